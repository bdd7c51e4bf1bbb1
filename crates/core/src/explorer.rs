//! Links into the configured block explorer and compact address display.

use std::fmt::Display;

fn base(explorer: &str) -> &str {
    explorer.trim_end_matches('/')
}

/// `{explorer}/address/{address}`
pub fn address_url(explorer: &str, address: impl Display) -> String {
    format!("{}/address/{}", base(explorer), address)
}

/// `{explorer}/tx/{hash}`
pub fn tx_url(explorer: &str, hash: impl Display) -> String {
    format!("{}/tx/{}", base(explorer), hash)
}

/// Shorten `0x1234567890abcdef...` to `0x1234...cdef`, keeping `chars` hex
/// digits on each side. Strings too short to shorten are returned whole.
pub fn short_address(address: &str, chars: usize) -> String {
    if address.is_empty() {
        return String::new();
    }
    let head = 2 + chars;
    if address.len() <= head + chars || !address.is_char_boundary(head) {
        return address.to_string();
    }
    let tail = address.len() - chars;
    if !address.is_char_boundary(tail) {
        return address.to_string();
    }
    format!("{}...{}", &address[..head], &address[tail..])
}
