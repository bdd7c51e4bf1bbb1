//! Startup configuration.
//!
//! Built-in defaults, then an optional `castpos.yaml`, then `CASTPOS_*`
//! environment variables, each layer overriding the one before. Everything
//! is validated once in [`Settings::validate`]; nothing downstream reads the
//! environment or the file again.

use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy_primitives::Address;
use castpos_types::{
    ChainId,
    constants::{
        DEFAULT_APP_URL, DEFAULT_BLOCK_EXPLORER, DEFAULT_CHAIN_ID, DEFAULT_OPERATING_TARGET,
        DEFAULT_TOKEN_ADDRESS, DEFAULT_TOKEN_DECIMALS, ENV_PREFIX, MAX_TOKEN_DECIMALS,
    },
    manifest::AccountAssociation,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read {}: {}", .0.display(), .1)]
    Read(PathBuf, std::io::Error),
    #[error("Failed to parse {}: {}", .0.display(), .1)]
    Parse(PathBuf, serde_yml::Error),
    #[error("Invalid {field} '{value}': expected a 20-byte hex address")]
    InvalidAddress { field: &'static str, value: String },
    #[error("Invalid {field} '{value}': {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },
    #[error("Invalid {field} '{value}': expected an unsigned integer")]
    InvalidNumber { field: &'static str, value: String },
    #[error("Token decimals {0} exceeds the maximum of {max}", max = MAX_TOKEN_DECIMALS)]
    InvalidDecimals(u8),
    #[error("Chain id must be non-zero")]
    ZeroChainId,
}

/// Raw, unvalidated settings as they appear in `castpos.yaml`. Every field
/// is optional; missing fields fall back to the built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsFile {
    pub chain_id: Option<ChainId>,
    pub token_address: Option<String>,
    pub token_decimals: Option<u8>,
    pub merchant_address: Option<String>,
    pub reserve_address: Option<String>,
    pub block_explorer: Option<String>,
    pub app_url: Option<String>,
    pub rpc_url: Option<String>,
    pub operating_target: Option<String>,
    pub account_association: Option<AccountAssociation>,
}

impl SettingsFile {
    /// Read `path`. A missing file is not an error and yields the empty layer.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content =
            fs::read_to_string(path).map_err(|e| SettingsError::Read(path.to_path_buf(), e))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yml::from_str(&content).map_err(|e| SettingsError::Parse(path.to_path_buf(), e))
    }

    /// Overlay `CASTPOS_*` variables, looked up through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(value) = var("CHAIN_ID") {
            self.chain_id = Some(parse_number(&value, "chain id")?);
        }
        if let Some(value) = var("TOKEN_DECIMALS") {
            self.token_decimals = Some(parse_number(&value, "token decimals")?);
        }

        let strings: [(&str, &mut Option<String>); 7] = [
            ("TOKEN_ADDRESS", &mut self.token_address),
            ("MERCHANT_ADDRESS", &mut self.merchant_address),
            ("RESERVE_ADDRESS", &mut self.reserve_address),
            ("BLOCK_EXPLORER", &mut self.block_explorer),
            ("APP_URL", &mut self.app_url),
            ("RPC_URL", &mut self.rpc_url),
            ("OPERATING_TARGET", &mut self.operating_target),
        ];
        for (name, slot) in strings {
            if let Some(value) = var(name) {
                *slot = Some(value);
            }
        }

        let header = var("FARCASTER_HEADER");
        let payload = var("FARCASTER_PAYLOAD");
        let signature = var("FARCASTER_SIGNATURE");
        if header.is_some() || payload.is_some() || signature.is_some() {
            let association = self.account_association.get_or_insert_with(Default::default);
            if let Some(header) = header {
                association.header = header;
            }
            if let Some(payload) = payload {
                association.payload = payload;
            }
            if let Some(signature) = signature {
                association.signature = signature;
            }
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, field: &'static str) -> Result<T, SettingsError> {
    value.trim().parse().map_err(|_| SettingsError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

fn parse_address(value: &str, field: &'static str) -> Result<Address, SettingsError> {
    value
        .trim()
        .parse()
        .map_err(|_| SettingsError::InvalidAddress {
            field,
            value: value.to_string(),
        })
}

/// Empty means unset for the optional addresses
fn parse_optional_address(
    value: Option<&str>,
    field: &'static str,
) -> Result<Option<Address>, SettingsError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_address(value, field).map(Some),
    }
}

fn parse_url(value: &str, field: &'static str) -> Result<Url, SettingsError> {
    Url::parse(value.trim()).map_err(|e| SettingsError::InvalidUrl {
        field,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Validated configuration handed to the core functions at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub chain_id: ChainId,
    pub token_address: Address,
    pub token_decimals: u8,
    /// The wallet that receives payments, when one is connected
    pub merchant_address: Option<Address>,
    /// Destination for surplus. Unset only disables allocation.
    pub reserve_address: Option<Address>,
    pub block_explorer: Url,
    pub app_url: Url,
    pub rpc_url: Option<Url>,
    /// Kept as typed; a bad value degrades the surplus to zero instead of
    /// failing startup
    pub operating_target: String,
    pub account_association: AccountAssociation,
}

impl Settings {
    /// Defaults, then the file at `path` if present, then the process environment
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let file = SettingsFile::load(path)?;
        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    pub fn from_sources<F>(mut file: SettingsFile, env: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        file.apply_env(env)?;
        Self::validate(file)
    }

    pub fn validate(file: SettingsFile) -> Result<Self, SettingsError> {
        let chain_id = file.chain_id.unwrap_or(DEFAULT_CHAIN_ID);
        if chain_id == 0 {
            return Err(SettingsError::ZeroChainId);
        }

        let token_decimals = file.token_decimals.unwrap_or(DEFAULT_TOKEN_DECIMALS);
        if token_decimals > MAX_TOKEN_DECIMALS {
            return Err(SettingsError::InvalidDecimals(token_decimals));
        }

        let token_address = parse_address(
            file.token_address.as_deref().unwrap_or(DEFAULT_TOKEN_ADDRESS),
            "token address",
        )?;
        let merchant_address =
            parse_optional_address(file.merchant_address.as_deref(), "merchant address")?;
        let reserve_address =
            parse_optional_address(file.reserve_address.as_deref(), "reserve address")?;

        let block_explorer = parse_url(
            file.block_explorer.as_deref().unwrap_or(DEFAULT_BLOCK_EXPLORER),
            "block explorer",
        )?;
        let app_url = parse_url(file.app_url.as_deref().unwrap_or(DEFAULT_APP_URL), "app url")?;
        let rpc_url = match file.rpc_url.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) => Some(parse_url(value, "rpc url")?),
        };

        Ok(Settings {
            chain_id,
            token_address,
            token_decimals,
            merchant_address,
            reserve_address,
            block_explorer,
            app_url,
            rpc_url,
            operating_target: file
                .operating_target
                .unwrap_or_else(|| DEFAULT_OPERATING_TARGET.to_string()),
            account_association: file.account_association.unwrap_or_default(),
        })
    }

    pub fn reserve_configured(&self) -> bool {
        self.reserve_address.is_some()
    }
}
