/// Application name shown in wallets and the discovery manifest
pub const APP_NAME: &str = "Cast-POS";

/// One-line description shown in wallets and the discovery manifest
pub const APP_DESCRIPTION: &str = "Accept crypto payments as easily as cash";

/// Version advertised in the discovery manifest metadata
pub const APP_VERSION: &str = "2.0.0";

/// Default EVM chain (Arbitrum Sepolia)
pub const DEFAULT_CHAIN_ID: u64 = 421614;

/// Default stablecoin contract on the default chain
pub const DEFAULT_TOKEN_ADDRESS: &str = "0x75faf114eafb1BDbe2F0316DF893fd58CE46AA4d";

/// Stablecoin decimals (USDC)
pub const DEFAULT_TOKEN_DECIMALS: u8 = 6;

/// Largest decimals value accepted for a token
pub const MAX_TOKEN_DECIMALS: u8 = 36;

/// Default block explorer for the default chain
pub const DEFAULT_BLOCK_EXPLORER: &str = "https://sepolia.arbiscan.io";

/// Default public URL of the app
pub const DEFAULT_APP_URL: &str = "http://localhost:3000";

/// Operating target pre-filled on the treasury screen, in whole units
pub const DEFAULT_OPERATING_TARGET: &str = "1000";

/// Fractional digits the amount fields let the user type
pub const INPUT_FRACTION_DIGITS: usize = 2;

/// Fractional digits used when showing amounts to people
pub const DISPLAY_FRACTION_DIGITS: u32 = 2;

/// Scheme of the payment-request URI
pub const PAYMENT_URI_SCHEME: &str = "ethereum";

/// Lifetime of the discovery manifest in shared caches, in seconds
pub const MANIFEST_MAX_AGE_SECS: u64 = 3600;

/// Path the discovery manifest is served under
pub const MANIFEST_PATH: &str = "/.well-known/farcaster.json";

/// Default port for the manifest service
pub const DEFAULT_MANIFEST_PORT: u16 = 3000;

/// Default binding address for the manifest service
pub const DEFAULT_BINDING_ADDRESS: &str = "0.0.0.0";

/// Name of the optional configuration file
pub const SETTINGS_FILE_NAME: &str = "castpos.yaml";

/// Prefix of the environment variables read at startup
pub const ENV_PREFIX: &str = "CASTPOS_";
