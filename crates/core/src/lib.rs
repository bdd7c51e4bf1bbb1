pub mod checkout;
pub mod explorer;
pub mod manifest;
pub mod request;
pub mod settings;
pub mod treasury;
pub mod wallet;

pub use request::{PaymentRequest, RequestError};
pub use settings::{Settings, SettingsError};
pub use treasury::{SurplusResult, TargetParse, TreasurySnapshot};
pub use wallet::{WalletError, WalletProvider};
