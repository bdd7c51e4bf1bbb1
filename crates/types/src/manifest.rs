//! Discovery manifest served to mini-app hosts.
//!
//! The document is static for a given deployment: it is assembled once from
//! the app URL and the signed account association, then served as JSON.
//!
//! ```json
//! {
//!   "accountAssociation": { "header": "...", "payload": "...", "signature": "..." },
//!   "frame": { "version": "1", "name": "Cast-POS", "homeUrl": "https://pos.example", ... },
//!   "metadata": { "name": "Cast-POS", "primaryCategory": "finance", "tags": ["payments", ...], ... }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::{APP_DESCRIPTION, APP_NAME, APP_VERSION};

pub const SPLASH_BACKGROUND_COLOR: &str = "#2563eb";
pub const PRIMARY_CATEGORY: &str = "finance";
pub const TAGS: [&str; 7] = [
    "payments", "pos", "usdc", "base", "treasury", "merchant", "commerce",
];
pub const AUTHOR: &str = "Wesley Rios";
pub const SUPPORT_EMAIL: &str = "wesley.f.rios@gmail.com";
pub const GITHUB_URL: &str = "https://github.com/ReageMeuFilho/crypto-brokerage-miniapp";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppManifest {
    pub account_association: AccountAssociation,
    pub frame: FrameConfig,
    pub metadata: ManifestMetadata,
}

/// Signed proof that the app domain belongs to an account. Left empty
/// until the operator provides it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountAssociation {
    pub header: String,
    pub payload: String,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameConfig {
    pub version: String,
    pub name: String,
    pub icon_url: String,
    pub home_url: String,
    pub image_url: String,
    pub button_title: String,
    pub splash_image_url: String,
    pub splash_background_color: String,
    pub webhook_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestMetadata {
    pub name: String,
    pub description: String,
    pub version: String,
    pub primary_category: String,
    pub tags: Vec<String>,
    pub author: String,
    pub website: String,
    pub support: SupportContact,
    pub social: SocialLinks,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportContact {
    pub email: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    pub github: String,
}

impl AppManifest {
    /// Build the manifest for an app served at `app_url`
    pub fn new(app_url: &str, account_association: AccountAssociation) -> Self {
        let base = app_url.trim_end_matches('/');
        AppManifest {
            account_association,
            frame: FrameConfig {
                version: "1".to_string(),
                name: APP_NAME.to_string(),
                icon_url: format!("{base}/icon-192x192.png"),
                home_url: base.to_string(),
                image_url: format!("{base}/og-image.png"),
                button_title: format!("Open {APP_NAME}"),
                splash_image_url: format!("{base}/splash.png"),
                splash_background_color: SPLASH_BACKGROUND_COLOR.to_string(),
                webhook_url: format!("{base}/api/webhook"),
            },
            metadata: ManifestMetadata {
                name: APP_NAME.to_string(),
                description: APP_DESCRIPTION.to_string(),
                version: APP_VERSION.to_string(),
                primary_category: PRIMARY_CATEGORY.to_string(),
                tags: TAGS.iter().map(|t| t.to_string()).collect(),
                author: AUTHOR.to_string(),
                website: base.to_string(),
                support: SupportContact {
                    email: SUPPORT_EMAIL.to_string(),
                    url: base.to_string(),
                },
                social: SocialLinks {
                    github: GITHUB_URL.to_string(),
                },
            },
        }
    }
}
