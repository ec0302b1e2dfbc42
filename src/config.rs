/// Share-link configuration
///
/// Defaults match the links the dashboard has always produced. A deployment
/// can override them by storing a JSON object under [`CONFIG_STORAGE_KEY`].
use crate::error::{Result, ShareError};
use crate::store::KeyValueStore;
use serde::{Deserialize, Serialize};

pub const CONFIG_STORAGE_KEY: &str = "hospital.share_config";

/// Payload version this build writes, and the highest it reads
pub const PAYLOAD_VERSION: u64 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    /// Fragment parameter carrying the token (`#/route?share=...`)
    pub param_name: String,
    /// Marks a token as gzip-compressed
    pub token_prefix: String,
    /// Encode with `-`/`_` instead of `+`/`/` and drop padding
    pub url_safe_alphabet: bool,
    /// Decode unprefixed tokens and unversioned `{stats, context}` payloads
    pub accept_legacy_tokens: bool,
    /// Links longer than this are still produced, but logged
    pub max_url_length: usize,
    /// Largest decoded payload JSON accepted from a link
    pub max_payload_bytes: usize,
}

impl Default for ShareConfig {
    fn default() -> Self {
        ShareConfig {
            param_name: "share".to_string(),
            token_prefix: "gz_".to_string(),
            url_safe_alphabet: true,
            accept_legacy_tokens: true,
            max_url_length: 2000,
            max_payload_bytes: 5 * 1024 * 1024,
        }
    }
}

impl ShareConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: ShareConfig = serde_json::from_str(text).map_err(|e| ShareError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load overrides from storage, falling back to defaults on any problem
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let Some(raw) = store.get(CONFIG_STORAGE_KEY) else {
            return ShareConfig::default();
        };

        let parsed = serde_json::from_value::<ShareConfig>(raw)
            .map_err(|e| ShareError::Config {
                message: e.to_string(),
            })
            .and_then(|config| config.validate().map(|_| config));

        match parsed {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring stored share config: {}", e);
                ShareConfig::default()
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| {
            Err(ShareError::Config {
                message: message.to_string(),
            })
        };

        if self.param_name.is_empty() {
            return invalid("param_name must not be empty");
        }
        if !self
            .param_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return invalid("param_name may only contain letters, digits, '_' and '-'");
        }
        if self.token_prefix.is_empty() {
            return invalid("token_prefix must not be empty");
        }
        if self.token_prefix.starts_with("ey") {
            // Legacy tokens are base64 of a JSON object and always start with "ey"
            return invalid("token_prefix would be ambiguous with legacy tokens");
        }
        if self.max_url_length == 0 {
            return invalid("max_url_length must be positive");
        }
        if self.max_payload_bytes == 0 {
            return invalid("max_payload_bytes must be positive");
        }

        Ok(())
    }
}
