/// Error types for share-link encoding and decoding
use std::fmt;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, ShareError>;

/// Step of the decode chain that rejected a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStage {
    Base64,
    Inflate,
    Utf8,
    Json,
}

impl fmt::Display for DecodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DecodeStage::Base64 => "base64",
            DecodeStage::Inflate => "inflate",
            DecodeStage::Utf8 => "utf-8",
            DecodeStage::Json => "json",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum ShareError {
    /// The selection produced no data worth sharing.
    #[error("nothing to share: no data is stored for this view")]
    NothingToShare,

    /// The compression primitive failed in either direction.
    #[error("compression failed: {0}")]
    Compression(String),

    /// A share token could not be turned back into a payload.
    #[error("malformed share token at {stage} stage: {detail}")]
    DecodeMalformed { stage: DecodeStage, detail: String },

    /// Payload was written by a newer encoder than this one understands.
    #[error("unsupported share payload version {0}")]
    UnsupportedVersion(u64),

    /// Payload decoded fine but carried no field this dashboard restores.
    #[error("share payload contains no recognized datasets")]
    EmptyPayload,

    /// Legacy token received while legacy support is switched off.
    #[error("legacy share tokens are not accepted")]
    LegacyRejected,

    /// Encoder was asked to share a field the decoder cannot restore.
    #[error("unknown share field '{0}'")]
    UnknownField(String),

    /// Persistent storage rejected a read or write.
    #[error("storage error for key '{key}': {detail}")]
    Storage { key: String, detail: String },

    #[error("invalid page url: {0}")]
    InvalidUrl(String),

    #[error("clipboard is not available in this browser")]
    ClipboardUnavailable,

    #[error("clipboard write failed: {0}")]
    Clipboard(String),

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid share configuration: {message}")]
    Config { message: String },
}

impl ShareError {
    pub(crate) fn malformed(stage: DecodeStage, detail: impl ToString) -> Self {
        ShareError::DecodeMalformed {
            stage,
            detail: detail.to_string(),
        }
    }

    /// Message suitable for showing to the person who clicked "share".
    pub fn user_message(&self) -> String {
        match self {
            ShareError::NothingToShare => {
                "There is no data to share for this view yet.".to_string()
            }
            ShareError::Compression(_) | ShareError::Serialize(_) => {
                "Could not generate the share link. Please try again.".to_string()
            }
            ShareError::ClipboardUnavailable | ShareError::Clipboard(_) => {
                "Copy the link below manually.".to_string()
            }
            other => other.to_string(),
        }
    }
}
