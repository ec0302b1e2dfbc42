/// Share payload structures and the parser for inbound payload shapes
use crate::error::{DecodeStage, Result, ShareError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field name to dataset value, in the order the encoder selected them
pub type Fields = Map<String, Value>;

/// Versioned payload carried inside a share token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharePayload {
    pub version: u64,
    pub kind: String,
    pub fields: Fields,
}

impl SharePayload {
    pub fn new(version: u64, kind: &str, fields: Fields) -> Self {
        SharePayload {
            version,
            kind: kind.to_string(),
            fields,
        }
    }
}

/// A payload after shape detection
///
/// Legacy payloads have no version or `fields` wrapper; their top-level keys
/// are the fields themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundPayload {
    pub version: Option<u64>,
    pub kind: String,
    pub fields: Fields,
    pub legacy: bool,
}

impl InboundPayload {
    pub fn parse(json: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| ShareError::malformed(DecodeStage::Json, e))?;

        let Value::Object(mut root) = value else {
            return Err(ShareError::malformed(
                DecodeStage::Json,
                "payload is not a JSON object",
            ));
        };

        let kind = match root.remove("kind") {
            Some(Value::String(kind)) => kind,
            _ => String::new(),
        };
        let version = root.remove("version").and_then(|v| v.as_u64());

        match root.remove("fields") {
            Some(Value::Object(fields)) => Ok(InboundPayload {
                version,
                kind,
                fields,
                legacy: false,
            }),
            Some(_) => Err(ShareError::malformed(
                DecodeStage::Json,
                "'fields' is not an object",
            )),
            None => Ok(InboundPayload {
                version,
                kind,
                fields: root,
                legacy: true,
            }),
        }
    }
}
