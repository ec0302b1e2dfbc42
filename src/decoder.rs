/// Decoder: restores an inbound share token into local storage on page load
use crate::codec::{self, Compression};
use crate::config::{PAYLOAD_VERSION, ShareConfig};
use crate::datasets::{Dataset, GENERIC_DATA_FIELD, resolve_field};
use crate::error::{Result, ShareError};
use crate::events::{ChangeBus, StorageChanged};
use crate::link::PageLocation;
use crate::payload::InboundPayload;
use crate::store::{KeyValueStore, write_all};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// What an applied token changed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    pub kind: String,
    pub version: Option<u64>,
    pub legacy: bool,
    pub restored_keys: Vec<String>,
    pub ignored_fields: Vec<String>,
}

/// Decode progress for one page load
#[derive(Debug)]
pub enum DecodeState {
    NoToken,
    TokenFound(String),
    Applied(ImportReport),
    /// Storage was left untouched
    Failed(ShareError),
}

#[derive(Debug)]
pub struct DecodeOutcome {
    pub state: DecodeState,
    /// Current address without the share parameter, set once a token was applied
    pub clean_url: Option<String>,
}

impl DecodeOutcome {
    fn finished(state: DecodeState) -> Self {
        DecodeOutcome {
            state,
            clean_url: None,
        }
    }

    pub fn report(&self) -> Option<&ImportReport> {
        match &self.state {
            DecodeState::Applied(report) => Some(report),
            _ => None,
        }
    }
}

/// Payload resolved to concrete storage writes
#[derive(Debug, Clone, PartialEq)]
pub struct RestorePlan {
    pub writes: BTreeMap<Dataset, Value>,
    pub ignored_fields: Vec<String>,
}

pub struct Decoder<'a> {
    config: &'a ShareConfig,
    compression: &'a dyn Compression,
}

impl<'a> Decoder<'a> {
    pub fn new(config: &'a ShareConfig, compression: &'a dyn Compression) -> Self {
        Decoder {
            config,
            compression,
        }
    }

    /// Token text to payload; never touches storage
    pub fn decode_token(&self, token: &str) -> Result<InboundPayload> {
        let opened = codec::open(
            token,
            &self.config.token_prefix,
            self.compression,
            self.config.max_payload_bytes,
        )?;
        let mut payload = InboundPayload::parse(&opened.json)?;
        payload.legacy |= opened.legacy;

        if payload.legacy {
            if !self.config.accept_legacy_tokens {
                return Err(ShareError::LegacyRejected);
            }
            log::warn!("Decoding deprecated legacy share token");
        }

        if let Some(version) = payload.version {
            if version > PAYLOAD_VERSION {
                return Err(ShareError::UnsupportedVersion(version));
            }
        }

        Ok(payload)
    }

    /// Map payload fields to datasets; unrecognized fields are skipped
    pub fn plan(&self, payload: &InboundPayload) -> Result<RestorePlan> {
        let mut writes = BTreeMap::new();
        let mut ignored_fields = Vec::new();

        for (field, value) in &payload.fields {
            match resolve_field(&payload.kind, field) {
                // A named field wins over `data` whatever the field order
                Some(dataset) if field == GENERIC_DATA_FIELD => {
                    writes.entry(dataset).or_insert_with(|| value.clone());
                }
                Some(dataset) => {
                    writes.insert(dataset, value.clone());
                }
                None => ignored_fields.push(field.clone()),
            }
        }

        if writes.is_empty() {
            return Err(ShareError::EmptyPayload);
        }
        if !ignored_fields.is_empty() {
            log::info!("Ignoring unrecognized share fields: {:?}", ignored_fields);
        }

        Ok(RestorePlan {
            writes,
            ignored_fields,
        })
    }

    /// Decode and write a token; all datasets are written or none are
    pub fn apply_token(&self, store: &mut dyn KeyValueStore, token: &str) -> Result<ImportReport> {
        let payload = self.decode_token(token)?;
        let plan = self.plan(&payload)?;

        let writes: Vec<(&str, Value)> = plan
            .writes
            .iter()
            .map(|(dataset, value)| (dataset.storage_key(), value.clone()))
            .collect();
        write_all(store, &writes)?;

        Ok(ImportReport {
            kind: payload.kind,
            version: payload.version,
            legacy: payload.legacy,
            restored_keys: writes.iter().map(|(key, _)| key.to_string()).collect(),
            ignored_fields: plan.ignored_fields,
        })
    }

    /// Page-load entry point: detect, apply, and report the clean address
    ///
    /// Failures are logged and end in [`DecodeState::Failed`]; they never
    /// propagate, so a bad link cannot stop the page from loading.
    pub fn run(&self, store: &mut dyn KeyValueStore, bus: &ChangeBus, current_url: &str) -> DecodeOutcome {
        let location = match PageLocation::parse(current_url) {
            Ok(location) => location,
            Err(e) => {
                log::warn!("Share detection skipped: {}", e);
                return DecodeOutcome::finished(DecodeState::NoToken);
            }
        };

        let mut state = match location.share_token(&self.config.param_name) {
            Some(token) => DecodeState::TokenFound(token),
            None => DecodeState::NoToken,
        };

        if let DecodeState::TokenFound(token) = &state {
            log::debug!("Found share token ({} characters)", token.len());
            state = match self.apply_token(store, token) {
                Ok(report) => DecodeState::Applied(report),
                Err(e) => {
                    log::warn!("Share token ignored: {}", e);
                    DecodeState::Failed(e)
                }
            };
        }

        let report = match state {
            DecodeState::Applied(report) => report,
            other => return DecodeOutcome::finished(other),
        };

        log::info!(
            "Imported shared '{}' data into {:?}",
            report.kind,
            report.restored_keys
        );
        bus.publish(&StorageChanged {
            keys: report.restored_keys.clone(),
            source_kind: report.kind.clone(),
        });

        DecodeOutcome {
            state: DecodeState::Applied(report),
            clean_url: Some(location.without_param(&self.config.param_name).to_url()),
        }
    }
}
