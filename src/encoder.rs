/// Encoder: turns selected datasets into a share URL
use crate::codec::{self, Compression};
use crate::config::{PAYLOAD_VERSION, ShareConfig};
use crate::datasets::resolve_field;
use crate::error::{Result, ShareError};
use crate::link::PageLocation;
use crate::payload::{Fields, SharePayload};
use crate::selection::is_empty_value;
use crate::store::KeyValueStore;

/// A generated share link and what went into it
#[derive(Debug, Clone, PartialEq)]
pub struct ShareLink {
    pub url: String,
    pub token: String,
    pub kind: String,
    pub fields: Fields,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EncodeOutcome {
    Ready(ShareLink),
    /// Nothing was stored for the selection; no URL is produced
    NothingToShare,
}

impl EncodeOutcome {
    pub fn link(&self) -> Option<&ShareLink> {
        match self {
            EncodeOutcome::Ready(link) => Some(link),
            EncodeOutcome::NothingToShare => None,
        }
    }
}

pub struct Encoder<'a> {
    config: &'a ShareConfig,
    compression: &'a dyn Compression,
}

impl<'a> Encoder<'a> {
    pub fn new(config: &'a ShareConfig, compression: &'a dyn Compression) -> Self {
        Encoder {
            config,
            compression,
        }
    }

    /// Read a selection from `store` and build a link on top of `current_url`
    ///
    /// The store is only read. `select` decides which datasets go in and may
    /// narrow them (e.g. to a few indicator keys) to keep the link short.
    pub fn share<F>(
        &self,
        store: &dyn KeyValueStore,
        current_url: &str,
        kind: &str,
        select: F,
    ) -> Result<EncodeOutcome>
    where
        F: FnOnce(&dyn KeyValueStore) -> Fields,
    {
        let fields = select(store);
        self.share_fields(current_url, kind, fields)
    }

    pub fn share_fields(&self, current_url: &str, kind: &str, fields: Fields) -> Result<EncodeOutcome> {
        let location = PageLocation::parse(current_url)?;

        let Some(token) = self.encode_token(kind, fields.clone())? else {
            log::info!("Share '{}' skipped: nothing stored", kind);
            return Ok(EncodeOutcome::NothingToShare);
        };

        let url = location.with_param(&self.config.param_name, &token).to_url();
        if url.len() > self.config.max_url_length {
            log::warn!(
                "Share link for '{}' is {} characters, some browsers truncate past {}",
                kind,
                url.len(),
                self.config.max_url_length
            );
        }

        log::info!("Generated share link for '{}' ({} fields)", kind, fields.len());
        Ok(EncodeOutcome::Ready(ShareLink {
            url,
            token,
            kind: kind.to_string(),
            fields,
        }))
    }

    /// Build just the token; `None` when every field is empty
    pub fn encode_token(&self, kind: &str, fields: Fields) -> Result<Option<String>> {
        if let Some(unknown) = fields.keys().find(|name| resolve_field(kind, name).is_none()) {
            return Err(ShareError::UnknownField(unknown.clone()));
        }

        let fields: Fields = fields
            .into_iter()
            .filter(|(_, value)| !is_empty_value(value))
            .collect();
        if fields.is_empty() {
            return Ok(None);
        }

        let payload = SharePayload::new(PAYLOAD_VERSION, kind, fields);
        let json = serde_json::to_string(&payload)?;
        let token = codec::seal(
            &json,
            &self.config.token_prefix,
            self.config.url_safe_alphabet,
            self.compression,
        )?;

        Ok(Some(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Gzip, open};
    use crate::datasets::Dataset;
    use crate::selection::Selection;
    use crate::store::MemoryStore;
    use serde_json::{Value, json};

    const PAGE: &str = "https://painel.example.org/#/assistencia";

    struct BrokenCompression;

    impl Compression for BrokenCompression {
        fn compress(&self, _bytes: &[u8]) -> Result<Vec<u8>> {
            Err(ShareError::Compression("CompressionStream unavailable".to_string()))
        }

        fn decompress(&self, _bytes: &[u8], _limit: usize) -> Result<Vec<u8>> {
            Err(ShareError::Compression("CompressionStream unavailable".to_string()))
        }
    }

    fn fields(pairs: &[(&str, Value)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_share_builds_url_with_token() {
        let config = ShareConfig::default();
        let encoder = Encoder::new(&config, &Gzip);

        let outcome = encoder
            .share_fields(PAGE, "assistance", fields(&[("context", json!("Plantão"))]))
            .unwrap();

        let link = outcome.link().unwrap();
        assert!(link.url.starts_with("https://painel.example.org/#/assistencia?share=gz_"));
        assert!(link.url.ends_with(&link.token));

        let opened = open(&link.token, "gz_", &Gzip, config.max_payload_bytes).unwrap();
        let payload: SharePayload = serde_json::from_str(&opened.json).unwrap();
        assert_eq!(payload.version, 2);
        assert_eq!(payload.kind, "assistance");
        assert_eq!(payload.fields, fields(&[("context", json!("Plantão"))]));
    }

    #[test]
    fn test_stored_config_cannot_change_written_version() {
        let config = ShareConfig::from_json(r#"{"payload_version": 1}"#).unwrap();
        let encoder = Encoder::new(&config, &Gzip);

        let token = encoder
            .encode_token("assistance", fields(&[("context", json!("UTI"))]))
            .unwrap()
            .unwrap();

        let opened = open(&token, "gz_", &Gzip, config.max_payload_bytes).unwrap();
        let payload: SharePayload = serde_json::from_str(&opened.json).unwrap();
        assert_eq!(payload.version, 2);
    }

    #[test]
    fn test_empty_selection_is_nothing_to_share() {
        let config = ShareConfig::default();
        let encoder = Encoder::new(&config, &Gzip);
        let store = MemoryStore::new();

        let outcome = encoder
            .share(&store, PAGE, "assistance", |s| Selection::for_kind("assistance").read(s))
            .unwrap();

        assert_eq!(outcome, EncodeOutcome::NothingToShare);
    }

    #[test]
    fn test_all_empty_values_is_nothing_to_share() {
        let config = ShareConfig::default();
        let encoder = Encoder::new(&config, &Gzip);

        let outcome = encoder
            .share_fields(PAGE, "assistance", fields(&[("stats", json!({})), ("context", json!(""))]))
            .unwrap();

        assert!(outcome.link().is_none());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let config = ShareConfig::default();
        let encoder = Encoder::new(&config, &Gzip);

        let err = encoder
            .share_fields(PAGE, "assistance", fields(&[("charts", json!([1]))]))
            .unwrap_err();

        assert!(matches!(err, ShareError::UnknownField(name) if name == "charts"));
    }

    #[test]
    fn test_compression_failure_yields_no_url() {
        let config = ShareConfig::default();
        let encoder = Encoder::new(&config, &BrokenCompression);

        let err = encoder
            .share_fields(PAGE, "assistance", fields(&[("context", json!("x"))]))
            .unwrap_err();

        assert!(matches!(err, ShareError::Compression(_)));
    }

    #[test]
    fn test_share_does_not_mutate_store() {
        let config = ShareConfig::default();
        let encoder = Encoder::new(&config, &Gzip);
        let mut store = MemoryStore::new();
        store
            .set(Dataset::DetailedStats.storage_key(), &json!({"jan": {"i1_acolhimento": 120, "i2": 3}}))
            .unwrap();
        let before = store.clone();

        encoder
            .share(&store, PAGE, "assistance", |s| {
                Selection::new().stats(&["i1_acolhimento"]).read(s)
            })
            .unwrap();

        assert_eq!(store, before);
    }

    #[test]
    fn test_existing_share_param_is_replaced() {
        let config = ShareConfig::default();
        let encoder = Encoder::new(&config, &Gzip);

        let outcome = encoder
            .share_fields(
                "https://painel.example.org/#/strategic?share=gz_old&view=all",
                "strategic",
                fields(&[("data", json!({"meta": 85}))]),
            )
            .unwrap();

        let url = &outcome.link().unwrap().url;
        assert_eq!(url.matches("share=").count(), 1);
        assert!(url.contains("#/strategic?view=all&share=gz_"));
    }

    #[test]
    fn test_standard_alphabet_is_percent_encoded_in_url() {
        let config = ShareConfig {
            url_safe_alphabet: false,
            ..ShareConfig::default()
        };
        let encoder = Encoder::new(&config, &Gzip);

        let outcome = encoder
            .share_fields(PAGE, "assistance", fields(&[("context", json!("x".repeat(200)))]))
            .unwrap();

        let link = outcome.link().unwrap();
        let query = link.url.split_once("share=").unwrap().1;
        assert!(!query.contains(['+', '/', '=']));
    }

    #[test]
    fn test_invalid_page_url() {
        let config = ShareConfig::default();
        let encoder = Encoder::new(&config, &Gzip);

        let err = encoder
            .share_fields("not a url", "assistance", fields(&[("context", json!("x"))]))
            .unwrap_err();

        assert!(matches!(err, ShareError::InvalidUrl(_)));
    }
}
