//! End-to-end share link scenarios: encode on one "browser", decode on another

use hospital_share::codec::{Gzip, encode_text};
use hospital_share::datasets::Dataset;
use hospital_share::payload::Fields;
use hospital_share::selection::Selection;
use hospital_share::store::{KeyValueStore, MemoryStore};
use hospital_share::{ChangeBus, DecodeState, Decoder, EncodeOutcome, Encoder, ShareConfig, ShareError};
use serde_json::{Value, json};

const ADMIN_PAGE: &str = "https://painel.hospital.example/app/#/assistencia";

fn admin_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    store
        .set(
            Dataset::DetailedStats.storage_key(),
            &json!({
                "jan": {"i1_acolhimento": 120, "i2_classificacao_risco": 98},
                "fev": {"i2_classificacao_risco": 101}
            }),
        )
        .unwrap();
    store
        .set(Dataset::Context.storage_key(), &json!("Hospital Regional, 220 leitos"))
        .unwrap();
    store
}

fn share_url(store: &MemoryStore, kind: &str, selection: Selection) -> String {
    let config = ShareConfig::default();
    let outcome = Encoder::new(&config, &Gzip)
        .share(store, ADMIN_PAGE, kind, |s| selection.read(s))
        .unwrap();
    match outcome {
        EncodeOutcome::Ready(link) => link.url,
        EncodeOutcome::NothingToShare => panic!("expected a link"),
    }
}

fn receive(store: &mut MemoryStore, url: &str) -> hospital_share::DecodeOutcome {
    let config = ShareConfig::default();
    Decoder::new(&config, &Gzip).run(store, &ChangeBus::new(), url)
}

#[test]
fn test_filtered_indicator_reaches_fresh_browser() {
    let url = share_url(&admin_store(), "assistance", Selection::new().stats(&["i1_acolhimento"]));

    let mut receiver = MemoryStore::new();
    let outcome = receive(&mut receiver, &url);

    assert!(matches!(outcome.state, DecodeState::Applied(_)));
    assert_eq!(
        receiver.get(Dataset::DetailedStats.storage_key()),
        Some(json!({"jan": {"i1_acolhimento": 120}}))
    );
    assert_eq!(receiver.keys(), vec![Dataset::DetailedStats.storage_key().to_string()]);
}

#[test]
fn test_round_trip_preserves_fields() {
    let config = ShareConfig::default();
    let mut fields = Fields::new();
    fields.insert("stats".to_string(), json!({"jan": {"i1_acolhimento": 120, "nota": "ok"}}));
    fields.insert("context".to_string(), json!("Contexto com acentuação e emoji 🏥"));

    let token = Encoder::new(&config, &Gzip)
        .encode_token("assistance", fields.clone())
        .unwrap()
        .unwrap();
    let payload = Decoder::new(&config, &Gzip).decode_token(&token).unwrap();

    assert_eq!(payload.fields, fields);
    assert_eq!(payload.kind, "assistance");
}

#[test]
fn test_decoding_twice_gives_same_state() {
    let url = share_url(&admin_store(), "assistance", Selection::for_kind("assistance"));

    let mut once = MemoryStore::new();
    receive(&mut once, &url);

    let mut twice = MemoryStore::new();
    receive(&mut twice, &url);
    receive(&mut twice, &url);

    assert_eq!(once, twice);
}

#[test]
fn test_import_overwrites_whole_dataset() {
    let url = share_url(&admin_store(), "assistance", Selection::new().stats(&["i1_acolhimento"]));

    let mut receiver = MemoryStore::new();
    receiver
        .set(Dataset::DetailedStats.storage_key(), &json!({"dez": {"i9_reinternacao": 2}}))
        .unwrap();
    receive(&mut receiver, &url);

    assert_eq!(
        receiver.get(Dataset::DetailedStats.storage_key()),
        Some(json!({"jan": {"i1_acolhimento": 120}}))
    );
}

#[test]
fn test_corrupted_token_never_mutates_storage() {
    let url = share_url(&admin_store(), "assistance", Selection::for_kind("assistance"));
    let (prefix, token) = url.split_once("share=").unwrap();

    let mut receiver = MemoryStore::new();
    receiver.set(Dataset::Context.storage_key(), &json!("local notes")).unwrap();
    let before = receiver.clone();

    for cut in [4, token.len() / 2, token.len() - 3] {
        let truncated = format!("{}share={}", prefix, &token[..cut]);
        let outcome = receive(&mut receiver, &truncated);
        assert!(matches!(outcome.state, DecodeState::Failed(_)), "cut at {}", cut);
        assert_eq!(receiver, before);
    }

    let mut flipped: Vec<u8> = token.as_bytes().to_vec();
    let middle = flipped.len() / 2;
    flipped[middle] = if flipped[middle] == b'A' { b'B' } else { b'A' };
    let corrupted = format!("{}share={}", prefix, String::from_utf8(flipped).unwrap());
    let outcome = receive(&mut receiver, &corrupted);
    assert!(matches!(outcome.state, DecodeState::Failed(_)));
    assert_eq!(receiver, before);
}

#[test]
fn test_invalid_token_leaves_storage_empty() {
    let mut receiver = MemoryStore::new();

    let outcome = receive(&mut receiver, "https://painel.hospital.example/#/?share=gz_!!!invalid!!!");

    assert!(matches!(
        outcome.state,
        DecodeState::Failed(ShareError::DecodeMalformed { .. })
    ));
    assert!(receiver.is_empty());
}

#[test]
fn test_nothing_to_share_without_data() {
    let config = ShareConfig::default();
    let empty = MemoryStore::new();

    let outcome = Encoder::new(&config, &Gzip)
        .share(&empty, ADMIN_PAGE, "assistance", |s| Selection::for_kind("assistance").read(s))
        .unwrap();

    assert_eq!(outcome, EncodeOutcome::NothingToShare);
}

#[test]
fn test_legacy_token_restores_same_keys() {
    let legacy_json = r#"{"stats":{"jan":{"i1_acolhimento":120}},"context":"Hospital Regional"}"#;
    let token = encode_text(legacy_json.as_bytes(), false);
    let url = format!("https://painel.hospital.example/#/?share={}", token);

    let mut legacy_receiver = MemoryStore::new();
    let outcome = receive(&mut legacy_receiver, &url);
    let report = outcome.report().unwrap();
    assert!(report.legacy);

    let mut fields = Fields::new();
    fields.insert("stats".to_string(), json!({"jan": {"i1_acolhimento": 120}}));
    fields.insert("context".to_string(), Value::String("Hospital Regional".to_string()));
    let config = ShareConfig::default();
    let link = Encoder::new(&config, &Gzip)
        .share_fields(ADMIN_PAGE, "assistance", fields)
        .unwrap();
    let mut current_receiver = MemoryStore::new();
    receive(&mut current_receiver, &link.link().unwrap().url);

    assert_eq!(legacy_receiver, current_receiver);
}

#[test]
fn test_clean_url_keeps_route() {
    let url = share_url(&admin_store(), "assistance", Selection::for_kind("assistance"));

    let outcome = receive(&mut MemoryStore::new(), &url);

    let clean = outcome.clean_url.unwrap();
    assert!(!clean.contains("share="));
    assert_eq!(clean, ADMIN_PAGE);
}
