/// Hospital Share - share links for the hospital dashboard's local data
/// Built with Rust + WASM + Yew

pub mod browser;
pub mod codec;
pub mod config;
pub mod datasets;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod events;
pub mod link;
pub mod payload;
pub mod selection;
pub mod store;
pub mod ui;

pub use config::ShareConfig;
pub use decoder::{DecodeOutcome, DecodeState, Decoder, ImportReport};
pub use encoder::{EncodeOutcome, Encoder, ShareLink};
pub use error::{Result, ShareError};
pub use events::{ChangeBus, StorageChanged};

use wasm_bindgen::prelude::*;

thread_local! {
    static CHANGE_BUS: ChangeBus = ChangeBus::new();
}

/// Page-wide bus announcing datasets overwritten by an imported share link
pub fn change_bus() -> ChangeBus {
    CHANGE_BUS.with(|bus| bus.clone())
}

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

/// Apply a `share=` link from the current address, for pages outside the Yew app
///
/// Returns the import report, or `null` when there was nothing (valid) to import.
#[wasm_bindgen]
pub fn apply_inbound_share() -> JsValue {
    let mut store = browser::open_store();
    let outcome = browser::import_from_location(&mut *store, &change_bus());

    outcome
        .report()
        .and_then(|report| serde_wasm_bindgen::to_value(report).ok())
        .unwrap_or(JsValue::NULL)
}

/// Build a share link for `kind`; `fields_json` overrides the default selection
///
/// Returns `undefined` when there is nothing to share.
#[wasm_bindgen]
pub fn build_share_link(
    kind: &str,
    fields_json: Option<String>,
) -> std::result::Result<Option<String>, JsValue> {
    let fields = fields_json
        .map(|text| serde_json::from_str::<payload::Fields>(&text))
        .transpose()
        .map_err(|e| JsValue::from_str(&ShareError::from(e).to_string()))?;

    match browser::share_current_page_with(kind, fields) {
        Ok(EncodeOutcome::Ready(link)) => Ok(Some(link.url)),
        Ok(EncodeOutcome::NothingToShare) => Ok(None),
        Err(e) => Err(JsValue::from_str(&e.user_message())),
    }
}

// Start the Yew app for the share panel
#[wasm_bindgen]
pub fn start_share_panel() {
    yew::Renderer::<ui::ShareApp>::new().render();
}
