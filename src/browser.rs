/// Browser glue: page address, history cleanup and clipboard
use crate::codec::Gzip;
use crate::config::ShareConfig;
use crate::decoder::{DecodeOutcome, DecodeState, Decoder};
use crate::encoder::{EncodeOutcome, Encoder};
use crate::error::{Result, ShareError};
use crate::events::ChangeBus;
use crate::payload::Fields;
use crate::selection::Selection;
use crate::store::{BrowserStore, KeyValueStore, MemoryStore};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;

pub fn current_href() -> Result<String> {
    let window = web_sys::window().ok_or_else(|| ShareError::InvalidUrl("no window".to_string()))?;
    window
        .location()
        .href()
        .map_err(|e| ShareError::InvalidUrl(format!("{:?}", e)))
}

/// Swap the visible address without navigating or adding a history entry
pub fn replace_address(url: &str) -> Result<()> {
    let window = web_sys::window().ok_or_else(|| ShareError::InvalidUrl("no window".to_string()))?;
    let history = window
        .history()
        .map_err(|e| ShareError::InvalidUrl(format!("{:?}", e)))?;
    history
        .replace_state_with_url(&JsValue::NULL, "", Some(url))
        .map_err(|e| ShareError::InvalidUrl(format!("{:?}", e)))
}

/// localStorage, or an in-memory stand-in when the browser blocks it
pub fn open_store() -> Box<dyn KeyValueStore> {
    match BrowserStore::local() {
        Ok(store) => Box::new(store),
        Err(e) => {
            log::warn!("Falling back to in-memory storage: {}", e);
            Box::new(MemoryStore::new())
        }
    }
}

/// Apply an inbound share link once per page load
pub fn import_from_location(store: &mut dyn KeyValueStore, bus: &ChangeBus) -> DecodeOutcome {
    let config = ShareConfig::load(store);

    let href = match current_href() {
        Ok(href) => href,
        Err(e) => {
            log::warn!("Cannot read page address: {}", e);
            return DecodeOutcome {
                state: DecodeState::NoToken,
                clean_url: None,
            };
        }
    };

    let outcome = Decoder::new(&config, &Gzip).run(store, bus, &href);

    if let Some(clean_url) = &outcome.clean_url {
        if let Err(e) = replace_address(clean_url) {
            log::warn!("Could not remove share parameter from address: {}", e);
        }
    }

    outcome
}

/// Build a share link for the current page from the stored datasets
///
/// `fields` overrides the default selection for `kind` when a view has
/// already picked what to share.
pub fn share_current_page_with(kind: &str, fields: Option<Fields>) -> Result<EncodeOutcome> {
    let store = open_store();
    let config = ShareConfig::load(&*store);
    let href = current_href()?;
    let encoder = Encoder::new(&config, &Gzip);

    match fields {
        Some(fields) => encoder.share_fields(&href, kind, fields),
        None => encoder.share(&*store, &href, kind, |s| Selection::for_kind(kind).read(s)),
    }
}

pub fn share_current_page(kind: &str) -> Result<EncodeOutcome> {
    share_current_page_with(kind, None)
}

/// Copy text with the async clipboard API
///
/// Returns [`ShareError::ClipboardUnavailable`] when the API is missing
/// (insecure context, older browsers) so the caller can show the text instead.
pub async fn copy_to_clipboard(text: &str) -> Result<()> {
    let window = web_sys::window().ok_or(ShareError::ClipboardUnavailable)?;
    let navigator = window.navigator();

    let has_clipboard = js_sys::Reflect::get(&navigator, &JsValue::from_str("clipboard"))
        .map(|value| !value.is_undefined() && !value.is_null())
        .unwrap_or(false);
    if !has_clipboard {
        return Err(ShareError::ClipboardUnavailable);
    }

    JsFuture::from(navigator.clipboard().write_text(text))
        .await
        .map_err(|e| ShareError::Clipboard(format!("{:?}", e)))?;
    Ok(())
}
