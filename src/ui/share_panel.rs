/// Share panel: generate share links and report imported data

use crate::browser::{copy_to_clipboard, import_from_location, open_store, share_current_page};
use crate::decoder::DecodeState;
use crate::encoder::EncodeOutcome;
use crate::error::ShareError;
use crate::events::StorageChanged;
use crate::ui::components::{LinkField, StatusKind, StatusMessage};
use patternfly_yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

/// Kind tag and button label for each view that can be shared
const SHARE_BUTTONS: [(&str, &str); 4] = [
    ("assistance", "Share assistance indicators"),
    ("strategic", "Share strategic indicators"),
    ("proposals", "Share proposals"),
    ("rqda_q1", "Share RQDA report data"),
];

#[derive(Clone, PartialEq)]
enum PanelState {
    Idle,
    Working(String),
    Copied(String),
    /// Link built, but it has to be copied by hand
    Manual { url: String, message: String },
    Info(String),
    Error(String),
}

#[function_component(ShareApp)]
pub fn share_app() -> Html {
    let state = use_state(|| PanelState::Idle);
    let imported = use_state(|| None::<StorageChanged>);

    // Subscribe before importing so this panel sees the change it triggers
    {
        let imported = imported.clone();
        use_effect_with((), move |_| {
            let bus = crate::change_bus();
            let subscription = bus.subscribe(move |change: &StorageChanged| {
                imported.set(Some(change.clone()));
            });

            let mut store = open_store();
            if let DecodeState::Failed(e) = import_from_location(&mut *store, &bus).state {
                // Bad links are not the user's problem; keep it in the console
                log::debug!("Inbound share link not applied: {}", e);
            }

            move || {
                bus.unsubscribe(subscription);
            }
        });
    }

    let on_share = {
        let state = state.clone();
        move |kind: &'static str| {
            let state = state.clone();
            Callback::from(move |_| {
                let state = state.clone();

                state.set(PanelState::Working(format!("Preparing '{}' link...", kind)));

                spawn_local(async move {
                    match share_current_page(kind) {
                        Ok(EncodeOutcome::NothingToShare) => {
                            state.set(PanelState::Info(ShareError::NothingToShare.user_message()));
                        }
                        Ok(EncodeOutcome::Ready(link)) => match copy_to_clipboard(&link.url).await {
                            Ok(()) => state.set(PanelState::Copied(link.url)),
                            Err(e) => {
                                log::info!("Clipboard copy failed: {}", e);
                                state.set(PanelState::Manual {
                                    url: link.url,
                                    message: e.user_message(),
                                });
                            }
                        },
                        Err(e) => {
                            log::error!("Share '{}' failed: {}", kind, e);
                            state.set(PanelState::Error(e.user_message()));
                        }
                    }
                });
            })
        }
    };

    let is_busy = matches!(*state, PanelState::Working(_));

    html! {
        <div class="padding-20">
            <h2 class="share-title">{"Share data"}</h2>

            if let Some(change) = (*imported).clone() {
                <StatusMessage kind={StatusKind::Success} title={"Shared data imported"}>
                    {format!("{} dataset(s) updated from a '{}' link.", change.keys.len(), change.source_kind)}
                </StatusMessage>
            }

            <div class="flex-column-gap">
                {for SHARE_BUTTONS.iter().map(|(kind, label)| html! {
                    <Button onclick={on_share(*kind)} disabled={is_busy} variant={ButtonVariant::Secondary} block={true}>
                        {*label}
                    </Button>
                })}
            </div>

            {match &*state {
                PanelState::Working(msg) => html! {
                    <div class="loading-text-center">
                        <Spinner />
                        <p class="loading-text">{msg}</p>
                    </div>
                },
                PanelState::Copied(url) => html! {
                    <StatusMessage kind={StatusKind::Success} title={"Link copied to clipboard"}>
                        <LinkField url={url.clone()} />
                    </StatusMessage>
                },
                PanelState::Manual { url, message } => html! {
                    <StatusMessage kind={StatusKind::Warning} title={message.clone()}>
                        <LinkField url={url.clone()} />
                    </StatusMessage>
                },
                PanelState::Info(msg) => html! {
                    <StatusMessage kind={StatusKind::Info} title={msg.clone()} />
                },
                PanelState::Error(msg) => html! {
                    <StatusMessage kind={StatusKind::Error} title={msg.clone()} />
                },
                PanelState::Idle => html! {}
            }}
        </div>
    }
}
