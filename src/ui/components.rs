/// Reusable UI pieces for the share panel

use patternfly_yew::prelude::*;
use web_sys::HtmlInputElement;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct LinkFieldProps {
    pub url: String,
}

/// Read-only link box, shown when the clipboard can't be used
///
/// Focusing the field selects the whole link so it can be copied by hand.
#[function_component(LinkField)]
pub fn link_field(props: &LinkFieldProps) -> Html {
    let on_focus = Callback::from(|e: FocusEvent| {
        if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
            input.select();
        }
    });

    html! {
        <input
            class="pf-v5-c-form-control share-link-field"
            type="text"
            readonly=true
            value={props.url.clone()}
            onfocus={on_focus}
        />
    }
}

#[derive(Clone, PartialEq)]
pub enum StatusKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Properties, PartialEq)]
pub struct StatusMessageProps {
    pub kind: StatusKind,
    pub title: String,
    #[prop_or_default]
    pub children: Children,
}

#[function_component(StatusMessage)]
pub fn status_message(props: &StatusMessageProps) -> Html {
    let alert_type = match props.kind {
        StatusKind::Info => AlertType::Info,
        StatusKind::Success => AlertType::Success,
        StatusKind::Warning => AlertType::Warning,
        StatusKind::Error => AlertType::Danger,
    };

    html! {
        <div class="message-top-margin">
            <Alert r#type={alert_type} title={props.title.clone()} inline={true}>
                {props.children.clone()}
            </Alert>
        </div>
    }
}
