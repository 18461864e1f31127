use serde::Deserialize;
use thiserror::Error;

use crate::prompts::OutboundMessage;

/// The decoded wire payload of an interaction callback, as Slack posts it to
/// the registered callback URL. Only the fields the resolver needs are
/// modeled; everything else in the payload is ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct InteractionCallback {
    #[serde(default)]
    pub callback_id: String,
    #[serde(default)]
    pub actions: Vec<WireAction>,
    #[serde(default)]
    pub user: WireParty,
    #[serde(default)]
    pub channel: WireParty,
    #[serde(default)]
    pub original_message: OutboundMessage,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct WireAction {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub selected_options: Vec<WireSelectedOption>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct WireSelectedOption {
    #[serde(default)]
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct WireParty {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Everything the resolver needs, self-contained: the round trip holds no
/// server-side state, so the event must carry its own identifiers, its own
/// addressing, and the original message it may need to overwrite.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackEvent {
    pub action_name: String,
    pub action_value: Option<String>,
    pub selected_option: Option<String>,
    pub requester_id: String,
    pub channel_id: String,
    pub original_message: OutboundMessage,
}

impl CallbackEvent {
    /// The identifier to dispatch on: the control's value when present,
    /// otherwise its name. Controls created with only a name (menus, and any
    /// button that omits an explicit value) must still resolve.
    pub fn effective_action(&self) -> Option<&str> {
        if let Some(value) = self.action_value.as_deref().filter(|value| !value.is_empty()) {
            return Some(value);
        }
        (!self.action_name.is_empty()).then_some(self.action_name.as_str())
    }
}

#[derive(Debug, Error)]
pub enum CallbackDecodeError {
    #[error("could not process payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("callback payload carried no actions")]
    NoActions,
}

pub fn decode_interaction(payload: &str) -> Result<CallbackEvent, CallbackDecodeError> {
    let wire: InteractionCallback = serde_json::from_str(payload)?;
    let action = wire.actions.into_iter().next().ok_or(CallbackDecodeError::NoActions)?;
    let selected_option = action
        .selected_options
        .into_iter()
        .next()
        .map(|option| option.value)
        .filter(|value| !value.is_empty());

    Ok(CallbackEvent {
        action_name: action.name,
        action_value: action.value,
        selected_option,
        requester_id: wire.user.id,
        channel_id: wire.channel.id,
        original_message: wire.original_message,
    })
}
