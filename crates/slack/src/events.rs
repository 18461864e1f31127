use fetchbot_core::identity::BotIdentity;

use crate::interaction::CallbackEvent;

/// An inbound free-text message from the platform's real-time stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageEvent {
    pub user_id: String,
    pub channel_id: String,
    pub text: String,
}

impl MessageEvent {
    /// Direct-message channels are distinguished by their `D` id prefix.
    pub fn is_direct(&self) -> bool {
        self.channel_id.starts_with('D')
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportErrorEvent {
    pub detail: String,
}

/// Every inbound event kind, as a closed sum so dispatch is exhaustive at
/// compile time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BotEvent {
    Message(MessageEvent),
    Callback(CallbackEvent),
    TransportError(TransportErrorEvent),
}

/// A message reaches the classifier only when it is a direct message or
/// explicitly mentions the bot; anything else in a shared channel is not for
/// us. Events without a sender (bot echoes, system notices) never engage.
pub fn should_engage(event: &MessageEvent, identity: &BotIdentity) -> bool {
    if event.user_id.is_empty() {
        return false;
    }

    event.is_direct() || event.text.contains(&identity.mention())
}
