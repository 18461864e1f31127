/// The bot's own identity as reported by the platform at startup.
///
/// Resolved once during bootstrap and passed into every component that needs
/// it; no piece of the runtime mutates it afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BotIdentity {
    pub name: String,
    pub user_id: String,
}

impl BotIdentity {
    pub fn new(name: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self { name: name.into(), user_id: user_id.into() }
    }

    /// The substring a message must contain to count as mentioning the bot.
    /// Matches both raw `@U123` text and Slack's `<@U123>` mention encoding.
    pub fn mention(&self) -> String {
        format!("@{}", self.user_id)
    }
}
