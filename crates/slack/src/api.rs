use std::time::Duration;

use fetchbot_core::{config::SlackConfig, identity::BotIdentity};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::prompts::Attachment;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("slack api transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("slack api call `{method}` failed: {error}")]
    Rejected { method: &'static str, error: String },
}

/// Thin Slack Web API client covering the three calls the bot makes:
/// `auth.test` at startup, `chat.postEphemeral` for private prompts, and
/// `chat.postMessage` for channel posts.
pub struct SlackApiClient {
    http: reqwest::Client,
    base_url: String,
    bot_token: SecretString,
}

impl SlackApiClient {
    pub fn new(slack: &SlackConfig, request_timeout_secs: u64) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: slack.api_base_url.trim_end_matches('/').to_owned(),
            bot_token: slack.bot_token.clone(),
        })
    }

    /// Resolves the bot's own identity. Called once at bootstrap; a rejection
    /// here means the credential is unusable and startup must abort.
    pub async fn auth_test(&self) -> Result<BotIdentity, ApiError> {
        let response: AuthTestResponse = self.call("auth.test", &EmptyRequest {}).await?;
        if !response.ok {
            return Err(ApiError::Rejected {
                method: "auth.test",
                error: response.error.unwrap_or_else(|| "unknown error".to_owned()),
            });
        }

        Ok(BotIdentity::new(response.user, response.user_id))
    }

    pub async fn post_ephemeral(
        &self,
        channel_id: &str,
        user_id: &str,
        text: &str,
        attachments: &[Attachment],
    ) -> Result<(), ApiError> {
        let request = PostEphemeralRequest { channel: channel_id, user: user_id, text, attachments };
        let response: PostAck = self.call("chat.postEphemeral", &request).await?;
        ack_to_result("chat.postEphemeral", response)
    }

    pub async fn post_message(
        &self,
        channel_id: &str,
        text: &str,
        attachments: &[Attachment],
    ) -> Result<(), ApiError> {
        let request = PostMessageRequest { channel: channel_id, text, attachments };
        let response: PostAck = self.call("chat.postMessage", &request).await?;
        ack_to_result("chat.postMessage", response)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        let url = format!("{}/{method}", self.base_url);
        debug!(method, "calling slack api");

        let response = self
            .http
            .post(url)
            .bearer_auth(self.bot_token.expose_secret())
            .json(body)
            .send()
            .await?;

        Ok(response.json().await?)
    }
}

fn ack_to_result(method: &'static str, ack: PostAck) -> Result<(), ApiError> {
    if ack.ok {
        Ok(())
    } else {
        Err(ApiError::Rejected {
            method,
            error: ack.error.unwrap_or_else(|| "unknown error".to_owned()),
        })
    }
}

#[derive(Debug, Serialize)]
struct EmptyRequest {}

#[derive(Debug, Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
    attachments: &'a [Attachment],
}

#[derive(Debug, Serialize)]
struct PostEphemeralRequest<'a> {
    channel: &'a str,
    user: &'a str,
    text: &'a str,
    attachments: &'a [Attachment],
}

#[derive(Debug, Deserialize)]
struct AuthTestResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    user: String,
    #[serde(default)]
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct PostAck {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}
