use std::sync::Arc;

use fetchbot_core::{
    config::{AppConfig, ConfigError, LoadOptions},
    identity::BotIdentity,
};
use fetchbot_slack::{
    api::{ApiError, SlackApiClient},
    delivery::SlackApiDelivery,
    intents::IntentClassifier,
    listener::{MessageListener, NoopMessageTransport, ReconnectPolicy},
    prompts::PromptCatalog,
    resolver::CallbackResolver,
};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub identity: BotIdentity,
    pub resolver: Arc<CallbackResolver>,
    pub listener: MessageListener,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("slack auth preflight failed: {0}")]
    Auth(#[source] ApiError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

/// Credential problems surface here, at process start, and nowhere else: the
/// auth preflight resolves the bot's identity once, and the rest of the
/// runtime receives it as an immutable value.
pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let client = SlackApiClient::new(&config.slack, config.server.request_timeout_secs)
        .map_err(BootstrapError::Auth)?;
    let identity = client.auth_test().await.map_err(BootstrapError::Auth)?;

    info!(
        event_name = "system.bootstrap.authenticated",
        bot_user = %identity.name,
        bot_user_id = %identity.user_id,
        "bot is registered"
    );

    let catalog = PromptCatalog::new(&config.content);
    let resolver = Arc::new(CallbackResolver::new(catalog.clone()));
    let delivery = Arc::new(SlackApiDelivery::new(client));
    let listener = MessageListener::new(
        Arc::new(NoopMessageTransport),
        delivery,
        IntentClassifier::default(),
        catalog,
        identity.clone(),
        ReconnectPolicy::from(&config.listener),
    );

    Ok(Application { config, identity, resolver, listener })
}

#[cfg(test)]
mod tests {
    use fetchbot_core::config::{ConfigOverrides, LoadOptions};

    use crate::bootstrap::{bootstrap, BootstrapError};

    #[tokio::test]
    async fn bootstrap_fails_fast_without_a_bot_token() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                bot_token: Some(String::new()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        let error = result.err().expect("bootstrap must fail without a token");
        assert!(matches!(error, BootstrapError::Config(_)));
        assert!(error.to_string().contains("slack.bot_token"));
    }

    #[tokio::test]
    async fn bootstrap_fails_when_auth_preflight_cannot_reach_the_api() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                bot_token: Some("xoxb-test".to_string()),
                api_base_url: Some("http://127.0.0.1:9".to_string()),
                request_timeout_secs: Some(1),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        let error = result.err().expect("bootstrap must fail when auth.test is unreachable");
        assert!(matches!(error, BootstrapError::Auth(_)));
    }
}
