use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use fetchbot_core::{config::ListenerConfig, identity::BotIdentity};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    delivery::{DeliveryMode, PromptDelivery},
    events::{should_engage, BotEvent, MessageEvent},
    intents::IntentClassifier,
    prompts::PromptCatalog,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport failed to connect: {0}")]
    Connect(String),
    #[error("transport read failed: {0}")]
    Receive(String),
    #[error("transport disconnect failed: {0}")]
    Disconnect(String),
}

/// Inbound seam for the real-time message stream.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn connect(&self) -> Result<(), TransportError>;
    async fn next_event(&self) -> Result<Option<BotEvent>, TransportError>;
    async fn disconnect(&self) -> Result<(), TransportError>;
}

#[derive(Default)]
pub struct NoopMessageTransport;

#[async_trait]
impl MessageTransport for NoopMessageTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn next_event(&self) -> Result<Option<BotEvent>, TransportError> {
        Ok(None)
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_retries: 5, base_delay_ms: 250, max_delay_ms: 5_000 }
    }
}

impl From<&ListenerConfig> for ReconnectPolicy {
    fn from(config: &ListenerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
        }
    }
}

impl ReconnectPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// Single logical worker for the message stream: pulls events in arrival
/// order, classifies the ones addressed to the bot, and hands the resulting
/// prompt to the delivery seam. Holds no state across events; each message is
/// classified and forgotten.
pub struct MessageListener {
    transport: Arc<dyn MessageTransport>,
    delivery: Arc<dyn PromptDelivery>,
    classifier: IntentClassifier,
    catalog: PromptCatalog,
    identity: BotIdentity,
    reconnect_policy: ReconnectPolicy,
}

impl MessageListener {
    pub fn new(
        transport: Arc<dyn MessageTransport>,
        delivery: Arc<dyn PromptDelivery>,
        classifier: IntentClassifier,
        catalog: PromptCatalog,
        identity: BotIdentity,
        reconnect_policy: ReconnectPolicy,
    ) -> Self {
        Self { transport, delivery, classifier, catalog, identity, reconnect_policy }
    }

    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> Result<()> {
        for attempt in 0..=self.reconnect_policy.max_retries {
            if *shutdown.borrow() {
                return Ok(());
            }

            match self.connect_and_pump(attempt, shutdown.clone()).await {
                Ok(()) => return Ok(()),
                Err(transport_error) => {
                    warn!(
                        attempt,
                        max_retries = self.reconnect_policy.max_retries,
                        error = %transport_error,
                        "message stream transport failed"
                    );

                    if attempt >= self.reconnect_policy.max_retries {
                        warn!(
                            max_retries = self.reconnect_policy.max_retries,
                            "message stream retries exhausted; continuing process without crash"
                        );
                        return Ok(());
                    }

                    let delay = self.reconnect_policy.backoff(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Ok(())
    }

    async fn connect_and_pump(
        &self,
        attempt: u32,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), TransportError> {
        info!(attempt, "opening message stream connection");
        self.transport.connect().await?;
        info!(attempt, "message stream connected");

        loop {
            let next = tokio::select! {
                _ = shutdown.changed() => {
                    info!("shutdown requested; closing message stream");
                    self.transport.disconnect().await?;
                    return Ok(());
                }
                next = self.transport.next_event() => next?,
            };

            let Some(event) = next else {
                info!(attempt, "message stream closed");
                self.transport.disconnect().await?;
                return Ok(());
            };

            self.handle_event(event).await;
        }
    }

    async fn handle_event(&self, event: BotEvent) {
        let correlation_id = Uuid::new_v4().to_string();

        match event {
            BotEvent::Message(message) => self.handle_message(message, &correlation_id).await,
            BotEvent::Callback(callback) => {
                warn!(
                    event_name = "ingress.stream.unexpected_callback",
                    %correlation_id,
                    action = callback.effective_action().unwrap_or("unknown"),
                    "callback arrived on the message stream; callbacks are resolved on the HTTP endpoint"
                );
            }
            BotEvent::TransportError(error) => {
                warn!(
                    event_name = "ingress.stream.transport_error",
                    %correlation_id,
                    detail = %error.detail,
                    "transport reported an error event"
                );
            }
        }
    }

    async fn handle_message(&self, message: MessageEvent, correlation_id: &str) {
        if !should_engage(&message, &self.identity) {
            debug!(
                event_name = "ingress.message.ignored",
                %correlation_id,
                channel_id = %message.channel_id,
                "message not addressed to the bot"
            );
            return;
        }

        let topic = self.classifier.classify(&message.text);
        let prompt = self.catalog.prompt_for(topic, &message.user_id);
        let mode = DeliveryMode::for_topic(topic);

        info!(
            event_name = "ingress.message.classified",
            %correlation_id,
            user_id = %message.user_id,
            channel_id = %message.channel_id,
            topic = ?topic,
            "classified inbound message"
        );

        if let Err(error) =
            self.delivery.deliver(&message.user_id, &message.channel_id, &prompt, mode).await
        {
            warn!(
                event_name = "egress.prompt.delivery_failed",
                %correlation_id,
                user_id = %message.user_id,
                error = %error,
                "prompt delivery failed; dropping event"
            );
        }
    }
}
