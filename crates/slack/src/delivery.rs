use async_trait::async_trait;
use thiserror::Error;

use crate::{
    api::{ApiError, SlackApiClient},
    intents::Topic,
    prompts::PromptDescriptor,
};

/// How a prompt reaches its audience: visible only to the requester, or
/// posted into the channel for everyone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryMode {
    Ephemeral,
    ChannelPost,
}

impl DeliveryMode {
    /// Dog prompts land in the channel so the image that replaces them is
    /// visible to everyone; every other prompt stays private to the
    /// requester.
    pub fn for_topic(topic: Topic) -> Self {
        match topic {
            Topic::DogRequest => Self::ChannelPost,
            Topic::CodeRequest | Topic::GeneralMenu => Self::Ephemeral,
        }
    }
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Outbound seam for handing a finished prompt to the platform. The core
/// never awaits a response through this trait; the prompt is forgotten once
/// delivered.
#[async_trait]
pub trait PromptDelivery: Send + Sync {
    async fn deliver(
        &self,
        recipient_id: &str,
        channel_id: &str,
        prompt: &PromptDescriptor,
        mode: DeliveryMode,
    ) -> Result<(), DeliveryError>;
}

pub struct SlackApiDelivery {
    client: SlackApiClient,
}

impl SlackApiDelivery {
    pub fn new(client: SlackApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PromptDelivery for SlackApiDelivery {
    async fn deliver(
        &self,
        recipient_id: &str,
        channel_id: &str,
        prompt: &PromptDescriptor,
        mode: DeliveryMode,
    ) -> Result<(), DeliveryError> {
        let attachments = [prompt.to_attachment()];
        match mode {
            DeliveryMode::Ephemeral => {
                self.client.post_ephemeral(channel_id, recipient_id, "", &attachments).await?;
            }
            DeliveryMode::ChannelPost => {
                self.client.post_message(channel_id, "", &attachments).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::DeliveryMode;
    use crate::intents::Topic;

    #[test]
    fn only_dog_prompts_are_posted_publicly() {
        assert_eq!(DeliveryMode::for_topic(Topic::DogRequest), DeliveryMode::ChannelPost);
        assert_eq!(DeliveryMode::for_topic(Topic::CodeRequest), DeliveryMode::Ephemeral);
        assert_eq!(DeliveryMode::for_topic(Topic::GeneralMenu), DeliveryMode::Ephemeral);
    }
}
