use thiserror::Error;

use crate::{
    intents::Topic,
    interaction::CallbackEvent,
    prompts::{
        Attachment, OutboundMessage, PromptCatalog, ACTION_CANCEL, ACTION_NO_CODE, ACTION_NO_DOG,
        ACTION_SELECT, ACTION_YES_CODE, ACTION_YES_DOG, OPTION_CODE, OPTION_DOG,
    },
};

const NO_CODE_REPLY: &str = "No worries. The code will be here if you change your mind.";
const NO_DOG_REPLY: &str = "OK, but you're missing out on a very good dog.";
const FAREWELL_REPLY: &str = "All right, catch you later!";

/// The single result of resolving a callback: a plain text acknowledgment, or
/// a replacement message that overwrites the original prompt in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplyOutcome {
    Text(String),
    Replace(OutboundMessage),
}

/// Malformed-event errors and resolution errors are distinct variants so the
/// HTTP layer can map them to different wire statuses.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("callback event carried no action identifier")]
    MalformedEvent,
    #[error("could not process callback: {0}")]
    UnknownAction(String),
    #[error("unknown menu selection: {0}")]
    UnknownOption(String),
    #[error("menu action `actionSelect` requires a selected option")]
    MissingOption,
}

impl ResolveError {
    /// True for the malformed-event class; false for resolution errors.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedEvent)
    }
}

/// Resolves a decoded callback back to its reply branch. Resolution is a pure
/// function over the event's own fields: no lookup against the prompt that
/// was originally sent, which may have been issued by another process
/// instance entirely.
pub struct CallbackResolver {
    catalog: PromptCatalog,
}

impl CallbackResolver {
    pub fn new(catalog: PromptCatalog) -> Self {
        Self { catalog }
    }

    pub fn resolve(&self, event: &CallbackEvent) -> Result<ReplyOutcome, ResolveError> {
        let action = event.effective_action().ok_or(ResolveError::MalformedEvent)?;

        match action {
            ACTION_YES_CODE => Ok(ReplyOutcome::Text(self.catalog.repo_link_text())),
            ACTION_NO_CODE => Ok(ReplyOutcome::Text(NO_CODE_REPLY.to_owned())),
            ACTION_YES_DOG => {
                Ok(ReplyOutcome::Replace(replace_attachments(
                    event,
                    self.catalog.dog_image_attachment(),
                )))
            }
            ACTION_NO_DOG => Ok(ReplyOutcome::Text(NO_DOG_REPLY.to_owned())),
            ACTION_SELECT => self.resolve_menu_selection(event),
            ACTION_CANCEL => Ok(ReplyOutcome::Text(FAREWELL_REPLY.to_owned())),
            other => Err(ResolveError::UnknownAction(other.to_owned())),
        }
    }

    /// One level of menu-then-sub-action indirection: the chosen option
    /// re-issues the matching topic prompt in place of the menu.
    fn resolve_menu_selection(&self, event: &CallbackEvent) -> Result<ReplyOutcome, ResolveError> {
        let selected = event.selected_option.as_deref().ok_or(ResolveError::MissingOption)?;
        let topic = match selected {
            OPTION_CODE => Topic::CodeRequest,
            OPTION_DOG => Topic::DogRequest,
            other => return Err(ResolveError::UnknownOption(other.to_owned())),
        };

        let prompt = self.catalog.prompt_for(topic, &event.requester_id);
        Ok(ReplyOutcome::Replace(replace_attachments(event, prompt.to_attachment())))
    }
}

fn replace_attachments(event: &CallbackEvent, attachment: Attachment) -> OutboundMessage {
    let mut message = event.original_message.clone();
    message.attachments = vec![attachment];
    message
}
