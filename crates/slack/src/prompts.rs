use fetchbot_core::config::ContentConfig;
use serde::{Deserialize, Serialize};

use crate::intents::Topic;

/// Action identifiers are opaque strings scoped to a single prompt. The
/// resolver dispatches purely on these values, so every identifier it knows
/// about is defined here, next to the prompts that emit it.
pub const ACTION_YES_CODE: &str = "yes_code";
pub const ACTION_NO_CODE: &str = "noCode";
pub const ACTION_YES_DOG: &str = "yesDog";
pub const ACTION_NO_DOG: &str = "noDog";
pub const ACTION_SELECT: &str = "actionSelect";
pub const ACTION_CANCEL: &str = "actionCancel";

/// Menu option values carried back in the callback's selected option.
pub const OPTION_CODE: &str = "Code";
pub const OPTION_DOG: &str = "Dog";

pub const PROMPT_COLOR: &str = "#334fff";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuOption {
    pub label: String,
    pub value: String,
}

/// One interactive element of a prompt: a button (optionally carrying an
/// external link) or a select menu with its own controlling identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionControl {
    Button { action_id: String, label: String, url: Option<String> },
    Menu { action_id: String, label: String, options: Vec<MenuOption> },
}

impl ActionControl {
    pub fn button(action_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::Button { action_id: action_id.into(), label: label.into(), url: None }
    }

    pub fn link_button(
        action_id: impl Into<String>,
        label: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self::Button { action_id: action_id.into(), label: label.into(), url: Some(url.into()) }
    }

    pub fn menu(
        action_id: impl Into<String>,
        label: impl Into<String>,
        options: Vec<(&str, &str)>,
    ) -> Self {
        Self::Menu {
            action_id: action_id.into(),
            label: label.into(),
            options: options
                .into_iter()
                .map(|(label, value)| MenuOption { label: label.to_owned(), value: value.to_owned() })
                .collect(),
        }
    }

    pub fn action_id(&self) -> &str {
        match self {
            Self::Button { action_id, .. } | Self::Menu { action_id, .. } => action_id,
        }
    }
}

/// An outbound interactive message body plus its ordered controls. Immutable
/// once handed to the transport layer; a prompt that has been resolved is
/// re-issued with an empty control list rather than mutated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptDescriptor {
    pub text: String,
    pub color: String,
    pub callback_id: String,
    pub controls: Vec<ActionControl>,
}

impl PromptDescriptor {
    pub fn new(text: impl Into<String>, callback_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: PROMPT_COLOR.to_owned(),
            callback_id: callback_id.into(),
            controls: Vec::new(),
        }
    }

    pub fn control(mut self, control: ActionControl) -> Self {
        self.controls.push(control);
        self
    }

    /// Renders the descriptor into the attachment wire form the platform
    /// expects. Buttons carry their identifier in both `name` and `value`;
    /// menus carry it in `name` only, with the chosen value arriving later in
    /// the callback's selected option.
    pub fn to_attachment(&self) -> Attachment {
        let actions = self
            .controls
            .iter()
            .map(|control| match control {
                ActionControl::Button { action_id, label, url } => AttachmentAction {
                    name: action_id.clone(),
                    text: label.clone(),
                    kind: "button".to_owned(),
                    value: Some(action_id.clone()),
                    url: url.clone(),
                    options: Vec::new(),
                },
                ActionControl::Menu { action_id, label, options } => AttachmentAction {
                    name: action_id.clone(),
                    text: label.clone(),
                    kind: "select".to_owned(),
                    value: None,
                    url: None,
                    options: options
                        .iter()
                        .map(|option| SelectOption {
                            text: option.label.clone(),
                            value: option.value.clone(),
                        })
                        .collect(),
                },
            })
            .collect();

        Attachment {
            text: self.text.clone(),
            color: self.color.clone(),
            callback_id: self.callback_id.clone(),
            actions,
            fields: Vec::new(),
            image_url: None,
        }
    }
}

/// Builds the canned prompt for each topic from the configured content
/// sources. Constructed once at bootstrap and shared by the classifier side
/// and the resolver side, so re-issued prompts are structurally identical to
/// first-issued ones.
#[derive(Clone, Debug)]
pub struct PromptCatalog {
    repo_url: String,
    dog_image_url: String,
}

impl PromptCatalog {
    pub fn new(content: &ContentConfig) -> Self {
        Self { repo_url: content.repo_url.clone(), dog_image_url: content.dog_image_url.clone() }
    }

    pub fn prompt_for(&self, topic: Topic, requester_id: &str) -> PromptDescriptor {
        match topic {
            Topic::CodeRequest => self.code_prompt(requester_id),
            Topic::DogRequest => self.dog_prompt(requester_id),
            Topic::GeneralMenu => self.menu_prompt(requester_id),
        }
    }

    pub fn repo_link_text(&self) -> String {
        format!("The source code is at {}!", self.repo_url)
    }

    /// The attachment that overwrites a prompt once the user asks to see the
    /// dog: image only, no remaining controls.
    pub fn dog_image_attachment(&self) -> Attachment {
        Attachment {
            text: String::new(),
            color: PROMPT_COLOR.to_owned(),
            callback_id: String::new(),
            actions: Vec::new(),
            fields: vec![AttachmentField { title: "A dog".to_owned() }],
            image_url: Some(self.dog_image_url.clone()),
        }
    }

    fn code_prompt(&self, requester_id: &str) -> PromptDescriptor {
        PromptDescriptor::new(
            "Would you like to see the source code for this bot?",
            callback_id_for(requester_id),
        )
        .control(ActionControl::link_button(
            ACTION_YES_CODE,
            "Yes, show me the code!",
            self.repo_url.clone(),
        ))
        .control(ActionControl::button(ACTION_NO_CODE, "No thanks."))
    }

    fn dog_prompt(&self, requester_id: &str) -> PromptDescriptor {
        PromptDescriptor::new("Would you like to see a dog?", callback_id_for(requester_id))
            .control(ActionControl::button(ACTION_YES_DOG, "Yes, show me a dog!"))
            .control(ActionControl::button(ACTION_NO_DOG, "Not right now."))
    }

    fn menu_prompt(&self, requester_id: &str) -> PromptDescriptor {
        PromptDescriptor::new("What would you like to see?", callback_id_for(requester_id))
            .control(ActionControl::menu(
                ACTION_SELECT,
                "Pick a topic",
                vec![("Code", OPTION_CODE), ("Dog", OPTION_DOG)],
            ))
            .control(ActionControl::button(ACTION_CANCEL, "Cancel"))
    }
}

fn callback_id_for(requester_id: &str) -> String {
    format!("ask_{requester_id}")
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub color: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub callback_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<AttachmentAction>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<AttachmentField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentAction {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub text: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentField {
    #[serde(default)]
    pub title: String,
}

/// A message as posted (or re-posted, when a prompt is overwritten in place).
/// Unknown platform fields on the inbound side are ignored on decode.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

#[cfg(test)]
mod tests {
    use fetchbot_core::config::ContentConfig;

    use super::{
        ActionControl, PromptCatalog, Topic, ACTION_CANCEL, ACTION_NO_CODE, ACTION_SELECT,
        ACTION_YES_CODE, ACTION_YES_DOG,
    };

    fn catalog() -> PromptCatalog {
        PromptCatalog::new(&ContentConfig {
            repo_url: "https://example.com/fetchbot".to_owned(),
            dog_image_url: "https://example.com/dog.jpg".to_owned(),
        })
    }

    #[test]
    fn code_prompt_has_link_button_and_decline_button() {
        let prompt = catalog().prompt_for(Topic::CodeRequest, "U123");

        assert_eq!(prompt.callback_id, "ask_U123");
        assert_eq!(prompt.controls.len(), 2);
        assert!(matches!(
            &prompt.controls[0],
            ActionControl::Button { action_id, url: Some(url), .. }
                if action_id == ACTION_YES_CODE && url == "https://example.com/fetchbot"
        ));
        assert!(matches!(
            &prompt.controls[1],
            ActionControl::Button { action_id, url: None, .. } if action_id == ACTION_NO_CODE
        ));
    }

    #[test]
    fn menu_prompt_offers_select_and_cancel() {
        let prompt = catalog().prompt_for(Topic::GeneralMenu, "U123");

        assert_eq!(prompt.controls.len(), 2);
        let ActionControl::Menu { action_id, options, .. } = &prompt.controls[0] else {
            panic!("expected menu control first");
        };
        assert_eq!(action_id, ACTION_SELECT);
        assert_eq!(
            options.iter().map(|option| option.value.as_str()).collect::<Vec<_>>(),
            vec!["Code", "Dog"]
        );
        assert_eq!(prompt.controls[1].action_id(), ACTION_CANCEL);
    }

    #[test]
    fn attachment_wire_form_uses_legacy_action_fields() {
        let attachment = catalog().prompt_for(Topic::DogRequest, "U9").to_attachment();
        let json = serde_json::to_value(&attachment).expect("attachment serializes");

        assert_eq!(json["callback_id"], "ask_U9");
        assert_eq!(json["actions"][0]["type"], "button");
        assert_eq!(json["actions"][0]["name"], ACTION_YES_DOG);
        assert_eq!(json["actions"][0]["value"], ACTION_YES_DOG);
        assert!(json["actions"][0].get("url").is_none(), "plain buttons carry no url field");
    }

    #[test]
    fn menu_attachment_carries_options_but_no_value() {
        let attachment = catalog().prompt_for(Topic::GeneralMenu, "U9").to_attachment();
        let json = serde_json::to_value(&attachment).expect("attachment serializes");

        assert_eq!(json["actions"][0]["type"], "select");
        assert!(json["actions"][0].get("value").is_none());
        assert_eq!(json["actions"][0]["options"][1]["value"], "Dog");
    }

    #[test]
    fn dog_image_attachment_has_no_remaining_controls() {
        let attachment = catalog().dog_image_attachment();

        assert!(attachment.actions.is_empty());
        assert_eq!(attachment.image_url.as_deref(), Some("https://example.com/dog.jpg"));
        assert_eq!(attachment.fields[0].title, "A dog");
    }
}
