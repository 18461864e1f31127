/// The finite set of conversation topics the bot can respond to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    CodeRequest,
    DogRequest,
    GeneralMenu,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TriggerRule {
    pub keyword: String,
    pub topic: Topic,
}

impl TriggerRule {
    pub fn new(keyword: impl Into<String>, topic: Topic) -> Self {
        Self { keyword: keyword.into(), topic }
    }
}

/// Trigger table evaluated top to bottom; the first keyword contained in the
/// message wins, regardless of where it appears in the text. The order is a
/// policy decision: `code` outranks `dog` when both are present. Matching is
/// case-sensitive substring containment.
pub fn default_triggers() -> Vec<TriggerRule> {
    vec![
        TriggerRule::new("code", Topic::CodeRequest),
        TriggerRule::new("dog", Topic::DogRequest),
    ]
}

pub struct IntentClassifier {
    triggers: Vec<TriggerRule>,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new(default_triggers())
    }
}

impl IntentClassifier {
    pub fn new(triggers: Vec<TriggerRule>) -> Self {
        Self { triggers }
    }

    /// Messages that match no trigger fall through to the general menu, so
    /// every engaged message produces exactly one topic.
    pub fn classify(&self, text: &str) -> Topic {
        self.triggers
            .iter()
            .find(|rule| text.contains(rule.keyword.as_str()))
            .map(|rule| rule.topic)
            .unwrap_or(Topic::GeneralMenu)
    }
}
