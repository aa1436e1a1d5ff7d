use serde::Serialize;

/// Who said what. Serialized lowercase on the wire and in the history file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Case-insensitive parse back to the canonical role.
    pub fn parse(token: &str) -> Option<Role> {
        let token = token.trim();
        if token.eq_ignore_ascii_case("system") {
            Some(Role::System)
        } else if token.eq_ignore_ascii_case("user") {
            Some(Role::User)
        } else if token.eq_ignore_ascii_case("assistant") {
            Some(Role::Assistant)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The ordered message sequence sent to the completion client. Append-only:
/// the single system message always sits at index 0 and is never touched
/// again for the lifetime of the session.
#[derive(Debug)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(system: impl Into<String>) -> Self {
        Conversation {
            messages: vec![Message::system(system)],
        }
    }

    /// System message first, then whatever a previous session left behind.
    pub fn with_prior(system: impl Into<String>, prior: Vec<Message>) -> Self {
        let mut conversation = Conversation::new(system);
        conversation.messages.extend(prior);
        conversation
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The most recent (user, assistant) pair: the content of the final
    /// assistant turn together with the user turn nearest before it.
    pub fn last_turn(&self) -> Option<(&str, &str)> {
        let assistant = self.messages.last().filter(|m| m.role == Role::Assistant)?;
        let user = self
            .messages
            .iter()
            .rev()
            .skip(1)
            .find(|m| m.role == Role::User)?;
        Some((user.content.as_str(), assistant.content.as_str()))
    }
}
