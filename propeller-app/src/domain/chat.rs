use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CHAT_TITLE: &str = "New Chat";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A file previously returned by the upload endpoint and referenced from a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub filename: String,
    #[serde(rename = "originalname", default)]
    pub original_name: String,
    pub mimetype: String,
    #[serde(default)]
    pub size: u64,
    pub path: String,
    #[serde(default)]
    pub url: String,
}

impl Attachment {
    pub fn is_image(&self) -> bool {
        self.mimetype.starts_with("image/")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: String, attachments: Vec<Attachment>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: Role::User,
            content,
            attachments: Some(attachments),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: Role::Assistant,
            content,
            attachments: None,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub personality: Option<String>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    pub fn new(id: String, user_id: String, title: String, personality: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            title,
            personality,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    pub fn append(&mut self, messages: impl IntoIterator<Item = ChatMessage>) {
        self.messages.extend(messages);
        self.updated_at = Utc::now();
    }

    pub fn rename(&mut self, title: String) {
        self.title = title;
        self.updated_at = Utc::now();
    }
}
