use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Owned by the identity subsystem; read-only inside the messaging core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub full_name: String,
    pub bio: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Dialog,
    Group,
    General,
}

impl ChannelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dialog => "dialog",
            Self::Group => "group",
            Self::General => "general",
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown channel type: {0}")]
pub struct UnknownChannelType(pub String);

impl FromStr for ChannelType {
    type Err = UnknownChannelType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dialog" => Ok(Self::Dialog),
            "group" => Ok(Self::Group),
            "general" => Ok(Self::General),
            other => Err(UnknownChannelType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: i64,
    pub name: String,
    pub tags: Vec<String>,
    pub creator_id: Option<i64>,
    pub creator: Option<User>,
    pub image: Option<String>,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ChannelType,
    pub archived: bool,
    /// Ordered by subscription id. Empty unless the channel was loaded
    /// through the channel store.
    pub subscriptions: Vec<Subscription>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Channel {
    /// Membership is exactly the set of subscriptions referencing the channel.
    pub fn has_user(&self, user_id: i64) -> bool {
        self.subscriptions.iter().any(|s| s.user_id == user_id)
    }

    /// Builds an unsaved subscription with default preferences. The store
    /// assigns `id` and `created_at` on insert.
    pub fn create_subscription(&self, user_id: i64) -> Subscription {
        Subscription {
            id: 0,
            alert: true,
            unread: 0,
            channel_id: self.id,
            user_id,
            kind: self.kind,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub alert: bool,
    pub unread: i16,
    pub channel_id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: ChannelType,
    pub created_at: DateTime<Utc>,
}

/// A posted message. `author` and `channel` are populated when the message is
/// read back through the message store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub author_id: i64,
    pub author: Option<User>,
    pub channel_id: i64,
    pub channel: Option<Channel>,
    pub content: String,
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    pub fn new(author_id: i64, channel_id: i64, content: String, attachments: Vec<Attachment>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            author_id,
            author: None,
            channel_id,
            channel: None,
            content,
            attachments,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: i64,
    pub message_id: i64,
    pub url: String,
    /// MIME type of the payload, e.g. `image/png`.
    pub kind: String,
}

impl Attachment {
    pub fn new(url: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: 0,
            message_id: 0,
            url: url.into(),
            kind: kind.into(),
        }
    }
}
