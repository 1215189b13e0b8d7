use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Attachment, Channel, ChannelType, Message, Subscription, User};

// -- JWT Claims --

/// Claims carried by bearer credentials. `sub` is the user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub exp: usize,
}

// -- Channel requests --

#[derive(Debug, Clone)]
pub struct ChannelRequest {
    pub channel: String,
}

/// A channel request paired with the caller's credential.
#[derive(Debug, Clone)]
pub struct TokenizedChannelRequest {
    pub token: String,
    pub request: ChannelRequest,
}

impl TokenizedChannelRequest {
    pub fn new(token: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            request: ChannelRequest {
                channel: channel.into(),
            },
        }
    }

    pub fn channel(&self) -> &str {
        &self.request.channel
    }
}

// -- Message requests --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttachmentRequest {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl From<AttachmentRequest> for Attachment {
    fn from(req: AttachmentRequest) -> Self {
        Attachment::new(req.url, req.kind)
    }
}

/// HTTP body of a post; the channel comes from the path.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<AttachmentRequest>,
}

#[derive(Debug, Clone)]
pub struct CreateMessageRequest {
    pub channel: String,
    pub content: String,
    pub attachments: Vec<AttachmentRequest>,
}

impl CreateMessageRequest {
    pub fn to_message(&self, author_id: i64, channel_id: i64) -> Message {
        let attachments = self
            .attachments
            .iter()
            .cloned()
            .map(Attachment::from)
            .collect();
        Message::new(author_id, channel_id, self.content.clone(), attachments)
    }
}

#[derive(Debug, Clone)]
pub struct TokenizedPostRequest {
    pub token: String,
    pub request: CreateMessageRequest,
}

impl TokenizedPostRequest {
    pub fn new(token: impl Into<String>, channel: impl Into<String>, body: SendMessageRequest) -> Self {
        Self {
            token: token.into(),
            request: CreateMessageRequest {
                channel: channel.into(),
                content: body.content,
                attachments: body.attachments,
            },
        }
    }

    pub fn channel(&self) -> &str {
        &self.request.channel
    }
}

// -- Responses --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub full_name: String,
    pub bio: String,
    pub image: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            bio: user.bio.clone(),
            image: user.image.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub id: i64,
    pub channel_id: i64,
    pub user_id: i64,
    pub alert: bool,
    pub unread: i16,
    #[serde(rename = "type")]
    pub kind: ChannelType,
    pub created_at: DateTime<Utc>,
}

impl From<&Subscription> for SubscriptionResponse {
    fn from(sub: &Subscription) -> Self {
        Self {
            id: sub.id,
            channel_id: sub.channel_id,
            user_id: sub.user_id,
            alert: sub.alert,
            unread: sub.unread,
            kind: sub.kind,
            created_at: sub.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChannelResponse {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ChannelType,
    pub description: String,
    pub tags: Vec<String>,
    pub image: Option<String>,
    pub archived: bool,
    pub creator: Option<UserResponse>,
    pub members: Vec<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<&Channel> for ChannelResponse {
    fn from(channel: &Channel) -> Self {
        Self {
            id: channel.id,
            name: channel.name.clone(),
            kind: channel.kind,
            description: channel.description.clone(),
            tags: channel.tags.clone(),
            image: channel.image.clone(),
            archived: channel.archived,
            creator: channel.creator.as_ref().map(UserResponse::from),
            members: channel.subscriptions.iter().map(|s| s.user_id).collect(),
            created_at: channel.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AttachmentResponse {
    pub id: i64,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: i64,
    pub channel_id: i64,
    pub channel: Option<String>,
    pub author: Option<UserResponse>,
    pub content: String,
    pub attachments: Vec<AttachmentResponse>,
    pub created_at: DateTime<Utc>,
}

impl From<&Message> for MessageResponse {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            channel_id: message.channel_id,
            channel: message.channel.as_ref().map(|c| c.name.clone()),
            author: message.author.as_ref().map(UserResponse::from),
            content: message.content.clone(),
            attachments: message
                .attachments
                .iter()
                .map(|a| AttachmentResponse {
                    id: a.id,
                    url: a.url.clone(),
                    kind: a.kind.clone(),
                })
                .collect(),
            created_at: message.created_at,
        }
    }
}
