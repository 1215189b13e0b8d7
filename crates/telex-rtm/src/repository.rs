use std::sync::Arc;

use telex_db::{ChannelStore, Database, DbError, MessageFilter, MessageStore, SubscriptionStore};
use telex_types::api::{TokenizedChannelRequest, TokenizedPostRequest};
use telex_types::models::{Channel, Message, Subscription, User};
use tracing::{error, info, warn};

use crate::error::{Result, RtmError};
use crate::identity::IdentityResolver;

/// Caller-facing channel operations. Every mutating call resolves the
/// credential first, so an unauthenticated request never touches storage.
#[derive(Clone)]
pub struct ChannelRepository {
    identity: Arc<dyn IdentityResolver>,
    channels: ChannelStore,
    subscriptions: SubscriptionStore,
    messages: MessageStore,
}

impl ChannelRepository {
    pub fn new(db: Arc<Database>, identity: Arc<dyn IdentityResolver>) -> Self {
        Self {
            identity,
            channels: ChannelStore::new(db.clone()),
            subscriptions: SubscriptionStore::new(db.clone()),
            messages: MessageStore::new(db),
        }
    }

    /// Unauthenticated read. `Ok(None)` means no channel has that name.
    pub fn fetch_channel(&self, name: &str) -> Result<Option<Channel>> {
        Ok(self.channels.fetch(name)?)
    }

    /// Posts a message on behalf of the credential's owner, who must be
    /// subscribed to the target channel.
    pub fn post_message(&self, request: &TokenizedPostRequest) -> Result<Message> {
        let user = self.authenticate(&request.token)?;
        let channel = self.require_channel(request.channel())?;

        if !channel.has_user(user.id) {
            warn!("User {} tried to post to {} without a subscription", user.id, channel.name);
            return Err(RtmError::NotSubscribed {
                user_id: user.id,
                channel: channel.name,
            });
        }

        let message = request.request.to_message(user.id, channel.id);
        let message = self.messages.create(message).map_err(|e| {
            error!("Failed to write message from user {} to {}: {}", user.id, channel.name, e);
            RtmError::PersistenceFailure(e)
        })?;

        info!("User {} posted message {} to {}", user.id, message.id, channel.name);
        Ok(message)
    }

    /// Subscribes the caller to the channel. Joining twice is a conflict;
    /// the storage layer's uniqueness constraint decides concurrent races.
    pub fn join_channel(&self, request: &TokenizedChannelRequest) -> Result<Subscription> {
        let user = self.authenticate(&request.token)?;
        let channel = self.require_channel(request.channel())?;

        let subscription = channel.create_subscription(user.id);
        match self.subscriptions.create(&channel, subscription) {
            Ok(created) => {
                info!("User {} joined {}", user.id, channel.name);
                Ok(created)
            }
            Err(DbError::Conflict(_)) => Err(RtmError::AlreadySubscribed {
                user_id: user.id,
                channel: channel.name,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes the caller's subscription. `Ok(None)` when there was nothing
    /// to remove.
    pub fn leave_channel(&self, request: &TokenizedChannelRequest) -> Result<Option<Subscription>> {
        let user = self.authenticate(&request.token)?;
        let channel = self.require_channel(request.channel())?;

        let removed = self.subscriptions.delete(user.id, channel.id)?;
        if removed.is_some() {
            info!("User {} left {}", user.id, channel.name);
        }
        Ok(removed)
    }

    /// Messages of a channel in posting order, with authors and attachments.
    pub fn channel_messages(&self, name: &str) -> Result<Vec<Message>> {
        let channel = self.require_channel(name)?;
        Ok(self.messages.get_all(&MessageFilter::channel(channel.id))?)
    }

    fn authenticate(&self, token: &str) -> Result<User> {
        self.identity.resolve(token).map_err(|e| {
            warn!("Credential rejected: {}", e);
            RtmError::from(e)
        })
    }

    fn require_channel(&self, name: &str) -> Result<Channel> {
        self.channels
            .fetch(name)?
            .ok_or_else(|| RtmError::ChannelNotFound(name.to_string()))
    }
}
