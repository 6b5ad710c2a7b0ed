//! Realtime notification fan-out.
//!
//! Delivery is at-most-once and never acknowledged. The channel
//! implementation stands in for a pub/sub transport.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::BroadcastError;
use crate::game::events::Notification;
use crate::game::state::PlayerId;

/// Pushes notifications to room topics and single users.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Publish to every subscriber of `topic`.
    async fn publish(&self, topic: &str, notification: Notification) -> Result<(), BroadcastError>;

    /// Publish to one user's private queue.
    async fn publish_to_user(&self, user: &PlayerId, notification: Notification) -> Result<(), BroadcastError>;
}

/// Where a delivery is addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Topic, e.g. `rooms/{room_id}`
    Topic(String),
    /// Single user
    User(PlayerId),
}

/// One message on the channel.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Addressee.
    pub to: Recipient,
    /// Message.
    pub notification: Notification,
}

/// [`Broadcaster`] over a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct ChannelBroadcaster {
    tx: broadcast::Sender<Delivery>,
}

impl ChannelBroadcaster {
    /// Channel holding up to `capacity` undelivered messages per receiver.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to every delivery.
    pub fn subscribe(&self) -> broadcast::Receiver<Delivery> {
        self.tx.subscribe()
    }

    fn send(&self, to: Recipient, notification: Notification) -> Result<(), BroadcastError> {
        self.tx
            .send(Delivery { to, notification })
            .map(|_| ())
            .map_err(|_| BroadcastError::NoSubscribers)
    }
}

#[async_trait]
impl Broadcaster for ChannelBroadcaster {
    async fn publish(&self, topic: &str, notification: Notification) -> Result<(), BroadcastError> {
        self.send(Recipient::Topic(topic.to_string()), notification)
    }

    async fn publish_to_user(&self, user: &PlayerId, notification: Notification) -> Result<(), BroadcastError> {
        self.send(Recipient::User(*user), notification)
    }
}
