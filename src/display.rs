//! External display surface: the chat channel leaderboards are posted to.

use crate::error::ServiceError;
use async_trait::async_trait;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::Mutex;

/// Opaque identifier of a previously posted rendering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayHandle(pub String);

impl fmt::Display for DisplayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DisplayHandle {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadField {
    pub name: String,
    pub value: String,
}

/// Rich message body, shaped like a chat embed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayPayload {
    pub title: String,
    pub description: String,
    pub color: u32,
    /// RFC 3339
    pub timestamp: Option<String>,
    pub fields: Vec<PayloadField>,
}

impl DisplayPayload {
    pub fn field(&self, name: &str) -> Option<&PayloadField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A message read back from the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub handle: DisplayHandle,
    pub payload: Option<DisplayPayload>,
    /// Posted by this bot rather than another user.
    pub from_self: bool,
}

#[async_trait]
pub trait DisplaySurface: Send + Sync {
    async fn send(&self, channel: &str, payload: &DisplayPayload) -> Result<DisplayHandle, ServiceError>;

    async fn edit(
        &self,
        channel: &str,
        handle: &DisplayHandle,
        payload: &DisplayPayload,
    ) -> Result<(), ServiceError>;

    async fn fetch(&self, channel: &str, handle: &DisplayHandle) -> Result<PostedMessage, ServiceError>;

    /// Most recent messages first.
    async fn fetch_recent(&self, channel: &str, limit: usize) -> Result<Vec<PostedMessage>, ServiceError>;
}

#[derive(Default)]
struct Channels {
    next_id: u64,
    messages: HashMap<String, Vec<PostedMessage>>,
}

/// Display surface kept entirely in memory. Backs the REPL and tests.
#[derive(Default)]
pub struct MemorySurface {
    channels: Mutex<Channels>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a message as somebody else, e.g. a user chatting in the channel.
    pub async fn post_foreign(&self, channel: &str, payload: Option<DisplayPayload>) -> DisplayHandle {
        self.insert(channel, payload, false).await
    }

    pub async fn delete(&self, channel: &str, handle: &DisplayHandle) -> bool {
        let mut channels = self.channels.lock().await;
        let Some(messages) = channels.messages.get_mut(channel) else {
            return false;
        };
        let before = messages.len();
        messages.retain(|m| &m.handle != handle);
        messages.len() != before
    }

    pub async fn payload(&self, channel: &str, handle: &DisplayHandle) -> Option<DisplayPayload> {
        let channels = self.channels.lock().await;
        channels
            .messages
            .get(channel)?
            .iter()
            .find(|m| &m.handle == handle)
            .and_then(|m| m.payload.clone())
    }

    pub async fn message_count(&self, channel: &str) -> usize {
        let channels = self.channels.lock().await;
        channels.messages.get(channel).map_or(0, Vec::len)
    }

    async fn insert(&self, channel: &str, payload: Option<DisplayPayload>, from_self: bool) -> DisplayHandle {
        let mut channels = self.channels.lock().await;
        channels.next_id += 1;
        let handle = DisplayHandle(format!("msg-{}", channels.next_id));
        channels
            .messages
            .entry(channel.to_string())
            .or_default()
            .push(PostedMessage {
                handle: handle.clone(),
                payload,
                from_self,
            });
        handle
    }
}

#[async_trait]
impl DisplaySurface for MemorySurface {
    async fn send(&self, channel: &str, payload: &DisplayPayload) -> Result<DisplayHandle, ServiceError> {
        Ok(self.insert(channel, Some(payload.clone()), true).await)
    }

    async fn edit(
        &self,
        channel: &str,
        handle: &DisplayHandle,
        payload: &DisplayPayload,
    ) -> Result<(), ServiceError> {
        let mut channels = self.channels.lock().await;
        let message = channels
            .messages
            .get_mut(channel)
            .and_then(|messages| messages.iter_mut().find(|m| &m.handle == handle))
            .ok_or_else(|| ServiceError::NotFound {
                what: format!("message {handle} in channel {channel}"),
            })?;
        if !message.from_self {
            return Err(ServiceError::Unavailable {
                service: "display surface",
                reason: format!("message {handle} was not posted by this bot"),
            });
        }
        message.payload = Some(payload.clone());
        Ok(())
    }

    async fn fetch(&self, channel: &str, handle: &DisplayHandle) -> Result<PostedMessage, ServiceError> {
        let channels = self.channels.lock().await;
        channels
            .messages
            .get(channel)
            .and_then(|messages| messages.iter().find(|m| &m.handle == handle))
            .cloned()
            .ok_or_else(|| ServiceError::NotFound {
                what: format!("message {handle} in channel {channel}"),
            })
    }

    async fn fetch_recent(&self, channel: &str, limit: usize) -> Result<Vec<PostedMessage>, ServiceError> {
        let channels = self.channels.lock().await;
        Ok(channels
            .messages
            .get(channel)
            .map(|messages| messages.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}
