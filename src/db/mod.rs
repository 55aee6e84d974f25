#[cfg(test)]
pub(crate) mod faulty;
mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validate::MessageDraft;

/// Recipient meaning "everyone in the room".
pub const BROADCAST: &str = "Todos";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub name: String,
    /// Epoch millis of the last registration or heartbeat.
    pub last_status: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Message,
    PrivateMessage,
    Status,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        use MessageKind::*;
        match self {
            Message => "message",
            PrivateMessage => "private_message",
            Status => "status",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        use MessageKind::*;
        match raw {
            "message" => Some(Message),
            "private_message" => Some(PrivateMessage),
            "status" => Some(Status),
            _ => None,
        }
    }

    /// Kinds a participant may author; `status` is reserved for join/leave notices.
    pub fn from_client(raw: &str) -> Option<Self> {
        Self::parse(raw).filter(|kind| *kind != MessageKind::Status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub from: String,
    pub to: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub time: String,
}

impl Message {
    pub fn visible_to(&self, caller: Option<&str>) -> bool {
        matches!(self.kind, MessageKind::Message | MessageKind::Status)
            || self.to == BROADCAST
            || caller.is_some_and(|caller| self.to == caller || self.from == caller)
    }
}

/// A message before the store has assigned it an id.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub from: String,
    pub to: String,
    pub text: String,
    pub kind: MessageKind,
    pub time: String,
}

impl NewMessage {
    pub fn status(from: &str, text: &str, time: String) -> Self {
        Self {
            from: from.to_owned(),
            to: BROADCAST.to_owned(),
            text: text.to_owned(),
            kind: MessageKind::Status,
            time,
        }
    }
}

/// Participant and message collections.
///
/// Every call is atomic on its own; nothing here spans calls.
#[async_trait]
pub trait Store: Send + Sync {
    /// Returns `false` when the name is already taken.
    async fn insert_participant(&self, participant: &Participant) -> anyhow::Result<bool>;
    async fn find_participant(&self, name: &str) -> anyhow::Result<Option<Participant>>;
    async fn list_participants(&self) -> anyhow::Result<Vec<Participant>>;
    /// Returns `false` when no such participant exists.
    async fn touch_participant(&self, name: &str, at: i64) -> anyhow::Result<bool>;
    async fn stale_participants(&self, cutoff: i64) -> anyhow::Result<Vec<Participant>>;
    /// Deletes `name` only if its `last_status` is still older than `cutoff`.
    async fn remove_participant_if_stale(&self, name: &str, cutoff: i64) -> anyhow::Result<bool>;

    async fn insert_message(&self, message: NewMessage) -> anyhow::Result<Message>;
    async fn find_message(&self, id: Uuid) -> anyhow::Result<Option<Message>>;
    /// Visible messages in insertion order, keeping only the newest `limit`.
    async fn visible_messages(&self, caller: Option<&str>, limit: Option<usize>) -> anyhow::Result<Vec<Message>>;
    async fn update_message(&self, id: Uuid, draft: &MessageDraft) -> anyhow::Result<bool>;
    async fn delete_message(&self, id: Uuid) -> anyhow::Result<bool>;
}
