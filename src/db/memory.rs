use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::validate::MessageDraft;

use super::{Message, NewMessage, Participant, Store};

#[derive(Default)]
struct Inner {
    // insertion order is the vec order
    participants: Vec<Participant>,
    messages: Vec<Message>,
}

/// In-process store; nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_participant(&self, participant: &Participant) -> anyhow::Result<bool> {
        let mut inner = self.inner.lock().await;
        if inner.participants.iter().any(|p| p.name == participant.name) {
            return Ok(false);
        }
        inner.participants.push(participant.clone());
        Ok(true)
    }

    async fn find_participant(&self, name: &str) -> anyhow::Result<Option<Participant>> {
        let inner = self.inner.lock().await;
        Ok(inner.participants.iter().find(|p| p.name == name).cloned())
    }

    async fn list_participants(&self) -> anyhow::Result<Vec<Participant>> {
        Ok(self.inner.lock().await.participants.clone())
    }

    async fn touch_participant(&self, name: &str, at: i64) -> anyhow::Result<bool> {
        let mut inner = self.inner.lock().await;
        let Some(participant) = inner.participants.iter_mut().find(|p| p.name == name) else {
            return Ok(false);
        };
        participant.last_status = at;
        Ok(true)
    }

    async fn stale_participants(&self, cutoff: i64) -> anyhow::Result<Vec<Participant>> {
        let inner = self.inner.lock().await;
        Ok(inner.participants.iter()
            .filter(|p| p.last_status < cutoff)
            .cloned()
            .collect())
    }

    async fn remove_participant_if_stale(&self, name: &str, cutoff: i64) -> anyhow::Result<bool> {
        let mut inner = self.inner.lock().await;
        let before = inner.participants.len();
        inner.participants.retain(|p| p.name != name || p.last_status >= cutoff);
        Ok(inner.participants.len() != before)
    }

    async fn insert_message(&self, message: NewMessage) -> anyhow::Result<Message> {
        let NewMessage { from, to, text, kind, time } = message;
        let message = Message { id: Uuid::now_v7(), from, to, text, kind, time };

        self.inner.lock().await.messages.push(message.clone());
        Ok(message)
    }

    async fn find_message(&self, id: Uuid) -> anyhow::Result<Option<Message>> {
        let inner = self.inner.lock().await;
        Ok(inner.messages.iter().find(|message| message.id == id).cloned())
    }

    async fn visible_messages(&self, caller: Option<&str>, limit: Option<usize>) -> anyhow::Result<Vec<Message>> {
        let inner = self.inner.lock().await;
        let visible: Vec<Message> = inner.messages.iter()
            .filter(|message| message.visible_to(caller))
            .cloned()
            .collect();

        let skip = limit.map_or(0, |limit| visible.len().saturating_sub(limit));
        Ok(visible.into_iter().skip(skip).collect())
    }

    async fn update_message(&self, id: Uuid, draft: &MessageDraft) -> anyhow::Result<bool> {
        let mut inner = self.inner.lock().await;
        let Some(message) = inner.messages.iter_mut().find(|message| message.id == id) else {
            return Ok(false);
        };
        message.to = draft.to.clone();
        message.text = draft.text.clone();
        message.kind = draft.kind;
        Ok(true)
    }

    async fn delete_message(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut inner = self.inner.lock().await;
        let before = inner.messages.len();
        inner.messages.retain(|message| message.id != id);
        Ok(inner.messages.len() != before)
    }
}
