//! `MemoryStore` wrapper whose operations can be switched to fail.

use std::sync::{atomic::{AtomicBool, Ordering}, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use crate::validate::MessageDraft;

use super::{MemoryStore, Message, NewMessage, Participant, Store};

#[derive(Default)]
pub(crate) struct FaultyStore {
    inner: MemoryStore,
    fail_stale_scan: AtomicBool,
    fail_message_writes: AtomicBool,
    fail_removal_of: Mutex<Option<String>>,
}

impl FaultyStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn break_stale_scan(&self, broken: bool) {
        self.fail_stale_scan.store(broken, Ordering::SeqCst);
    }

    pub(crate) fn break_message_writes(&self, broken: bool) {
        self.fail_message_writes.store(broken, Ordering::SeqCst);
    }

    pub(crate) fn break_removal_of(&self, name: Option<&str>) {
        *self.fail_removal_of.lock().unwrap() = name.map(str::to_owned);
    }
}

#[async_trait]
impl Store for FaultyStore {
    async fn insert_participant(&self, participant: &Participant) -> anyhow::Result<bool> {
        self.inner.insert_participant(participant).await
    }

    async fn find_participant(&self, name: &str) -> anyhow::Result<Option<Participant>> {
        self.inner.find_participant(name).await
    }

    async fn list_participants(&self) -> anyhow::Result<Vec<Participant>> {
        self.inner.list_participants().await
    }

    async fn touch_participant(&self, name: &str, at: i64) -> anyhow::Result<bool> {
        self.inner.touch_participant(name, at).await
    }

    async fn stale_participants(&self, cutoff: i64) -> anyhow::Result<Vec<Participant>> {
        if self.fail_stale_scan.load(Ordering::SeqCst) {
            anyhow::bail!("store offline");
        }
        self.inner.stale_participants(cutoff).await
    }

    async fn remove_participant_if_stale(&self, name: &str, cutoff: i64) -> anyhow::Result<bool> {
        if self.fail_removal_of.lock().unwrap().as_deref() == Some(name) {
            anyhow::bail!("cannot delete {name}");
        }
        self.inner.remove_participant_if_stale(name, cutoff).await
    }

    async fn insert_message(&self, message: NewMessage) -> anyhow::Result<Message> {
        if self.fail_message_writes.load(Ordering::SeqCst) {
            anyhow::bail!("messages collection is read-only");
        }
        self.inner.insert_message(message).await
    }

    async fn find_message(&self, id: Uuid) -> anyhow::Result<Option<Message>> {
        self.inner.find_message(id).await
    }

    async fn visible_messages(&self, caller: Option<&str>, limit: Option<usize>) -> anyhow::Result<Vec<Message>> {
        self.inner.visible_messages(caller, limit).await
    }

    async fn update_message(&self, id: Uuid, draft: &MessageDraft) -> anyhow::Result<bool> {
        self.inner.update_message(id, draft).await
    }

    async fn delete_message(&self, id: Uuid) -> anyhow::Result<bool> {
        self.inner.delete_message(id).await
    }
}
