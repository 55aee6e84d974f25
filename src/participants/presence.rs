use std::{sync::Arc, time::Duration};

use tracing::{error, info};

use crate::{
    clock::Clock,
    db::{NewMessage, Participant, Store},
    validate, ChatError, ChatResult,
};

pub const JOINED: &str = "joined";
pub const LEFT: &str = "left";

/// Registration, heartbeats and eviction of idle participants.
#[derive(Clone)]
pub struct PresenceManager {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl PresenceManager {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Adds `name` to the room and announces it.
    ///
    /// The participant row is written before the join notice; a failed notice
    /// leaves the participant registered.
    pub async fn register(&self, name: Option<&str>) -> ChatResult<Participant> {
        let name = validate::participant_name(name)?;
        let participant = Participant { name, last_status: self.clock.now_millis() };

        if !self.store.insert_participant(&participant).await? {
            return Err(ChatError::Conflict(format!("{} is already in the room", participant.name)));
        }

        self.store
            .insert_message(NewMessage::status(&participant.name, JOINED, self.clock.time_label()))
            .await?;

        info!(name = %participant.name, "participant joined");
        Ok(participant)
    }

    pub async fn participants(&self) -> ChatResult<Vec<Participant>> {
        Ok(self.store.list_participants().await?)
    }

    pub async fn heartbeat(&self, name: Option<&str>) -> ChatResult<()> {
        let Some(name) = validate::identity(name) else {
            return Err(ChatError::NotFound("no participant given".to_owned()));
        };

        if !self.store.touch_participant(&name, self.clock.now_millis()).await? {
            return Err(ChatError::NotFound(format!("{name} is not in the room")));
        }
        Ok(())
    }

    /// Evicts everyone whose last heartbeat is older than `now - ttl` and
    /// posts one leave notice per eviction.
    ///
    /// Each candidate is deleted only if it is still stale at delete time, so
    /// a heartbeat racing the sweep keeps its participant.
    pub async fn sweep(&self, now: i64, ttl: Duration) -> ChatResult<Vec<Participant>> {
        let cutoff = now.saturating_sub(i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX));
        let candidates = self.store.stale_participants(cutoff).await?;

        let mut removed = Vec::with_capacity(candidates.len());
        for participant in candidates {
            match self.store.remove_participant_if_stale(&participant.name, cutoff).await {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    error!(name = %participant.name, "failed to evict: {e:#}");
                    continue;
                }
            }

            let notice = NewMessage::status(&participant.name, LEFT, self.clock.time_label());
            if let Err(e) = self.store.insert_message(notice).await {
                error!(name = %participant.name, "evicted without leave notice: {e:#}");
            }

            info!(name = %participant.name, last_status = participant.last_status, "participant left");
            removed.push(participant);
        }

        Ok(removed)
    }

    pub async fn sweep_now(&self, ttl: Duration) -> ChatResult<Vec<Participant>> {
        self.sweep(self.clock.now_millis(), ttl).await
    }
}
