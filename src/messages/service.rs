use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    clock::Clock,
    db::{Message, NewMessage, Store},
    validate, ChatError, ChatResult,
};

#[derive(Clone)]
pub struct MessageService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

fn message_id(raw: &str) -> ChatResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| ChatError::NotFound(format!("message {raw}")))
}

impl MessageService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    async fn require_participant(&self, name: &str) -> ChatResult<()> {
        if self.store.find_participant(name).await?.is_none() {
            // the sender's session expired, not a missing resource
            return Err(ChatError::InvalidInput(format!("{name} is not in the room")));
        }
        Ok(())
    }

    async fn owned_message(&self, id: &str, caller: Option<&str>) -> ChatResult<Message> {
        let id = message_id(id)?;
        let Some(message) = self.store.find_message(id).await? else {
            return Err(ChatError::NotFound(format!("message {id}")));
        };

        if caller != Some(message.from.as_str()) {
            warn!(%id, owner = %message.from, ?caller, "refused to touch someone else's message");
            return Err(ChatError::Forbidden(format!("message {id} belongs to {}", message.from)));
        }
        Ok(message)
    }

    pub async fn post(
        &self,
        from: Option<&str>,
        to: Option<&str>,
        text: Option<&str>,
        kind: Option<&str>,
    ) -> ChatResult<Message> {
        let from = validate::identity(from).ok_or(ChatError::Unauthenticated)?;
        let draft = validate::message_draft(to, text, kind)?;
        self.require_participant(&from).await?;

        let message = self.store
            .insert_message(NewMessage {
                from,
                to: draft.to,
                text: draft.text,
                kind: draft.kind,
                time: self.clock.time_label(),
            })
            .await?;

        debug!(id = %message.id, from = %message.from, to = %message.to, "message posted");
        Ok(message)
    }

    /// Messages `caller` may see, oldest first; with `limit`, only the newest
    /// `limit` of them (still oldest first).
    pub async fn list(&self, caller: Option<&str>, limit: Option<&str>) -> ChatResult<Vec<Message>> {
        let limit = validate::limit(limit)?;
        let caller = validate::identity(caller);
        Ok(self.store.visible_messages(caller.as_deref(), limit).await?)
    }

    pub async fn delete(&self, id: &str, caller: Option<&str>) -> ChatResult<()> {
        let caller = validate::identity(caller);
        let message = self.owned_message(id, caller.as_deref()).await?;

        if !self.store.delete_message(message.id).await? {
            return Err(ChatError::NotFound(format!("message {}", message.id)));
        }
        debug!(id = %message.id, "message deleted");
        Ok(())
    }

    /// Replaces recipient, body and type; `id`, `from` and `time` stay as they were.
    pub async fn edit(
        &self,
        id: &str,
        caller: Option<&str>,
        to: Option<&str>,
        text: Option<&str>,
        kind: Option<&str>,
    ) -> ChatResult<()> {
        let draft = validate::message_draft(to, text, kind)?;
        let caller = validate::identity(caller)
            .ok_or_else(|| ChatError::InvalidInput("no participant given".to_owned()))?;
        self.require_participant(&caller).await?;
        let message = self.owned_message(id, Some(&caller)).await?;

        if !self.store.update_message(message.id, &draft).await? {
            return Err(ChatError::NotFound(format!("message {}", message.id)));
        }
        debug!(id = %message.id, "message edited");
        Ok(())
    }
}
