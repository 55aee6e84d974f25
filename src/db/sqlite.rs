use anyhow::{anyhow, Context};
use async_trait::async_trait;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use uuid::Uuid;

use crate::validate::MessageDraft;

use super::{Message, MessageKind, NewMessage, Participant, Store, BROADCAST};

// unique: participants.name
// unique: messages.id
// messages.seq is the insertion order
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS participants (
    name TEXT PRIMARY KEY NOT NULL,
    last_status INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS participants_last_status ON participants (last_status);
CREATE TABLE IF NOT EXISTS messages (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    "from" TEXT NOT NULL,
    "to" TEXT NOT NULL,
    text TEXT NOT NULL,
    kind TEXT NOT NULL,
    time TEXT NOT NULL
);
"#;

type MessageRow = (String, String, String, String, String, String);

fn message_from_row((id, from, to, text, kind, time): MessageRow) -> anyhow::Result<Message> {
    Ok(Message {
        id: Uuid::parse_str(&id).with_context(|| format!("bad message id {id:?}"))?,
        kind: MessageKind::parse(&kind).ok_or_else(|| anyhow!("bad message kind {kind:?} on {id}"))?,
        from,
        to,
        text,
        time,
    })
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .with_context(|| format!("connecting to {url}"))?;

        Self::from_pool(pool).await
    }

    /// Private database living as long as the store; handy for tests.
    pub async fn in_memory() -> anyhow::Result<Self> {
        // each connection to :memory: is its own database, so keep exactly one alive
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> anyhow::Result<Self> {
        sqlx::raw_sql(SCHEMA)
            .execute(&pool)
            .await
            .context("creating schema")?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_participant(&self, participant: &Participant) -> anyhow::Result<bool> {
        let result = sqlx::query("INSERT INTO participants (name,last_status) VALUES (?,?) ON CONFLICT(name) DO NOTHING")
            .bind(&participant.name)
            .bind(participant.last_status)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_participant(&self, name: &str) -> anyhow::Result<Option<Participant>> {
        let row: Option<(String, i64)> = sqlx::query_as("SELECT name,last_status FROM participants WHERE name=?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(name, last_status)| Participant { name, last_status }))
    }

    async fn list_participants(&self) -> anyhow::Result<Vec<Participant>> {
        let rows: Vec<(String, i64)> = sqlx::query_as("SELECT name,last_status FROM participants ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|(name, last_status)| Participant { name, last_status }).collect())
    }

    async fn touch_participant(&self, name: &str, at: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE participants SET last_status=? WHERE name=?")
            .bind(at)
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn stale_participants(&self, cutoff: i64) -> anyhow::Result<Vec<Participant>> {
        let rows: Vec<(String, i64)> = sqlx::query_as("SELECT name,last_status FROM participants WHERE last_status<? ORDER BY rowid")
            .bind(cutoff)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|(name, last_status)| Participant { name, last_status }).collect())
    }

    async fn remove_participant_if_stale(&self, name: &str, cutoff: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM participants WHERE name=? AND last_status<?")
            .bind(name)
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_message(&self, message: NewMessage) -> anyhow::Result<Message> {
        let id = Uuid::now_v7();
        sqlx::query(r#"INSERT INTO messages (id,"from","to",text,kind,time) VALUES (?,?,?,?,?,?)"#)
            .bind(id.to_string())
            .bind(&message.from)
            .bind(&message.to)
            .bind(&message.text)
            .bind(message.kind.as_str())
            .bind(&message.time)
            .execute(&self.pool)
            .await?;

        let NewMessage { from, to, text, kind, time } = message;
        Ok(Message { id, from, to, text, kind, time })
    }

    async fn find_message(&self, id: Uuid) -> anyhow::Result<Option<Message>> {
        let row: Option<MessageRow> = sqlx::query_as(r#"SELECT id,"from","to",text,kind,time FROM messages WHERE id=?"#)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(message_from_row).transpose()
    }

    async fn visible_messages(&self, caller: Option<&str>, limit: Option<usize>) -> anyhow::Result<Vec<Message>> {
        // LIMIT -1 is "no limit" in sqlite
        let limit = limit.map_or(-1, |limit| i64::try_from(limit).unwrap_or(i64::MAX));
        let rows: Vec<MessageRow> = sqlx::query_as(
            r#"SELECT id,"from","to",text,kind,time FROM (
                SELECT seq,id,"from","to",text,kind,time FROM messages
                WHERE kind IN ('message','status') OR "to"=?1 OR "to"=?2 OR "from"=?2
                ORDER BY seq DESC
                LIMIT ?3
            ) ORDER BY seq ASC"#,
        )
            .bind(BROADCAST)
            .bind(caller)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(message_from_row).collect()
    }

    async fn update_message(&self, id: Uuid, draft: &MessageDraft) -> anyhow::Result<bool> {
        let result = sqlx::query(r#"UPDATE messages SET "to"=?,text=?,kind=? WHERE id=?"#)
            .bind(&draft.to)
            .bind(&draft.text)
            .bind(draft.kind.as_str())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_message(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM messages WHERE id=?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn chat(from: &str, to: &str, kind: MessageKind, text: &str) -> NewMessage {
        NewMessage { from: from.into(), to: to.into(), text: text.into(), kind, time: "00:00:00".into() }
    }

    async fn fill(store: &dyn Store) {
        let script = [
            chat("alice", BROADCAST, MessageKind::Message, "1"),
            chat("alice", "bob", MessageKind::PrivateMessage, "2"),
            chat("bob", "alice", MessageKind::PrivateMessage, "3"),
            chat("carol", "dave", MessageKind::PrivateMessage, "4"),
            chat("dave", BROADCAST, MessageKind::Status, "5"),
            chat("carol", BROADCAST, MessageKind::PrivateMessage, "6"),
            chat("bob", "carol", MessageKind::PrivateMessage, "7"),
        ];
        for message in script {
            store.insert_message(message).await.unwrap();
        }
    }

    fn texts(messages: &[Message]) -> Vec<&str> {
        messages.iter().map(|message| message.text.as_str()).collect()
    }

    #[tokio::test]
    async fn native_limit_matches_in_memory_reslice() {
        let sqlite = SqliteStore::in_memory().await.unwrap();
        let memory = MemoryStore::new();
        fill(&sqlite).await;
        fill(&memory).await;

        for caller in [None, Some("alice"), Some("bob"), Some("carol"), Some("zed")] {
            for limit in [None, Some(1), Some(2), Some(3), Some(100)] {
                let a = sqlite.visible_messages(caller, limit).await.unwrap();
                let b = memory.visible_messages(caller, limit).await.unwrap();
                assert_eq!(texts(&a), texts(&b), "caller={caller:?} limit={limit:?}");
            }
        }

        let bob = sqlite.visible_messages(Some("bob"), None).await.unwrap();
        assert_eq!(texts(&bob), ["1", "2", "3", "5", "6", "7"]);
        let bob = sqlite.visible_messages(Some("bob"), Some(2)).await.unwrap();
        assert_eq!(texts(&bob), ["6", "7"]);
    }

    #[tokio::test]
    async fn duplicate_participant_is_refused() {
        let store = SqliteStore::in_memory().await.unwrap();
        let alice = Participant { name: "alice".into(), last_status: 1 };

        assert!(store.insert_participant(&alice).await.unwrap());
        assert!(!store.insert_participant(&alice).await.unwrap());
        assert_eq!(store.list_participants().await.unwrap(), vec![alice]);
    }

    #[tokio::test]
    async fn participants_come_back_in_registration_order() {
        let sqlite = SqliteStore::in_memory().await.unwrap();
        let memory = MemoryStore::new();
        for (name, last_status) in [("zed", 5), ("alice", 1), ("mallory", 9), ("bob", 3)] {
            let participant = Participant { name: name.into(), last_status };
            sqlite.insert_participant(&participant).await.unwrap();
            memory.insert_participant(&participant).await.unwrap();
        }

        for store in [&sqlite as &dyn Store, &memory] {
            let names: Vec<_> = store.list_participants().await.unwrap().into_iter().map(|p| p.name).collect();
            assert_eq!(names, ["zed", "alice", "mallory", "bob"]);
            let stale: Vec<_> = store.stale_participants(6).await.unwrap().into_iter().map(|p| p.name).collect();
            assert_eq!(stale, ["zed", "alice", "bob"]);
        }
    }

    #[tokio::test]
    async fn stale_removal_rechecks_freshness() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.insert_participant(&Participant { name: "alice".into(), last_status: 100 }).await.unwrap();

        assert_eq!(store.stale_participants(200).await.unwrap().len(), 1);
        // heartbeat lands between the read and the delete
        assert!(store.touch_participant("alice", 300).await.unwrap());
        assert!(!store.remove_participant_if_stale("alice", 200).await.unwrap());
        assert!(store.find_participant("alice").await.unwrap().is_some());

        assert!(store.remove_participant_if_stale("alice", 301).await.unwrap());
        assert!(store.find_participant("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn messages_update_and_delete_by_id() {
        let store = SqliteStore::in_memory().await.unwrap();
        let message = store.insert_message(chat("alice", BROADCAST, MessageKind::Message, "oi")).await.unwrap();

        let draft = MessageDraft { to: "bob".into(), text: "psst".into(), kind: MessageKind::PrivateMessage };
        assert!(store.update_message(message.id, &draft).await.unwrap());

        let stored = store.find_message(message.id).await.unwrap().unwrap();
        assert_eq!((stored.to.as_str(), stored.text.as_str(), stored.kind), ("bob", "psst", MessageKind::PrivateMessage));
        assert_eq!(stored.from, "alice");

        assert!(store.delete_message(message.id).await.unwrap());
        assert!(!store.delete_message(message.id).await.unwrap());
        assert!(!store.update_message(message.id, &draft).await.unwrap());
        assert!(store.find_message(message.id).await.unwrap().is_none());
    }
}
