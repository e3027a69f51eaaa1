//! Реестр закреплённых сообщений: какое сообщение закреплено в каком чате.
//!
//! Переживает перезапуск процесса, чтобы после деплоя продолжать
//! редактировать то же сообщение, а не плодить новые закрепы.

use std::fmt;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use teloxide::types::{ChatId, MessageId};

use crate::database::Database;
use crate::error::StoreError;

/// Пространства ключей: одиночный закреп администратора и закрепы пользователей.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinKey {
    Admin,
    User(ChatId),
}

impl fmt::Display for PinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinKey::Admin => write!(f, "admin"),
            PinKey::User(chat_id) => write!(f, "user:{}", chat_id.0),
        }
    }
}

/// `pinned` ложно, если сообщение отправлено, но закрепить его не удалось.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinRecord {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub pinned: bool,
}

#[async_trait]
pub trait PinRegistry: Send + Sync {
    async fn get(&self, key: PinKey) -> Result<Option<PinRecord>, StoreError>;
    async fn set(&self, key: PinKey, record: PinRecord) -> Result<(), StoreError>;
    async fn delete(&self, key: PinKey) -> Result<(), StoreError>;
}

pub struct SqlitePinRegistry {
    db: Database,
}

impl SqlitePinRegistry {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PinRegistry for SqlitePinRegistry {
    async fn get(&self, key: PinKey) -> Result<Option<PinRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT chat_id, message_id, pinned FROM pinned_messages WHERE pin_key = ?",
        )
        .bind(key.to_string())
        .fetch_optional(&self.db.pool)
        .await?;

        match row {
            Some(row) => {
                let chat_id: i64 = row.try_get("chat_id")?;
                let message_id: i64 = row.try_get("message_id")?;
                let pinned: bool = row.try_get("pinned")?;
                let message_id = i32::try_from(message_id).map_err(|_| StoreError::Corrupted {
                    key: key.to_string(),
                    reason: format!("message id {message_id} out of range"),
                })?;
                Ok(Some(PinRecord {
                    chat_id: ChatId(chat_id),
                    message_id: MessageId(message_id),
                    pinned,
                }))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: PinKey, record: PinRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO pinned_messages (pin_key, chat_id, message_id, pinned, updated_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT (pin_key) DO UPDATE SET
                   chat_id = excluded.chat_id,
                   message_id = excluded.message_id,
                   pinned = excluded.pinned,
                   updated_at = excluded.updated_at"#,
        )
        .bind(key.to_string())
        .bind(record.chat_id.0)
        .bind(record.message_id.0 as i64)
        .bind(record.pinned)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.db.pool)
        .await?;

        log::debug!("📌 Pin record {} -> message {}", key, record.message_id.0);
        Ok(())
    }

    async fn delete(&self, key: PinKey) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM pinned_messages WHERE pin_key = ?")
            .bind(key.to_string())
            .execute(&self.db.pool)
            .await?;
        Ok(())
    }
}
