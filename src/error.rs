use std::time::Duration;

use thiserror::Error;

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Ошибки хранилищ (записи и закрепы).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Corrupted row for {key}: {reason}")]
    Corrupted { key: String, reason: String },
}

/// Ошибки вызовов платформы (send/edit/pin/unpin).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Telegram request failed: {0}")]
    Request(#[from] teloxide::RequestError),
    #[error("Platform call timed out after {0:?}")]
    Timeout(Duration),
    #[error("Message {message_id} in chat {chat_id} rejected: {reason}")]
    Rejected {
        chat_id: i64,
        message_id: i32,
        reason: String,
    },
}

/// Сбой обновления закрепа. Наружу не пробрасывается, только в лог.
#[derive(Debug, Error)]
pub enum PinError {
    #[error("pin registry: {0}")]
    Registry(#[from] StoreError),
    #[error("transport: {0}")]
    Transport(#[from] TransportError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
    #[error("Catalog is empty: {0}")]
    EmptyCatalog(&'static str),
}
