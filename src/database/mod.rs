use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(1800))
            .connect_with(options)
            .await?;

        Ok(Database { pool })
    }

    pub async fn init(&self) -> Result<(), sqlx::Error> {
        // Закреплённые сообщения: ключ "admin" или "user:<chat_id>"
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pinned_messages (
                pin_key TEXT PRIMARY KEY,
                chat_id INTEGER NOT NULL,
                message_id INTEGER NOT NULL,
                pinned INTEGER NOT NULL DEFAULT 1,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Не больше одной записи на пользователя
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS appointments (
                chat_id INTEGER PRIMARY KEY,
                username TEXT NOT NULL,
                salon TEXT NOT NULL,
                service TEXT NOT NULL,
                master TEXT NOT NULL,
                starts_at TEXT NOT NULL,
                payload TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_appointments_starts_at ON appointments (starts_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
