use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use sqlx::Row;
use teloxide::types::ChatId;
use tokio::sync::{mpsc, RwLock};

use crate::database::Database;
use crate::error::StoreError;
use crate::models::Appointment;

type AppointmentCache = Arc<RwLock<HashMap<ChatId, Appointment>>>;

/// Хранилище записей: не больше одной записи на пользователя.
///
/// Запись в базу выполняется под блокировкой кэша на запись, поэтому
/// читатели видят либо старое, либо новое состояние целиком. После каждого
/// изменения идентификатор пользователя уходит в канал изменений, из
/// которого закрепы пересчитываются.
#[derive(Clone)]
pub struct AppointmentStore {
    db: Database,
    cache: AppointmentCache,
    changes: Option<mpsc::UnboundedSender<ChatId>>,
}

impl AppointmentStore {
    /// Поднимает все сохранённые записи в память.
    pub async fn load(db: Database) -> Result<Self, StoreError> {
        let start_time = Instant::now();
        let rows = sqlx::query("SELECT chat_id, payload FROM appointments")
            .fetch_all(&db.pool)
            .await?;

        let mut cache = HashMap::with_capacity(rows.len());
        for row in rows {
            let chat_id: i64 = row.try_get("chat_id")?;
            let payload: String = row.try_get("payload")?;
            let appointment: Appointment =
                serde_json::from_str(&payload).map_err(|e| StoreError::Corrupted {
                    key: chat_id.to_string(),
                    reason: e.to_string(),
                })?;
            cache.insert(ChatId(chat_id), appointment);
        }

        log::info!(
            "📚 Loaded {} appointments in {:?}",
            cache.len(),
            start_time.elapsed()
        );

        Ok(Self {
            db,
            cache: Arc::new(RwLock::new(cache)),
            changes: None,
        })
    }

    pub fn with_change_feed(mut self, changes: mpsc::UnboundedSender<ChatId>) -> Self {
        self.changes = Some(changes);
        self
    }

    /// Заменяет запись пользователя, если она была. Возвращает предыдущую.
    pub async fn put(
        &self,
        user_id: ChatId,
        mut appointment: Appointment,
    ) -> Result<Option<Appointment>, StoreError> {
        appointment.user_id = user_id;
        let payload = serde_json::to_string(&appointment).map_err(|e| StoreError::Corrupted {
            key: user_id.0.to_string(),
            reason: e.to_string(),
        })?;

        let previous = {
            let mut cache = self.cache.write().await;

            sqlx::query(
                r#"
                INSERT INTO appointments
                (chat_id, username, salon, service, master, starts_at, payload, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT (chat_id) DO UPDATE SET
                    username = excluded.username,
                    salon = excluded.salon,
                    service = excluded.service,
                    master = excluded.master,
                    starts_at = excluded.starts_at,
                    payload = excluded.payload,
                    created_at = excluded.created_at
                "#,
            )
            .bind(user_id.0)
            .bind(&appointment.username)
            .bind(&appointment.salon.name)
            .bind(&appointment.service.name)
            .bind(&appointment.master.name)
            .bind(appointment.starts_at.to_rfc3339())
            .bind(&payload)
            .bind(appointment.created_at.to_rfc3339())
            .execute(&self.db.pool)
            .await?;

            cache.insert(user_id, appointment)
        };

        if previous.is_some() {
            log::info!("🔁 Appointment replaced for user {}", user_id);
        } else {
            log::info!("🆕 Appointment stored for user {}", user_id);
        }
        self.notify(user_id);

        Ok(previous)
    }

    /// Удаляет запись пользователя. `None` означает, что отменять было нечего.
    pub async fn cancel(&self, user_id: ChatId) -> Result<Option<Appointment>, StoreError> {
        let removed = {
            let mut cache = self.cache.write().await;
            if !cache.contains_key(&user_id) {
                return Ok(None);
            }

            sqlx::query("DELETE FROM appointments WHERE chat_id = ?")
                .bind(user_id.0)
                .execute(&self.db.pool)
                .await?;

            cache.remove(&user_id)
        };

        log::info!("🗑️ Appointment cancelled for user {}", user_id);
        self.notify(user_id);

        Ok(removed)
    }

    pub async fn get(&self, user_id: ChatId) -> Option<Appointment> {
        self.cache.read().await.get(&user_id).cloned()
    }

    /// Все будущие записи по возрастанию времени.
    pub async fn list_future(&self, now: DateTime<Utc>) -> Vec<Appointment> {
        let mut upcoming: Vec<Appointment> = self
            .cache
            .read()
            .await
            .values()
            .filter(|a| a.is_future(now))
            .cloned()
            .collect();

        upcoming.sort_by(|a, b| {
            a.starts_at
                .cmp(&b.starts_at)
                .then_with(|| a.user_id.0.cmp(&b.user_id.0))
        });
        upcoming
    }

    /// Удаляет записи, время которых уже прошло.
    pub async fn purge_lapsed(&self, now: DateTime<Utc>) -> Result<Vec<Appointment>, StoreError> {
        let lapsed = {
            let mut cache = self.cache.write().await;
            let lapsed_ids: Vec<ChatId> = cache
                .values()
                .filter(|a| !a.is_future(now))
                .map(|a| a.user_id)
                .collect();

            let mut lapsed = Vec::with_capacity(lapsed_ids.len());
            for user_id in lapsed_ids {
                sqlx::query("DELETE FROM appointments WHERE chat_id = ?")
                    .bind(user_id.0)
                    .execute(&self.db.pool)
                    .await?;
                if let Some(appointment) = cache.remove(&user_id) {
                    lapsed.push(appointment);
                }
            }
            lapsed
        };

        for appointment in &lapsed {
            log::info!(
                "⌛ Appointment {} lapsed for user {}",
                appointment.slot_label(),
                appointment.user_id
            );
            self.notify(appointment.user_id);
        }

        Ok(lapsed)
    }

    fn notify(&self, user_id: ChatId) {
        if let Some(changes) = &self.changes {
            if changes.send(user_id).is_err() {
                log::warn!("Change feed closed, pins for {} will not refresh", user_id);
            }
        }
    }
}
