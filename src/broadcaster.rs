//! Закреплённые сводки: одна у каждого пользователя с будущей записью и
//! одна общая у администратора.
//!
//! Оба вида обновляются одним способом: найти закреп в реестре и
//! отредактировать его, а если редактирование не удалось, отправить новое
//! сообщение, закрепить и перезаписать реестр. Ошибки платформы только
//! логируются и никогда не откатывают саму запись.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use teloxide::types::ChatId;
use tokio::sync::{mpsc, Mutex};

use crate::error::PinError;
use crate::models::Appointment;
use crate::store::{AppointmentStore, PinKey, PinRecord, PinRegistry};
use crate::summary::{render_admin_summary, render_user_summary};
use crate::transport::{ChatTransport, Keyboard};

pub struct PinnedSummaryBroadcaster {
    transport: Arc<dyn ChatTransport>,
    registry: Arc<dyn PinRegistry>,
    store: AppointmentStore,
    admin_chat_id: ChatId,
    // "прочитать список и отредактировать" для общего закрепа строго по одному
    admin_lock: Mutex<()>,
}

impl PinnedSummaryBroadcaster {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        registry: Arc<dyn PinRegistry>,
        store: AppointmentStore,
        admin_chat_id: ChatId,
    ) -> Self {
        Self {
            transport,
            registry,
            store,
            admin_chat_id,
            admin_lock: Mutex::new(()),
        }
    }

    /// Разбирает канал изменений хранилища. Накопившиеся изменения
    /// обрабатываются пачкой, общий закреп пересчитывается один раз.
    pub async fn run(self: Arc<Self>, mut changes: mpsc::UnboundedReceiver<ChatId>) {
        while let Some(first) = changes.recv().await {
            let mut users = vec![first];
            while let Ok(next) = changes.try_recv() {
                if !users.contains(&next) {
                    users.push(next);
                }
            }
            self.apply_changes(&users, Utc::now()).await;
        }
        log::info!("Change feed closed, broadcaster stopped");
    }

    pub async fn apply_changes(&self, users: &[ChatId], now: DateTime<Utc>) {
        for user_id in users {
            self.refresh_user(*user_id, now).await;
        }
        self.refresh_admin(now).await;
    }

    pub async fn refresh_user(&self, user_id: ChatId, now: DateTime<Utc>) {
        let key = PinKey::User(user_id);
        let result = match self.store.get(user_id).await.filter(|a| a.is_future(now)) {
            Some(appointment) => {
                let (text, keyboard) = render_user_summary(&appointment);
                self.upsert_pin(key, user_id, &text, Some(&keyboard)).await
            }
            None => self.remove_pin(key).await,
        };

        if let Err(e) = result {
            log::error!("Failed to refresh pinned summary for user {}: {}", user_id, e);
        }
    }

    pub async fn refresh_admin(&self, now: DateTime<Utc>) {
        let _guard = self.admin_lock.lock().await;

        let upcoming = self.store.list_future(now).await;
        if let Err(e) = self.sync_admin(&upcoming).await {
            log::error!("Failed to refresh admin summary: {}", e);
        }
    }

    async fn sync_admin(&self, upcoming: &[Appointment]) -> Result<(), PinError> {
        // Закреп администратора создаётся только с первой записью
        if upcoming.is_empty() && self.registry.get(PinKey::Admin).await?.is_none() {
            return Ok(());
        }
        let text = render_admin_summary(upcoming);
        self.upsert_pin(PinKey::Admin, self.admin_chat_id, &text, None).await
    }

    async fn upsert_pin(
        &self,
        key: PinKey,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), PinError> {
        let previous = self.registry.get(key).await?;

        if let Some(record) = previous.filter(|r| r.chat_id == chat_id) {
            match self.transport.edit(chat_id, record.message_id, text, keyboard).await {
                Ok(()) => {
                    log::debug!("✏️ Pinned message {} updated in {}", record.message_id.0, chat_id);
                    if !record.pinned {
                        self.repin(key, record).await?;
                    }
                    return Ok(());
                }
                Err(e) => log::warn!(
                    "Pinned message {} in {} is not editable, re-creating: {}",
                    record.message_id.0,
                    chat_id,
                    e
                ),
            }
        }

        let message_id = self.transport.send(chat_id, text, keyboard).await?;
        let pinned = match self.transport.pin(chat_id, message_id).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to pin message {} in {}: {}", message_id.0, chat_id, e);
                false
            }
        };
        let record = PinRecord {
            chat_id,
            message_id,
            pinned,
        };
        self.registry.set(key, record).await?;
        log::info!("📌 New pinned message {} for {}", message_id.0, key);

        if let Some(old) = previous.filter(|r| r.pinned) {
            self.unpin_best_effort(old).await;
        }

        Ok(())
    }

    /// Одна попытка закрепить сообщение, которое не удалось закрепить при отправке.
    async fn repin(&self, key: PinKey, record: PinRecord) -> Result<(), PinError> {
        self.transport.pin(record.chat_id, record.message_id).await?;
        self.registry
            .set(
                key,
                PinRecord {
                    pinned: true,
                    ..record
                },
            )
            .await?;
        log::info!("📌 Message {} pinned for {} on retry", record.message_id.0, key);
        Ok(())
    }

    async fn remove_pin(&self, key: PinKey) -> Result<(), PinError> {
        if let Some(record) = self.registry.get(key).await? {
            if record.pinned {
                self.unpin_best_effort(record).await;
            }
            self.registry.delete(key).await?;
            log::info!("📍 Pin removed for {}", key);
        }
        Ok(())
    }

    async fn unpin_best_effort(&self, record: PinRecord) {
        if let Err(e) = self.transport.unpin(record.chat_id, record.message_id).await {
            log::warn!(
                "Best-effort unpin of message {} in {} failed: {}",
                record.message_id.0,
                record.chat_id,
                e
            );
        }
    }
}
