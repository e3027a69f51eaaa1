use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use teloxide::types::{ChatId, User};

use crate::machine::{ConversationStateMachine, Effect, Input};
use crate::store::AppointmentStore;
use crate::summary::render_new_booking_notice;
use crate::transport::{ChatTransport, Reply};

/// Общее состояние, которое диспетчер передаёт во все обработчики.
#[derive(Clone)]
pub struct BotState {
    pub machine: Arc<ConversationStateMachine>,
    pub store: AppointmentStore,
    pub transport: Arc<dyn ChatTransport>,
    pub admin_chat_id: ChatId,
}

impl BotState {
    /// Прогоняет событие через диалог и отвечает пользователю.
    /// Закрепы обновляются отдельно, по каналу изменений хранилища.
    pub async fn dispatch(&self, chat_id: ChatId, username: &str, input: Input) {
        let start_time = Instant::now();
        let transition = self.machine.handle(chat_id, username, input, Utc::now()).await;

        self.reply(chat_id, &transition.reply).await;

        if let Effect::Booked(appointment) = &transition.effect {
            let notice = render_new_booking_notice(appointment);
            if let Err(e) = self.transport.send(self.admin_chat_id, &notice, None).await {
                log::warn!("Failed to notify admin about booking of {}: {}", chat_id, e);
            }
        }

        log::debug!("🎯 Event for {} handled in {:?}", chat_id, start_time.elapsed());
    }

    pub async fn reply(&self, chat_id: ChatId, reply: &Reply) {
        if let Err(e) = self
            .transport
            .send(chat_id, &reply.text, reply.keyboard.as_ref())
            .await
        {
            log::warn!("Failed to reply to {}: {}", chat_id, e);
        }
    }
}

/// `@username`, а если его нет, то имя.
pub fn display_name(user: Option<&User>) -> String {
    match user {
        Some(user) => match &user.username {
            Some(username) => format!("@{}", username),
            None => user.first_name.clone(),
        },
        None => "unknown".to_string(),
    }
}
