pub mod callbacks;
pub mod commands;
pub mod messages;

pub use callbacks::callback_handler;
pub use commands::{command_handler, Command};
pub use messages::message_handler;

use std::time::Duration;

use chrono::Utc;
use tokio::time;

use crate::bot_state::BotState;

/// Убирает прошедшие записи; закрепы пересчитываются через канал изменений.
pub async fn check_lapsed_appointments_task(state: BotState, period: Duration) {
    let mut interval = time::interval(period);

    loop {
        interval.tick().await;

        match state.store.purge_lapsed(Utc::now()).await {
            Ok(lapsed) if !lapsed.is_empty() => {
                log::info!("⌛ {} appointments lapsed", lapsed.len());
            }
            Ok(_) => {}
            Err(e) => log::error!("Error purging lapsed appointments: {}", e),
        }

        let active = state.machine.active_sessions().await;
        log::debug!("💬 {} conversations in progress", active);
    }
}
