use teloxide::prelude::*;

use crate::bot_state::{display_name, BotState};
use crate::error::HandlerResult;
use crate::machine::Input;

pub async fn message_handler(msg: Message, state: BotState) -> HandlerResult {
    if let Some(text) = msg.text() {
        // Команды уже разобраны в command_handler
        if text.starts_with('/') {
            return Ok(());
        }

        let username = display_name(msg.from.as_ref());
        state
            .dispatch(msg.chat.id, &username, Input::from_text(text))
            .await;
    }

    Ok(())
}
