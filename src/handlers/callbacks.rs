use teloxide::prelude::*;

use crate::bot_state::{display_name, BotState};
use crate::error::HandlerResult;
use crate::machine::Input;

pub async fn callback_handler(bot: Bot, q: CallbackQuery, state: BotState) -> HandlerResult {
    // Убираем "часики" на кнопке, даже если дальше что-то пойдёт не так
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        log::warn!("Failed to answer callback query: {}", e);
    }

    if let (Some(data), Some(message)) = (q.data.as_deref(), q.message.as_ref()) {
        let chat_id = message.chat().id;
        let username = display_name(Some(&q.from));
        state
            .dispatch(chat_id, &username, Input::from_callback(data))
            .await;
    }

    Ok(())
}
