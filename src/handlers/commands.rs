use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::bot_state::{display_name, BotState};
use crate::error::HandlerResult;
use crate::machine::Input;
use crate::transport::Reply;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Доступные команды:")]
pub enum Command {
    #[command(description = "записаться на процедуру")]
    Start,
    #[command(description = "показать помощь")]
    Help,
    #[command(description = "отменить запись")]
    Cancel,
}

pub async fn command_handler(msg: Message, cmd: Command, state: BotState) -> HandlerResult {
    let chat_id = msg.chat.id;
    let username = display_name(msg.from.as_ref());

    match cmd {
        Command::Start => state.dispatch(chat_id, &username, Input::Start).await,
        Command::Cancel => state.dispatch(chat_id, &username, Input::Cancel).await,
        Command::Help => {
            state
                .reply(chat_id, &Reply::text(Command::descriptions().to_string()))
                .await
        }
    }

    Ok(())
}
