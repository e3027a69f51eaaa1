//! Исходящие вызовы в чат-платформу: отправка, редактирование, закреп.

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, KeyboardRemove,
    MessageId, ReplyMarkup,
};
use teloxide::{ApiError, RequestError};

use crate::error::TransportError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub data: String,
}

impl InlineButton {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Обычная клавиатура под полем ввода.
    Menu(Vec<Vec<String>>),
    /// Кнопки под сообщением с callback-данными.
    Inline(Vec<Vec<InlineButton>>),
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageId, TransportError>;

    /// Редактирует текст; клавиатура допускается только `Keyboard::Inline`.
    async fn edit(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError>;

    async fn pin(&self, chat_id: ChatId, message_id: MessageId) -> Result<(), TransportError>;

    async fn unpin(&self, chat_id: ChatId, message_id: MessageId) -> Result<(), TransportError>;
}

/// Реализация поверх teloxide с ограничением времени на каждый вызов.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
    timeout: Duration,
}

impl TelegramTransport {
    pub fn new(bot: Bot, timeout: Duration) -> Self {
        Self { bot, timeout }
    }

    async fn bounded<T, F>(&self, call: &'static str, request: F) -> Result<T, TransportError>
    where
        F: Future<Output = Result<T, RequestError>>,
    {
        let start_time = Instant::now();
        let result = match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result.map_err(TransportError::from),
            Err(_) => Err(TransportError::Timeout(self.timeout)),
        };
        log::debug!("📡 {} finished in {:?}", call, start_time.elapsed());
        result
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageId, TransportError> {
        let mut request = self.bot.send_message(chat_id, text);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(reply_markup(keyboard));
        }
        let message = self.bounded("send_message", request.send()).await?;
        Ok(message.id)
    }

    async fn edit(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError> {
        let mut request = self.bot.edit_message_text(chat_id, message_id, text);
        if let Some(Keyboard::Inline(rows)) = keyboard {
            request = request.reply_markup(inline_markup(rows));
        }

        let result = self.bounded("edit_message_text", request.send()).await;
        classify_edit(chat_id, message_id, result.map(|_| ()))
    }

    async fn pin(&self, chat_id: ChatId, message_id: MessageId) -> Result<(), TransportError> {
        let request = self
            .bot
            .pin_chat_message(chat_id, message_id)
            .disable_notification(true);
        self.bounded("pin_chat_message", request.send()).await?;
        Ok(())
    }

    async fn unpin(&self, chat_id: ChatId, message_id: MessageId) -> Result<(), TransportError> {
        let request = self.bot.unpin_chat_message(chat_id).message_id(message_id);
        self.bounded("unpin_chat_message", request.send()).await?;
        Ok(())
    }
}

/// Сообщение, которое уже нельзя редактировать, отличаем от сбоя сети.
fn classify_edit(
    chat_id: ChatId,
    message_id: MessageId,
    result: Result<(), TransportError>,
) -> Result<(), TransportError> {
    match result {
        // Повторный пересчёт с тем же текстом
        Err(TransportError::Request(RequestError::Api(ApiError::MessageNotModified))) => Ok(()),
        Err(TransportError::Request(RequestError::Api(
            api @ (ApiError::MessageToEditNotFound | ApiError::MessageCantBeEdited),
        ))) => Err(TransportError::Rejected {
            chat_id: chat_id.0,
            message_id: message_id.0,
            reason: api.to_string(),
        }),
        other => other,
    }
}

fn inline_markup(rows: &[Vec<InlineButton>]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(rows.iter().map(|row| {
        row.iter()
            .map(|button| InlineKeyboardButton::callback(button.label.clone(), button.data.clone()))
            .collect::<Vec<_>>()
    }))
}

fn reply_markup(keyboard: &Keyboard) -> ReplyMarkup {
    match keyboard {
        Keyboard::Menu(rows) => ReplyMarkup::Keyboard(
            KeyboardMarkup::new(rows.iter().map(|row| {
                row.iter()
                    .map(|label| KeyboardButton::new(label.clone()))
                    .collect::<Vec<_>>()
            }))
            .resize_keyboard(),
        ),
        Keyboard::Inline(rows) => ReplyMarkup::InlineKeyboard(inline_markup(rows)),
        Keyboard::Remove => ReplyMarkup::KeyboardRemove(KeyboardRemove::new()),
    }
}
