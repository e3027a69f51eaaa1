//! Общая обвязка интеграционных тестов: записывающий транспорт и сборка ядра.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use beauty_time_bot::database::Database;
use beauty_time_bot::error::TransportError;
use beauty_time_bot::machine::{Input, Transition};
use beauty_time_bot::models::{Catalog, SlotGenerator};
use beauty_time_bot::store::{AppointmentStore, SqlitePinRegistry};
use beauty_time_bot::transport::{ChatTransport, Keyboard};
use beauty_time_bot::{ConversationStateMachine, PinnedSummaryBroadcaster};
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use teloxide::types::{ChatId, MessageId};
use tempfile::TempDir;
use tokio::sync::mpsc;

pub const ADMIN: ChatId = ChatId(-1000);
pub const SALON: &str = "BeautyTime на Тверской";
pub const BROWS: &str = "Оформление бровей";
pub const HENNA: &str = "Окрашивание хной";
pub const MARIA: &str = "Мария ⭐4.8";

/// 2024-06-09 12:00 по местному времени (UTC+3).
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 9, 9, 0, 0).unwrap()
}

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Send(ChatId),
    Edit(ChatId, MessageId, String),
    Pin(ChatId, MessageId),
    Unpin(ChatId, MessageId),
}

#[derive(Default)]
struct FakeState {
    next_id: i32,
    messages: HashMap<(i64, i32), SentMessage>,
    pinned: HashSet<(i64, i32)>,
    calls: Vec<Call>,
    offline: bool,
    failing_pins: usize,
}

/// Транспорт в памяти: помнит сообщения, закрепы и все вызовы.
#[derive(Default)]
pub struct FakeTransport {
    state: Mutex<FakeState>,
}

impl FakeTransport {
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().unwrap().offline = offline;
    }

    /// Следующие `count` вызовов `pin` завершатся таймаутом.
    pub fn fail_next_pins(&self, count: usize) {
        self.state.lock().unwrap().failing_pins = count;
    }

    /// Сообщение удалено кем-то вне бота.
    pub fn delete_message(&self, chat_id: ChatId, message_id: MessageId) {
        let mut state = self.state.lock().unwrap();
        state.messages.remove(&(chat_id.0, message_id.0));
        state.pinned.remove(&(chat_id.0, message_id.0));
    }

    pub fn pinned(&self, chat_id: ChatId) -> Vec<(MessageId, SentMessage)> {
        let state = self.state.lock().unwrap();
        let mut pinned: Vec<(MessageId, SentMessage)> = state
            .pinned
            .iter()
            .filter(|(chat, _)| *chat == chat_id.0)
            .filter_map(|key| state.messages.get(key).map(|m| (MessageId(key.1), m.clone())))
            .collect();
        pinned.sort_by_key(|(id, _)| id.0);
        pinned
    }

    pub fn pinned_text(&self, chat_id: ChatId) -> Option<String> {
        let pinned = self.pinned(chat_id);
        assert!(pinned.len() <= 1, "more than one pin in {chat_id}: {pinned:?}");
        pinned.into_iter().next().map(|(_, m)| m.text)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn sends_to(&self, chat_id: ChatId) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Send(chat) if *chat == chat_id))
            .count()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    fn offline_error(chat_id: ChatId, message_id: i32) -> TransportError {
        TransportError::Rejected {
            chat_id: chat_id.0,
            message_id,
            reason: "offline".to_string(),
        }
    }
}

#[async_trait]
impl ChatTransport for FakeTransport {
    async fn send(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageId, TransportError> {
        let mut state = self.state.lock().unwrap();
        if state.offline {
            return Err(Self::offline_error(chat_id, 0));
        }
        state.next_id += 1;
        let id = state.next_id;
        state.messages.insert(
            (chat_id.0, id),
            SentMessage {
                text: text.to_string(),
                keyboard: keyboard.cloned(),
            },
        );
        state.calls.push(Call::Send(chat_id));
        Ok(MessageId(id))
    }

    async fn edit(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        if state.offline {
            return Err(Self::offline_error(chat_id, message_id.0));
        }
        state
            .calls
            .push(Call::Edit(chat_id, message_id, text.to_string()));
        match state.messages.get_mut(&(chat_id.0, message_id.0)) {
            Some(message) => {
                message.text = text.to_string();
                message.keyboard = keyboard.cloned();
                Ok(())
            }
            None => Err(TransportError::Rejected {
                chat_id: chat_id.0,
                message_id: message_id.0,
                reason: "message to edit not found".to_string(),
            }),
        }
    }

    async fn pin(&self, chat_id: ChatId, message_id: MessageId) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        if state.offline {
            return Err(Self::offline_error(chat_id, message_id.0));
        }
        state.calls.push(Call::Pin(chat_id, message_id));
        if state.failing_pins > 0 {
            state.failing_pins -= 1;
            return Err(TransportError::Timeout(Duration::from_secs(10)));
        }
        state.pinned.insert((chat_id.0, message_id.0));
        Ok(())
    }

    async fn unpin(&self, chat_id: ChatId, message_id: MessageId) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        if state.offline {
            return Err(Self::offline_error(chat_id, message_id.0));
        }
        state.calls.push(Call::Unpin(chat_id, message_id));
        if state.pinned.remove(&(chat_id.0, message_id.0)) {
            Ok(())
        } else {
            Err(TransportError::Rejected {
                chat_id: chat_id.0,
                message_id: message_id.0,
                reason: "message is not pinned".to_string(),
            })
        }
    }
}

pub struct Harness {
    pub dir: TempDir,
    pub db: Database,
    pub store: AppointmentStore,
    pub machine: Arc<ConversationStateMachine>,
    pub broadcaster: PinnedSummaryBroadcaster,
    pub transport: Arc<FakeTransport>,
    changes: mpsc::UnboundedReceiver<ChatId>,
}

pub fn slots() -> SlotGenerator {
    SlotGenerator::new(FixedOffset::east_opt(3 * 3600).unwrap())
}

async fn open_db(dir: &TempDir) -> Database {
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("bot.db").display());
    let db = Database::new(&url).await.unwrap();
    db.init().await.unwrap();
    db
}

impl Harness {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        Self::open(dir, Arc::new(FakeTransport::default())).await
    }

    /// Поднимает ядро поверх существующей базы, как после рестарта процесса.
    pub async fn open(dir: TempDir, transport: Arc<FakeTransport>) -> Self {
        let db = open_db(&dir).await;
        let (tx, changes) = mpsc::unbounded_channel();
        let store = AppointmentStore::load(db.clone())
            .await
            .unwrap()
            .with_change_feed(tx);
        let registry = Arc::new(SqlitePinRegistry::new(db.clone()));
        let broadcaster =
            PinnedSummaryBroadcaster::new(transport.clone(), registry, store.clone(), ADMIN);
        let machine = Arc::new(ConversationStateMachine::new(
            Arc::new(Catalog::default()),
            slots(),
            store.clone(),
        ));

        Self {
            dir,
            db,
            store,
            machine,
            broadcaster,
            transport,
            changes,
        }
    }

    pub async fn restart(self) -> Self {
        let Harness {
            dir, db, transport, ..
        } = self;
        db.pool.close().await;
        Self::open(dir, transport).await
    }

    /// Применяет накопившиеся изменения хранилища к закрепам.
    pub async fn settle(&mut self, now: DateTime<Utc>) {
        let mut users = Vec::new();
        while let Ok(user) = self.changes.try_recv() {
            if !users.contains(&user) {
                users.push(user);
            }
        }
        self.broadcaster.apply_changes(&users, now).await;
    }

    pub async fn send(&self, user: ChatId, input: Input) -> Transition {
        self.send_at(user, input, now()).await
    }

    pub async fn send_at(&self, user: ChatId, input: Input, at: DateTime<Utc>) -> Transition {
        self.machine
            .handle(user, &format!("@user{}", user.0), input, at)
            .await
    }

    pub async fn text(&self, user: ChatId, text: &str) -> Transition {
        self.send(user, Input::from_text(text)).await
    }

    pub async fn callback(&self, user: ChatId, data: &str) -> Transition {
        self.send(user, Input::from_callback(data)).await
    }

    /// Полный проход диалога до выбора времени включительно.
    pub async fn book(
        &self,
        user: ChatId,
        service: &str,
        master: &str,
        date: &str,
        time: &str,
    ) -> Transition {
        self.text(user, SALON).await;
        self.text(user, service).await;
        self.text(user, master).await;
        self.callback(user, &format!("date_{date}")).await;
        self.callback(user, &format!("time_{time}")).await
    }
}
