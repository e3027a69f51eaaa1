//! Диалог записи: салон → услуга → мастер → дата → время → запись.
//!
//! События одного пользователя обрабатываются строго по очереди (у каждого
//! пользователя своя блокировка), разные пользователи не мешают друг другу.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use regex::Regex;
use teloxide::types::ChatId;
use tokio::sync::Mutex;

use crate::models::slot::{self, DAYS_AHEAD};
use crate::models::{Appointment, Catalog, ConversationState, Master, Salon, Service, SlotGenerator};
use crate::store::AppointmentStore;
use crate::summary::{render_user_summary, CANCEL_APPOINTMENT};
use crate::texts;
use crate::transport::{InlineButton, Keyboard, Reply};

pub const DATE_PREFIX: &str = "date_";
pub const TIME_PREFIX: &str = "time_";
pub const BACK_TO_MASTER: &str = "back_to_master";

static TIME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}:\d{2}$").expect("time pattern is valid"));

const WEEKDAYS: [&str; 7] = ["Пн", "Вт", "Ср", "Чт", "Пт", "Сб", "Вс"];

/// Входящее событие от пользователя.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Start,
    Text(String),
    Date(String),
    Time(String),
    Cancel,
    BackToMaster,
    Unknown(String),
}

impl Input {
    /// Свободный текст вида `\d{1,2}:\d{2}` считается вводом времени.
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if TIME_PATTERN.is_match(trimmed) {
            Input::Time(trimmed.to_string())
        } else {
            Input::Text(text.to_string())
        }
    }

    pub fn from_callback(data: &str) -> Self {
        if let Some(date) = data.strip_prefix(DATE_PREFIX) {
            return Input::Date(date.to_string());
        }
        if let Some(time) = data.strip_prefix(TIME_PREFIX) {
            return Input::Time(time.to_string());
        }
        match data {
            CANCEL_APPOINTMENT => Input::Cancel,
            BACK_TO_MASTER => Input::BackToMaster,
            other => Input::Unknown(other.to_string()),
        }
    }
}

/// Что нужно сделать после перехода помимо ответа пользователю.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    Booked(Appointment),
    Cancelled(Appointment),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub reply: Reply,
    pub effect: Effect,
}

impl Transition {
    fn reply(reply: Reply) -> Self {
        Self {
            reply,
            effect: Effect::None,
        }
    }
}

type Session = Arc<Mutex<Option<ConversationState>>>;

pub struct ConversationStateMachine {
    catalog: Arc<Catalog>,
    slots: SlotGenerator,
    store: AppointmentStore,
    sessions: Mutex<HashMap<ChatId, Session>>,
}

impl ConversationStateMachine {
    pub fn new(catalog: Arc<Catalog>, slots: SlotGenerator, store: AppointmentStore) -> Self {
        Self {
            catalog,
            slots,
            store,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Текущий шаг диалога; `None`, если диалога нет или запись оформлена.
    pub async fn state(&self, user_id: ChatId) -> Option<ConversationState> {
        let session = self.sessions.lock().await.get(&user_id).cloned()?;
        let state = session.lock().await;
        state.clone()
    }

    /// Число пользователей с незавершённым диалогом.
    pub async fn active_sessions(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn handle(
        &self,
        user_id: ChatId,
        username: &str,
        input: Input,
        now: DateTime<Utc>,
    ) -> Transition {
        let session = self.session(user_id).await;
        let transition = {
            let mut state = session.lock().await;
            let transition = self.transition(user_id, username, &mut state, input, now).await;
            log::debug!(
                "💬 {} is now at {}",
                user_id,
                state.as_ref().map_or("idle", ConversationState::name)
            );
            transition
        };
        self.release(user_id, session).await;
        transition
    }

    async fn transition(
        &self,
        user_id: ChatId,
        username: &str,
        state: &mut Option<ConversationState>,
        input: Input,
        now: DateTime<Utc>,
    ) -> Transition {
        match input {
            Input::Start => self.start(user_id, state, now).await,
            Input::Cancel => self.cancel(user_id, state).await,
            Input::BackToMaster => match state
                .as_ref()
                .and_then(ConversationState::back_to_master)
            {
                Some(next) => {
                    let reply = match &next {
                        ConversationState::AwaitingMaster { service, .. } => {
                            self.master_prompt(service, texts::CHOOSE_MASTER)
                        }
                        _ => Reply::text(texts::RESTART_REQUIRED),
                    };
                    *state = Some(next);
                    Transition::reply(reply)
                }
                None => Transition::reply(Reply::text(texts::RESTART_REQUIRED)),
            },
            Input::Text(text) => {
                let current = state.take().unwrap_or_default();
                let (next, reply) = self.on_text(current, &text, now);
                *state = Some(next);
                Transition::reply(reply)
            }
            Input::Date(raw) => match state.take() {
                Some(current @ ConversationState::AwaitingDate { .. })
                | Some(current @ ConversationState::AwaitingTime { .. }) => {
                    let (next, reply) = self.on_date(current, &raw, now);
                    *state = Some(next);
                    Transition::reply(reply)
                }
                other => {
                    *state = other;
                    Transition::reply(Reply::text(texts::RESTART_REQUIRED))
                }
            },
            Input::Time(raw) => self.on_time(user_id, username, state, &raw, now).await,
            Input::Unknown(data) => {
                log::debug!("Unknown callback {:?} from {}", data, user_id);
                Transition::reply(Reply::text(texts::UNKNOWN_ACTION))
            }
        }
    }

    async fn session(&self, user_id: ChatId) -> Session {
        let mut sessions = self.sessions.lock().await;
        sessions.entry(user_id).or_default().clone()
    }

    /// Убирает пустую сессию, если её больше никто не ждёт.
    async fn release(&self, user_id: ChatId, session: Session) {
        let mut sessions = self.sessions.lock().await;
        // ссылки держат только карта и этот вызов
        if Arc::strong_count(&session) != 2 {
            return;
        }
        let idle = session.try_lock().map(|state| state.is_none()).unwrap_or(false);
        if idle {
            sessions.remove(&user_id);
        }
    }

    async fn start(
        &self,
        user_id: ChatId,
        state: &mut Option<ConversationState>,
        now: DateTime<Utc>,
    ) -> Transition {
        if let Some(appointment) = self.store.get(user_id).await.filter(|a| a.is_future(now)) {
            *state = None;
            let (summary, keyboard) = render_user_summary(&appointment);
            return Transition::reply(Reply::with_keyboard(
                format!("{}\n\n{}", texts::ALREADY_BOOKED, summary),
                keyboard,
            ));
        }

        *state = Some(ConversationState::AwaitingSalon);
        Transition::reply(self.salon_prompt(texts::CHOOSE_SALON))
    }

    async fn cancel(&self, user_id: ChatId, state: &mut Option<ConversationState>) -> Transition {
        *state = None;
        match self.store.cancel(user_id).await {
            Ok(Some(appointment)) => Transition {
                reply: Reply::with_keyboard(texts::CANCELLED, Keyboard::Remove),
                effect: Effect::Cancelled(appointment),
            },
            Ok(None) => Transition::reply(Reply::text(texts::NOTHING_TO_CANCEL)),
            Err(e) => {
                log::error!("Error cancelling appointment for {}: {}", user_id, e);
                Transition::reply(Reply::text(texts::CANCEL_FAILED))
            }
        }
    }

    fn on_text(
        &self,
        current: ConversationState,
        text: &str,
        now: DateTime<Utc>,
    ) -> (ConversationState, Reply) {
        match current {
            ConversationState::AwaitingSalon => match self.catalog.find_salon(text) {
                Some(salon) => (
                    ConversationState::AwaitingService {
                        salon: salon.clone(),
                    },
                    self.service_prompt(texts::CHOOSE_SERVICE),
                ),
                None => (
                    ConversationState::AwaitingSalon,
                    self.salon_prompt(texts::CHOOSE_SALON_AGAIN),
                ),
            },
            ConversationState::AwaitingService { salon } => {
                if text.trim() == texts::SHOW_ALL_SERVICES {
                    let reply = self.all_services();
                    return (ConversationState::AwaitingService { salon }, reply);
                }
                match self.catalog.find_service(text) {
                    Some(service) => {
                        let reply = self.master_prompt(service, texts::CHOOSE_MASTER);
                        (
                            ConversationState::AwaitingMaster {
                                salon,
                                service: service.clone(),
                            },
                            reply,
                        )
                    }
                    None => (
                        ConversationState::AwaitingService { salon },
                        self.service_prompt(texts::CHOOSE_SERVICE_AGAIN),
                    ),
                }
            }
            ConversationState::AwaitingMaster { salon, service } => {
                match self.catalog.find_master(&service, text).cloned() {
                    Some(master) => (
                        ConversationState::AwaitingDate {
                            salon,
                            service,
                            master,
                        },
                        self.date_prompt(now, texts::CHOOSE_DATE),
                    ),
                    None => {
                        let reply = self.master_prompt(&service, texts::CHOOSE_MASTER_AGAIN);
                        (ConversationState::AwaitingMaster { salon, service }, reply)
                    }
                }
            }
            current @ ConversationState::AwaitingDate { .. } => {
                (current, self.date_prompt(now, texts::CHOOSE_DATE_AGAIN))
            }
            ConversationState::AwaitingTime {
                salon,
                service,
                master,
                date,
            } => {
                let reply = self.time_prompt(date, now, texts::CHOOSE_TIME_AGAIN);
                (
                    ConversationState::AwaitingTime {
                        salon,
                        service,
                        master,
                        date,
                    },
                    reply,
                )
            }
        }
    }

    fn on_date(
        &self,
        current: ConversationState,
        raw: &str,
        now: DateTime<Utc>,
    ) -> (ConversationState, Reply) {
        let (salon, service, master) = match current {
            ConversationState::AwaitingDate {
                salon,
                service,
                master,
            } => (salon, service, master),
            ConversationState::AwaitingTime {
                salon,
                service,
                master,
                date,
            } => {
                // Дата уже выбрана, ждём время
                let reply = self.time_prompt(date, now, texts::CHOOSE_TIME_AGAIN);
                return (
                    ConversationState::AwaitingTime {
                        salon,
                        service,
                        master,
                        date,
                    },
                    reply,
                );
            }
            other => return (other, Reply::text(texts::RESTART_REQUIRED)),
        };

        let offered = self.slots.dates(now, DAYS_AHEAD);
        let date = match slot::parse_date(raw) {
            Ok(date) if offered.contains(&date) => date,
            _ => {
                return (
                    ConversationState::AwaitingDate {
                        salon,
                        service,
                        master,
                    },
                    self.date_prompt(now, texts::CHOOSE_DATE_AGAIN),
                )
            }
        };

        if self.slots.available_times(date, now).is_empty() {
            return (
                ConversationState::AwaitingDate {
                    salon,
                    service,
                    master,
                },
                self.date_prompt(now, texts::NO_TIMES_LEFT),
            );
        }

        let reply = self.time_prompt(date, now, texts::CHOOSE_TIME);
        (
            ConversationState::AwaitingTime {
                salon,
                service,
                master,
                date,
            },
            reply,
        )
    }

    async fn on_time(
        &self,
        user_id: ChatId,
        username: &str,
        state: &mut Option<ConversationState>,
        raw: &str,
        now: DateTime<Utc>,
    ) -> Transition {
        let Some(ConversationState::AwaitingTime {
            salon,
            service,
            master,
            date,
        }) = state.as_ref()
        else {
            return Transition::reply(Reply::text(texts::RESTART_REQUIRED));
        };
        let date = *date;

        // Пока пользователь выбирал, все отметки на эту дату прошли
        if self.slots.available_times(date, now).is_empty() {
            *state = Some(ConversationState::AwaitingDate {
                salon: salon.clone(),
                service: service.clone(),
                master: master.clone(),
            });
            return Transition::reply(self.date_prompt(now, texts::NO_TIMES_LEFT));
        }

        let time = match slot::parse_time(raw) {
            Ok(time) => time,
            Err(_) => {
                return Transition::reply(self.time_prompt(date, now, texts::TIME_UNPARSABLE))
            }
        };
        if !self.slots.times().contains(&time) {
            return Transition::reply(self.time_prompt(date, now, texts::CHOOSE_TIME_AGAIN));
        }
        let starts_at = match self.slots.resolve(date, time) {
            Ok(starts_at) => starts_at,
            Err(_) => {
                return Transition::reply(self.time_prompt(date, now, texts::TIME_UNPARSABLE))
            }
        };
        if starts_at <= now {
            return Transition::reply(self.time_prompt(date, now, texts::CHOOSE_TIME_AGAIN));
        }

        let appointment = Appointment {
            user_id,
            username: username.to_string(),
            salon: salon.clone(),
            service: service.clone(),
            master: master.clone(),
            date,
            time,
            starts_at,
            created_at: now,
        };

        match self.store.put(user_id, appointment.clone()).await {
            Ok(_) => {
                *state = None;
                log::info!(
                    "✅ Booking committed for {}: {} {}",
                    user_id,
                    appointment.slot_label(),
                    appointment.service.name
                );
                Transition {
                    reply: Reply::with_keyboard(texts::BOOKED, Keyboard::Remove),
                    effect: Effect::Booked(appointment),
                }
            }
            Err(e) => {
                log::error!("Error saving appointment for {}: {}", user_id, e);
                Transition::reply(self.time_prompt(date, now, texts::BOOKING_FAILED))
            }
        }
    }

    fn salon_prompt(&self, text: &str) -> Reply {
        let rows = self
            .catalog
            .salons()
            .iter()
            .map(|salon: &Salon| vec![salon.name.clone()])
            .collect();
        Reply::with_keyboard(text, Keyboard::Menu(rows))
    }

    fn service_prompt(&self, text: &str) -> Reply {
        let mut rows: Vec<Vec<String>> = self
            .catalog
            .services()
            .iter()
            .map(|service: &Service| vec![service.name.clone()])
            .collect();
        rows.push(vec![texts::SHOW_ALL_SERVICES.to_string()]);
        Reply::with_keyboard(text, Keyboard::Menu(rows))
    }

    fn all_services(&self) -> Reply {
        let lines: Vec<String> = self
            .catalog
            .services()
            .iter()
            .map(|s| format!("• {} — {}", s.name, s.duration))
            .collect();
        Reply::text(format!("{}\n\n{}", texts::ALL_SERVICES_HEADER, lines.join("\n")))
    }

    fn master_prompt(&self, service: &Service, text: &str) -> Reply {
        let rows = self
            .catalog
            .masters_for(service)
            .iter()
            .map(|master: &Master| vec![master.label()])
            .collect();
        Reply::with_keyboard(text, Keyboard::Menu(rows))
    }

    fn date_prompt(&self, now: DateTime<Utc>, text: &str) -> Reply {
        let rows = self
            .slots
            .dates(now, DAYS_AHEAD)
            .into_iter()
            .map(|date| {
                let data = format!("{}{}", DATE_PREFIX, date.format("%Y-%m-%d"));
                vec![InlineButton::new(date_label(date), data)]
            })
            .collect();
        Reply::with_keyboard(text, Keyboard::Inline(rows))
    }

    fn time_prompt(&self, date: NaiveDate, now: DateTime<Utc>, text: &str) -> Reply {
        let times: Vec<InlineButton> = self
            .slots
            .available_times(date, now)
            .into_iter()
            .map(|time| {
                let label = slot::format_time(time);
                InlineButton::new(label.clone(), format!("{}{}", TIME_PREFIX, label))
            })
            .collect();

        let mut rows = Vec::new();
        if !times.is_empty() {
            rows.push(times);
        }
        rows.push(vec![InlineButton::new(texts::BACK_TO_MASTER, BACK_TO_MASTER)]);
        Reply::with_keyboard(text, Keyboard::Inline(rows))
    }
}

/// "10.06.2024 (Пн)"
fn date_label(date: NaiveDate) -> String {
    let weekday = WEEKDAYS[date.weekday().num_days_from_monday() as usize];
    format!("{} ({})", date.format("%d.%m.%Y"), weekday)
}
