use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use teloxide::types::ChatId;

use super::catalog::{Master, Salon, Service};

/// Единственная активная запись пользователя.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub user_id: ChatId,
    pub username: String,
    pub salon: Salon,
    pub service: Service,
    pub master: Master,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub starts_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    pub fn is_future(&self, now: DateTime<Utc>) -> bool {
        self.starts_at > now
    }

    /// "2024-06-10 11:00"
    pub fn slot_label(&self) -> String {
        format!("{} {}", self.date.format("%Y-%m-%d"), self.time.format("%H:%M"))
    }
}
