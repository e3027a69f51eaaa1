use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use thiserror::Error;

pub const DAYS_AHEAD: usize = 5;
const FIRST_HOUR: u32 = 10;
const HOURS_PER_DAY: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotParseError {
    #[error("not a valid time of day: {0:?}")]
    Time(String),
    #[error("not a valid date: {0:?}")]
    Date(String),
    #[error("{date} {time} does not exist in the salon time zone")]
    Unresolvable { date: NaiveDate, time: NaiveTime },
}

/// Генератор дат и времени записи относительно текущего момента.
#[derive(Debug, Clone, Copy)]
pub struct SlotGenerator {
    offset: FixedOffset,
}

impl SlotGenerator {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }

    /// `count` дней подряд, начиная с сегодняшнего.
    pub fn dates(&self, now: DateTime<Utc>, count: usize) -> Vec<NaiveDate> {
        let today = self.today(now);
        (0..count as i64).map(|i| today + Duration::days(i)).collect()
    }

    pub fn times(&self) -> Vec<NaiveTime> {
        (FIRST_HOUR..FIRST_HOUR + HOURS_PER_DAY)
            .filter_map(|hour| NaiveTime::from_hms_opt(hour, 0, 0))
            .collect()
    }

    /// Только те отметки времени, что ещё не прошли для выбранной даты.
    pub fn available_times(&self, date: NaiveDate, now: DateTime<Utc>) -> Vec<NaiveTime> {
        self.times()
            .into_iter()
            .filter(|time| matches!(self.resolve(date, *time), Ok(at) if at > now))
            .collect()
    }

    pub fn resolve(
        &self,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<DateTime<Utc>, SlotParseError> {
        self.offset
            .from_local_datetime(&date.and_time(time))
            .single()
            .map(|at| at.with_timezone(&Utc))
            .ok_or(SlotParseError::Unresolvable { date, time })
    }
}

pub fn parse_time(raw: &str) -> Result<NaiveTime, SlotParseError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|_| SlotParseError::Time(raw.to_string()))
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, SlotParseError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| SlotParseError::Date(raw.to_string()))
}

pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}
