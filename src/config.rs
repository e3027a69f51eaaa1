use std::env;
use std::time::Duration;

use chrono::FixedOffset;
use teloxide::types::ChatId;

use crate::error::ConfigError;

const DEFAULT_DATABASE_URL: &str = "sqlite://beauty_time.db?mode=rwc";
const DEFAULT_PLATFORM_TIMEOUT_SECS: u64 = 10;
const DEFAULT_UTC_OFFSET_HOURS: i32 = 3;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Параметры запуска бота. Токен Telegram читает сам `Bot::from_env`.
#[derive(Debug, Clone)]
pub struct Config {
    pub admin_chat_id: ChatId,
    pub database_url: String,
    pub platform_timeout: Duration,
    pub utc_offset: FixedOffset,
    pub sweep_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let admin_raw = lookup("ADMIN_CHAT_ID").ok_or(ConfigError::Missing("ADMIN_CHAT_ID"))?;
        let admin_chat_id = admin_raw
            .trim()
            .parse::<i64>()
            .map(ChatId)
            .map_err(|_| ConfigError::Invalid {
                name: "ADMIN_CHAT_ID",
                value: admin_raw.clone(),
            })?;

        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let timeout_secs =
            parse_or(&lookup, "PLATFORM_TIMEOUT_SECS", DEFAULT_PLATFORM_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "PLATFORM_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }

        let offset_hours = parse_or(&lookup, "UTC_OFFSET_HOURS", DEFAULT_UTC_OFFSET_HOURS)?;
        let utc_offset = FixedOffset::east_opt(offset_hours * 3600).ok_or(ConfigError::Invalid {
            name: "UTC_OFFSET_HOURS",
            value: offset_hours.to_string(),
        })?;

        let sweep_secs = parse_or(&lookup, "SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS)?;

        Ok(Config {
            admin_chat_id,
            database_url,
            platform_timeout: Duration::from_secs(timeout_secs),
            utc_offset,
            sweep_interval: Duration::from_secs(sweep_secs.max(1)),
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::Invalid { name, value: raw }),
        None => Ok(default),
    }
}
