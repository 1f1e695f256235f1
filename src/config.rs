use std::env;
use std::time::Duration;

use chrono::FixedOffset;

use crate::engine::ScoringSettings;
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    /// OSRM base URL; unset means distances are always estimated.
    pub routing_url: Option<String>,
    pub routing_profile: String,
    pub routing_timeout_ms: u64,
    pub scoring_concurrency: usize,
    pub default_rank_limit: usize,
    /// Local offset that decides where a scheduling day starts.
    pub day_offset: FixedOffset,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            routing_url: env::var("ROUTING_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            routing_profile: env::var("ROUTING_PROFILE").unwrap_or_else(|_| "driving".to_string()),
            routing_timeout_ms: parse_or_default("ROUTING_TIMEOUT_MS", 2000)?,
            scoring_concurrency: parse_or_default("SCORING_CONCURRENCY", 8)?,
            default_rank_limit: parse_or_default("DEFAULT_RANK_LIMIT", 5)?,
            day_offset: day_offset(parse_or_default("DAY_UTC_OFFSET_MINUTES", 0)?)?,
        })
    }

    pub fn routing_timeout(&self) -> Duration {
        Duration::from_millis(self.routing_timeout_ms)
    }

    pub fn scoring_settings(&self) -> ScoringSettings {
        ScoringSettings {
            routing_timeout: self.routing_timeout(),
            concurrency: self.scoring_concurrency.max(1),
            day_offset: self.day_offset,
        }
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}

fn day_offset(minutes: i32) -> Result<FixedOffset, AppError> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| {
            AppError::Internal(format!("invalid DAY_UTC_OFFSET_MINUTES: {minutes} out of range"))
        })
}
