use std::env;

use chrono::{FixedOffset, NaiveTime, Offset, Utc};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Supabase,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub clinic_utc_offset_minutes: i32,
    pub migration_time: NaiveTime,
    pub migration_enabled: bool,
    pub storage_backend: StorageBackend,
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub notification_webhook_url: Option<String>,
    pub notification_timeout_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            clinic_utc_offset_minutes: 330,
            migration_time: NaiveTime::from_hms_opt(0, 1, 0).unwrap_or(NaiveTime::MIN),
            migration_enabled: true,
            storage_backend: StorageBackend::Memory,
            supabase_url: String::new(),
            supabase_service_key: String::new(),
            notification_webhook_url: None,
            notification_timeout_seconds: 5,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| {
                warn!("BIND_ADDR not set, using {}", defaults.bind_addr);
                defaults.bind_addr.clone()
            }),
            clinic_utc_offset_minutes: parse_or_default(
                "CLINIC_UTC_OFFSET_MINUTES",
                defaults.clinic_utc_offset_minutes,
            ),
            migration_time: env::var("MIGRATION_TIME")
                .ok()
                .and_then(|raw| NaiveTime::parse_from_str(&raw, "%H:%M").ok())
                .unwrap_or_else(|| {
                    warn!("MIGRATION_TIME not set or not HH:MM, using 00:01");
                    defaults.migration_time
                }),
            migration_enabled: parse_or_default("MIGRATION_ENABLED", defaults.migration_enabled),
            storage_backend: match env::var("STORAGE_BACKEND").as_deref() {
                Ok("supabase") => StorageBackend::Supabase,
                Ok("memory") => StorageBackend::Memory,
                Ok(other) => {
                    warn!("Unknown STORAGE_BACKEND '{}', falling back to memory", other);
                    StorageBackend::Memory
                }
                Err(_) => StorageBackend::Memory,
            },
            supabase_url: env::var("SUPABASE_URL").unwrap_or_else(|_| {
                warn!("SUPABASE_URL not set, using empty value");
                String::new()
            }),
            supabase_service_key: env::var("SUPABASE_SERVICE_KEY").unwrap_or_else(|_| {
                warn!("SUPABASE_SERVICE_KEY not set, using empty value");
                String::new()
            }),
            notification_webhook_url: env::var("NOTIFICATION_WEBHOOK_URL")
                .ok()
                .filter(|url| !url.is_empty()),
            notification_timeout_seconds: parse_or_default(
                "NOTIFICATION_TIMEOUT_SECONDS",
                defaults.notification_timeout_seconds,
            ),
        };

        if config.storage_backend == StorageBackend::Supabase && !config.is_supabase_configured() {
            warn!("Supabase storage selected but SUPABASE_URL/SUPABASE_SERVICE_KEY are missing");
        }

        config
    }

    pub fn is_supabase_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_service_key.is_empty()
    }

    /// Offset used to derive clinic-local calendar dates.
    pub fn clinic_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.clinic_utc_offset_minutes * 60).unwrap_or_else(|| {
            warn!(
                "CLINIC_UTC_OFFSET_MINUTES={} is out of range, using UTC",
                self.clinic_utc_offset_minutes
            );
            Utc.fix()
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{}='{}' could not be parsed, using {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
