use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::services::sessions::SessionSettings;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    /// Без DATABASE_URL брони хранятся в памяти процесса
    pub database: Option<DatabaseConfig>,
    /// Без REDIS_URL удержания хранятся в памяти процесса
    pub redis: Option<RedisConfig>,
    pub booking: BookingConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    /// "json" или "pretty"
    pub log_format: String,
}

// Настройки базы данных
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

// Настройки Redis
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

// Настройки выбора мест и сессий
#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    pub hold_ttl_seconds: u64,
    pub session_ttl_seconds: u64,
    pub cleanup_interval_seconds: u64,
    pub default_max_seats: usize,
    pub demo_occupancy: bool,
    pub catalog_path: Option<String>,
}

impl BookingConfig {
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            hold_ttl: Duration::from_secs(self.hold_ttl_seconds),
            session_ttl: Duration::from_secs(self.session_ttl_seconds),
            default_max_seats: self.default_max_seats,
            demo_occupancy: self.demo_occupancy,
        }
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_seconds.max(1))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{name} must be {expected}, got {value:?}")]
pub struct ConfigError {
    pub name: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database = match non_empty("DATABASE_URL") {
            Some(url) => Some(DatabaseConfig {
                url,
                pool_size: parse("DB_POOL_SIZE", var("DB_POOL_SIZE", "20"), "a valid number")?,
            }),
            None => None,
        };

        Ok(Config {
            app: AppConfig {
                host: var("HOST", "0.0.0.0"),
                port: parse("PORT", var("PORT", "8000"), "a valid port")?,
                environment: var("ENVIRONMENT", "development"),
                rust_log: var("RUST_LOG", "seat_booking=debug,tower_http=debug"),
                log_format: var("LOG_FORMAT", "pretty"),
            },
            database,
            redis: non_empty("REDIS_URL").map(|url| RedisConfig { url }),
            booking: BookingConfig {
                hold_ttl_seconds: parse("HOLD_TTL_SECONDS", var("HOLD_TTL_SECONDS", "300"), "a valid number")?,
                session_ttl_seconds: parse(
                    "SESSION_TTL_SECONDS",
                    var("SESSION_TTL_SECONDS", "900"),
                    "a valid number",
                )?,
                cleanup_interval_seconds: parse(
                    "CLEANUP_INTERVAL_SECONDS",
                    var("CLEANUP_INTERVAL_SECONDS", "60"),
                    "a valid number",
                )?,
                default_max_seats: parse("DEFAULT_MAX_SEATS", var("DEFAULT_MAX_SEATS", "8"), "a valid number")?,
                demo_occupancy: parse("DEMO_OCCUPANCY", var("DEMO_OCCUPANCY", "false"), "true or false")?,
                catalog_path: non_empty("CATALOG_PATH"),
            },
        })
    }
}

fn parse<T: FromStr>(name: &'static str, value: String, expected: &'static str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError { name, value, expected })
}
