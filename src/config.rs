use chrono_tz::Tz;
use serde::Deserialize;
use std::env;
use std::str::FromStr;

pub const DEFAULT_TIMEZONE: &str = "UTC";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub default_timezone: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()?;

        let mut config: Config = cfg.try_deserialize()?;

        // Устанавливаем временную зону клиентов по умолчанию, если не указана
        if config.default_timezone.is_none() {
            config.default_timezone = Some(DEFAULT_TIMEZONE.to_string());
        }

        config.validate()?;

        Ok(config)
    }

    /// Получает временную зону по умолчанию для новых клиентов
    pub fn get_default_timezone(&self) -> Result<Tz, chrono_tz::ParseError> {
        self.default_timezone
            .as_deref()
            .unwrap_or(DEFAULT_TIMEZONE)
            .parse::<Tz>()
    }

    pub fn database_settings(&self) -> DatabaseSettings {
        DatabaseSettings::default_from_url(self.database_url.clone())
    }

    /// Валидирует конфигурацию
    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "DATABASE_URL must not be empty".to_string(),
            ));
        }

        if let Some(tz_str) = &self.default_timezone {
            if crate::validation::validate_timezone(tz_str).is_err() {
                return Err(config::ConfigError::Message(format!(
                    "Invalid timezone: {}",
                    tz_str
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub connect_timeout_secs: Option<u64>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
    pub sql_log: Option<bool>,
}

impl DatabaseSettings {
    pub fn default_from_url(url: String) -> Self {
        Self {
            url,
            max_connections: parse_env_var("DATABASE_MAX_CONNECTIONS"),
            min_connections: parse_env_var("DATABASE_MIN_CONNECTIONS"),
            connect_timeout_secs: parse_env_var("DATABASE_CONNECT_TIMEOUT_SECS"),
            acquire_timeout_secs: parse_env_var("DATABASE_ACQUIRE_TIMEOUT_SECS"),
            idle_timeout_secs: parse_env_var("DATABASE_IDLE_TIMEOUT_SECS"),
            sql_log: parse_env_var("DATABASE_SQL_LOG"),
        }
    }

    /// Настройки для отдельной SQLite базы в памяти.
    ///
    /// Каждое подключение пула открыло бы свою пустую базу в памяти,
    /// поэтому пул ограничен одним подключением.
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: Some(1),
            min_connections: Some(1),
            connect_timeout_secs: None,
            acquire_timeout_secs: None,
            idle_timeout_secs: None,
            sql_log: Some(false),
        }
    }
}

fn parse_env_var<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    env::var(key).ok().and_then(|value| value.parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str, tz: Option<&str>) -> Config {
        Config {
            database_url: url.to_string(),
            default_timezone: tz.map(str::to_string),
        }
    }

    #[test]
    fn accepts_known_timezone() {
        let cfg = config("sqlite::memory:", Some("Europe/Moscow"));
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.get_default_timezone().unwrap(), chrono_tz::Europe::Moscow);
    }

    #[test]
    fn rejects_unknown_timezone() {
        let cfg = config("sqlite::memory:", Some("Mars/Olympus"));
        assert!(cfg.validate().is_err());
        assert!(config("sqlite::memory:", Some("W-SU")).validate().is_err());
    }

    #[test]
    fn rejects_empty_url() {
        assert!(config("  ", None).validate().is_err());
    }

    #[test]
    fn missing_timezone_falls_back_to_utc() {
        let cfg = config("sqlite::memory:", None);
        assert_eq!(cfg.get_default_timezone().unwrap(), chrono_tz::UTC);
    }
}
