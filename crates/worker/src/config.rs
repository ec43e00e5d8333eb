use std::str::FromStr;
use std::time::Duration;

/// Errors raised while reading the worker configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("expected 'pretty' or 'json', got '{other}'")),
        }
    }
}

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    /// How often every public channel's playback state is recomputed.
    pub tick_interval: Duration,
    /// Pre-load the next item once fewer seconds than this remain.
    pub preload_window_secs: i64,
    pub run_migrations: bool,
    pub log_format: LogFormat,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var               | Default    |
    /// |-----------------------|------------|
    /// | `DATABASE_URL`        | (required) |
    /// | `DB_MAX_CONNECTIONS`  | `10`       |
    /// | `TICK_INTERVAL_SECS`  | `5`        |
    /// | `PRELOAD_WINDOW_SECS` | `10`       |
    /// | `RUN_MIGRATIONS`      | `true`     |
    /// | `LOG_FORMAT`          | `pretty`   |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let db_max_connections: u32 = parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?;
        if db_max_connections == 0 {
            return Err(invalid("DB_MAX_CONNECTIONS", "0", "must be at least 1"));
        }

        let tick_interval_secs: u64 = parse_or(&lookup, "TICK_INTERVAL_SECS", 5)?;
        if tick_interval_secs == 0 {
            return Err(invalid("TICK_INTERVAL_SECS", "0", "must be at least 1"));
        }

        let preload_window_secs: i64 = parse_or(&lookup, "PRELOAD_WINDOW_SECS", 10)?;
        if preload_window_secs < 0 {
            return Err(invalid(
                "PRELOAD_WINDOW_SECS",
                &preload_window_secs.to_string(),
                "must not be negative",
            ));
        }

        Ok(Self {
            database_url,
            db_max_connections,
            tick_interval: Duration::from_secs(tick_interval_secs),
            preload_window_secs,
            run_migrations: parse_or(&lookup, "RUN_MIGRATIONS", true)?,
            log_format: parse_or(&lookup, "LOG_FORMAT", LogFormat::Pretty)?,
        })
    }
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e: T::Err| invalid(var, &value, &e.to_string())),
    }
}
