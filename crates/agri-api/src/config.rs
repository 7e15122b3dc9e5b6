//! # Service Configuration
//!
//! Everything the server reads from its environment at startup. Values are
//! parsed once into [`AppConfig`]; a malformed value stops startup with a
//! [`ConfigError`] naming the variable.
//!
//! | Variable                       | Default               |
//! |--------------------------------|-----------------------|
//! | `PORT`                         | `8080`                |
//! | `AGRI_AUTH_TOKEN`              | unset (auth disabled) |
//! | `DATABASE_URL`                 | unset (in-memory)     |
//! | `AGRI_METRICS_ENABLED`         | `true`                |
//! | `AGRI_RATE_LIMIT_MAX`          | `1000`                |
//! | `AGRI_RATE_LIMIT_WINDOW_SECS`  | `60`                  |
//! | `AGRI_MAIL_ENABLED`            | `true`                |
//! | `AGRI_SMTP_HOST`               | unset (log-only mail) |
//! | `AGRI_SMTP_PORT`               | `587`                 |
//! | `AGRI_SMTP_USERNAME` / `AGRI_SMTP_PASSWORD` | unset    |
//! | `AGRI_SMTP_STARTTLS`           | `true`                |
//! | `AGRI_MAIL_FROM`               | `no-reply@agri.local` |
//! | `AGRI_LOG_FORMAT`              | `text`                |

use std::str::FromStr;

use thiserror::Error;

/// A variable was present but could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid value for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub reason: String,
}

/// Log line format for the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("expected \"text\" or \"json\", got \"{other}\"")),
        }
    }
}

/// Fixed-window request limit applied per caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub max_requests: u64,
    pub window_secs: u64,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            max_requests: 1000,
            window_secs: 60,
        }
    }
}

/// Outbound mail settings. Custom `Debug` redacts the SMTP password.
#[derive(Clone, PartialEq, Eq)]
pub struct MailConfig {
    pub enabled: bool,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub starttls: bool,
    pub from: String,
}

impl MailConfig {
    /// Whether mail should go out over SMTP rather than to the log.
    pub fn uses_smtp(&self) -> bool {
        self.enabled && self.smtp_host.is_some()
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            smtp_host: None,
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            starttls: true,
            from: "no-reply@agri.local".to_string(),
        }
    }
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("enabled", &self.enabled)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &self.smtp_password.as_ref().map(|_| "[REDACTED]"))
            .field("starttls", &self.starttls)
            .field("from", &self.from)
            .finish()
    }
}

/// Application configuration.
///
/// Custom `Debug` redacts the auth token and the database URL, which may
/// carry credentials.
#[derive(Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Static bearer secret. `None` disables authentication.
    pub auth_token: Option<String>,
    pub database_url: Option<String>,
    pub metrics_enabled: bool,
    pub rate_limit: RateLimit,
    pub mail: MailConfig,
    pub log_format: LogFormat,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("metrics_enabled", &self.metrics_enabled)
            .field("rate_limit", &self.rate_limit)
            .field("mail", &self.mail)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            database_url: None,
            metrics_enabled: true,
            rate_limit: RateLimit::default(),
            mail: MailConfig::default(),
            log_format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read the configuration through `lookup`, which returns the raw value
    /// of a variable if it is set. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let mail = MailConfig {
            enabled: parse_bool(&get, "AGRI_MAIL_ENABLED", defaults.mail.enabled)?,
            smtp_host: get("AGRI_SMTP_HOST"),
            smtp_port: parse(&get, "AGRI_SMTP_PORT", defaults.mail.smtp_port)?,
            smtp_username: get("AGRI_SMTP_USERNAME"),
            smtp_password: get("AGRI_SMTP_PASSWORD"),
            starttls: parse_bool(&get, "AGRI_SMTP_STARTTLS", defaults.mail.starttls)?,
            from: get("AGRI_MAIL_FROM").unwrap_or(defaults.mail.from),
        };

        let rate_limit = RateLimit {
            max_requests: parse(&get, "AGRI_RATE_LIMIT_MAX", defaults.rate_limit.max_requests)?,
            window_secs: parse(
                &get,
                "AGRI_RATE_LIMIT_WINDOW_SECS",
                defaults.rate_limit.window_secs,
            )?,
        };
        if rate_limit.window_secs == 0 {
            return Err(ConfigError {
                var: "AGRI_RATE_LIMIT_WINDOW_SECS",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            port: parse(&get, "PORT", defaults.port)?,
            auth_token: get("AGRI_AUTH_TOKEN"),
            database_url: get("DATABASE_URL"),
            metrics_enabled: parse_bool(&get, "AGRI_METRICS_ENABLED", defaults.metrics_enabled)?,
            rate_limit,
            mail,
            log_format: parse(&get, "AGRI_LOG_FORMAT", defaults.log_format)?,
        })
    }
}

fn parse<T>(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(var) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError {
            var,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_bool(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    match get(var).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError {
                var,
                reason: format!("expected a boolean, got \"{v}\""),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.port, 8080);
        assert!(cfg.auth_token.is_none());
        assert!(cfg.database_url.is_none());
        assert!(cfg.metrics_enabled);
        assert_eq!(cfg.rate_limit, RateLimit::default());
        assert!(!cfg.mail.uses_smtp());
        assert_eq!(cfg.log_format, LogFormat::Text);
    }

    #[test]
    fn values_are_parsed() {
        let cfg = load(&[
            ("PORT", "9000"),
            ("AGRI_AUTH_TOKEN", "s3cret"),
            ("AGRI_METRICS_ENABLED", "false"),
            ("AGRI_RATE_LIMIT_MAX", "5"),
            ("AGRI_SMTP_HOST", "smtp.example.org"),
            ("AGRI_SMTP_PORT", "2525"),
            ("AGRI_LOG_FORMAT", "JSON"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.auth_token.as_deref(), Some("s3cret"));
        assert!(!cfg.metrics_enabled);
        assert_eq!(cfg.rate_limit.max_requests, 5);
        assert!(cfg.mail.uses_smtp());
        assert_eq!(cfg.mail.smtp_port, 2525);
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn mail_disabled_wins_over_host() {
        let cfg = load(&[("AGRI_SMTP_HOST", "smtp.example.org"), ("AGRI_MAIL_ENABLED", "no")]).unwrap();
        assert!(!cfg.mail.uses_smtp());
    }

    #[test]
    fn blank_values_count_as_unset() {
        let cfg = load(&[("AGRI_AUTH_TOKEN", "  "), ("PORT", "")]).unwrap();
        assert!(cfg.auth_token.is_none());
        assert_eq!(cfg.port, 8080);
    }

    #[test]
    fn bad_values_name_the_variable() {
        let err = load(&[("PORT", "eighty")]).unwrap_err();
        assert_eq!(err.var, "PORT");
        let err = load(&[("AGRI_METRICS_ENABLED", "maybe")]).unwrap_err();
        assert_eq!(err.var, "AGRI_METRICS_ENABLED");
        let err = load(&[("AGRI_RATE_LIMIT_WINDOW_SECS", "0")]).unwrap_err();
        assert_eq!(err.var, "AGRI_RATE_LIMIT_WINDOW_SECS");
        let err = load(&[("AGRI_LOG_FORMAT", "xml")]).unwrap_err();
        assert!(err.to_string().contains("AGRI_LOG_FORMAT"));
    }

    #[test]
    fn debug_redacts_secrets() {
        let cfg = load(&[
            ("AGRI_AUTH_TOKEN", "super-secret"),
            ("DATABASE_URL", "postgres://u:pw@db/agri"),
            ("AGRI_SMTP_PASSWORD", "mail-pw"),
        ])
        .unwrap();
        let debug = format!("{cfg:?}");
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("pw@db"));
        assert!(!debug.contains("mail-pw"));
        assert!(debug.contains("[REDACTED]"));
    }
}
