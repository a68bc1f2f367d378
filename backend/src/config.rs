use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

/// SMTP settings for the notification worker. All fields are optional;
/// when incomplete the worker logs and drops events instead of sending.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_name: String,
    pub from_email: Option<String>,
}

impl SmtpConfig {
    pub fn is_configured(&self) -> bool {
        self.host.is_some()
            && self.username.is_some()
            && self.password.is_some()
            && self.from_email.is_some()
    }

    /// Config with no SMTP credentials; the worker will drop events
    pub fn disabled() -> Self {
        Self {
            host: None,
            port: 587,
            username: None,
            password: None,
            from_name: "Holy Cross Church".to_string(),
            from_email: None,
        }
    }
}

/// Environment-driven server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub smtp: SmtpConfig,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("LEDGER_PORT", "3000"),
            database_url: try_load("LEDGER_DATABASE_URL", "sqlite:parish_ledger.db"),
            smtp: SmtpConfig {
                host: var("SMTP_HOST").ok(),
                port: try_load("SMTP_PORT", "587"),
                username: var("SMTP_USER").ok(),
                password: var("SMTP_PASS").ok(),
                from_name: try_load("SMTP_FROM_NAME", "Holy Cross Church"),
                from_email: var("SMTP_FROM").ok(),
            },
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| ())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_smtp_is_not_configured() {
        assert!(!SmtpConfig::disabled().is_configured());
    }

    #[test]
    fn test_complete_smtp_is_configured() {
        let smtp = SmtpConfig {
            host: Some("smtp.example.com".to_string()),
            port: 587,
            username: Some("user".to_string()),
            password: Some("pass".to_string()),
            from_name: "Holy Cross Church".to_string(),
            from_email: Some("office@example.com".to_string()),
        };
        assert!(smtp.is_configured());
    }
}
