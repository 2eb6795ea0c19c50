use std::{fmt::Display, str::FromStr};

use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Bearer token for candidate management; `None` disables the admin API.
    pub admin_token: Option<String>,
    pub allowed_origin: String,
    pub identity_rate_limit: u32,
    pub identity_rate_window_minutes: i64,
    pub ballot_rate_limit: u32,
    pub ballot_rate_window_minutes: i64,
    pub session_ttl_minutes: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            admin_token: None,
            allowed_origin: "http://localhost".into(),
            identity_rate_limit: 10,
            identity_rate_window_minutes: 1,
            ballot_rate_limit: 3,
            ballot_rate_window_minutes: 1,
            session_ttl_minutes: 30,
        }
    }
}

impl AppConfig {
    /// Builds the config from a key lookup such as the Shuttle secret store.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let admin_token = lookup("ADMIN_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        if admin_token.is_none() {
            warn!("ADMIN_TOKEN not found - candidate management will be disabled");
        }

        Self {
            admin_token,
            allowed_origin: lookup("ALLOWED_ORIGIN").unwrap_or(defaults.allowed_origin),
            identity_rate_limit: try_load(&lookup, "IDENTITY_RATE_LIMIT", defaults.identity_rate_limit),
            identity_rate_window_minutes: try_load(&lookup, "IDENTITY_RATE_WINDOW_MINUTES", defaults.identity_rate_window_minutes),
            ballot_rate_limit: try_load(&lookup, "BALLOT_RATE_LIMIT", defaults.ballot_rate_limit),
            ballot_rate_window_minutes: try_load(&lookup, "BALLOT_RATE_WINDOW_MINUTES", defaults.ballot_rate_window_minutes),
            session_ttl_minutes: try_load(&lookup, "SESSION_TTL_MINUTES", defaults.session_ttl_minutes),
        }
    }
}

fn try_load<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value: {e}, using default: {default}");
            default
        }),
        None => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}
