//! Environment-based configuration.
//!
//! Loaded once at process start; immutable afterwards. A local `.env` file
//! is read best-effort before the process environment.

use anyhow::{Context, Result, anyhow};
use std::env;

/// Default port for the authorization callback listener.
const DEFAULT_CALLBACK_PORT: u16 = 3000;

/// Google `OAuth2` client registration.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// Client ID from the Google Cloud console.
    pub client_id: String,
    /// Client secret for this confidential client.
    pub client_secret: String,
    /// Redirect URI registered for the client; must point at the local
    /// callback listener.
    pub redirect_uri: String,
}

/// Process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Google client registration.
    pub google: GoogleConfig,
    /// Port the callback listener binds during authorization.
    pub callback_port: u16,
}

/// Loads configuration from `.env` (if present) and the environment.
///
/// # Errors
///
/// Returns an error naming the first missing required variable, or an
/// unparseable `CALLBACK_PORT`.
pub fn load() -> Result<Config> {
    dotenvy::dotenv().ok();
    load_with(|key| env::var(key).ok())
}

/// Builds a [`Config`] from any variable source; `load` feeds it the
/// process environment, tests feed it maps.
fn load_with(get: impl Fn(&str) -> Option<String>) -> Result<Config> {
    let required = |key: &str| {
        get(key).ok_or_else(|| anyhow!("{key} is required (set it in the environment or .env)"))
    };

    let callback_port = match get("CALLBACK_PORT") {
        Some(value) => value
            .parse()
            .with_context(|| format!("CALLBACK_PORT is not a valid port: {value}"))?,
        None => DEFAULT_CALLBACK_PORT,
    };

    Ok(Config {
        google: GoogleConfig {
            client_id: required("GOOGLE_CLIENT_ID")?,
            client_secret: required("GOOGLE_CLIENT_SECRET")?,
            redirect_uri: required("GOOGLE_REDIRECT_URI")?,
        },
        callback_port,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn complete() -> HashMap<String, String> {
        vars(&[
            ("GOOGLE_CLIENT_ID", "id"),
            ("GOOGLE_CLIENT_SECRET", "secret"),
            ("GOOGLE_REDIRECT_URI", "http://localhost:3000/auth/callback"),
        ])
    }

    #[test]
    fn loads_with_default_port() {
        let env = complete();
        let config = load_with(|key| env.get(key).cloned()).unwrap();
        assert_eq!(config.google.client_id, "id");
        assert_eq!(config.callback_port, 3000);
    }

    #[test]
    fn loads_with_explicit_port() {
        let mut env = complete();
        env.insert("CALLBACK_PORT".to_string(), "8099".to_string());
        let config = load_with(|key| env.get(key).cloned()).unwrap();
        assert_eq!(config.callback_port, 8099);
    }

    #[test]
    fn missing_client_id_is_named_in_the_error() {
        let mut env = complete();
        env.remove("GOOGLE_CLIENT_ID");
        let err = load_with(|key| env.get(key).cloned()).unwrap_err();
        assert!(err.to_string().contains("GOOGLE_CLIENT_ID"));
    }

    #[test]
    fn unparseable_port_fails() {
        let mut env = complete();
        env.insert("CALLBACK_PORT".to_string(), "not-a-port".to_string());
        assert!(load_with(|key| env.get(key).cloned()).is_err());
    }
}
