//! Process settings read from the environment (optionally seeded from `.env`).

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
/// 100 KiB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 100 * 1024;

#[derive(Clone, Debug)]
pub struct DatabaseSettings {
    /// Connection URL of the datastore endpoint.
    pub url: String,
    /// Service credential; sent as the connection password.
    pub service_key: String,
    pub max_connections: u32,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub port: u16,
    pub max_body_bytes: usize,
    pub database: DatabaseSettings,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Empty values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let service_key = get("DATABASE_SERVICE_KEY").ok_or(ConfigError::Missing("DATABASE_SERVICE_KEY"))?;

        Ok(Settings {
            port: parse_or("PORT", get("PORT"), DEFAULT_PORT)?,
            max_body_bytes: parse_or("MAX_BODY_BYTES", get("MAX_BODY_BYTES"), DEFAULT_MAX_BODY_BYTES)?,
            database: DatabaseSettings {
                url,
                service_key,
                max_connections: parse_or(
                    "DATABASE_MAX_CONNECTIONS",
                    get("DATABASE_MAX_CONNECTIONS"),
                    DEFAULT_MAX_CONNECTIONS,
                )?,
            },
        })
    }
}

fn parse_or<T: std::str::FromStr>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply_when_only_credentials_given() {
        let s = Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db.example/petmatch"),
            ("DATABASE_SERVICE_KEY", "secret"),
        ]))
        .unwrap();
        assert_eq!(s.port, DEFAULT_PORT);
        assert_eq!(s.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
        assert_eq!(s.database.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(s.database.service_key, "secret");
    }

    #[test]
    fn missing_url_fails() {
        let err = Settings::from_lookup(lookup(&[("DATABASE_SERVICE_KEY", "secret")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn blank_service_key_counts_as_missing() {
        let err = Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db.example/petmatch"),
            ("DATABASE_SERVICE_KEY", "   "),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_SERVICE_KEY")));
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db.example/petmatch"),
            ("DATABASE_SERVICE_KEY", "secret"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }
}
