use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use tracing::info;

use crate::error::ConfigError;
use crate::session::SessionOptions;
use crate::sources::{DEFAULT_SPOTS_PATH, DEFAULT_ZONES_COLLECTION};

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind: SocketAddr,
    pub zones_file: Option<PathBuf>,
    pub spots_path: String,
    pub zones_collection: String,
}

/// Shape of the optional `shepherd.toml`; every key may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    bind: Option<String>,
    zones_file: Option<PathBuf>,
    spots_path: Option<String>,
    zones_collection: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            zones_file: None,
            spots_path: DEFAULT_SPOTS_PATH.to_string(),
            zones_collection: DEFAULT_ZONES_COLLECTION.to_string(),
        }
    }
}

impl Config {
    /// Loads `.env`, then the optional TOML file, then `SHEPHERD_*` variables.
    /// Later sources win.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let file = match path {
            Some(path) => read_config_file(path)?,
            None => ConfigFile::default(),
        };

        Self::from_sources(file, |key| env::var(key).ok())
    }

    fn from_sources(
        file: ConfigFile,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let bind = match var("SHEPHERD_BIND").or(file.bind) {
            Some(raw) => parse_value("SHEPHERD_BIND", &raw)?,
            None => {
                info!("SHEPHERD_BIND not set, using default: {}", defaults.bind);
                defaults.bind
            }
        };

        let zones_file = var("SHEPHERD_ZONES_FILE")
            .map(PathBuf::from)
            .or(file.zones_file);

        let spots_path = var("SHEPHERD_SPOTS_PATH")
            .or(file.spots_path)
            .unwrap_or_else(|| {
                info!("SHEPHERD_SPOTS_PATH not set, using default: {DEFAULT_SPOTS_PATH}");
                defaults.spots_path
            });

        let zones_collection = var("SHEPHERD_ZONES_COLLECTION")
            .or(file.zones_collection)
            .unwrap_or_else(|| {
                info!("SHEPHERD_ZONES_COLLECTION not set, using default: {DEFAULT_ZONES_COLLECTION}");
                defaults.zones_collection
            });

        Ok(Self {
            bind,
            zones_file,
            spots_path,
            zones_collection,
        })
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            spots_path: self.spots_path.clone(),
            zones_collection: self.zones_collection.clone(),
        }
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let shown = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: shown.clone(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Toml {
        path: shown,
        source,
    })
}

fn parse_value<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
        key,
        message: format!("'{raw}': {e}"),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_sources() {
        let config = Config::from_sources(ConfigFile::default(), env_of(&[])).expect("config");
        assert_eq!(config, Config::default());
        assert_eq!(config.bind.port(), DEFAULT_PORT);
        assert!(config.bind.ip().is_unspecified());
        assert_eq!(config.spots_path, DEFAULT_SPOTS_PATH);
        assert_eq!(config.zones_collection, DEFAULT_ZONES_COLLECTION);
    }

    #[test]
    fn environment_overrides_file() {
        let file: ConfigFile = toml::from_str(
            r#"
            bind = "127.0.0.1:8080"
            zones_file = "zones.json"
            spots_path = "lotA"
            "#,
        )
        .expect("toml");

        let config = Config::from_sources(file, env_of(&[("SHEPHERD_SPOTS_PATH", "lotB")]))
            .expect("config");

        assert_eq!(config.bind.to_string(), "127.0.0.1:8080");
        assert_eq!(config.zones_file, Some(PathBuf::from("zones.json")));
        assert_eq!(config.spots_path, "lotB");
        assert_eq!(config.zones_collection, DEFAULT_ZONES_COLLECTION);
    }

    #[test]
    fn invalid_bind_is_reported() {
        let err = Config::from_sources(ConfigFile::default(), env_of(&[("SHEPHERD_BIND", "nope")]))
            .expect_err("bad bind");
        assert!(matches!(err, ConfigError::InvalidValue { key: "SHEPHERD_BIND", .. }));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<ConfigFile>("port = 1").is_err());
    }
}
