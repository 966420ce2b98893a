//! Application-level configuration: environment variables plus an optional JSON file.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PLAYER_KV_BACK_CONFIG_PATH";
/// User addressed by the anonymous routes when the caller names none.
pub const DEFAULT_USER_ID: &str = "demo-user";
const DEFAULT_PORT: u16 = 8080;

/// Invalid or incomplete configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable required by the selected backend is not set.
    #[error("missing environment variable `{var}`")]
    MissingEnvVar {
        /// Name of the variable.
        var: &'static str,
    },
    /// `KV_BACKEND` names an unknown backend.
    #[error("unknown KV backend `{0}` (expected memory, couchdb or mongodb)")]
    UnknownBackend(String),
    /// A variable is set but cannot be parsed.
    #[error("invalid value `{value}` for `{var}`")]
    InvalidValue {
        /// Name of the variable.
        var: &'static str,
        /// Raw value found in the environment.
        value: String,
    },
}

/// Which KV backend serves requests and how to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageSettings {
    /// Process-local map; data is lost on restart.
    Memory,
    /// CouchDB server, one document per key.
    CouchDb {
        /// Server URL.
        base_url: String,
        /// Database name.
        database: String,
        /// Basic auth user and password.
        credentials: Option<(String, String)>,
    },
    /// MongoDB deployment; the database name falls back to the backend default.
    MongoDb {
        /// URI as configured.
        uri: String,
        /// Database name; the backend default when unset.
        database: Option<String>,
    },
}

/// How to reach the token authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    /// Endpoint receiving `POST {"token": ...}`.
    pub verify_url: String,
    /// Sent as a bearer credential to the authority when set.
    pub api_key: Option<String>,
}

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    port: u16,
    default_user_id: String,
    storage: StorageSettings,
    auth: Option<AuthSettings>,
}

impl AppConfig {
    /// Load the configuration from the process environment and the optional JSON file.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_lookup(|var| env::var(var).ok())?;
        if let Some(file) = read_config_file() {
            if let Some(user) = file.default_user_id.filter(|user| !user.is_empty()) {
                config.default_user_id = user;
            }
        }
        Ok(config)
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let port = match var("PORT").or_else(|| var("SERVER_PORT")) {
            Some(value) => value.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                var: "PORT",
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let required = |name: &'static str| var(name).ok_or(ConfigError::MissingEnvVar { var: name });

        let storage = match var("KV_BACKEND").as_deref().unwrap_or("memory") {
            "memory" => StorageSettings::Memory,
            "couchdb" => StorageSettings::CouchDb {
                base_url: required("COUCH_BASE_URL")?,
                database: required("COUCH_DB")?,
                credentials: var("COUCH_USERNAME").zip(var("COUCH_PASSWORD")),
            },
            "mongodb" => StorageSettings::MongoDb {
                uri: required("MONGO_URI")?,
                database: var("MONGO_DB"),
            },
            other => return Err(ConfigError::UnknownBackend(other.to_owned())),
        };

        let auth = var("AUTH_VERIFY_URL").map(|verify_url| AuthSettings {
            verify_url,
            api_key: var("AUTH_API_KEY"),
        });

        Ok(Self {
            port,
            default_user_id: DEFAULT_USER_ID.to_owned(),
            storage,
            auth,
        })
    }

    /// TCP port the HTTP server binds to.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Selected storage backend.
    pub fn storage(&self) -> &StorageSettings {
        &self.storage
    }

    /// Token authority settings, when configured.
    pub fn auth(&self) -> Option<&AuthSettings> {
        self.auth.as_ref()
    }

    /// Pick the requested user, falling back to the default user for missing or empty ids.
    pub fn resolve_user_id<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested
            .filter(|id| !id.is_empty())
            .unwrap_or(&self.default_user_id)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            default_user_id: DEFAULT_USER_ID.to_owned(),
            storage: StorageSettings::Memory,
            auth: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    default_user_id: Option<String>,
}

/// Read the optional configuration file, logging and ignoring unusable ones.
fn read_config_file() -> Option<RawConfig> {
    let path = resolve_config_path();
    match fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
            Ok(raw) => {
                info!(path = %path.display(), "loaded configuration file");
                Some(raw)
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to parse config; falling back to defaults"
                );
                None
            }
        },
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!(
                path = %path.display(),
                "config file not found; using built-in defaults"
            );
            None
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "failed to read config; falling back to defaults"
            );
            None
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
