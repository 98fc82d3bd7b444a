//! # Mixtape Configuration Module
//!
//! This module provides configuration management for Mixtape, including:
//! - Loading configuration from YAML files
//! - Merging with embedded default configuration
//! - Environment variable overrides
//! - Typed getters with defaults for the host settings
//!
//! Domain crates extend [`Config`] with their own getters through extension
//! traits (see `mxtcatalog::CatalogConfigExt`), using the generic accessors
//! [`Config::get_string`], [`Config::get_u64`] and [`Config::get_string_list`].
//!
//! ## Usage
//!
//! ```no_run
//! use mxtconfig::Config;
//!
//! let config = Config::load_config(None)?;
//! let port = config.get_http_port();
//! let origins = config.get_cors_origins();
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{anyhow, Result};
use dirs::home_dir;
use serde_yaml::{Mapping, Value};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("mixtape.yaml");

const ENV_CONFIG_DIR: &str = "MIXTAPE_CONFIG";
const ENV_PREFIX: &str = "MIXTAPE_CONFIG__";
/// Variable conventionnelle des hébergeurs, prioritaire sur `host.http_port`
const ENV_PORT: &str = "PORT";
const CONFIG_FILE: &str = "config.yaml";
const CONFIG_DIR_NAME: &str = ".mixtape";

// Default values for configuration
const DEFAULT_HTTP_PORT: u16 = 80;
const DEFAULT_LOG_BUFFER_CAPACITY: usize = 1000;
const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";
const DEFAULT_LOG_ENABLE_CONSOLE: bool = true;
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

/// Macro to generate a getter for usize values with default
macro_rules! impl_usize_config {
    ($getter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> usize {
            match self.get_value($path) {
                Ok(Value::Number(n)) => n.as_u64().map(|v| v as usize).unwrap_or($default),
                _ => $default,
            }
        }
    };
}

/// Macro to generate a getter for bool values with default
macro_rules! impl_bool_config {
    ($getter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> bool {
            match self.get_value($path) {
                Ok(Value::Bool(b)) => b,
                _ => $default,
            }
        }
    };
}

/// Configuration manager for Mixtape
///
/// The configuration is built once at startup from the embedded defaults,
/// the optional `config.yaml` of the configuration directory and the
/// environment. It is never written back to disk.
#[derive(Debug)]
pub struct Config {
    config_dir: Option<PathBuf>,
    data: Value,
}

impl Config {
    /// Finds a config directory by trying different locations in order
    ///
    /// 1. The provided `directory`
    /// 2. The `MIXTAPE_CONFIG` environment variable
    /// 3. `.mixtape` in the current directory
    /// 4. `.mixtape` in the user's home directory
    fn find_config_dir(directory: Option<&Path>) -> Option<PathBuf> {
        if let Some(dir) = directory {
            return Some(dir.to_path_buf());
        }

        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Trying to load config from env");
            return Some(PathBuf::from(env_path));
        }

        let local = Path::new(CONFIG_DIR_NAME);
        if local.is_dir() {
            return Some(local.to_path_buf());
        }

        home_dir()
            .map(|home| home.join(CONFIG_DIR_NAME))
            .filter(|path| path.is_dir())
    }

    /// Loads the configuration
    ///
    /// This method:
    /// 1. Determines the configuration directory
    /// 2. Loads the default embedded configuration
    /// 3. Merges it with the external config.yaml file if present
    /// 4. Applies environment variable overrides
    ///
    /// # Arguments
    ///
    /// * `directory` - The directory containing the config.yaml file, or `None` to search for it
    pub fn load_config(directory: Option<&Path>) -> Result<Self> {
        let config_dir = Self::find_config_dir(directory);

        let mut value = lower_keys_value(serde_yaml::from_str(DEFAULT_CONFIG)?);

        match config_dir.as_ref().map(|dir| dir.join(CONFIG_FILE)) {
            Some(path) if path.is_file() => {
                let data = fs::read(&path)?;
                let external: Value = serde_yaml::from_slice(&data)
                    .map_err(|e| anyhow!("Invalid YAML in {}: {}", path.display(), e))?;
                merge_yaml(&mut value, &lower_keys_value(external));
                info!(config_file = %path.display(), "Loaded config file");
            }
            Some(path) => {
                info!(config_file = %path.display(), "Config file not found, using default embedded config");
            }
            None => info!("No config directory, using default embedded config"),
        }

        apply_env_overrides(&mut value, env::vars());

        Ok(Config {
            config_dir,
            data: value,
        })
    }

    /// Builds a configuration from the embedded defaults merged with `yaml`
    ///
    /// The environment is not consulted.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let mut value = lower_keys_value(serde_yaml::from_str(DEFAULT_CONFIG)?);
        let external: Value = serde_yaml::from_str(yaml)?;
        merge_yaml(&mut value, &lower_keys_value(external));

        Ok(Config {
            config_dir: None,
            data: value,
        })
    }

    /// Répertoire de configuration retenu, s'il existe
    pub fn config_dir(&self) -> Option<&Path> {
        self.config_dir.as_deref()
    }

    /// Gets a configuration value at the specified path
    ///
    /// Returns an error if the path doesn't exist.
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        get_value_internal(&self.data, path)
    }

    /// Récupère une chaîne, ou `default` si absente ou d'un autre type
    pub fn get_string(&self, path: &[&str], default: &str) -> String {
        match self.get_value(path) {
            Ok(Value::String(s)) => s,
            _ => default.to_string(),
        }
    }

    /// Récupère un entier positif, ou `default` si absent ou invalide
    pub fn get_u64(&self, path: &[&str], default: u64) -> u64 {
        match self.get_value(path) {
            Ok(Value::Number(n)) => n.as_u64().unwrap_or(default),
            Ok(Value::String(s)) => s.trim().parse().unwrap_or_else(|_| {
                warn!(path = %path.join("."), value = %s, "Invalid integer, using default {}", default);
                default
            }),
            _ => default,
        }
    }

    /// Récupère une liste de chaînes
    ///
    /// Une chaîne simple est acceptée et découpée sur les virgules, ce qui permet
    /// de surcharger une liste depuis une variable d'environnement.
    pub fn get_string_list(&self, path: &[&str], default: &[&str]) -> Vec<String> {
        match self.get_value(path) {
            Ok(Value::Sequence(seq)) => seq
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            Ok(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            _ => default.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Gets the HTTP port from configuration
    ///
    /// Returns the configured HTTP port, or the default port (80) if not configured or invalid.
    pub fn get_http_port(&self) -> u16 {
        match self.get_value(&["host", "http_port"]) {
            Ok(Value::Number(n)) => match n.as_u64().and_then(|p| u16::try_from(p).ok()) {
                Some(port) => port,
                None => {
                    warn!("Invalid HTTP port {}, using default {}", n, DEFAULT_HTTP_PORT);
                    DEFAULT_HTTP_PORT
                }
            },
            Ok(Value::String(s)) => match s.parse::<u16>() {
                Ok(port) => port,
                Err(_) => {
                    warn!("Invalid HTTP port '{}', using default {}", s, DEFAULT_HTTP_PORT);
                    DEFAULT_HTTP_PORT
                }
            },
            Ok(_) => {
                warn!(
                    "HTTP port not a number or string, using default {}",
                    DEFAULT_HTTP_PORT
                );
                DEFAULT_HTTP_PORT
            }
            Err(err) => {
                warn!(
                    "Failed to get HTTP port: {}, using default {}",
                    err, DEFAULT_HTTP_PORT
                );
                DEFAULT_HTTP_PORT
            }
        }
    }

    /// Origines autorisées pour les appels CORS des navigateurs
    pub fn get_cors_origins(&self) -> Vec<String> {
        self.get_string_list(&["host", "cors_origins"], &[DEFAULT_CORS_ORIGIN])
    }

    /// Récupère le niveau de log minimum depuis la configuration
    pub fn get_log_min_level(&self) -> String {
        self.get_string(&["host", "logger", "min_level"], DEFAULT_LOG_MIN_LEVEL)
    }

    impl_usize_config!(
        get_log_buffer_capacity,
        &["host", "logger", "buffer_capacity"],
        DEFAULT_LOG_BUFFER_CAPACITY
    );

    impl_bool_config!(
        get_log_enable_console,
        &["host", "logger", "enable_console"],
        DEFAULT_LOG_ENABLE_CONSOLE
    );
}

fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
    if path.is_empty() {
        *data = value;
        return Ok(());
    }
    if let Value::Mapping(map) = data {
        let key_value = Value::String(path[0].to_lowercase());
        if path.len() == 1 {
            map.insert(key_value, value);
        } else {
            let entry = map
                .entry(key_value)
                .or_insert(Value::Mapping(Mapping::new()));
            set_value_internal(entry, &path[1..], value)?;
        }
        Ok(())
    } else {
        Err(anyhow!("Current node is not a map"))
    }
}

fn get_value_internal(data: &Value, path: &[&str]) -> Result<Value> {
    let mut current = data;
    for (i, key) in path.iter().enumerate() {
        if let Value::Mapping(map) = current {
            match map.get(&Value::String(key.to_lowercase())) {
                Some(next) => current = next,
                None => return Err(anyhow!("Path {} does not exist", path[..=i].join("."))),
            }
        } else {
            return Err(anyhow!("Path {} is not a map", path[..i].join(".")));
        }
    }
    Ok(current.clone())
}

/// Applique les surcharges `MIXTAPE_CONFIG__SECTION__KEY=value` puis `PORT`
///
/// `PORT` est appliqué en dernier : il l'emporte sur `MIXTAPE_CONFIG__HOST__HTTP_PORT`
/// quel que soit l'ordre des variables.
fn apply_env_overrides<I>(config: &mut Value, vars: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut port = None;
    for (key, value) in vars {
        if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
            let key_path = stripped.split("__").collect::<Vec<_>>();
            if let Err(e) = set_value_internal(config, &key_path, convert_env_value(&value)) {
                warn!(env_var = %key, "Ignoring environment override: {}", e);
            }
        } else if key == ENV_PORT && !value.is_empty() {
            port = Some(value);
        }
    }

    if let Some(value) = port {
        let port = convert_env_value(&value);
        if let Err(e) = set_value_internal(config, &["host", "http_port"], port) {
            warn!(env_var = ENV_PORT, "Ignoring environment override: {}", e);
        }
    }
}

fn convert_env_value(value: &str) -> Value {
    match serde_yaml::from_str::<Value>(value) {
        Ok(Value::Null) | Err(_) => Value::String(value.to_string()),
        Ok(parsed) => parsed,
    }
}

fn lower_keys_value(value: Value) -> Value {
    match value {
        Value::Mapping(map) => {
            let mut new_map = Mapping::new();
            for (k, v) in map {
                let key = match k {
                    Value::String(s) => Value::String(s.to_lowercase()),
                    other => other,
                };
                new_map.insert(key, lower_keys_value(v));
            }
            Value::Mapping(new_map)
        }
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(lower_keys_value).collect()),
        _ => value,
    }
}

/// Merges external YAML configuration into default configuration
///
/// Mappings are merged key by key; scalars and sequences from `external`
/// replace the default ones. A null document leaves the defaults untouched.
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (_, Value::Null) => {}
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_embedded_defaults() {
        let config = Config::from_yaml_str("").unwrap();
        assert_eq!(config.get_http_port(), 80);
        assert_eq!(config.get_cors_origins(), vec!["http://localhost:3000"]);
        assert_eq!(config.get_log_min_level(), "INFO");
        assert_eq!(config.get_log_buffer_capacity(), 1000);
        assert!(config.get_log_enable_console());
        assert!(config.config_dir().is_none());
    }

    #[test]
    fn test_merge_keeps_unrelated_defaults() {
        let config = Config::from_yaml_str("host:\n  http_port: 8080\n").unwrap();
        assert_eq!(config.get_http_port(), 8080);
        // Le reste de la section host vient toujours des valeurs par défaut
        assert_eq!(config.get_log_buffer_capacity(), 1000);
    }

    #[test]
    fn test_keys_are_lowercased() {
        let config = Config::from_yaml_str("Host:\n  HTTP_PORT: 9000\n").unwrap();
        assert_eq!(config.get_http_port(), 9000);
        assert_eq!(config.get_log_buffer_capacity(), 1000);
    }

    #[test]
    fn test_load_config_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.yaml"),
            "host:\n  cors_origins:\n    - https://mixtape.example\n",
        )
        .unwrap();

        let config = Config::load_config(Some(dir.path())).unwrap();
        assert_eq!(config.config_dir(), Some(dir.path()));
        assert_eq!(config.get_cors_origins(), vec!["https://mixtape.example"]);
    }

    #[test]
    fn test_load_config_invalid_yaml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.yaml"), "host: [unclosed").unwrap();
        assert!(Config::load_config(Some(dir.path())).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut value = lower_keys_value(serde_yaml::from_str(DEFAULT_CONFIG).unwrap());
        apply_env_overrides(
            &mut value,
            vars(&[
                ("MIXTAPE_CONFIG__HOST__LOGGER__MIN_LEVEL", "DEBUG"),
                ("MIXTAPE_CONFIG__HOST__LOGGER__ENABLE_CONSOLE", "false"),
                ("UNRELATED", "1"),
            ]),
        );

        let config = Config {
            config_dir: None,
            data: value,
        };
        assert_eq!(config.get_log_min_level(), "DEBUG");
        assert!(!config.get_log_enable_console());
    }

    #[test]
    fn test_port_env_variable() {
        let mut value = lower_keys_value(serde_yaml::from_str(DEFAULT_CONFIG).unwrap());
        apply_env_overrides(&mut value, vars(&[("PORT", "3001")]));

        let config = Config {
            config_dir: None,
            data: value,
        };
        assert_eq!(config.get_http_port(), 3001);
    }

    #[test]
    fn test_port_env_variable_wins_in_any_order() {
        let orders = [
            vars(&[("PORT", "3001"), ("MIXTAPE_CONFIG__HOST__HTTP_PORT", "4001")]),
            vars(&[("MIXTAPE_CONFIG__HOST__HTTP_PORT", "4001"), ("PORT", "3001")]),
        ];
        for order in orders {
            let mut value = lower_keys_value(serde_yaml::from_str(DEFAULT_CONFIG).unwrap());
            apply_env_overrides(&mut value, order);
            let config = Config {
                config_dir: None,
                data: value,
            };
            assert_eq!(config.get_http_port(), 3001);
        }
    }

    #[test]
    fn test_port_env_variable_on_scalar_host_is_ignored() {
        let mut value = lower_keys_value(serde_yaml::from_str("host: nope\n").unwrap());
        apply_env_overrides(&mut value, vars(&[("PORT", "3001")]));
        assert_eq!(value["host"], Value::String("nope".into()));
    }

    #[test]
    fn test_invalid_port_falls_back_to_default() {
        let config = Config::from_yaml_str("host:\n  http_port: 700000\n").unwrap();
        assert_eq!(config.get_http_port(), 80);

        let config = Config::from_yaml_str("host:\n  http_port: nope\n").unwrap();
        assert_eq!(config.get_http_port(), 80);
    }

    #[test]
    fn test_string_list_from_comma_separated_string() {
        let config =
            Config::from_yaml_str("host:\n  cors_origins: \"http://a.test, http://b.test,\"\n")
                .unwrap();
        assert_eq!(
            config.get_cors_origins(),
            vec!["http://a.test", "http://b.test"]
        );
    }

    #[test]
    fn test_get_value_missing_path() {
        let config = Config::from_yaml_str("").unwrap();
        let err = config.get_value(&["host", "nothing", "here"]).unwrap_err();
        assert!(err.to_string().contains("host.nothing"));
    }

    #[test]
    fn test_get_u64_accepts_numeric_strings() {
        let config = Config::from_yaml_str("custom:\n  limit: \"42\"\n").unwrap();
        assert_eq!(config.get_u64(&["custom", "limit"], 7), 42);
        assert_eq!(config.get_u64(&["custom", "missing"], 7), 7);
    }
}
