//! Extension pour intégrer le catalogue dans mxtconfig
//!
//! Ce module fournit le trait `CatalogConfigExt` qui ajoute à
//! `mxtconfig::Config` les réglages Cloudinary et webhook.
//!
//! Les identifiants sont lus en priorité dans les variables d'environnement
//! `CLOUDINARY_*`, puis dans la section `cloudinary` de la configuration.
//! Leur absence est fatale : le serveur ne démarre pas sans eux.

use crate::client::{
    CloudinaryCredentials, DEFAULT_API_BASE, DEFAULT_MAX_RESULTS, DEFAULT_PREFIX,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
use crate::error::ConfigError;
use crate::webhook::WebhookPolicy;
use mxtconfig::Config;
use serde_yaml::Value;
use std::env;
use std::time::Duration;

pub const ENV_CLOUD_NAME: &str = "CLOUDINARY_CLOUD_NAME";
pub const ENV_API_KEY: &str = "CLOUDINARY_API_KEY";
pub const ENV_API_SECRET: &str = "CLOUDINARY_API_SECRET";
pub const ENV_WEBHOOK_SECRET: &str = "CLOUDINARY_WEBHOOK_SECRET";

/// Fenêtre d'acceptation par défaut des horodatages de webhook (2 heures)
pub const DEFAULT_WEBHOOK_TOLERANCE_SECS: u64 = 7200;

const DEFAULT_NOTIFICATION_TYPES: &[&str] = &["upload", "delete", "rename", "resource_created"];

/// Trait d'extension pour lire la configuration du catalogue
pub trait CatalogConfigExt {
    /// Identifiants du compte Cloudinary (obligatoires)
    fn get_cloudinary_credentials(&self) -> Result<CloudinaryCredentials, ConfigError>;

    /// Secret partagé de signature des webhooks (obligatoire)
    fn get_webhook_secret(&self) -> Result<String, ConfigError>;

    fn get_cloudinary_api_base(&self) -> String;
    fn get_cloudinary_prefix(&self) -> String;
    fn get_cloudinary_max_results(&self) -> u32;
    fn get_cloudinary_timeout(&self) -> Duration;

    /// Politique de refresh (`any` ou `filtered`)
    fn get_webhook_policy(&self) -> Result<WebhookPolicy, ConfigError>;

    /// Fenêtre d'acceptation des horodatages, en secondes (0 = pas de contrôle)
    fn get_webhook_tolerance_secs(&self) -> u64;
}

impl CatalogConfigExt for Config {
    fn get_cloudinary_credentials(&self) -> Result<CloudinaryCredentials, ConfigError> {
        Ok(CloudinaryCredentials::new(
            required(self, ENV_CLOUD_NAME, "cloud_name")?,
            required(self, ENV_API_KEY, "api_key")?,
            required(self, ENV_API_SECRET, "api_secret")?,
        ))
    }

    fn get_webhook_secret(&self) -> Result<String, ConfigError> {
        required(self, ENV_WEBHOOK_SECRET, "webhook_secret")
    }

    fn get_cloudinary_api_base(&self) -> String {
        self.get_string(&["cloudinary", "api_base"], DEFAULT_API_BASE)
    }

    fn get_cloudinary_prefix(&self) -> String {
        self.get_string(&["cloudinary", "prefix"], DEFAULT_PREFIX)
    }

    fn get_cloudinary_max_results(&self) -> u32 {
        let value = self.get_u64(&["cloudinary", "max_results"], DEFAULT_MAX_RESULTS as u64);
        u32::try_from(value).unwrap_or(DEFAULT_MAX_RESULTS)
    }

    fn get_cloudinary_timeout(&self) -> Duration {
        // Un délai nul ferait échouer toutes les requêtes
        match self.get_u64(&["cloudinary", "timeout_secs"], DEFAULT_REQUEST_TIMEOUT_SECS) {
            0 => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    fn get_webhook_policy(&self) -> Result<WebhookPolicy, ConfigError> {
        let name = self.get_string(&["webhook", "policy"], "any");
        let types =
            self.get_string_list(&["webhook", "notification_types"], DEFAULT_NOTIFICATION_TYPES);
        WebhookPolicy::from_name(&name, types)
    }

    fn get_webhook_tolerance_secs(&self) -> u64 {
        self.get_u64(&["webhook", "tolerance_secs"], DEFAULT_WEBHOOK_TOLERANCE_SECS)
    }
}

fn required(config: &Config, env_var: &'static str, key: &str) -> Result<String, ConfigError> {
    lookup(env::var(env_var).ok(), config, key).ok_or(ConfigError::Missing(env_var))
}

fn lookup(from_env: Option<String>, config: &Config, key: &str) -> Option<String> {
    from_env
        .filter(|v| !v.trim().is_empty())
        .or_else(|| match config.get_value(&["cloudinary", key]) {
            // Une clé d'API purement numérique est lue comme un nombre par YAML
            Ok(Value::String(s)) => Some(s),
            Ok(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
        .filter(|v| !v.trim().is_empty())
}
