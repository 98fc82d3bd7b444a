//! Notifications Cloudinary : authentification et politique de refresh
//!
//! Une notification n'est acceptée que si elle est signée avec le secret
//! partagé : `X-Cld-Signature` doit valoir le SHA-1 hexadécimal de
//! `corps ‖ X-Cld-Timestamp ‖ secret`, et l'horodatage doit être récent.
//!
//! Une fois authentifiée, la [`WebhookPolicy`] décide si elle déclenche un refresh.

use crate::error::ConfigError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::time::Duration;
use utoipa::ToSchema;

pub const TIMESTAMP_HEADER: &str = "x-cld-timestamp";
pub const SIGNATURE_HEADER: &str = "x-cld-signature";

/// Resource type Cloudinary sous lequel sont rangés les fichiers audio
const AUDIO_RESOURCE_TYPE: &str = "video";
const UPLOAD_DELIVERY_TYPE: &str = "upload";

/// Corps d'une notification Cloudinary
///
/// Seul `notification_type` est obligatoire : les autres champs varient
/// selon le type de notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    #[schema(example = "upload")]
    pub notification_type: String,
    #[serde(default)]
    #[schema(example = "my-music/mixes/summer_mix_2024")]
    pub public_id: Option<String>,
    #[serde(default)]
    #[schema(example = "video")]
    pub resource_type: Option<String>,
    #[serde(default, rename = "type")]
    #[schema(example = "upload")]
    pub delivery_type: Option<String>,
}

impl Notification {
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

/// Politique de refresh sur notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookPolicy {
    /// Toute notification authentifiée déclenche un refresh
    Any,
    /// Refresh uniquement pour les types listés, sur des fichiers audio uploadés
    Filtered { notification_types: Vec<String> },
}

impl WebhookPolicy {
    /// Construit la politique depuis son nom de configuration
    pub fn from_name(name: &str, notification_types: Vec<String>) -> Result<Self, ConfigError> {
        match name.trim().to_lowercase().as_str() {
            "any" => Ok(Self::Any),
            "filtered" => Ok(Self::Filtered { notification_types }),
            other => Err(ConfigError::InvalidPolicy(other.to_string())),
        }
    }

    pub fn should_refresh(&self, notification: &Notification) -> bool {
        match self {
            Self::Any => true,
            Self::Filtered { notification_types } => {
                let kind_matches = notification_types
                    .iter()
                    .any(|t| t.eq_ignore_ascii_case(&notification.notification_type));
                let audio = notification
                    .resource_type
                    .as_deref()
                    .is_none_or(|t| t == AUDIO_RESOURCE_TYPE);
                let uploaded = notification
                    .delivery_type
                    .as_deref()
                    .is_none_or(|t| t == UPLOAD_DELIVERY_TYPE);
                kind_matches && audio && uploaded
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("Invalid timestamp header")]
    InvalidTimestamp,
    #[error("Timestamp outside of the accepted window")]
    Expired,
    #[error("Signature mismatch")]
    Mismatch,
}

/// Vérificateur de signature des notifications
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
    tolerance: Option<Duration>,
}

impl WebhookVerifier {
    /// `tolerance_secs == 0` désactive le contrôle de fraîcheur
    pub fn new(secret: impl Into<String>, tolerance_secs: u64) -> Self {
        Self {
            secret: secret.into(),
            tolerance: (tolerance_secs > 0).then(|| Duration::from_secs(tolerance_secs)),
        }
    }

    /// Signature attendue pour ce corps et cet horodatage
    pub fn sign(&self, body: &[u8], timestamp: &str) -> String {
        let mut hasher = Sha1::new();
        hasher.update(body);
        hasher.update(timestamp.as_bytes());
        hasher.update(self.secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn verify(
        &self,
        body: &[u8],
        timestamp: &str,
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SignatureError> {
        let sent_at: i64 = timestamp
            .trim()
            .parse()
            .map_err(|_| SignatureError::InvalidTimestamp)?;

        if let Some(tolerance) = self.tolerance {
            let age = now.timestamp().abs_diff(sent_at);
            if age > tolerance.as_secs() {
                return Err(SignatureError::Expired);
            }
        }

        let expected = self.sign(body, timestamp.trim());
        if constant_time_eq(
            expected.as_bytes(),
            signature.trim().to_ascii_lowercase().as_bytes(),
        ) {
            Ok(())
        } else {
            Err(SignatureError::Mismatch)
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
