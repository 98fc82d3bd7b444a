//! # mxtcatalog - Miroir en mémoire du catalogue Cloudinary
//!
//! Cette crate détient la copie locale du listing des fichiers audio hébergés
//! sur Cloudinary et la sert à un nombre quelconque de lecteurs concurrents.
//!
//! Le listing est rechargé au démarrage et à chaque notification signée
//! reçue sur `/api/webhook`. Un échec de rechargement laisse l'ancien
//! snapshot en place.
//!
//! ## Modules
//!
//! - [`client`] : client de l'API Admin Cloudinary
//! - [`store`] : cache avec refresh single-flight
//! - [`webhook`] : signature et politique de refresh des notifications
//! - [`api`] : handlers HTTP
//! - [`config_ext`], [`server_ext`] : intégration mxtconfig / mxtserver

pub mod api;
pub mod client;
pub mod config_ext;
pub mod error;
pub mod models;
pub mod openapi;
pub mod server_ext;
pub mod source;
pub mod store;
pub mod webhook;

pub use api::{CatalogState, HealthResponse, WebhookResponse, create_router};
pub use client::{ClientBuilder, CloudinaryClient, CloudinaryCredentials};
pub use config_ext::CatalogConfigExt;
pub use error::{ConfigError, FetchError};
pub use models::{Resource, Snapshot};
pub use openapi::CatalogApiDoc;
pub use server_ext::CatalogServerExt;
pub use source::ResourceSource;
pub use store::{CatalogStatus, CatalogStore};
pub use webhook::{Notification, WebhookPolicy, WebhookVerifier};
