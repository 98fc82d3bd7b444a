//! # mxtserver - Serveur web haut niveau basé sur Axum
//!
//! Cette crate fournit une abstraction simple pour créer le serveur HTTP de
//! Mixtape. Les crates métier (comme `mxtcatalog`) y ajoutent leurs routes via
//! des traits d'extension, sans que `mxtserver` les connaisse.
//!
//! ## Architecture
//!
//! - [`server`] : Implémentation du serveur principal et du builder
//! - [`logs`] : Initialisation de `tracing` et buffer mémoire des logs
//!
//! ## Exemple d'utilisation
//!
//! ```rust,no_run
//! use mxtserver::{ServerBuilder, logs::LoggingOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut server = ServerBuilder::new("MyServer", 8080).build();
//!     server.init_logging(LoggingOptions::default()).await;
//!
//!     server.add_route("/api/status", || async {
//!         serde_json::json!({"status": "ok"})
//!     }).await;
//!
//!     server.start().await?;
//!     server.wait().await;
//!     Ok(())
//! }
//! ```

pub mod logs;
pub mod server;

pub use logs::{BufferLayer, LogEntry, LogState, LoggingOptions};
pub use server::{Server, ServerBuilder};
