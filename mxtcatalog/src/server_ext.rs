//! Extension mxtserver pour le catalogue
//!
//! Ce module fournit un trait d'extension pour monter l'API catalogue sur un
//! `mxtserver::Server`, sans que mxtserver dépende de mxtcatalog.

use crate::api::{CatalogState, create_router};
use crate::client::CloudinaryClient;
use crate::config_ext::CatalogConfigExt;
use crate::openapi::CatalogApiDoc;
use crate::store::CatalogStore;
use crate::webhook::WebhookVerifier;
use anyhow::Result;
use mxtconfig::Config;
use mxtserver::Server;
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;

/// Trait pour étendre mxtserver avec l'API catalogue
///
/// # Exemple
///
/// ```rust,no_run
/// use mxtcatalog::CatalogServerExt;
/// use mxtserver::ServerBuilder;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = mxtconfig::Config::load_config(None)?;
///     let mut server = ServerBuilder::new_configured(&config).build();
///
///     let store = server.init_catalog(&config).await?;
///     let _ = store.refresh().await;
///
///     server.start().await?;
///     server.wait().await;
///     Ok(())
/// }
/// ```
pub trait CatalogServerExt {
    /// Construit le client Cloudinary, le store et la vérification des
    /// webhooks depuis la configuration, puis enregistre les routes
    ///
    /// Échoue si un identifiant obligatoire manque : aucune route n'est alors
    /// enregistrée.
    ///
    /// # Routes enregistrées
    ///
    /// - `GET /api/tracks`
    /// - `POST /api/webhook`
    /// - `GET /health`
    /// - `GET /api-docs/catalog.json` et `/swagger-ui/catalog`
    async fn init_catalog(&mut self, config: &Config) -> Result<Arc<CatalogStore>>;

    /// Enregistre les routes avec un état déjà construit
    async fn init_catalog_with_state(&mut self, state: CatalogState);
}

impl CatalogServerExt for Server {
    async fn init_catalog(&mut self, config: &Config) -> Result<Arc<CatalogStore>> {
        let credentials = config.get_cloudinary_credentials()?;
        let webhook_secret = config.get_webhook_secret()?;
        let policy = config.get_webhook_policy()?;

        let client = CloudinaryClient::builder(credentials)
            .base_url(config.get_cloudinary_api_base())
            .prefix(config.get_cloudinary_prefix())
            .max_results(config.get_cloudinary_max_results())
            .timeout(config.get_cloudinary_timeout())
            .build()?;

        info!(
            api_base = %client.base_url(),
            prefix = %client.prefix(),
            ?policy,
            "Catalog configured"
        );

        let store = Arc::new(CatalogStore::new(Arc::new(client)));
        let verifier = WebhookVerifier::new(webhook_secret, config.get_webhook_tolerance_secs());

        self.init_catalog_with_state(CatalogState::new(store.clone(), verifier, policy))
            .await;

        Ok(store)
    }

    async fn init_catalog_with_state(&mut self, state: CatalogState) {
        self.add_router("/", create_router(state)).await;
        self.add_openapi(CatalogApiDoc::openapi(), "catalog").await;
        info!("✅ Catalog API registered");
    }
}
