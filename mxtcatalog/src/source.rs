//! Abstraction de la source amont du catalogue
//!
//! Le store ne connaît que ce trait : le client Cloudinary en est
//! l'implémentation de production, les tests fournissent la leur.

use crate::error::FetchError;
use crate::models::Resource;
use async_trait::async_trait;

/// Source capable de fournir la liste complète des ressources amont
#[async_trait]
pub trait ResourceSource: Send + Sync {
    /// Effectue un appel amont et renvoie la liste décodée
    ///
    /// Aucun retry : un échec est remonté tel quel.
    async fn fetch_resources(&self) -> Result<Vec<Resource>, FetchError>;

    /// Description courte pour les logs
    fn describe(&self) -> String {
        "upstream".to_string()
    }
}
