//! Modèles de données du catalogue
//!
//! Les noms JSON sont ceux de l'API Cloudinary ; l'endpoint `/api/tracks`
//! renvoie exactement la même forme.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Une ressource média distante (un fichier audio)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Resource {
    /// Identifiant opaque et unique
    #[schema(example = "f1c9e2b07a3d4e5f8a9b0c1d2e3f4a5b")]
    pub asset_id: String,
    /// Chemin hiérarchique, source de la catégorie et du titre
    #[schema(example = "my-music/mixes/summer_mix_2024")]
    pub public_id: String,
    /// Format du fichier
    #[schema(example = "mp3")]
    pub format: String,
    /// Type de livraison (upload, private...)
    #[serde(rename = "type")]
    #[schema(example = "upload")]
    pub delivery_type: String,
}

/// Liste complète des ressources connues, remplacée d'un bloc à chaque refresh
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Snapshot {
    pub resources: Vec<Resource>,
}

impl Snapshot {
    pub fn new(resources: Vec<Resource>) -> Self {
        Self { resources }
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_ignores_extra_upstream_fields() {
        let json = r#"{
            "resources": [{
                "asset_id": "a1",
                "public_id": "my-music/beats/lofi_01",
                "format": "mp3",
                "version": 1719304891,
                "resource_type": "video",
                "type": "upload",
                "bytes": 5120334,
                "secure_url": "https://res.cloudinary.com/demo/video/upload/v1/my-music/beats/lofi_01.mp3"
            }],
            "next_cursor": "8edbc61040178db60b0973ca9494bf3a"
        }"#;

        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.resources[0].delivery_type, "upload");
    }

    #[test]
    fn test_serialized_shape_mirrors_upstream() {
        let snapshot = Snapshot::new(vec![Resource {
            asset_id: "a1".into(),
            public_id: "my-music/song".into(),
            format: "mp3".into(),
            delivery_type: "upload".into(),
        }]);

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "resources": [{
                    "asset_id": "a1",
                    "public_id": "my-music/song",
                    "format": "mp3",
                    "type": "upload"
                }]
            })
        );
    }

    #[test]
    fn test_missing_resources_key_is_rejected() {
        assert!(serde_json::from_str::<Snapshot>(r#"{"error": {"message": "nope"}}"#).is_err());
    }
}
