//! Pistes côté client : catégorie, titre et URL de lecture
//!
//! Tout est dérivé du `public_id` une seule fois, à la construction du
//! [`Track`] ; les fonctions de dérivation sont pures.

use mxtcatalog::Resource;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Base des URLs de diffusion Cloudinary
pub const DELIVERY_BASE: &str = "https://res.cloudinary.com";

/// Catégorie d'une piste, déduite du dossier qui la contient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Mixes,
    Beats,
    Tracks,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Mixes, Category::Beats, Category::Tracks];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Mixes => "mixes",
            Category::Beats => "beats",
            Category::Tracks => "tracks",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Une ressource du catalogue prête à être affichée et jouée
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub resource: Resource,
    pub category: Category,
    pub title: String,
    pub stream_url: String,
}

impl Track {
    pub fn from_resource(resource: Resource, cloud_name: &str, prefix: &str) -> Self {
        Self {
            category: classify(&resource.public_id, prefix),
            title: derive_title(&resource.public_id),
            stream_url: stream_url(cloud_name, &resource),
            resource,
        }
    }

    pub fn public_id(&self) -> &str {
        &self.resource.public_id
    }
}

/// Catégorie d'après le premier dossier sous `prefix`
///
/// `my-music/mixes/x` → Mixes, `my-music/beats/x` → Beats, tout le reste
/// (fichier à la racine, autre dossier) → Tracks.
pub fn classify(public_id: &str, prefix: &str) -> Category {
    let relative = public_id.strip_prefix(prefix).unwrap_or(public_id);
    let folder = relative.split_once('/').map(|(folder, _)| folder);

    match folder {
        Some(f) if f.eq_ignore_ascii_case("mixes") => Category::Mixes,
        Some(f) if f.eq_ignore_ascii_case("beats") => Category::Beats,
        _ => Category::Tracks,
    }
}

/// Titre lisible tiré du dernier segment du `public_id`
pub fn derive_title(public_id: &str) -> String {
    let name = public_id.rsplit('/').next().unwrap_or(public_id);
    let title = name
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if title.is_empty() {
        public_id.to_string()
    } else {
        title
    }
}

pub fn stream_url(cloud_name: &str, resource: &Resource) -> String {
    format!(
        "{}/{}/video/upload/{}.{}",
        DELIVERY_BASE, cloud_name, resource.public_id, resource.format
    )
}
