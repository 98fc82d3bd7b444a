//! Bibliothèque : pistes regroupées par catégorie

use crate::track::{Category, Track};

/// Pistes du catalogue, dans l'ordre amont
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Library {
    tracks: Vec<Track>,
}

impl Library {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Pistes d'une catégorie, ordre amont conservé
    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter(move |t| t.category == category)
    }

    /// Nombre de pistes par catégorie, dans l'ordre de [`Category::ALL`]
    pub fn counts(&self) -> Vec<(Category, usize)> {
        Category::ALL
            .iter()
            .map(|&c| (c, self.by_category(c).count()))
            .collect()
    }

    pub fn find(&self, public_id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.public_id() == public_id)
    }

    /// Copie des pistes d'une catégorie, pour alimenter une file de lecture
    pub fn category_tracks(&self, category: Category) -> Vec<Track> {
        self.by_category(category).cloned().collect()
    }
}

impl FromIterator<Track> for Library {
    fn from_iter<I: IntoIterator<Item = Track>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
