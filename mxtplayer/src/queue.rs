//! File de lecture
//!
//! Une liste ordonnée de pistes, un curseur et un état de lecture. La file
//! ne joue rien elle-même : elle indique quelle URL doit être jouée.

use crate::error::{Error, Result};
use crate::track::Track;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

#[derive(Debug, Clone, Default)]
pub struct PlayQueue {
    tracks: Vec<Track>,
    cursor: Option<usize>,
    state: PlayState,
}

impl PlayQueue {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self {
            tracks,
            cursor: None,
            state: PlayState::Stopped,
        }
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

    pub fn state(&self) -> PlayState {
        self.state
    }

    /// Index de la piste courante
    pub fn position(&self) -> Option<usize> {
        self.cursor
    }

    pub fn current(&self) -> Option<&Track> {
        self.cursor.and_then(|i| self.tracks.get(i))
    }

    /// Joue la piste à `index`
    pub fn play(&mut self, index: usize) -> Result<&Track> {
        if index >= self.tracks.len() {
            return Err(Error::InvalidIndex(index, self.tracks.len()));
        }
        self.cursor = Some(index);
        self.state = PlayState::Playing;
        debug!(index, title = %self.tracks[index].title, "Playing track");
        Ok(&self.tracks[index])
    }

    /// Met en pause ; sans effet si rien ne joue
    pub fn pause(&mut self) -> bool {
        if self.state == PlayState::Playing {
            self.state = PlayState::Paused;
            true
        } else {
            false
        }
    }

    pub fn resume(&mut self) -> bool {
        if self.state == PlayState::Paused {
            self.state = PlayState::Playing;
            true
        } else {
            false
        }
    }

    /// Arrête la lecture, le curseur est conservé
    pub fn stop(&mut self) {
        self.state = PlayState::Stopped;
    }

    /// Passe à la piste suivante
    ///
    /// Retourne `None` en fin de file, sans changer d'état. Depuis une file
    /// jamais lancée, démarre à la première piste.
    pub fn next(&mut self) -> Option<&Track> {
        let index = match self.cursor {
            Some(i) if i + 1 < self.tracks.len() => i + 1,
            Some(_) => return None,
            None if !self.tracks.is_empty() => 0,
            None => return None,
        };
        self.play(index).ok()
    }

    /// Revient à la piste précédente, `None` sur la première
    pub fn previous(&mut self) -> Option<&Track> {
        match self.cursor {
            Some(i) if i > 0 => self.play(i - 1).ok(),
            _ => None,
        }
    }
}
