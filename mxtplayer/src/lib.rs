//! # mxtplayer - Client du catalogue Mixtape
//!
//! Récupère le listing servi par `/api/tracks`, classe chaque ressource
//! (mixes, beats, tracks), en dérive un titre lisible et l'URL de diffusion
//! Cloudinary, et fournit une file de lecture.
//!
//! ```no_run
//! use mxtplayer::{CatalogClient, Category, PlayQueue};
//!
//! # async fn example() -> mxtplayer::Result<()> {
//! let client = CatalogClient::builder("http://localhost:8080", "demo").build()?;
//! let library = client.fetch_library().await?;
//!
//! let mut queue = PlayQueue::new(library.category_tracks(Category::Beats));
//! if let Some(track) = queue.next() {
//!     println!("▶ {} ({})", track.title, track.stream_url);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod library;
pub mod queue;
pub mod track;

pub use client::{CatalogClient, ClientBuilder};
pub use error::{Error, Result};
pub use library::Library;
pub use queue::{PlayQueue, PlayState};
pub use track::{Category, Track, classify, derive_title, stream_url};
