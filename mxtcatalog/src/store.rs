//! Store en mémoire du catalogue
//!
//! Le store détient le snapshot courant et la date du dernier refresh réussi,
//! derrière un unique `RwLock` :
//!
//! - les lecteurs ne tiennent le verrou que le temps de cloner l'`Arc` du snapshot ;
//! - l'écriture remplace le snapshot et la date dans la même section critique ;
//! - aucun verrou n'est tenu pendant l'appel réseau.
//!
//! Les refresh concurrents sont fusionnés (single-flight) : le premier appel
//! lance la requête amont, les appels qui arrivent pendant qu'elle est en vol
//! attendent le même résultat au lieu d'émettre leur propre requête.
//!
//! La requête tourne dans sa propre tâche tokio : elle va jusqu'au bout et
//! libère la place même si tous les appelants ont abandonné l'attente.

use crate::error::FetchError;
use crate::models::Snapshot;
use crate::source::ResourceSource;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tracing::{debug, info, warn};

type RefreshFuture = Shared<BoxFuture<'static, Result<usize, FetchError>>>;

/// Refresh en cours, partagé par tous les appelants concurrents
struct InFlight {
    generation: u64,
    future: RefreshFuture,
}

struct CatalogState {
    snapshot: Arc<Snapshot>,
    last_refresh: Option<DateTime<Utc>>,
}

/// Vue cohérente du nombre de pistes et de la date du dernier refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogStatus {
    pub cached_tracks: usize,
    pub last_refresh: Option<DateTime<Utc>>,
}

/// Cache du listing amont
///
/// Construit explicitement et partagé via `Arc` avec les handlers HTTP.
pub struct CatalogStore {
    source: Arc<dyn ResourceSource>,
    state: Arc<RwLock<CatalogState>>,
    in_flight: Arc<Mutex<Option<InFlight>>>,
    fetches: AtomicU64,
}

impl CatalogStore {
    /// Crée un store vide adossé à `source`
    pub fn new(source: Arc<dyn ResourceSource>) -> Self {
        Self {
            source,
            state: Arc::new(RwLock::new(CatalogState {
                snapshot: Arc::new(Snapshot::default()),
                last_refresh: None,
            })),
            in_flight: Arc::new(Mutex::new(None)),
            fetches: AtomicU64::new(0),
        }
    }

    /// Snapshot courant, toujours complet
    pub fn read(&self) -> Arc<Snapshot> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot
            .clone()
    }

    /// Date du dernier refresh réussi
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last_refresh
    }

    pub fn status(&self) -> CatalogStatus {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        CatalogStatus {
            cached_tracks: state.snapshot.len(),
            last_refresh: state.last_refresh,
        }
    }

    /// Nombre de requêtes amont lancées depuis la création du store
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Recharge le listing amont et installe le nouveau snapshot
    ///
    /// Retourne le nombre de ressources installées. En cas d'échec le snapshot
    /// précédent reste en place et l'erreur est retournée.
    pub async fn refresh(&self) -> Result<usize, FetchError> {
        let future = {
            let mut slot = lock(&self.in_flight);
            match slot.as_ref() {
                Some(in_flight) => {
                    debug!(
                        generation = in_flight.generation,
                        "Joining in-flight catalog refresh"
                    );
                    in_flight.future.clone()
                }
                None => {
                    let generation = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
                    let task = tokio::spawn(fetch_and_install(
                        self.source.clone(),
                        self.state.clone(),
                        self.in_flight.clone(),
                        generation,
                    ));
                    let future = task
                        .map(|joined| {
                            joined.unwrap_or_else(|e| {
                                Err(FetchError::Network(format!("refresh task failed: {e}")))
                            })
                        })
                        .boxed()
                        .shared();
                    *slot = Some(InFlight {
                        generation,
                        future: future.clone(),
                    });
                    future
                }
            }
        };

        future.await
    }
}

fn lock(in_flight: &Mutex<Option<InFlight>>) -> MutexGuard<'_, Option<InFlight>> {
    in_flight.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Libère la place du refresh `generation`, y compris si la tâche panique
struct ReleaseSlot {
    in_flight: Arc<Mutex<Option<InFlight>>>,
    generation: u64,
}

impl Drop for ReleaseSlot {
    fn drop(&mut self) {
        let mut slot = lock(&self.in_flight);
        if slot.as_ref().is_some_and(|f| f.generation == self.generation) {
            *slot = None;
        }
    }
}

async fn fetch_and_install(
    source: Arc<dyn ResourceSource>,
    state: Arc<RwLock<CatalogState>>,
    in_flight: Arc<Mutex<Option<InFlight>>>,
    generation: u64,
) -> Result<usize, FetchError> {
    let _release = ReleaseSlot {
        in_flight,
        generation,
    };
    info!(source = %source.describe(), generation, "🔄 Refreshing catalog");

    match source.fetch_resources().await {
        Ok(resources) => {
            let count = resources.len();
            let snapshot = Arc::new(Snapshot::new(resources));
            {
                let mut state = state.write().unwrap_or_else(PoisonError::into_inner);
                state.snapshot = snapshot;
                state.last_refresh = Some(Utc::now());
            }
            info!("✅ Catalog updated with {} tracks", count);
            Ok(count)
        }
        Err(e) => {
            warn!("⚠️ Catalog refresh failed, keeping previous snapshot: {}", e);
            Err(e)
        }
    }
}
