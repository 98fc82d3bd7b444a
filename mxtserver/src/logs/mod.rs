// logs.rs
mod buffer_layer;

pub use buffer_layer::BufferLayer;

use std::{
    collections::VecDeque,
    sync::{Arc, PoisonError, RwLock},
};

use axum::{Json, extract::State, response::IntoResponse};
use chrono::{DateTime, Utc};
use mxtconfig::Config;
use serde::Serialize;
use tracing::Level;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Représente une entrée de log
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub target: String,
    pub message: String,
}

/// Buffer circulaire partagé
#[derive(Clone)]
pub struct LogState {
    buffer: Arc<RwLock<VecDeque<LogEntry>>>,
    capacity: usize,
}

impl LogState {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn push(&self, entry: LogEntry) {
        let mut buf = self.buffer.write().unwrap_or_else(PoisonError::into_inner);
        if buf.len() == self.capacity {
            buf.pop_front();
        }
        buf.push_back(entry);
    }

    pub fn dump(&self) -> Vec<LogEntry> {
        self.buffer
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

/// Handler REST (dump JSON du buffer)
pub async fn log_dump(State(state): State<LogState>) -> impl IntoResponse {
    Json(state.dump())
}

/// Options d'initialisation du système de logging
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Niveau minimum (ERROR, WARN, INFO, DEBUG, TRACE)
    pub min_level: Level,
    /// Capacité du buffer circulaire (nombre d'entrées conservées)
    pub buffer_capacity: usize,
    /// Activer la sortie console
    pub enable_console: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            min_level: Level::INFO,
            buffer_capacity: 1000,
            enable_console: true,
        }
    }
}

impl LoggingOptions {
    /// Lit les options depuis la section `host.logger` de la configuration
    pub fn from_config(config: &Config) -> Self {
        let configured = config.get_log_min_level();
        let min_level = string_to_level(&configured).unwrap_or_else(|| {
            eprintln!("⚠️ Unknown log level '{}', falling back to INFO", configured);
            Level::INFO
        });

        Self {
            min_level,
            buffer_capacity: config.get_log_buffer_capacity(),
            enable_console: config.get_log_enable_console(),
        }
    }
}

/// Initialise le système de logging (buffer mémoire + console optionnelle)
///
/// `RUST_LOG` a priorité sur le niveau configuré lorsqu'il est défini.
/// Si un subscriber global est déjà installé, il est conservé et seul le
/// `LogState` retourné reste vide.
///
/// # Exemple
/// ```rust,no_run
/// use mxtserver::logs::{init_logging, LoggingOptions};
///
/// let log_state = init_logging(LoggingOptions::default());
/// ```
pub fn init_logging(options: LoggingOptions) -> LogState {
    let log_state = LogState::new(options.buffer_capacity);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_to_string(options.min_level)));

    // L'ordre est important : le filtre doit être appliqué avant le buffer
    let console = options.enable_console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_ansi(true)
    });

    let result = Registry::default()
        .with(filter)
        .with(BufferLayer::new(log_state.clone()))
        .with(console)
        .try_init();

    if let Err(e) = result {
        eprintln!("❌ Failed to install tracing subscriber: {}", e);
    }

    log_state
}

fn string_to_level(s: &str) -> Option<Level> {
    match s.to_uppercase().as_str() {
        "ERROR" => Some(Level::ERROR),
        "WARN" => Some(Level::WARN),
        "INFO" => Some(Level::INFO),
        "DEBUG" => Some(Level::DEBUG),
        "TRACE" => Some(Level::TRACE),
        _ => None,
    }
}

fn level_to_string(level: Level) -> &'static str {
    match level {
        Level::ERROR => "error",
        Level::WARN => "warn",
        Level::INFO => "info",
        Level::DEBUG => "debug",
        Level::TRACE => "trace",
    }
}
