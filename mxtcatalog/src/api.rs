//! Handlers HTTP du catalogue
//!
//! - `GET /api/tracks` : snapshot courant, sans jamais déclencher de refresh
//! - `POST /api/webhook` : notification signée, refresh selon la politique
//! - `GET /health` : état du cache

use crate::error::FetchError;
use crate::models::Snapshot;
use crate::store::CatalogStore;
use crate::webhook::{
    Notification, SIGNATURE_HEADER, SignatureError, TIMESTAMP_HEADER, WebhookPolicy,
    WebhookVerifier,
};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

/// État partagé des handlers du catalogue
#[derive(Clone)]
pub struct CatalogState {
    pub store: Arc<CatalogStore>,
    pub verifier: Arc<WebhookVerifier>,
    pub policy: Arc<WebhookPolicy>,
}

impl CatalogState {
    pub fn new(store: Arc<CatalogStore>, verifier: WebhookVerifier, policy: WebhookPolicy) -> Self {
        Self {
            store,
            verifier: Arc::new(verifier),
            policy: Arc::new(policy),
        }
    }
}

/// Réponse de `POST /api/webhook`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WebhookResponse {
    /// Vrai si la notification a déclenché un refresh réussi
    pub refreshed: bool,
    /// Nombre de pistes en cache après traitement
    #[schema(example = 42)]
    pub cached_tracks: usize,
}

/// Réponse de `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    /// Date du dernier refresh réussi, `null` avant le premier
    pub last_fetch: Option<DateTime<Utc>>,
    pub cached_tracks: usize,
}

/// Corps JSON des réponses d'erreur
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "invalid_signature")]
    pub error: String,
    pub message: String,
}

/// Erreurs des handlers du catalogue
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing header {0}")]
    MissingHeader(&'static str),

    #[error("Malformed notification: {0}")]
    MalformedBody(String),

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error("Catalog refresh failed: {0}")]
    Refresh(#[from] FetchError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::MissingHeader(_) => (StatusCode::BAD_REQUEST, "missing_header"),
            ApiError::MalformedBody(_) => (StatusCode::BAD_REQUEST, "malformed_body"),
            ApiError::Signature(_) => (StatusCode::UNAUTHORIZED, "invalid_signature"),
            ApiError::Refresh(_) => (StatusCode::INTERNAL_SERVER_ERROR, "refresh_failed"),
        };

        let body = Json(ErrorResponse {
            error: code.to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

/// Crée le router de l'API catalogue
///
/// Les chemins sont absolus : le router se monte à la racine du serveur.
pub fn create_router(state: CatalogState) -> Router {
    Router::new()
        .route("/api/tracks", get(get_tracks))
        .route("/api/webhook", post(receive_webhook))
        .route("/health", get(health))
        .with_state(state)
}

/// GET /api/tracks
#[utoipa::path(
    get,
    path = "/api/tracks",
    tag = "catalog",
    responses(
        (status = 200, description = "Snapshot courant du catalogue", body = Snapshot),
        (status = 405, description = "Méthode non autorisée")
    )
)]
pub async fn get_tracks(State(state): State<CatalogState>) -> Response {
    let snapshot = state.store.read();
    Json(&*snapshot).into_response()
}

/// POST /api/webhook
#[utoipa::path(
    post,
    path = "/api/webhook",
    tag = "catalog",
    request_body = Notification,
    params(
        ("X-Cld-Timestamp" = String, Header, description = "Horodatage Unix de l'envoi"),
        ("X-Cld-Signature" = String, Header, description = "SHA-1 hex de corps ‖ horodatage ‖ secret")
    ),
    responses(
        (status = 200, description = "Notification traitée", body = WebhookResponse),
        (status = 400, description = "Corps invalide ou en-têtes absents", body = ErrorResponse),
        (status = 401, description = "Signature invalide", body = ErrorResponse),
        (status = 500, description = "Échec du refresh, ancien snapshot conservé", body = ErrorResponse)
    )
)]
pub async fn receive_webhook(
    State(state): State<CatalogState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    let timestamp = header_str(&headers, TIMESTAMP_HEADER)?;
    let signature = header_str(&headers, SIGNATURE_HEADER)?;

    if let Err(e) = state.verifier.verify(&body, timestamp, signature, Utc::now()) {
        warn!("🚫 Rejected webhook: {}", e);
        return Err(e.into());
    }

    let notification =
        Notification::parse(&body).map_err(|e| ApiError::MalformedBody(e.to_string()))?;

    if !state.policy.should_refresh(&notification) {
        debug!(
            kind = %notification.notification_type,
            "Notification ignored by webhook policy"
        );
        return Ok(Json(WebhookResponse {
            refreshed: false,
            cached_tracks: state.store.status().cached_tracks,
        }));
    }

    info!(
        kind = %notification.notification_type,
        public_id = notification.public_id.as_deref().unwrap_or("-"),
        "📬 Webhook accepted"
    );
    let cached_tracks = state.store.refresh().await?;

    Ok(Json(WebhookResponse {
        refreshed: true,
        cached_tracks,
    }))
}

/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    tag = "catalog",
    responses(
        (status = 200, description = "État du cache", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<CatalogState>) -> Json<HealthResponse> {
    let status = state.store.status();
    Json(HealthResponse {
        status: "healthy".to_string(),
        last_fetch: status.last_refresh,
        cached_tracks: status.cached_tracks,
    })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, ApiError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .ok_or(ApiError::MissingHeader(name))
}
