//! # Module Server - API de haut niveau pour Axum
//!
//! Ce module fournit une abstraction simple pour créer des serveurs HTTP
//! avec Axum, en cachant la configuration du routage, du CORS et de l'arrêt.
//!
//! ## Fonctionnalités
//!
//! - 🚀 **Routes JSON simples** : Ajoutez des endpoints API avec `add_route()`
//! - 🎯 **Handlers avec état** : `add_handler_with_state()` et `add_router()`
//! - 📚 **Documentation API** : OpenAPI/Swagger avec `add_openapi()`
//! - 🌍 **CORS** : liste fixe d'origines autorisées
//! - ⚡ **Gestion gracieuse** : Arrêt propre sur Ctrl+C

use crate::logs::{LoggingOptions, init_logging, log_dump};
use anyhow::Result;
use axum::handler::Handler;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router};
use mxtconfig::Config;
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::{signal, sync::RwLock, task::JoinHandle};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tracing::{error, info, warn};
use utoipa_swagger_ui::SwaggerUi;

/// Durée de mise en cache des réponses preflight CORS
const CORS_MAX_AGE: Duration = Duration::from_secs(300);

/// Serveur principal
pub struct Server {
    name: String,
    http_port: u16,
    cors_origins: Vec<String>,
    router: Arc<RwLock<Router>>,
    join_handle: Option<JoinHandle<()>>,
}

impl Server {
    /// Crée une nouvelle instance de serveur
    ///
    /// # Arguments
    ///
    /// * `name` - Nom du serveur (pour les logs)
    /// * `http_port` - Port HTTP à écouter (0 pour un port éphémère)
    pub fn new(name: impl Into<String>, http_port: u16) -> Self {
        Self {
            name: name.into(),
            http_port,
            cors_origins: Vec::new(),
            router: Arc::new(RwLock::new(Router::new())),
            join_handle: None,
        }
    }

    /// Remplace la liste des origines autorisées pour le CORS
    pub fn set_cors_origins(&mut self, origins: Vec<String>) {
        self.cors_origins = origins;
    }

    /// Ajoute une route JSON dynamique
    ///
    /// La closure fournie est appelée à chaque requête GET sur le chemin spécifié.
    ///
    /// # Exemple
    ///
    /// ```rust,no_run
    /// # use mxtserver::Server;
    /// # #[tokio::main]
    /// # async fn main() {
    /// # let mut server = Server::new("Test", 3000);
    /// server.add_route("/info", || async {
    ///     serde_json::json!({"version": "0.1.0"})
    /// }).await;
    /// # }
    /// ```
    pub async fn add_route<F, Fut, T>(&mut self, path: &str, f: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        let f = Arc::new(f);
        let handler = move || {
            let f = f.clone();
            async move { Json(f().await) }
        };

        self.mount(path, Router::new().route("/", get(handler))).await;
    }

    /// Ajoute un handler GET avec état
    pub async fn add_handler_with_state<H, T, S>(&mut self, path: &str, handler: H, state: S)
    where
        H: Handler<T, S> + Clone + 'static,
        T: 'static,
        S: Clone + Send + Sync + 'static,
    {
        let route = Router::new().route("/", get(handler)).with_state(state);
        self.mount(path, route).await;
    }

    /// Ajoute un sous-router au serveur
    ///
    /// - Si `path` est "/", merge directement au router principal
    /// - Sinon, nest le router sous le chemin donné
    pub async fn add_router(&mut self, path: &str, sub_router: Router) {
        let normalized = format!("/{}", path.trim_start_matches('/'));
        self.mount(&normalized, sub_router).await;
    }

    async fn mount(&mut self, path: &str, route: Router) {
        let mut r = self.router.write().await;
        *r = if path == "/" {
            std::mem::take(&mut *r).merge(route)
        } else {
            std::mem::take(&mut *r).nest(path, route)
        };
    }

    /// Publie la documentation OpenAPI d'une API et son Swagger UI
    ///
    /// Les routes de l'API elles-mêmes sont enregistrées séparément avec
    /// [`Server::add_router`].
    ///
    /// - `/swagger-ui/{name}` affiche la documentation Swagger
    /// - `/api-docs/{name}.json` fournit la spécification OpenAPI
    pub async fn add_openapi(&mut self, openapi: utoipa::openapi::OpenApi, name: &str) {
        let swagger_path = format!("/swagger-ui/{}", name);
        let swagger_path_static: &'static str = Box::leak(swagger_path.into_boxed_str());

        let openapi_json_path = format!("/api-docs/{}.json", name);
        let openapi_json_path_static: &'static str = Box::leak(openapi_json_path.into_boxed_str());

        let swagger = SwaggerUi::new(swagger_path_static).url(openapi_json_path_static, openapi);

        let mut r = self.router.write().await;
        *r = std::mem::take(&mut *r).merge(swagger);
    }

    /// Router complet, couche CORS comprise
    pub async fn router(&self) -> Router {
        self.router
            .read()
            .await
            .clone()
            .layer(cors_layer(&self.cors_origins))
    }

    /// Démarre le serveur HTTP
    ///
    /// Le port est lié avant le retour : une erreur de bind est propagée.
    /// Le service tourne ensuite en tâche de fond jusqu'à Ctrl+C.
    ///
    /// # Exemple
    ///
    /// ```rust,no_run
    /// # use mxtserver::Server;
    /// # #[tokio::main]
    /// # async fn main() -> anyhow::Result<()> {
    /// # let mut server = Server::new("Test", 3000);
    /// server.start().await?;
    /// server.wait().await;  // Attend Ctrl+C
    /// # Ok(())
    /// # }
    /// ```
    pub async fn start(&mut self) -> Result<SocketAddr> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Server {} running at http://{}", self.name, local_addr);

        let router = self.router().await;
        self.join_handle = Some(tokio::spawn(async move {
            let served = axum::serve(listener, router.into_make_service())
                .with_graceful_shutdown(shutdown_signal())
                .await;
            if let Err(e) = served {
                error!("❌ HTTP server stopped with error: {}", e);
            }
        }));

        Ok(local_addr)
    }

    /// Attend la fin du serveur
    pub async fn wait(&mut self) {
        if let Some(h) = self.join_handle.take() {
            let _ = h.await;
        }
    }

    /// Initialise le système de logging et enregistre la route `/api/logs`
    pub async fn init_logging(&mut self, options: LoggingOptions) {
        let log_state = init_logging(options);

        self.add_handler_with_state("/api/logs", log_dump, log_state)
            .await;
    }
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Ctrl+C reçu, arrêt gracieux"),
        Err(e) => {
            error!("❌ Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("⚠️ Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .max_age(CORS_MAX_AGE)
}

/// Builder pattern
pub struct ServerBuilder {
    name: String,
    http_port: u16,
    cors_origins: Vec<String>,
}

impl ServerBuilder {
    /// Crée un nouveau builder
    pub fn new(name: impl Into<String>, http_port: u16) -> Self {
        Self {
            name: name.into(),
            http_port,
            cors_origins: Vec::new(),
        }
    }

    /// Builder initialisé depuis la section `host` de la configuration
    pub fn new_configured(config: &Config) -> Self {
        Self {
            name: "Mixtape".to_string(),
            http_port: config.get_http_port(),
            cors_origins: config.get_cors_origins(),
        }
    }

    pub fn http_port(mut self, port: u16) -> Self {
        self.http_port = port;
        self
    }

    pub fn cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    /// Construit le serveur
    pub fn build(self) -> Server {
        let mut server = Server::new(self.name, self.http_port);
        server.set_cors_origins(self.cors_origins);
        server
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    fn test_server() -> Server {
        ServerBuilder::new("Test", 0)
            .cors_origins(vec!["http://localhost:3000".to_string()])
            .build()
    }

    #[tokio::test]
    async fn test_add_route_serves_json() {
        let mut server = test_server();
        server
            .add_route("/info", || async { serde_json::json!({"version": "0.1.0"}) })
            .await;

        let response = server
            .router()
            .await
            .oneshot(Request::get("/info").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["version"], "0.1.0");
    }

    #[tokio::test]
    async fn test_cors_allows_listed_origin() {
        let mut server = test_server();
        server.add_route("/info", || async { "ok" }).await;

        let response = server
            .router()
            .await
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/info")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
            "true"
        );
    }

    #[tokio::test]
    async fn test_cors_ignores_unknown_origin() {
        let mut server = test_server();
        server.add_route("/info", || async { "ok" }).await;

        let response = server
            .router()
            .await
            .oneshot(
                Request::get("/info")
                    .header(header::ORIGIN, "https://evil.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_openapi_document_is_published() {
        #[derive(utoipa::OpenApi)]
        #[openapi(components(schemas(crate::LogEntry)))]
        struct TestDoc;

        let mut server = test_server();
        server
            .add_openapi(<TestDoc as utoipa::OpenApi>::openapi(), "test")
            .await;

        let response = server
            .router()
            .await
            .oneshot(
                Request::get("/api-docs/test.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_start_binds_and_serves() {
        let mut server = test_server();
        server.add_route("/info", || async { "ok" }).await;

        let addr = server.start().await.unwrap();
        assert_ne!(addr.port(), 0);

        let body = reqwest::get(format!("http://127.0.0.1:{}/info", addr.port()))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "\"ok\"");
    }
}
