use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Mixtape Catalog API",
        version = "0.1.0",
        description = "Miroir en mémoire des pistes audio hébergées sur Cloudinary"
    ),
    paths(
        crate::api::get_tracks,
        crate::api::receive_webhook,
        crate::api::health,
    ),
    components(
        schemas(
            crate::models::Resource,
            crate::models::Snapshot,
            crate::webhook::Notification,
            crate::api::WebhookResponse,
            crate::api::HealthResponse,
            crate::api::ErrorResponse,
        )
    ),
    tags(
        (name = "catalog", description = "Listing des pistes et invalidation par webhook")
    )
)]
pub struct CatalogApiDoc;
