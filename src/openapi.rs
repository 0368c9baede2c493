//! OpenAPI document for the service, served interactively at `/docs`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "pdfseal",
        description = "Password-encrypt PDFs over HTTP. Encryption is performed by qpdf \
                       with 256-bit keys and all document permissions disabled."
    ),
    paths(
        crate::api::handlers::health::health,
        crate::api::handlers::encrypt::encrypt_pdf,
        crate::api::handlers::encrypt::upload_redirect,
    ),
    components(schemas(
        crate::api::handlers::health::HealthResponse,
        crate::api::models::encrypt::EncryptResponse,
        crate::api::models::encrypt::ErrorResponse,
    )),
    tags(
        (name = "health", description = "Liveness"),
        (name = "encryption", description = "PDF encryption pipeline")
    )
)]
pub struct ApiDoc;
