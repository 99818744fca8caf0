//! OpenAPI documentation for the HTTP surface.
//!
//! The document is served as JSON at `/api-docs/openapi.json` and rendered with Scalar at `/docs`.

use utoipa::OpenApi;

use crate::{api, errors};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Postlens API",
        description = "Extract the text of a social media post from a PDF or image, and get suggestions to improve it."
    ),
    paths(
        api::handlers::health::health,
        api::handlers::documents::upload_document,
    ),
    components(
        schemas(
            api::models::documents::AnalysisResponse,
            api::models::documents::UploadForm,
            api::models::documents::HealthResponse,
            errors::ErrorBody,
        )
    ),
    tags(
        (name = "documents", description = "Text extraction and improvement suggestions.

PDFs are read through their embedded text layer; images go through OCR. Scanned PDFs with no text layer yield `empty_content`."),
        (name = "health", description = "Liveness checks."),
    )
)]
pub struct ApiDoc;
