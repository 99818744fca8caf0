use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Successful result of a document upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    /// Full text extracted from the document, exactly as the extraction engine produced it
    pub extracted_text: String,
    /// Five short improvement suggestions, or `AI suggestion failed.` when the suggestion
    /// service was unavailable
    pub suggestions: String,
}

/// Multipart body of an upload (documentation only; parsed by hand in the handler)
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    /// A PDF (`application/pdf`) or any `image/*` file
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Liveness acknowledgment
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub message: String,
}
