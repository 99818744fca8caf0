use crate::AppState;
use crate::api::models::documents::{AnalysisResponse, UploadForm};
use crate::errors::{Error, ErrorBody, Result};
use crate::extraction::content_type_essence;
use crate::pipeline::{self, UploadedDocument};
use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
};
use bytes::BytesMut;
use tracing::{debug, info, instrument, warn};

/// Multipart field carrying the document.
const FILE_FIELD: &str = "file";

/// Content type assumed when the file part declares none.
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[utoipa::path(
    post,
    path = "/upload",
    tag = "documents",
    summary = "Analyze document",
    description = "Upload a PDF or image. Its text is extracted (PDF text layer or OCR) and sent to the \
suggestion service. A suggestion service outage does not fail the request: `suggestions` is then `AI suggestion failed.`",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Text extracted and analyzed", body = AnalysisResponse),
        (status = 400, description = "No file, unsupported file type, or no extractable text", body = ErrorBody),
        (status = 413, description = "Payload too large", body = ErrorBody),
        (status = 500, description = "Text extraction failed", body = ErrorBody)
    )
)]
#[instrument(skip_all)]
pub async fn upload_document(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResponse>> {
    info!("Upload route hit");

    let document = match multipart {
        Ok(multipart) => read_document(multipart, state.config.limits.max_upload_size).await?,
        Err(rejection) => {
            debug!("Request body is not multipart: {}", rejection);
            None
        }
    };

    let response = pipeline::run(document, &state.extractors, state.analyzer.as_ref()).await?;
    Ok(Json(response))
}

/// Read the first `file` part into memory, aborting as soon as it exceeds `max_size`.
///
/// Returns `None` when the form has no `file` part.
async fn read_document(mut multipart: Multipart, max_size: u64) -> Result<Option<UploadedDocument>> {
    while let Some(mut field) = multipart.next_field().await.map_err(|e| multipart_error(e, max_size))? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let content_type = content_type_essence(field.content_type().unwrap_or(DEFAULT_CONTENT_TYPE));
        let file_name = field.file_name().map(str::to_string);
        let mut buffer = BytesMut::new();

        while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, max_size))? {
            if (buffer.len() + chunk.len()) as u64 > max_size {
                warn!(
                    file_name = ?file_name,
                    max_size = max_size,
                    "File size limit exceeded, aborting upload"
                );
                return Err(Error::PayloadTooLarge { max_bytes: max_size });
            }
            buffer.extend_from_slice(&chunk);
        }

        return Ok(Some(UploadedDocument::new(buffer.freeze(), content_type, file_name)));
    }

    Ok(None)
}

fn multipart_error(e: MultipartError, max_size: u64) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge { max_bytes: max_size }
    } else {
        Error::BadRequest {
            message: format!("Failed to parse multipart data: {}", e.body_text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::analysis::SUGGESTION_FAILED;
    use crate::api::models::documents::AnalysisResponse;
    use crate::errors::ErrorBody;
    use crate::extraction::{ExtractionError, Extractors};
    use crate::test_utils::{StubAnalyzer, StubExtractor, create_test_config, create_test_server, stub_extractors};
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use std::sync::Arc;

    fn file_form(bytes: &'static [u8], file_name: &str, mime: &str) -> MultipartForm {
        MultipartForm::new().add_part("file", Part::bytes(bytes).file_name(file_name).mime_type(mime))
    }

    #[test_log::test(tokio::test)]
    async fn test_upload_pdf() {
        let (extractors, document, _image) = stub_extractors("Check out our new menu!", "unused");
        let analyzer = StubAnalyzer::generating("- Add a photo\n- Tag the location");
        let server = create_test_server(create_test_config(), extractors, Arc::new(analyzer.clone()));

        let response = server
            .post("/upload")
            .multipart(file_form(b"%PDF-1.7 fake", "menu.pdf", "application/pdf"))
            .await;

        response.assert_status_ok();
        let body: AnalysisResponse = response.json();
        assert_eq!(body.extracted_text, "Check out our new menu!");
        assert_eq!(body.suggestions, "- Add a photo\n- Tag the location");
        assert_eq!(document.seen(), vec![bytes::Bytes::from_static(b"%PDF-1.7 fake")]);
        assert_eq!(analyzer.seen(), vec!["Check out our new menu!".to_string()]);
    }

    #[test_log::test(tokio::test)]
    async fn test_content_type_parameters_and_case_ignored() {
        let (extractors, document, image) = stub_extractors("pdf text", "ocr text");
        let server = create_test_server(create_test_config(), extractors, Arc::new(StubAnalyzer::generating("- tip")));

        let response = server
            .post("/upload")
            .multipart(file_form(b"%PDF-1.7", "post.pdf", "application/pdf; name=post.pdf"))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<AnalysisResponse>().extracted_text, "pdf text");

        let response = server
            .post("/upload")
            .multipart(file_form(b"\x89PNG", "post.png", "IMAGE/PNG; q=1"))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<AnalysisResponse>().extracted_text, "ocr text");

        assert_eq!(document.calls(), 1);
        assert_eq!(image.calls(), 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_upload_image_wire_format() {
        let (extractors, _document, image) = stub_extractors("unused", "Sunset vibes");
        let server = create_test_server(create_test_config(), extractors, Arc::new(StubAnalyzer::generating("- tip")));

        let response = server
            .post("/upload")
            .multipart(file_form(b"\xff\xd8\xff", "photo.jpg", "image/jpeg"))
            .await;

        response.assert_status_ok();
        response.assert_json(&serde_json::json!({
            "extractedText": "Sunset vibes",
            "suggestions": "- tip"
        }));
        assert_eq!(image.calls(), 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_missing_file_part() {
        let (extractors, document, image) = stub_extractors("a", "b");
        let analyzer = StubAnalyzer::generating("- tip");
        let server = create_test_server(create_test_config(), extractors, Arc::new(analyzer.clone()));

        let response = server
            .post("/upload")
            .multipart(MultipartForm::new().add_text("caption", "hello"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorBody = response.json();
        assert_eq!(body.error_kind, "missing_file");
        assert_eq!(body.message, "No file uploaded");
        assert_eq!(document.calls() + image.calls() + analyzer.calls(), 0);
    }

    #[test_log::test(tokio::test)]
    async fn test_non_multipart_body_is_missing_file() {
        let (extractors, document, image) = stub_extractors("a", "b");
        let server = create_test_server(create_test_config(), extractors, Arc::new(StubAnalyzer::generating("- tip")));

        let response = server.post("/upload").json(&serde_json::json!({"file": "nope"})).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<ErrorBody>().error_kind, "missing_file");
        assert_eq!(document.calls() + image.calls(), 0);
    }

    #[test_log::test(tokio::test)]
    async fn test_unsupported_content_type() {
        let (extractors, document, image) = stub_extractors("a", "b");
        let server = create_test_server(create_test_config(), extractors, Arc::new(StubAnalyzer::generating("- tip")));

        let response = server
            .post("/upload")
            .multipart(file_form(b"plain words", "notes.txt", "text/plain"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorBody = response.json();
        assert_eq!(body.error_kind, "unsupported_content_type");
        assert_eq!(body.message, "Unsupported file type: text/plain");
        assert_eq!(document.calls() + image.calls(), 0);
    }

    #[test_log::test(tokio::test)]
    async fn test_empty_extraction() {
        let (extractors, _document, _image) = stub_extractors("   \n  ", "b");
        let analyzer = StubAnalyzer::generating("- tip");
        let server = create_test_server(create_test_config(), extractors, Arc::new(analyzer.clone()));

        let response = server
            .post("/upload")
            .multipart(file_form(b"%PDF-1.4", "blank.pdf", "application/pdf"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorBody = response.json();
        assert_eq!(body.error_kind, "empty_content");
        assert_eq!(body.message, "Could not extract text");
        assert_eq!(analyzer.calls(), 0);
    }

    #[test_log::test(tokio::test)]
    async fn test_extraction_failure() {
        let extractors = Extractors::new(
            Arc::new(StubExtractor::failing(|| ExtractionError::MalformedPdf("unexpected EOF".to_string()))),
            Arc::new(StubExtractor::returning("unused")),
        );
        let analyzer = StubAnalyzer::generating("- tip");
        let server = create_test_server(create_test_config(), extractors, Arc::new(analyzer.clone()));

        let response = server
            .post("/upload")
            .multipart(file_form(b"%PDF-trunc", "broken.pdf", "application/pdf"))
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorBody = response.json();
        assert_eq!(body.error_kind, "extraction_failed");
        assert_eq!(body.message, "Server processing failed");
        assert_eq!(body.details.as_deref(), Some("malformed PDF: unexpected EOF"));
        assert_eq!(analyzer.calls(), 0);
    }

    #[test_log::test(tokio::test)]
    async fn test_degraded_suggestions_still_200() {
        let (extractors, _document, _image) = stub_extractors("Some post", "b");
        let server = create_test_server(create_test_config(), extractors, Arc::new(StubAnalyzer::degraded()));

        let response = server
            .post("/upload")
            .multipart(file_form(b"%PDF-1.4", "post.pdf", "application/pdf"))
            .await;

        response.assert_status_ok();
        let body: AnalysisResponse = response.json();
        assert_eq!(body.extracted_text, "Some post");
        assert_eq!(body.suggestions, SUGGESTION_FAILED);
    }

    #[test_log::test(tokio::test)]
    async fn test_oversized_upload_rejected_before_extraction() {
        let (extractors, document, image) = stub_extractors("a", "b");
        let mut config = create_test_config();
        config.limits.max_upload_size = 16;
        let server = create_test_server(config, extractors, Arc::new(StubAnalyzer::generating("- tip")));

        let response = server
            .post("/upload")
            .multipart(file_form(&[b'x'; 64], "big.png", "image/png"))
            .await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        let body: ErrorBody = response.json();
        assert_eq!(body.error_kind, "payload_too_large");
        assert_eq!(body.message, "File size exceeds maximum allowed size of 16 bytes");
        assert_eq!(document.calls() + image.calls(), 0);
    }

    #[test_log::test(tokio::test)]
    async fn test_upload_at_limit_accepted() {
        let (extractors, _document, image) = stub_extractors("a", "text in image");
        let mut config = create_test_config();
        config.limits.max_upload_size = 16;
        let server = create_test_server(config, extractors, Arc::new(StubAnalyzer::generating("- tip")));

        let response = server
            .post("/upload")
            .multipart(file_form(&[b'x'; 16], "small.png", "image/png"))
            .await;

        response.assert_status_ok();
        assert_eq!(image.calls(), 1);
    }
}
