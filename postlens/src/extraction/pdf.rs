use super::{ExtractionError, TextExtractor};
use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, instrument};

/// Extracts the text layer of a PDF held fully in memory.
///
/// Parsing is CPU-bound and runs on the blocking pool. The parser is known to panic on some
/// malformed inputs; a panic surfaces as [`ExtractionError::WorkerCrashed`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

#[async_trait]
impl TextExtractor for PdfExtractor {
    #[instrument(skip_all, fields(size_bytes = bytes.len()))]
    async fn extract(&self, bytes: Bytes) -> Result<String, ExtractionError> {
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|e| ExtractionError::WorkerCrashed(e.to_string()))?
            .map_err(|e| ExtractionError::MalformedPdf(e.to_string()))?;

        debug!(chars = text.len(), "Extracted PDF text layer");
        Ok(text)
    }
}
