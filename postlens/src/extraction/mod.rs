//! Text extraction from uploaded documents.
//!
//! An upload is routed to exactly one [`TextExtractor`] based on its declared content type:
//!
//! - `application/pdf` → [`PdfExtractor`], backed by the `pdf-extract` crate
//! - `image/*` → [`TesseractExtractor`], backed by the Tesseract OCR engine
//!
//! The content type is resolved once into an [`ExtractionKind`] and the rest of the pipeline
//! only ever matches on that enum. Extracted text is checked by [`validate_text`] before it is
//! allowed anywhere near the analysis service.

mod ocr;
mod pdf;

pub use ocr::TesseractExtractor;
pub use pdf::PdfExtractor;

use crate::config::OcrConfig;
use crate::errors::Error;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error as ThisError;

/// Declared content type of PDF documents.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Prefix shared by every image content type.
pub const IMAGE_CONTENT_TYPE_PREFIX: &str = "image/";

/// Failure reported by an extraction collaborator.
#[derive(ThisError, Debug)]
pub enum ExtractionError {
    /// The PDF parser rejected the document
    #[error("malformed PDF: {0}")]
    MalformedPdf(String),

    /// The OCR engine could not be started or talked to
    #[error("failed to run OCR engine: {0}")]
    EngineIo(#[from] std::io::Error),

    /// The OCR engine ran but exited unsuccessfully
    #[error("OCR engine exited with status {}", exit_status(.status))]
    EngineExited { status: Option<i32> },

    /// The extraction worker panicked or was cancelled
    #[error("extraction worker crashed: {0}")]
    WorkerCrashed(String),
}

fn exit_status(status: &Option<i32>) -> String {
    status.map_or_else(|| "unknown".to_string(), |code| code.to_string())
}

/// Which extraction strategy a declared content type resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionKind {
    Document,
    Image,
    Unsupported(String),
}

/// Reduce a declared content type to its lowercase `type/subtype`, dropping parameters.
///
/// Values that do not parse as a media type are only trimmed, so they still surface verbatim
/// in the unsupported type error.
pub fn content_type_essence(raw: &str) -> String {
    match raw.trim().parse::<mime::Mime>() {
        Ok(parsed) => parsed.essence_str().to_ascii_lowercase(),
        Err(_) => raw.trim().to_string(),
    }
}

impl ExtractionKind {
    /// Resolve a content type essence (see [`content_type_essence`]). Matching is exact for
    /// PDFs and by prefix for images.
    pub fn from_content_type(content_type: &str) -> Self {
        if content_type == PDF_CONTENT_TYPE {
            Self::Document
        } else if content_type.starts_with(IMAGE_CONTENT_TYPE_PREFIX) {
            Self::Image
        } else {
            Self::Unsupported(content_type.to_string())
        }
    }
}

/// Output of a single extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Full best-effort transcription; may be empty
    pub text: String,
    pub source_content_type: String,
}

/// A content-family specific conversion from raw bytes to plain text.
///
/// Implementations are stateless: no caching, no retries.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, bytes: Bytes) -> Result<String, ExtractionError>;
}

/// The set of strategies the dispatcher chooses from.
#[derive(Clone)]
pub struct Extractors {
    pub document: Arc<dyn TextExtractor>,
    pub image: Arc<dyn TextExtractor>,
}

impl Extractors {
    pub fn new(document: Arc<dyn TextExtractor>, image: Arc<dyn TextExtractor>) -> Self {
        Self { document, image }
    }

    /// The production strategies: `pdf-extract` for documents, Tesseract for images.
    pub fn from_config(ocr: &OcrConfig) -> Self {
        Self::new(Arc::new(PdfExtractor), Arc::new(TesseractExtractor::new(ocr)))
    }

    /// Pick the strategy for `kind`, rejecting unsupported content types.
    pub fn select(&self, kind: &ExtractionKind) -> Result<&dyn TextExtractor, Error> {
        match kind {
            ExtractionKind::Document => Ok(self.document.as_ref()),
            ExtractionKind::Image => Ok(self.image.as_ref()),
            ExtractionKind::Unsupported(content_type) => Err(Error::UnsupportedContentType {
                content_type: content_type.clone(),
            }),
        }
    }
}

/// Reject extraction output that is empty once whitespace is trimmed.
pub fn validate_text(text: &str) -> Result<(), Error> {
    if text.trim().is_empty() {
        return Err(Error::EmptyContent);
    }
    Ok(())
}
