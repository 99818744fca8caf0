//! Per-request orchestration: dispatch, extract, validate, analyze.
//!
//! A request moves through an explicit state machine:
//!
//! ```text
//! Received ─▶ Dispatched ─▶ Extracted ─▶ Validated ─▶ Analyzed ─▶ Responded(Ok)
//!     │            │            │            │
//!     └────────────┴────────────┴────────────┴──────────────────▶ Responded(Err)
//! ```
//!
//! Every transition is handled exhaustively in [`PipelineState::advance`], so each request ends
//! in exactly one [`Outcome`]. Only the extraction step may turn a well-formed request into a
//! server error; analysis cannot fail.

use crate::analysis::Analyze;
use crate::api::models::documents::AnalysisResponse;
use crate::errors::Error;
use crate::extraction::{ExtractionKind, ExtractionResult, Extractors, validate_text};
use bytes::Bytes;
use tracing::{info, instrument};

/// A document as received at ingress. Owned by a single request, never persisted.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub bytes: Bytes,
    pub content_type: String,
    pub size_bytes: u64,
    /// Client-side file name, for logging only
    pub file_name: Option<String>,
}

impl UploadedDocument {
    pub fn new(bytes: Bytes, content_type: impl Into<String>, file_name: Option<String>) -> Self {
        Self {
            size_bytes: bytes.len() as u64,
            bytes,
            content_type: content_type.into(),
            file_name,
        }
    }
}

/// Terminal result of one pipeline run.
pub type Outcome = Result<AnalysisResponse, Error>;

/// States of a single request.
#[derive(Debug)]
pub enum PipelineState {
    Received(Option<UploadedDocument>),
    Dispatched {
        document: UploadedDocument,
        kind: ExtractionKind,
    },
    Extracted(ExtractionResult),
    Validated(ExtractionResult),
    Analyzed {
        extraction: ExtractionResult,
        suggestions: String,
    },
    Responded(Outcome),
}

impl PipelineState {
    /// Perform one transition.
    pub async fn advance(self, extractors: &Extractors, analyzer: &dyn Analyze) -> Self {
        match self {
            PipelineState::Received(None) => PipelineState::Responded(Err(Error::MissingFile)),
            PipelineState::Received(Some(document)) => {
                let kind = ExtractionKind::from_content_type(&document.content_type);
                PipelineState::Dispatched { document, kind }
            }
            PipelineState::Dispatched { document, kind } => {
                let extractor = match extractors.select(&kind) {
                    Ok(extractor) => extractor,
                    Err(e) => return PipelineState::Responded(Err(e)),
                };
                info!(
                    content_type = %document.content_type,
                    size_bytes = document.size_bytes,
                    file_name = ?document.file_name,
                    "Extracting text ({:?})",
                    kind
                );
                let UploadedDocument { bytes, content_type, .. } = document;
                match extractor.extract(bytes).await {
                    Ok(text) => PipelineState::Extracted(ExtractionResult {
                        text,
                        source_content_type: content_type,
                    }),
                    Err(source) => PipelineState::Responded(Err(Error::ExtractionFailed { content_type, source })),
                }
            }
            PipelineState::Extracted(extraction) => match validate_text(&extraction.text) {
                Ok(()) => PipelineState::Validated(extraction),
                Err(e) => PipelineState::Responded(Err(e)),
            },
            PipelineState::Validated(extraction) => {
                let result = analyzer.analyze(&extraction.text).await;
                if result.degraded {
                    info!("Responding with degraded suggestions");
                }
                PipelineState::Analyzed {
                    extraction,
                    suggestions: result.suggestions,
                }
            }
            PipelineState::Analyzed { extraction, suggestions } => PipelineState::Responded(Ok(AnalysisResponse {
                extracted_text: extraction.text,
                suggestions,
            })),
            responded @ PipelineState::Responded(_) => responded,
        }
    }

    /// Short state name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::Received(_) => "received",
            PipelineState::Dispatched { .. } => "dispatched",
            PipelineState::Extracted(_) => "extracted",
            PipelineState::Validated(_) => "validated",
            PipelineState::Analyzed { .. } => "analyzed",
            PipelineState::Responded(_) => "responded",
        }
    }
}

/// Drive a request from `Received` to `Responded`.
#[instrument(skip_all)]
pub async fn run(document: Option<UploadedDocument>, extractors: &Extractors, analyzer: &dyn Analyze) -> Outcome {
    let mut state = PipelineState::Received(document);
    loop {
        state = match state {
            PipelineState::Responded(outcome) => return outcome,
            other => {
                tracing::trace!(state = other.name(), "Advancing pipeline");
                other.advance(extractors, analyzer).await
            }
        };
    }
}
