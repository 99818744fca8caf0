use super::{ExtractionError, TextExtractor};
use crate::config::OcrConfig;
use async_trait::async_trait;
use bytes::Bytes;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Runs the Tesseract engine over an image buffer.
///
/// The image is streamed to the engine's stdin and the recognized text read back from stdout
/// (`tesseract stdin stdout -l <lang>`). Engine progress and diagnostics on stderr are
/// discarded. The child is killed if the extraction future is dropped.
#[derive(Debug, Clone)]
pub struct TesseractExtractor {
    program: String,
    language: String,
}

impl TesseractExtractor {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            program: config.tesseract_path.clone(),
            language: config.language.clone(),
        }
    }
}

#[async_trait]
impl TextExtractor for TesseractExtractor {
    #[instrument(skip_all, fields(size_bytes = bytes.len(), language = %self.language))]
    async fn extract(&self, bytes: Bytes) -> Result<String, ExtractionError> {
        let mut child = Command::new(&self.program)
            .args(["stdin", "stdout", "-l", &self.language])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        // Feed stdin concurrently so a chatty engine can't deadlock on a full stdout pipe
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ExtractionError::WorkerCrashed("OCR engine stdin unavailable".to_string()))?;
        let writer = tokio::spawn(async move {
            stdin.write_all(&bytes).await?;
            stdin.shutdown().await
        });

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(ExtractionError::EngineExited {
                status: output.status.code(),
            });
        }

        writer
            .await
            .map_err(|e| ExtractionError::WorkerCrashed(e.to_string()))??;

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(chars = text.len(), "OCR recognized text");
        Ok(text)
    }
}
