//! Stub collaborators and helpers shared by tests.

use crate::analysis::{Analyze, SuggestionResult};
use crate::config::Config;
use crate::extraction::{ExtractionError, Extractors, TextExtractor};
use crate::{AppState, build_router};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::{Arc, Mutex, Once};

/// Install the process-wide rustls provider that `main` installs in production.
pub fn install_crypto_provider() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
    });
}

/// A [`TextExtractor`] with a canned answer that records every buffer it is given.
#[derive(Clone)]
pub struct StubExtractor {
    answer: Result<String, fn() -> ExtractionError>,
    seen: Arc<Mutex<Vec<Bytes>>>,
}

impl StubExtractor {
    pub fn returning(text: &str) -> Self {
        Self {
            answer: Ok(text.to_string()),
            seen: Arc::default(),
        }
    }

    pub fn failing(error: fn() -> ExtractionError) -> Self {
        Self {
            answer: Err(error),
            seen: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn seen(&self) -> Vec<Bytes> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextExtractor for StubExtractor {
    async fn extract(&self, bytes: Bytes) -> Result<String, ExtractionError> {
        self.seen.lock().unwrap().push(bytes);
        match &self.answer {
            Ok(text) => Ok(text.clone()),
            Err(error) => Err(error()),
        }
    }
}

/// Document and image stubs wired into an [`Extractors`], with handles for inspection.
pub fn stub_extractors(document_text: &str, image_text: &str) -> (Extractors, StubExtractor, StubExtractor) {
    let document = StubExtractor::returning(document_text);
    let image = StubExtractor::returning(image_text);
    let extractors = Extractors::new(Arc::new(document.clone()), Arc::new(image.clone()));
    (extractors, document, image)
}

/// An [`Analyze`] with a fixed result that records every text it is given.
#[derive(Clone)]
pub struct StubAnalyzer {
    result: SuggestionResult,
    seen: Arc<Mutex<Vec<String>>>,
}

impl StubAnalyzer {
    pub fn generating(suggestions: &str) -> Self {
        Self {
            result: SuggestionResult::generated(suggestions.to_string()),
            seen: Arc::default(),
        }
    }

    pub fn degraded() -> Self {
        Self {
            result: SuggestionResult::failed(),
            seen: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Analyze for StubAnalyzer {
    async fn analyze(&self, text: &str) -> SuggestionResult {
        self.seen.lock().unwrap().push(text.to_string());
        self.result.clone()
    }
}

pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.host = "127.0.0.1".to_string();
    config.port = 0;
    config
}

/// Build a test server around the real router with the given collaborators.
pub fn create_test_server(config: Config, extractors: Extractors, analyzer: Arc<dyn Analyze>) -> axum_test::TestServer {
    let state = AppState::builder().config(config).extractors(extractors).analyzer(analyzer).build();
    let router = build_router(&state).expect("Failed to build router");
    axum_test::TestServer::new(router).expect("Failed to create test server")
}
