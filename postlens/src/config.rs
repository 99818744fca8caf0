//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The file path
//! defaults to `config.yaml` but can be specified via `-f` or the `POSTLENS_CONFIG` environment
//! variable. A missing file is not an error: every field has a default.
//!
//! ## Loading Priority
//!
//! Sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `POSTLENS_` override YAML values
//! 3. **OPENROUTER_API_KEY** - Special case: sets `analysis.api_key` if present
//!
//! For nested values, use double underscores, e.g. `POSTLENS_OCR__LANGUAGE=deu` sets
//! `ocr.language`.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use postlens::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//!
//! println!("Server will bind to {}", config.bind_address());
//! # Ok(())
//! # }
//! ```
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # Override server port
//! POSTLENS_PORT=8080
//!
//! # Credential for the suggestion service
//! OPENROUTER_API_KEY=sk-or-...
//!
//! # Raise the upload limit to 10 MiB
//! POSTLENS_LIMITS__MAX_UPLOAD_SIZE=10485760
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use url::Url;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "POSTLENS_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
    /// Upload limits
    pub limits: LimitsConfig,
    /// OCR engine settings for image uploads
    pub ocr: OcrConfig,
    /// Suggestion service settings
    pub analysis: AnalysisConfig,
    /// CORS settings for browser clients
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum accepted upload size in bytes (default: 5 MiB)
    pub max_upload_size: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_size: 5 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OcrConfig {
    /// Path or name of the tesseract executable
    pub tesseract_path: String,
    /// Tesseract language code (ISO 639-2, e.g. `eng`)
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_path: "tesseract".to_string(),
            language: "eng".to_string(),
        }
    }
}

/// Connection settings for the OpenAI-compatible chat completions service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Base URL; `chat/completions` is appended
    pub base_url: Url,
    /// Model identifier sent with every request
    pub model: String,
    /// Bearer credential. Requests degrade to the failure sentinel when unset.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Optional `HTTP-Referer` attribution header
    pub referer: Option<String>,
    /// Optional `X-Title` attribution header
    pub title: Option<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("https://openrouter.ai/api/v1").expect("static URL is valid"),
            model: "mistralai/mistral-7b-instruct".to_string(),
            api_key: None,
            referer: None,
            title: Some("Social Media Analyzer".to_string()),
        }
    }
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<CorsOrigin>,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![CorsOrigin::Wildcard],
            max_age: None,
        }
    }
}

/// CORS origin specification.
///
/// Can be either a wildcard (`*`) to allow all origins, or a specific URL.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://app.example.com`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            enable_otel_export: false,
            limits: LimitsConfig::default(),
            ocr: OcrConfig::default(),
            analysis: AnalysisConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(figment::Error::from)?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), String> {
        if self.limits.max_upload_size == 0 {
            return Err("Config validation: limits.max_upload_size must be positive".to_string());
        }
        if self.ocr.tesseract_path.trim().is_empty() {
            return Err("Config validation: ocr.tesseract_path cannot be empty".to_string());
        }
        if self.ocr.language.trim().is_empty() {
            return Err("Config validation: ocr.language cannot be empty".to_string());
        }
        if self.analysis.model.trim().is_empty() {
            return Err("Config validation: analysis.model cannot be empty".to_string());
        }
        if self.cors.allowed_origins.len() > 1 && self.cors.allowed_origins.contains(&CorsOrigin::Wildcard) {
            return Err("Config validation: cors.allowed_origins cannot mix '*' with explicit origins".to_string());
        }
        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            // (POSTLENS_CONFIG names the file itself and is not a setting)
            .merge(Env::prefixed("POSTLENS_").ignore(&["CONFIG"]).split("__"))
            // Conventional name for the OpenRouter credential
            .merge(Env::raw().only(&["OPENROUTER_API_KEY"]).map(|_| "analysis.api_key".into()))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
