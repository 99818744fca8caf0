//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! # API Structure
//!
//! - `POST /upload`: submit a PDF or image for text extraction and suggestions
//! - `GET /`: liveness acknowledgment
//! - `GET /healthz`: plain-text health check
//!
//! All endpoints are documented with OpenAPI annotations using `utoipa`; documentation is
//! served at `/docs` when the server is running.

pub mod handlers;
pub mod models;
