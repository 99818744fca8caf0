//! HTTP request handlers.
//!
//! - [`documents`]: document upload, extraction and analysis
//! - [`health`]: liveness acknowledgment
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`] which converts to the matching HTTP status code
//! and a JSON body carrying `errorKind` and `message`.

pub mod documents;
pub mod health;
