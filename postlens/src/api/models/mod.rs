//! API request and response data models.
//!
//! These define the public API contract and are annotated with `utoipa` for the generated
//! OpenAPI document. Field names are camelCase on the wire.

pub mod documents;
