//! # AppError
//!
//! Centralized error handling for the Pictag ecosystem.
//! One variant per failure kind so callers can map each to a distinct
//! HTTP response class; nothing is collapsed into a catch-all.

use thiserror::Error;

/// The primary error type for all pt-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or incomplete upload request (user-correctable)
    #[error("invalid upload request: {0}")]
    Validation(String),

    /// Remote image fetch failed (network/IO)
    #[error("could not materialize linked image: {0}")]
    Materialization(String),

    /// Malformed base64/data-URI payload
    #[error("malformed image data: {0}")]
    DataFormat(String),

    /// The backing store rejected a write
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// The annotation service failed
    #[error("object detection failed: {0}")]
    Detection(String),

    /// No record for the supplied identifier
    #[error("image not found with id {0}")]
    NotFound(String),

    /// Supplied identifier is not a well-formed UUID
    #[error("invalid image identifier: {0}")]
    InvalidIdentifier(String),

    /// Infrastructure failure outside the categories above
    #[error("internal service error: {0}")]
    Internal(String),
}

/// A specialized Result type for Pictag logic.
pub type Result<T> = std::result::Result<T, AppError>;
