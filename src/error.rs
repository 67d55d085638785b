//! Error types for the price alert service

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PriceAlertError>;

/// Failure taxonomy for the service. Every tick-level failure is one of
/// these; all are caught at the tick boundary, logged, and swallowed.
#[derive(Debug, Error)]
pub enum PriceAlertError {
    /// Invalid or missing configuration value
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// ABI file could not be read or parsed
    #[error("ABI load error: {0}")]
    AbiLoad(String),

    /// Transaction submission failed before inclusion
    #[error("Submission error: {0}")]
    Submission(String),

    /// Transaction was not confirmed, or reverted on-chain
    #[error("Confirmation error: {0}")]
    Confirmation(String),
}
