use thiserror::Error;

/// Returned when an incoming bit stream cannot be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Serde error: bit stream is truncated or malformed")]
pub struct SerdeErr;
