use thiserror::Error;

use crate::{
    protocol::error::ProtocolError,
    registry::error::{ConfigError, LookupError},
};

/// Any error raised by the replication core, for callers that do not need
/// to tell the classes apart
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplicaError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
