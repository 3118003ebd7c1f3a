use thiserror::Error;

use replica_serde::SerdeErr;

use crate::{types::Context, value::ValueKind};

/// Receive-side errors: an incoming message does not match the local type
/// descriptors. The message is dropped and the process carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Received unknown type net id {net_id}")]
    UnknownKind { net_id: u16 },

    #[error("Received unknown method id {ordinal} for {type_name} ({method_count} methods)")]
    UnknownMethod {
        type_name: &'static str,
        ordinal: u16,
        method_count: usize,
    },

    #[error("Received field ordinal {ordinal} for {type_name} ({field_count} fields)")]
    FieldOutOfRange {
        type_name: &'static str,
        ordinal: usize,
        field_count: usize,
    },

    #[error("Received a {actual_bytes}-byte presence mask for {type_name}, expected {expected_bytes}")]
    MaskLengthMismatch {
        type_name: &'static str,
        expected_bytes: usize,
        actual_bytes: usize,
    },

    #[error("Presence mask has {present} bits set but {values} values were supplied")]
    ValueCountMismatch { present: usize, values: usize },

    #[error("Field `{field}` of {type_name} holds {expected:?}, received {actual:?}")]
    ValueKindMismatch {
        type_name: &'static str,
        field: &'static str,
        expected: ValueKind,
        actual: ValueKind,
    },

    #[error("`{type_name}::{method}` takes {expected} arguments, received {actual}")]
    ArgumentCount {
        type_name: &'static str,
        method: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Argument {index} of `{type_name}::{method}` must be {expected:?}, received {actual:?}")]
    ArgumentKind {
        type_name: &'static str,
        method: &'static str,
        index: usize,
        expected: ValueKind,
        actual: ValueKind,
    },

    #[error("Message addressed {expected} but the instance is {actual}")]
    KindMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{context:?} does not accept {message} messages")]
    UnexpectedMessage {
        context: Context,
        message: &'static str,
    },

    #[error("Malformed message: {0}")]
    Malformed(#[from] SerdeErr),
}
