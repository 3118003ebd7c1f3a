use thiserror::Error;

use crate::value::ValueKind;

/// Fatal errors raised while building a TypeDescriptor or locking a Protocol.
/// These abort initialization: silently skipping a slot would shift every
/// following ordinal and desynchronize the peers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A replicated field was declared private
    #[error("Replicated field `{field}` on {type_name} is private. Replicated fields must be at least protected")]
    PrivateReplicatedField {
        type_name: &'static str,
        field: &'static str,
    },

    /// `inherit()` was called after the type declared its own slots
    #[error("{type_name} inherits {base} after declaring its own slots. Base slots must come first")]
    BaseAfterOwnSlots {
        type_name: &'static str,
        base: &'static str,
    },

    /// Two fields share a name
    #[error("Replicated field `{field}` is declared more than once on {type_name}")]
    DuplicateField {
        type_name: &'static str,
        field: &'static str,
    },

    /// Two remote-callable methods share a name
    #[error("Remote-callable method `{method}` is declared more than once on {type_name}")]
    DuplicateMethod {
        type_name: &'static str,
        method: &'static str,
    },

    /// The slot count does not fit the wire ordinal width
    #[error("{type_name} declares {count} {slot}s, more than the wire format can address")]
    TooManySlots {
        type_name: &'static str,
        slot: &'static str,
        count: usize,
    },

    /// The same type was added to the Protocol twice
    #[error("{type_name} is already registered with the Protocol")]
    AlreadyRegistered { type_name: &'static str },

    /// Protocol is locked and cannot be modified
    #[error("Protocol is already locked and cannot be modified")]
    ProtocolLocked,
}

/// Recoverable caller-level errors: the caller asked for something that does not exist
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("{type_name} has no remote-callable method named `{name}`")]
    UnknownMethod { type_name: &'static str, name: String },

    #[error("{type_name} has no replicated field named `{name}`")]
    UnknownField { type_name: &'static str, name: String },

    #[error("Method ordinal {ordinal} is out of range for {type_name} ({method_count} methods)")]
    MethodOutOfRange {
        type_name: &'static str,
        ordinal: usize,
        method_count: usize,
    },

    #[error("Field ordinal {ordinal} is out of range for {type_name} ({field_count} fields)")]
    FieldOutOfRange {
        type_name: &'static str,
        ordinal: usize,
        field_count: usize,
    },

    #[error("`{type_name}::{method}` takes {expected} arguments, {actual} given")]
    ArgumentCount {
        type_name: &'static str,
        method: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Argument {index} of `{type_name}::{method}` must be {expected:?}, got {actual:?}")]
    ArgumentKind {
        type_name: &'static str,
        method: &'static str,
        index: usize,
        expected: ValueKind,
        actual: ValueKind,
    },

    #[error("{type_name} is not registered with the Protocol. Call `add_replicable()` during protocol initialization")]
    TypeNotRegistered { type_name: &'static str },

    #[error("Expected an instance of {expected}, got {actual}")]
    WrongInstanceType {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Cannot diff snapshots of different sizes ({old_bytes} vs {new_bytes} mask bytes)")]
    SnapshotLengthMismatch { old_bytes: usize, new_bytes: usize },
}
