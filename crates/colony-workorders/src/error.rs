//! Error types for the colony-workorders crate.
//!
//! Registry errors are configuration mistakes and are fatal at startup.
//! Load and view errors describe a single malformed entry; callers drop the
//! entry and keep going.

use colony_types::WorkOrderId;

/// Errors raised while populating the kind registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A factory was already registered under this kind tag.
    #[error("duplicate work order kind '{kind}'")]
    DuplicateKind {
        /// The kind tag registered twice.
        kind: String,
    },

    /// The factory builds an order that reports a different kind tag, so the
    /// order could never be written back under the tag it was loaded from.
    #[error("factory for kind '{kind}' builds orders of kind '{reported}'")]
    KindMismatch {
        /// The kind tag the factory was registered under.
        kind: String,
        /// The kind tag the blank order reports.
        reported: String,
    },
}

/// Errors raised while writing an order to the persistence tree.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// The order's kind has no registry entry.
    #[error("work order {id} has unregistered kind '{kind}'")]
    Unregistered {
        /// The order being written.
        id: WorkOrderId,
        /// Its kind tag.
        kind: String,
    },
}

/// Errors raised while reading one order from the persistence tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// No factory is registered for the stored kind tag.
    #[error("unknown work order kind '{kind}'")]
    UnknownKind {
        /// The stored kind tag.
        kind: String,
    },

    /// A required field is absent.
    #[error("missing field '{field}'")]
    MissingField {
        /// Name of the absent field.
        field: &'static str,
    },

    /// A field is present but has the wrong type or an out-of-range value.
    #[error("invalid field '{field}': {reason}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },
}

/// Errors raised by the binary client view codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    /// The buffer ended before the field was complete.
    #[error("view truncated while reading {field}")]
    Truncated {
        /// The field being read.
        field: &'static str,
    },

    /// The string does not fit the 2-byte length prefix, or the prefix
    /// itself runs past 2 bytes.
    #[error("view string too long: {len} bytes")]
    StringTooLong {
        /// Encoded length in bytes (a lower bound for an overlong prefix).
        len: usize,
    },

    /// The string bytes are not valid UTF-8.
    #[error("view string is not valid UTF-8")]
    InvalidUtf8,

    /// The type ordinal names no [`colony_types::WorkOrderType`].
    #[error("unknown work order type ordinal {ordinal}")]
    UnknownType {
        /// The ordinal read from the buffer.
        ordinal: i32,
    },

    /// An id field holds a negative value.
    #[error("negative value {value} in {field}")]
    NegativeId {
        /// The field being read.
        field: &'static str,
        /// The value read.
        value: i32,
    },

    /// An id is too large for its signed 32-bit field.
    #[error("{field} {value} does not fit a signed 32-bit field")]
    IdOutOfRange {
        /// The field being written.
        field: &'static str,
        /// The id that was refused.
        value: u32,
    },
}

/// Errors raised by the [`crate::WorkManager`].
#[derive(Debug, thiserror::Error)]
pub enum WorkManagerError {
    /// Every work-order id has been handed out.
    #[error("work order ids exhausted (top id {top})")]
    IdsExhausted {
        /// The highest id issued so far.
        top: u32,
    },
}
