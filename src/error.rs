//! The one error the containers report.

use thiserror::Error;

/// Lookup failure from `at`-style accessors.
///
/// Every other operation is precondition-based; see the `# Safety` and
/// `# Panics` sections of the individual methods.
#[derive(Copy, Clone, Debug, Error, Eq, PartialEq)]
pub enum OutOfRange {
    /// A positional lookup past the last live element.
    #[error("index {index} out of range for length {len}")]
    Index {
        /// The requested position.
        index: usize,
        /// Number of live elements at the time of the lookup.
        len: usize,
    },

    /// A keyed lookup for a key the table does not hold.
    #[error("key not present in map")]
    MissingKey,
}
