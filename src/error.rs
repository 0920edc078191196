//! Error type for table operations.

use thiserror::Error;

/// Failure of a keyed table operation.
///
/// Key absence is never an error; lookups report it as `Ok(None)` or
/// `Ok(false)`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// A computed bucket index fell outside the bucket array. This means the
    /// hash/capacity relationship is broken; `clear()` restores a consistent
    /// table.
    #[error("bucket index {index} out of range for capacity {capacity}")]
    IndexOutOfRange { index: usize, capacity: usize },
}
