//! Error types for costline-engine
//!
//! Computation errors (malformed index, invalid margin) are raised
//! immediately and never swallowed; storage errors pass through from the
//! persistence port.

use costline_storage::{IndexEntity, StorageError};
use thiserror::Error;

/// Main error type for engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    /// An order index is missing where a number is required; fatal to the
    /// operation, the data must be fixed upstream
    #[error("malformed index on {entity} {id}: no order index present")]
    MalformedIndex { entity: IndexEntity, id: String },

    /// A referenced id is absent from its expected sibling set
    #[error("item not found among siblings: {0}")]
    ItemNotFound(String),

    /// Margin must satisfy `0 <= margin < 1`; never silently clamped
    #[error("invalid margin: {0} (must be >= 0 and < 1)")]
    InvalidMargin(f64),

    /// Quantity must be non-negative
    #[error("invalid quantity: {0} (must be >= 0)")]
    InvalidQuantity(f64),

    /// Target position outside `[0, len)`; rejected rather than clamped
    #[error("index {index} out of range for {len} siblings")]
    IndexOutOfRange { index: i64, len: usize },

    /// Persistence error from the storage port
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl EngineError {
    pub fn malformed_index(entity: IndexEntity, id: impl Into<String>) -> Self {
        EngineError::MalformedIndex {
            entity,
            id: id.into(),
        }
    }

    pub fn item_not_found(id: impl Into<String>) -> Self {
        EngineError::ItemNotFound(id.into())
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
