//! EstimateStore - persistence layer for the costline estimating engine
//!
//! ## Core Principles
//!
//! 1. **Hierarchical ownership**: project → area → group → line item → option,
//!    enforced top-down, cascading on delete
//! 2. **Nullable order indices**: `index_in_category` / `index_in_group` may be
//!    missing on legacy rows (fatal to ordering until fixed) or numerically
//!    drifted (reconciled by the engine on read)
//! 3. **Atomic batches**: every multi-row index write goes through one
//!    transaction (`apply_index_updates`) - a reorder fully succeeds or fully
//!    rolls back
//!
//! ## Usage
//!
//! ```rust,ignore
//! use costline_storage::{EstimateStore, SqliteEstimateStore, IndexUpdate};
//!
//! let store = SqliteEstimateStore::open_in_memory()?;
//! store.insert_area(&area).await?;
//!
//! let area = store.fetch_area(&area.id).await?;
//!
//! // Apply a reorder computed by the engine, all-or-nothing
//! store.apply_index_updates(&[
//!     IndexUpdate::group("g1", 0),
//!     IndexUpdate::group("g2", 1),
//! ]).await?;
//! ```

pub mod domain;
pub mod error;

pub mod infrastructure;

pub use error::{ErrorKind, Result, StorageError};

// Domain re-exports
pub use domain::{
    Area, AreaTemplate, Category, EstimateStore, Group, GroupPatch, IndexEntity, IndexUpdate,
    LineItem, LineItemOption, LineItemOptionPatch, LineItemPatch, OptionTier, Project,
    ProjectPatch,
};

pub use infrastructure::MemoryEstimateStore;
#[cfg(feature = "sqlite")]
pub use infrastructure::SqliteEstimateStore;
