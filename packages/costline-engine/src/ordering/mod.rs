//! Pure ordering algorithms
//!
//! Collections are ordered by a persisted integer index. These functions
//! never touch storage: they compute the minimal set of corrections and
//! leave persistence to the caller.

mod move_item;
mod partition;
mod reindex;

pub use move_item::move_to_index;
pub use partition::partition_by_key;
pub use reindex::{reindex, Correction, Ordered};
