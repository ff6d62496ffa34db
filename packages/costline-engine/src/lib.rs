//! Costline engine - re-indexing and cost aggregation for estimating trees
//!
//! The engine keeps ordered collections (groups within a category, line
//! items within a group) contiguously indexed through inserts, deletes,
//! and arbitrary reorders, and computes hierarchical low/high price ranges
//! (line item → group → area → project) from selected pricing options.
//!
//! # Layers
//!
//! - `ordering`: pure index algorithms (reindex, move-to-position,
//!   category partitioning)
//! - `pricing`: margin/markup calculator and the hierarchical aggregator
//! - `usecases`: [`EstimatingService`], driving an injected
//!   [`costline_storage::EstimateStore`]
//!
//! # Example
//!
//! ```rust,ignore
//! use costline_engine::EstimatingService;
//! use costline_storage::SqliteEstimateStore;
//!
//! let service = EstimatingService::new(SqliteEstimateStore::open("estimates.db")?);
//!
//! // Reads self-heal drifted indices, then aggregate
//! let range = service.area_cost_range("area-1").await?;
//! println!("${} - ${}", range.low, range.high);
//!
//! // Reorders are computed in memory and persisted as one atomic batch
//! let siblings = service.move_group("group-3", 0).await?;
//! ```

pub mod errors;
pub mod ordering;
pub mod pricing;
pub mod usecases;

pub use errors::{EngineError, Result};
pub use ordering::{move_to_index, partition_by_key, reindex, Correction, Ordered};
pub use pricing::{
    area_cost_range, group_cost_range, line_item_cost_range, project_cost_range, total_price,
    unit_sale_price, CostRange,
};
pub use usecases::{reconcile_area, EstimatingService};
