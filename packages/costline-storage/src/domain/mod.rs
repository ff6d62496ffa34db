//! Domain layer for the estimate store
//!
//! # Domain Models
//!
//! - `Project`: top of the ownership hierarchy, owns areas
//! - `Area`: belongs to exactly one project or one template, owns groups
//! - `Group`: categorized, ordered by `index_in_category` among siblings
//!   sharing (area, category)
//! - `LineItem`: ordered by `index_in_group` within its group
//! - `LineItemOption`: selectable cost/pricing option across quality tiers
//! - `AreaTemplate`: standalone area used as a deep-copy source
//!
//! # Partial updates
//!
//! The `*Patch` types carry explicitly-optional fields; `None` leaves a field
//! untouched, `Some(None)` clears a nullable one.
//!
//! # Port Trait
//!
//! - `EstimateStore`: the persistence abstraction the engine drives

mod models;
mod patch;
mod store;

pub use models::{
    Area, AreaTemplate, Category, Group, LineItem, LineItemOption, OptionTier, Project,
};
pub use patch::{GroupPatch, LineItemOptionPatch, LineItemPatch, ProjectPatch};
pub use store::{EstimateStore, IndexEntity, IndexUpdate};
