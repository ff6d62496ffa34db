//! Port trait: `EstimateStore`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

use super::models::{Area, AreaTemplate, Group, Project};
use super::patch::{GroupPatch, LineItemOptionPatch, LineItemPatch, ProjectPatch};

/// Which entity an index correction targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexEntity {
    Group,
    LineItem,
}

impl IndexEntity {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexEntity::Group => "group",
            IndexEntity::LineItem => "line_item",
        }
    }
}

impl std::fmt::Display for IndexEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One index correction to persist: set `id`'s order index to `new_index`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexUpdate {
    pub entity: IndexEntity,
    pub id: String,
    pub new_index: i64,
}

impl IndexUpdate {
    pub fn group(id: impl Into<String>, new_index: i64) -> Self {
        Self {
            entity: IndexEntity::Group,
            id: id.into(),
            new_index,
        }
    }

    pub fn line_item(id: impl Into<String>, new_index: i64) -> Self {
        Self {
            entity: IndexEntity::LineItem,
            id: id.into(),
            new_index,
        }
    }
}

/// Persistence abstraction for the estimating hierarchy
///
/// Fetches return full subtrees (an area carries its groups, line items,
/// and options). Writes that touch multiple rows are atomic: the whole
/// batch commits or none of it does.
///
/// # Implementations
///
/// - `SqliteEstimateStore`: SQLite adapter (`sqlite` feature)
/// - `MemoryEstimateStore`: in-memory fake for tests
#[async_trait]
pub trait EstimateStore: Send + Sync {
    // ═══════════════════════════════════════════════════════════════════════
    // Reads
    // ═══════════════════════════════════════════════════════════════════════

    /// Get a project with its full area trees
    ///
    /// # Errors
    ///
    /// Returns `ErrorKind::ProjectNotFound` if the project doesn't exist
    async fn fetch_project(&self, project_id: &str) -> Result<Project>;

    /// Get an area with its full group/line-item/option tree
    async fn fetch_area(&self, area_id: &str) -> Result<Area>;

    /// Get a single group with its line items
    async fn fetch_group(&self, group_id: &str) -> Result<Group>;

    /// Get the group owning a line item
    ///
    /// # Errors
    ///
    /// Returns `ErrorKind::LineItemNotFound` if the line item doesn't exist
    async fn fetch_group_for_line_item(&self, line_item_id: &str) -> Result<Group>;

    /// Get an area template with its backing area tree
    async fn fetch_template(&self, template_id: &str) -> Result<AreaTemplate>;

    // ═══════════════════════════════════════════════════════════════════════
    // Creation / deletion
    // ═══════════════════════════════════════════════════════════════════════

    /// Insert a project and any embedded area trees
    async fn insert_project(&self, project: &Project) -> Result<()>;

    /// Insert an area tree (groups, line items, options included)
    async fn insert_area(&self, area: &Area) -> Result<()>;

    /// Insert a template and its backing area tree
    async fn insert_template(&self, template: &AreaTemplate) -> Result<()>;

    /// Delete an area, cascading to its groups, line items, and options
    async fn delete_area(&self, area_id: &str) -> Result<()>;

    // ═══════════════════════════════════════════════════════════════════════
    // Ordering
    // ═══════════════════════════════════════════════════════════════════════

    /// Apply a batch of index corrections in one transaction
    ///
    /// Every update must target an existing row; otherwise the whole batch
    /// rolls back and `ErrorKind::Transaction` is returned. An empty batch
    /// is a no-op.
    async fn apply_index_updates(&self, updates: &[IndexUpdate]) -> Result<()>;

    // ═══════════════════════════════════════════════════════════════════════
    // Partial updates
    // ═══════════════════════════════════════════════════════════════════════

    async fn update_project(&self, project_id: &str, patch: &ProjectPatch) -> Result<()>;

    async fn update_group(&self, group_id: &str, patch: &GroupPatch) -> Result<()>;

    async fn update_line_item(&self, line_item_id: &str, patch: &LineItemPatch) -> Result<()>;

    async fn update_line_item_option(
        &self,
        option_id: &str,
        patch: &LineItemOptionPatch,
    ) -> Result<()>;

    /// Mark `option_id` as the selected option for `line_item_id`,
    /// deselecting every sibling in the same transaction
    ///
    /// Keeps the at-most-one-selected invariant on the write path.
    async fn select_option(&self, line_item_id: &str, option_id: &str) -> Result<()>;
}
