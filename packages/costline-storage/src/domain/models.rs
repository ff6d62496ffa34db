//! Domain models for the estimating hierarchy

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A construction project
///
/// Top of the ownership hierarchy. Owns a set of areas and is associated
/// with clients and users (many-to-many) plus per-user stars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// Associated client ids
    #[serde(default)]
    pub client_ids: Vec<String>,
    /// Associated user ids
    #[serde(default)]
    pub user_ids: Vec<String>,
    /// Users who starred this project
    #[serde(default)]
    pub starred_by: Vec<String>,
    /// Owned areas, full trees
    #[serde(default)]
    pub areas: Vec<Area>,
}

impl Project {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            start_date: None,
            end_date: None,
            client_ids: Vec::new(),
            user_ids: Vec::new(),
            starred_by: Vec::new(),
            areas: Vec::new(),
        }
    }
}

/// An area within a project (or a template)
///
/// `project_id` and `template_id` are mutually exclusive in practice: an
/// area either lives inside a project or backs an [`AreaTemplate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: String,
    pub project_id: Option<String>,
    pub template_id: Option<String>,
    pub name: String,
    /// Owned groups, ordered per category by `index_in_category`
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl Area {
    /// Create an area owned by a project
    pub fn for_project(
        id: impl Into<String>,
        project_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            project_id: Some(project_id.into()),
            template_id: None,
            name: name.into(),
            groups: Vec::new(),
        }
    }

    /// Create a standalone area backing a template
    pub fn for_template(
        id: impl Into<String>,
        template_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            project_id: None,
            template_id: Some(template_id.into()),
            name: name.into(),
            groups: Vec::new(),
        }
    }
}

/// A named tag ordering groups within an area (e.g. "Products", "Labor")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A categorized line-item group within an area
///
/// Siblings sharing (area, category) are ordered by `index_in_category`.
/// The index is `Option` because legacy rows may carry none; a missing
/// index is fatal to every ordering operation until the row is fixed.
/// Only numeric drift (gaps, duplicates, negatives) is repaired on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub area_id: String,
    pub category: Category,
    pub index_in_category: Option<i64>,
    /// Persisted UI expand/collapse state
    pub is_open: bool,
    /// Owned line items, ordered by `index_in_group`
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

impl Group {
    pub fn new(
        id: impl Into<String>,
        area_id: impl Into<String>,
        category: Category,
        index_in_category: i64,
    ) -> Self {
        Self {
            id: id.into(),
            area_id: area_id.into(),
            category,
            index_in_category: Some(index_in_category),
            is_open: true,
            line_items: Vec::new(),
        }
    }
}

/// A single estimating line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    pub group_id: String,
    pub name: String,
    /// Non-negative quantity, in `unit`s
    pub quantity: f64,
    /// Margin as a decimal fraction, `0 <= margin < 1`
    pub margin_decimal: f64,
    /// Unit of measure (e.g. "sqft", "hour")
    pub unit: Option<String>,
    pub index_in_group: Option<i64>,
    /// Selectable pricing options across quality tiers
    #[serde(default)]
    pub options: Vec<LineItemOption>,
}

impl LineItem {
    pub fn new(
        id: impl Into<String>,
        group_id: impl Into<String>,
        name: impl Into<String>,
        index_in_group: i64,
    ) -> Self {
        Self {
            id: id.into(),
            group_id: group_id.into(),
            name: name.into(),
            quantity: 0.0,
            margin_decimal: 0.0,
            unit: None,
            index_in_group: Some(index_in_group),
            options: Vec::new(),
        }
    }
}

/// A cost/pricing option for a line item
///
/// The cost specification is either an exact per-unit cost or a low/high
/// per-unit range; `exact_cost_per_unit` takes precedence when `Some`. A
/// cost of `Some(0.0)` is a legitimate free option, not a missing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemOption {
    pub id: String,
    pub line_item_id: String,
    pub description: String,
    /// Non-negative multiplier on the sale price, default 1
    pub price_adjustment_multiplier: f64,
    pub exact_cost_per_unit: Option<f64>,
    pub low_cost_per_unit: Option<f64>,
    pub high_cost_per_unit: Option<f64>,
    pub is_selected: bool,
    pub tier: Option<OptionTier>,
}

impl LineItemOption {
    pub fn new(
        id: impl Into<String>,
        line_item_id: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            line_item_id: line_item_id.into(),
            description: description.into(),
            price_adjustment_multiplier: 1.0,
            exact_cost_per_unit: None,
            low_cost_per_unit: None,
            high_cost_per_unit: None,
            is_selected: false,
            tier: None,
        }
    }

    pub fn with_exact_cost(mut self, cost: f64) -> Self {
        self.exact_cost_per_unit = Some(cost);
        self
    }

    pub fn with_cost_range(mut self, low: f64, high: f64) -> Self {
        self.low_cost_per_unit = Some(low);
        self.high_cost_per_unit = Some(high);
        self
    }

    pub fn selected(mut self) -> Self {
        self.is_selected = true;
        self
    }
}

/// Quality tier ordering label (e.g. Premier / Designer / Luxury)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionTier {
    pub id: String,
    pub name: String,
    pub tier_level: i64,
}

impl OptionTier {
    pub fn new(id: impl Into<String>, name: impl Into<String>, tier_level: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tier_level,
        }
    }
}

/// A reusable area template
///
/// Wraps a standalone area used as a copy source for new areas; duplication
/// deep-copies the group/line-item/option subtree with fresh identities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaTemplate {
    pub id: String,
    pub name: String,
    pub area: Area,
}

impl AreaTemplate {
    pub fn new(id: impl Into<String>, name: impl Into<String>, area: Area) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            area,
        }
    }
}
