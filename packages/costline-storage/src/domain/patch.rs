//! Partial-update patch types
//!
//! Every patch field is explicitly optional: `None` leaves the target field
//! unchanged, and for nullable fields `Some(None)` clears it. This replaces
//! run-time key filtering with shapes the compiler checks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::{Group, LineItem, LineItemOption, Project};

/// Serde adapter keeping the absent-key / explicit-null distinction
///
/// Plain derives collapse `None` and `Some(None)` into the same `null` on
/// the wire, losing clear-the-field intent on a round trip. Paired with
/// `default` and `skip_serializing_if`, an absent key deserializes to
/// `None` and a present `null` to `Some(None)`.
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            // Unreached under skip_serializing_if
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::deserialize(deserializer).map(Some)
    }
}

/// Patch for project metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub start_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub end_date: Option<Option<DateTime<Utc>>>,
}

impl ProjectPatch {
    pub fn apply(&self, project: &mut Project) {
        if let Some(v) = &self.name {
            project.name = v.clone();
        }
        if let Some(v) = &self.description {
            project.description = v.clone();
        }
        if let Some(v) = self.start_date {
            project.start_date = v;
        }
        if let Some(v) = self.end_date {
            project.end_date = v;
        }
    }
}

/// Patch for a group; only the persisted expand/collapse state is mutable
/// field-wise (ordering goes through index updates instead)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_open: Option<bool>,
}

impl GroupPatch {
    pub fn apply(&self, group: &mut Group) {
        if let Some(v) = self.is_open {
            group.is_open = v;
        }
    }
}

/// Patch for line item fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin_decimal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub unit: Option<Option<String>>,
}

impl LineItemPatch {
    pub fn apply(&self, item: &mut LineItem) {
        if let Some(v) = &self.name {
            item.name = v.clone();
        }
        if let Some(v) = self.quantity {
            item.quantity = v;
        }
        if let Some(v) = self.margin_decimal {
            item.margin_decimal = v;
        }
        if let Some(v) = &self.unit {
            item.unit = v.clone();
        }
    }
}

/// Patch for a line item option's cost specification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItemOptionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_adjustment_multiplier: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub exact_cost_per_unit: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub low_cost_per_unit: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub high_cost_per_unit: Option<Option<f64>>,
}

impl LineItemOptionPatch {
    pub fn apply(&self, option: &mut LineItemOption) {
        if let Some(v) = &self.description {
            option.description = v.clone();
        }
        if let Some(v) = self.price_adjustment_multiplier {
            option.price_adjustment_multiplier = v;
        }
        if let Some(v) = self.exact_cost_per_unit {
            option.exact_cost_per_unit = v;
        }
        if let Some(v) = self.low_cost_per_unit {
            option.low_cost_per_unit = v;
        }
        if let Some(v) = self.high_cost_per_unit {
            option.high_cost_per_unit = v;
        }
    }
}
