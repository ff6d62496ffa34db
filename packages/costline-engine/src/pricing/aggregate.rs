//! Hierarchical cost aggregation
//!
//! Walks line items → groups → areas → project, pricing exactly one
//! selected option per line item and summing low/high totals. Aggregation
//! is strictly additive; the only rounding is a final `ceil` on each
//! public range, which protects against under-quoting.
//!
//! Returned ranges are a minimum bound, not exhaustive: a line item with
//! no selected (or no priced) option contributes zero to both bounds.

use costline_storage::{Area, Group, LineItem, Project};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::Result;

use super::calculator::total_price;

/// An aggregated low/high price range in dollars
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostRange {
    pub low: f64,
    pub high: f64,
}

impl CostRange {
    pub const ZERO: CostRange = CostRange { low: 0.0, high: 0.0 };

    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn add(&mut self, other: CostRange) {
        self.low += other.low;
        self.high += other.high;
    }

    /// Round both bounds up to whole dollars
    pub fn ceil(self) -> Self {
        Self {
            low: self.low.ceil(),
            high: self.high.ceil(),
        }
    }
}

/// Price range contributed by a single line item
///
/// Uses the first option flagged selected. An exact cost collapses the
/// range to a point; otherwise both range bounds must be present. A cost
/// of `Some(0.0)` is a legitimate free option and prices normally.
pub fn line_item_cost_range(item: &LineItem) -> Result<CostRange> {
    let selected: Vec<&costline_storage::LineItemOption> =
        item.options.iter().filter(|o| o.is_selected).collect();
    if selected.len() > 1 {
        debug!(
            line_item_id = %item.id,
            selected = selected.len(),
            "multiple selected options; using the first"
        );
    }
    let Some(option) = selected.first() else {
        return Ok(CostRange::ZERO);
    };

    if let Some(exact) = option.exact_cost_per_unit {
        let total = total_price(
            exact,
            item.quantity,
            item.margin_decimal,
            option.price_adjustment_multiplier,
        )?;
        return Ok(CostRange::new(total, total));
    }

    if let (Some(low), Some(high)) = (option.low_cost_per_unit, option.high_cost_per_unit) {
        let low_total = total_price(
            low,
            item.quantity,
            item.margin_decimal,
            option.price_adjustment_multiplier,
        )?;
        let high_total = total_price(
            high,
            item.quantity,
            item.margin_decimal,
            option.price_adjustment_multiplier,
        )?;
        return Ok(CostRange::new(low_total, high_total));
    }

    // Selected but unpriced: contributes nothing
    Ok(CostRange::ZERO)
}

/// Unrounded sum over a group's line items
pub fn group_cost_range(group: &Group) -> Result<CostRange> {
    let mut range = CostRange::ZERO;
    for item in &group.line_items {
        range.add(line_item_cost_range(item)?);
    }
    Ok(range)
}

fn area_cost_range_raw(area: &Area) -> Result<CostRange> {
    let mut range = CostRange::ZERO;
    for group in &area.groups {
        range.add(group_cost_range(group)?);
    }
    Ok(range)
}

/// Price range for an area, rounded up to whole dollars
pub fn area_cost_range(area: &Area) -> Result<CostRange> {
    Ok(area_cost_range_raw(area)?.ceil())
}

/// Price range for a project: sum over its areas, rounded up once
pub fn project_cost_range(project: &Project) -> Result<CostRange> {
    let mut range = CostRange::ZERO;
    for area in &project.areas {
        range.add(area_cost_range_raw(area)?);
    }
    Ok(range.ceil())
}
