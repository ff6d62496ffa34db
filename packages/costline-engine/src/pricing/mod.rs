//! Pricing: margin/markup calculation and hierarchical cost aggregation

mod aggregate;
mod calculator;

pub use aggregate::{
    area_cost_range, group_cost_range, line_item_cost_range, project_cost_range, CostRange,
};
pub use calculator::{total_price, unit_sale_price};
