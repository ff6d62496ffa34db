//! Margin/markup pricing formula
//!
//! `sale_price_per_unit = (cost / (1 - margin)) * multiplier`, scaled by
//! quantity for a line total. No rounding happens at this level; the
//! aggregator rounds once at the top.

use crate::errors::{EngineError, Result};

/// Per-unit sale price from cost, margin, and price-adjustment multiplier
///
/// # Errors
///
/// [`EngineError::InvalidMargin`] unless `0 <= margin_decimal < 1`. A
/// margin at or above 1 would divide by zero or flip the sign; it is
/// rejected rather than clamped because a clamped value would silently
/// corrupt every reported price.
pub fn unit_sale_price(
    cost_per_unit: f64,
    margin_decimal: f64,
    price_adjustment_multiplier: f64,
) -> Result<f64> {
    if !(0.0..1.0).contains(&margin_decimal) {
        return Err(EngineError::InvalidMargin(margin_decimal));
    }
    Ok(cost_per_unit / (1.0 - margin_decimal) * price_adjustment_multiplier)
}

/// Line total: unit sale price scaled by quantity
pub fn total_price(
    cost_per_unit: f64,
    quantity: f64,
    margin_decimal: f64,
    price_adjustment_multiplier: f64,
) -> Result<f64> {
    Ok(unit_sale_price(cost_per_unit, margin_decimal, price_adjustment_multiplier)? * quantity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_sale_price() {
        assert_eq!(unit_sale_price(100.0, 0.2, 1.0).unwrap(), 125.0);
        assert_eq!(unit_sale_price(100.0, 0.0, 1.0).unwrap(), 100.0);
        assert_eq!(unit_sale_price(100.0, 0.5, 1.0).unwrap(), 200.0);
    }

    #[test]
    fn test_multiplier_scales_sale_price() {
        assert_eq!(unit_sale_price(100.0, 0.2, 1.1).unwrap(), 137.5);
        assert_eq!(unit_sale_price(100.0, 0.0, 0.0).unwrap(), 0.0);
    }

    #[test]
    fn test_total_price() {
        assert_eq!(total_price(100.0, 3.0, 0.2, 1.0).unwrap(), 375.0);
        assert_eq!(total_price(50.0, 2.0, 0.0, 1.0).unwrap(), 100.0);
        assert_eq!(total_price(10.0, 0.0, 0.2, 1.0).unwrap(), 0.0);
    }

    #[test]
    fn test_margin_at_or_above_one_is_rejected() {
        assert!(matches!(
            unit_sale_price(100.0, 1.0, 1.0).unwrap_err(),
            EngineError::InvalidMargin(_)
        ));
        assert!(matches!(
            unit_sale_price(100.0, 1.5, 1.0).unwrap_err(),
            EngineError::InvalidMargin(_)
        ));
    }

    #[test]
    fn test_negative_margin_is_rejected() {
        assert!(matches!(
            total_price(100.0, 1.0, -0.1, 1.0).unwrap_err(),
            EngineError::InvalidMargin(_)
        ));
    }
}
