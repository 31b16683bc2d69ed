//! Variant stock list and the decrement guard.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One sellable (size, color) combination with its own price and stock.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariantStock {
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub stock: u32,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StockError {
    #[error("Variant not found")]
    VariantNotFound,
    #[error("Not enough stock")]
    Insufficient,
}

/// Decrement the matching variant's stock by `quantity`, returning the updated
/// variant. The list is left untouched on any failure, so callers can bail out
/// without writing anything back.
pub fn reduce_stock(
    variants: &mut [VariantStock],
    size: &str,
    color: &str,
    quantity: u32,
) -> Result<VariantStock, StockError> {
    let variant = variants
        .iter_mut()
        .find(|v| v.size == size && v.color == color)
        .ok_or(StockError::VariantNotFound)?;
    if variant.stock < quantity {
        return Err(StockError::Insufficient);
    }
    variant.stock -= quantity;
    Ok(variant.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variants() -> Vec<VariantStock> {
        vec![
            VariantStock { size: "M".into(), color: "Red".into(), price: Decimal::new(2500, 2), stock: 10 },
            VariantStock { size: "L".into(), color: "Blue".into(), price: Decimal::new(2700, 2), stock: 3 },
        ]
    }

    #[test]
    fn decrement_within_stock() {
        let mut vs = variants();
        let updated = reduce_stock(&mut vs, "M", "Red", 4).unwrap();
        assert_eq!(updated.stock, 6);
        assert_eq!(vs[0].stock, 6);
        assert_eq!(vs[1].stock, 3);
    }

    #[test]
    fn decrement_to_exactly_zero() {
        let mut vs = variants();
        let updated = reduce_stock(&mut vs, "L", "Blue", 3).unwrap();
        assert_eq!(updated.stock, 0);
    }

    #[test]
    fn over_commit_is_rejected_without_mutation() {
        let mut vs = variants();
        assert_eq!(reduce_stock(&mut vs, "L", "Blue", 4), Err(StockError::Insufficient));
        assert_eq!(vs, variants());
    }

    #[test]
    fn unknown_variant_is_not_found_without_mutation() {
        let mut vs = variants();
        assert_eq!(reduce_stock(&mut vs, "XL", "Red", 1), Err(StockError::VariantNotFound));
        assert_eq!(vs, variants());
    }
}
