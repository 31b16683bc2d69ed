//! Cart aggregate
//!
//! A cart is one row per user holding an ordered list of line items. Lines are
//! keyed by (product_id, selected_size, selected_color): adding a line that
//! matches an existing key bumps its quantity, anything else appends.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One entry in a cart, snapshotting the chosen variant at add time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: i64,
    #[serde(default)]
    pub selected_size: String,
    #[serde(default)]
    pub selected_color: String,
    pub quantity: u32,
    pub price_at_addition: Decimal,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub product_images: Vec<String>,
}

impl CartLine {
    fn matches(&self, product_id: i64, size: &str, color: &str) -> bool {
        self.product_id == product_id && self.selected_size == size && self.selected_color == color
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub user_id: i64,
    pub items: Vec<CartLine>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("Item not found in cart")]
    LineNotFound,
    #[error("Quantity must be at least 1")]
    ZeroQuantity,
}

impl Cart {
    pub fn empty(user_id: i64) -> Self {
        Self { user_id, items: vec![] }
    }

    /// Merge `line` into the cart: an existing line with the same variant key
    /// gets its quantity increased, otherwise the line is appended so insertion
    /// order is preserved.
    pub fn add_line(&mut self, line: CartLine) -> Result<(), CartError> {
        if line.quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.matches(line.product_id, &line.selected_size, &line.selected_color))
        {
            // No upper bound is enforced, so clamp rather than overflow.
            existing.quantity = existing.quantity.saturating_add(line.quantity);
        } else {
            self.items.push(line);
        }
        Ok(())
    }

    /// Replace the quantity of the matching line in-place.
    pub fn update_quantity(
        &mut self,
        product_id: i64,
        size: &str,
        color: &str,
        quantity: u32,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }
        let line = self
            .items
            .iter_mut()
            .find(|i| i.matches(product_id, size, color))
            .ok_or(CartError::LineNotFound)?;
        line.quantity = quantity;
        Ok(())
    }

    /// Remove the line matching the variant key. A miss is an error, matching
    /// `update_quantity` rather than the silent no-op some callers expect.
    pub fn remove_line(&mut self, product_id: i64, size: &str, color: &str) -> Result<(), CartError> {
        let before = self.items.len();
        self.items.retain(|i| !i.matches(product_id, size, color));
        if self.items.len() == before {
            return Err(CartError::LineNotFound);
        }
        Ok(())
    }

    /// Drop every line for a product, regardless of variant.
    pub fn remove_product(&mut self, product_id: i64) {
        self.items.retain(|i| i.product_id != product_id);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: i64, size: &str, color: &str, quantity: u32) -> CartLine {
        CartLine {
            product_id,
            selected_size: size.into(),
            selected_color: color.into(),
            quantity,
            price_at_addition: Decimal::new(4999, 2),
            product_name: "Linen Shirt".into(),
            product_images: vec!["https://cdn.example/shirt.jpg".into()],
        }
    }

    #[test]
    fn add_merges_matching_variant() {
        let mut cart = Cart::empty(7);
        cart.add_line(line(201, "M", "Red", 2)).unwrap();
        cart.add_line(line(201, "M", "Red", 3)).unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 5);
    }

    #[test]
    fn add_appends_new_variant_last() {
        let mut cart = Cart::empty(7);
        cart.add_line(line(201, "M", "Red", 1)).unwrap();
        cart.add_line(line(201, "L", "Red", 1)).unwrap();
        cart.add_line(line(202, "M", "Blue", 1)).unwrap();
        assert_eq!(cart.items.len(), 3);
        assert_eq!(cart.items[2].product_id, 202);
        assert_eq!(cart.items[1].selected_size, "L");
    }

    #[test]
    fn merge_clamps_instead_of_overflowing() {
        let mut cart = Cart::empty(7);
        cart.add_line(line(201, "M", "Red", u32::MAX - 1)).unwrap();
        cart.add_line(line(201, "M", "Red", 5)).unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, u32::MAX);
    }

    #[test]
    fn second_add_builds_on_the_first_rather_than_replacing_it() {
        // Two adds for the same user applied in sequence, the way serialized
        // cart transactions replay them: the later one must see and keep the
        // earlier line, never start over from an empty cart.
        let mut cart = Cart::empty(7);
        cart.add_line(line(201, "M", "Red", 2)).unwrap();
        let mut reread = cart.clone();
        reread.add_line(line(202, "L", "Blue", 1)).unwrap();
        assert_eq!(reread.items.len(), 2);
        assert_eq!(reread.items[0].product_id, 201);
        assert_eq!(reread.items[1].product_id, 202);
    }

    #[test]
    fn add_rejects_zero_quantity() {
        let mut cart = Cart::empty(7);
        assert_eq!(cart.add_line(line(201, "M", "Red", 0)), Err(CartError::ZeroQuantity));
        assert!(cart.is_empty());
    }

    #[test]
    fn update_replaces_quantity_in_place() {
        let mut cart = Cart::empty(7);
        cart.add_line(line(201, "M", "Red", 2)).unwrap();
        cart.update_quantity(201, "M", "Red", 9).unwrap();
        assert_eq!(cart.items[0].quantity, 9);
    }

    #[test]
    fn update_missing_line_is_not_found() {
        let mut cart = Cart::empty(7);
        cart.add_line(line(201, "M", "Red", 2)).unwrap();
        assert_eq!(
            cart.update_quantity(201, "S", "Red", 1),
            Err(CartError::LineNotFound)
        );
        assert_eq!(cart.items[0].quantity, 2);
    }

    #[test]
    fn remove_missing_line_is_not_found() {
        let mut cart = Cart::empty(7);
        cart.add_line(line(201, "M", "Red", 2)).unwrap();
        assert_eq!(cart.remove_line(202, "M", "Red"), Err(CartError::LineNotFound));
        assert_eq!(cart.items.len(), 1);
    }

    #[test]
    fn remove_product_drops_all_variants() {
        let mut cart = Cart::empty(7);
        cart.add_line(line(201, "M", "Red", 1)).unwrap();
        cart.add_line(line(201, "L", "Blue", 1)).unwrap();
        cart.add_line(line(202, "M", "Red", 1)).unwrap();
        cart.remove_product(201);
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].product_id, 202);
    }

    #[test]
    fn add_merge_remove_scenario() {
        let mut cart = Cart::empty(1);
        cart.add_line(line(201, "M", "Red", 2)).unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 2);
        cart.add_line(line(201, "M", "Red", 3)).unwrap();
        assert_eq!(cart.items[0].quantity, 5);
        cart.remove_line(201, "M", "Red").unwrap();
        assert!(cart.is_empty());
    }
}
