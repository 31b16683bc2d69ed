//! Order finalization and the return-request workflow.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use super::cart::CartLine;

pub const COD: &str = "cod";
pub const STATUS_PENDING: &str = "pending";
pub const STATUS_PAID: &str = "paid";

/// Return state of an order's items. Transitions apply to the whole order at
/// once: None -> Requested -> Approved | Rejected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnStatus {
    #[default]
    None,
    Requested,
    Approved,
    Rejected,
}

/// A cart line snapshotted into an order, plus its return state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    #[serde(flatten)]
    pub line: CartLine,
    #[serde(default)]
    pub return_status: ReturnStatus,
}

impl From<CartLine> for OrderLine {
    fn from(line: CartLine) -> Self {
        Self { line, return_status: ReturnStatus::None }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReturnAction {
    Approve,
    Reject,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Action must be 'approve' or 'reject'")]
pub struct InvalidReturnAction;

impl FromStr for ReturnAction {
    type Err = InvalidReturnAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            _ => Err(InvalidReturnAction),
        }
    }
}

pub fn is_cod(payment_method: &str) -> bool {
    payment_method.eq_ignore_ascii_case(COD)
}

/// COD orders are always pending until the courier collects; otherwise the
/// caller-supplied status is taken at face value, defaulting to pending.
pub fn effective_payment_status(payment_method: &str, payment_status: Option<&str>) -> String {
    if is_cod(payment_method) {
        STATUS_PENDING.to_string()
    } else {
        payment_status.unwrap_or(STATUS_PENDING).to_string()
    }
}

/// Whether finalizing the order clears the user's cart. Note this clears the
/// whole cart, not just the ordered lines; partial-cart checkout would need a
/// different contract.
pub fn clears_cart(payment_method: &str, effective_status: &str) -> bool {
    effective_status == STATUS_PAID || is_cod(payment_method)
}

/// Mark every item of the order as return-requested.
pub fn request_return(items: &mut [OrderLine]) {
    for item in items.iter_mut() {
        item.return_status = ReturnStatus::Requested;
    }
}

/// Approve or reject the pending return, uniformly across all items.
pub fn resolve_return(items: &mut [OrderLine], action: ReturnAction) {
    let status = match action {
        ReturnAction::Approve => ReturnStatus::Approved,
        ReturnAction::Reject => ReturnStatus::Rejected,
    };
    for item in items.iter_mut() {
        item.return_status = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn items() -> Vec<OrderLine> {
        let line = |product_id| CartLine {
            product_id,
            selected_size: "M".into(),
            selected_color: "Red".into(),
            quantity: 1,
            price_at_addition: Decimal::new(1500, 2),
            product_name: "Scarf".into(),
            product_images: vec![],
        };
        vec![line(1).into(), line(2).into()]
    }

    #[test]
    fn cod_is_always_pending() {
        assert_eq!(effective_payment_status("cod", Some("paid")), "pending");
        assert_eq!(effective_payment_status("COD", None), "pending");
    }

    #[test]
    fn card_status_passes_through() {
        assert_eq!(effective_payment_status("card", Some("paid")), "paid");
        assert_eq!(effective_payment_status("card", None), "pending");
    }

    #[test]
    fn cod_clears_cart_regardless_of_status() {
        let status = effective_payment_status("cod", Some("failed"));
        assert!(clears_cart("cod", &status));
    }

    #[test]
    fn paid_card_clears_cart_but_pending_does_not() {
        assert!(clears_cart("card", "paid"));
        assert!(!clears_cart("card", "pending"));
    }

    #[test]
    fn request_then_approve_marks_every_item() {
        let mut order_items = items();
        request_return(&mut order_items);
        assert!(order_items.iter().all(|i| i.return_status == ReturnStatus::Requested));
        resolve_return(&mut order_items, "approve".parse().unwrap());
        assert!(order_items.iter().all(|i| i.return_status == ReturnStatus::Approved));
    }

    #[test]
    fn reject_marks_every_item() {
        let mut order_items = items();
        request_return(&mut order_items);
        resolve_return(&mut order_items, ReturnAction::Reject);
        assert!(order_items.iter().all(|i| i.return_status == ReturnStatus::Rejected));
    }

    #[test]
    fn bogus_action_fails_to_parse() {
        assert_eq!("bogus".parse::<ReturnAction>(), Err(InvalidReturnAction));
    }

    #[test]
    fn order_line_defaults_return_status_when_absent() {
        let json = r#"{
            "product_id": 201, "selected_size": "M", "selected_color": "Red",
            "quantity": 2, "price_at_addition": "49.99",
            "product_name": "Linen Shirt", "product_images": []
        }"#;
        let item: OrderLine = serde_json::from_str(json).unwrap();
        assert_eq!(item.return_status, ReturnStatus::None);
        assert_eq!(item.line.quantity, 2);
    }
}
