//! Domain logic shared by the route handlers.
//!
//! Everything here is pure: handlers load the persisted document, apply one of
//! these operations, and write the result back inside a transaction.

pub mod cart;
pub mod order;
pub mod stock;
