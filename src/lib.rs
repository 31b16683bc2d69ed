//! Elan Commerce Backend
//!
//! REST backend for the Elan storefront: product and bestseller catalog,
//! per-user carts, orders with a return workflow, coupons, cash-on-delivery
//! settings, user accounts, and contact messages.
//!
//! The reusable core lives in [`domain`]: merging cart lines by variant key,
//! the stock-decrement guard, and order finalization. Handlers in [`api`] wire
//! those operations to Postgres; [`services`] holds the object-storage uploader
//! and the payment-gateway client.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
