//! Cart reconciliation engine.
//!
//! The cart is local-authoritative: add, update, and remove never reach a
//! server-side cart endpoint. The remote catalog is consulted only to
//! resolve a product snapshot at add time, and checkout sends product ids
//! and quantities for the backend to re-price.

pub mod manager;

pub use manager::{Cart, CartError, CartLine, CartManager};
