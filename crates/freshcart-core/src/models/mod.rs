//! Data models for the FreshCart API.
//!
//! This module contains the wire-facing data structures:
//!
//! - `Category`, `Product`, `Unit`: catalog data with drift-tolerant decoding
//! - `Order`, `OrderItem`, `CartItemDto`, `CheckoutRequest`: order history and checkout
//! - `LoginRequest`, `SignupRequest`, `CustomerProfile`: account management
//! - `ChatMessage`: support-chat transcripts

pub mod account;
pub mod catalog;
pub mod chat;
pub mod order;

pub use account::{
    CustomerProfile, ImageUploadResponse, LoginRequest, MessageResponse, SignupRequest,
};
pub use catalog::{Category, Product, Unit};
pub use chat::ChatMessage;
pub use order::{CartItemDto, CheckoutRequest, Order, OrderItem, OrderStatus};
