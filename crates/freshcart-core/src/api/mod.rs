//! REST API client module for the FreshCart backend.
//!
//! This module provides the `ApiClient` for executing requests against the
//! backend: JWT bearer authentication, bounded retry on transient transport
//! failures, and typed JSON encode/decode for every consumed endpoint.

pub mod client;
pub mod error;

pub use client::{ApiClient, RequestDescriptor};
pub use error::ApiError;
