//! Authentication module for managing user sessions and credentials.
//!
//! This module provides:
//! - `SessionManager`: credential lifecycle with strict and graceful validation
//! - `SessionState`: shared, atomically replaceable credential handle
//! - `SecureStore` / `KeyringStore`: credential persistence via the OS keychain
//! - `token`: JWT payload expiry inspection (unparseable tokens count as expired)

pub mod credentials;
pub mod session;
pub mod token;

pub use credentials::{KeyringStore, MemoryStore, SecureStore};
pub use session::{AuthError, Credential, SessionManager, SessionSignal, SessionState};
