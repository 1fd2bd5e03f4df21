//! FreshCart core - the client-side data-access layer for the FreshCart
//! grocery app.
//!
//! The crate wires three pieces together:
//!
//! - [`api::ApiClient`]: authenticated request execution against the REST
//!   backend, with bounded retry on transient transport failures
//! - [`auth::SessionManager`]: credential lifecycle (login, signup, restore,
//!   logout, expiry) persisted through a secure store
//! - [`cart::CartManager`]: the local-authoritative cart, reconciled against
//!   the remote catalog and cached on disk
//!
//! Components are constructed explicitly and handed to each other; there is
//! no global state. A 401 from any request flows back to the session manager
//! over a channel, so the session can never stay out of step with the server
//! for long.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use freshcart_core::{
//!     ApiClient, CacheStore, CartManager, Config, KeyringStore, SessionManager, SessionState,
//! };
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let session = SessionState::new();
//! let (api, signals) = ApiClient::new(&config, session.clone())?;
//!
//! let store = Arc::new(KeyringStore::new());
//! let sessions = SessionManager::new(api.clone(), session, store, signals);
//! sessions.restore_on_startup().await;
//!
//! let cart = CartManager::new(api, CacheStore::new(config.cache_dir()?)?);
//! println!("{} items in the cart", cart.load_cart().await.item_count());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod cache;
pub mod cart;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, RequestDescriptor};
pub use auth::{
    AuthError, Credential, KeyringStore, MemoryStore, SecureStore, SessionManager, SessionSignal,
    SessionState,
};
pub use cache::CacheStore;
pub use cart::{Cart, CartError, CartLine, CartManager};
pub use config::Config;
