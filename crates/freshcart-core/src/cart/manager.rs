//! Cart state, mutation, and persistence.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::api::{ApiClient, ApiError};
use crate::cache::CacheStore;
use crate::models::{CartItemDto, CheckoutRequest, Order, Product};

/// One row of the cart: a frozen product snapshot bound to a quantity.
///
/// The snapshot is captured from the catalog when the product is added and
/// is not live-linked; later catalog price changes leave the line alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub id: i64,
    pub product: Product,
    pub quantity: u32,
    #[serde(rename = "addedDate")]
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

/// A point-in-time view of the cart. The total is always derived from the
/// lines, never stored, so it cannot drift.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, product_id: i64) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product.id == product_id)
    }

    /// Exact decimal sum of price x quantity across all lines.
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Total number of units across all lines.
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[derive(Error, Debug)]
pub enum CartError {
    #[error("Product {0} was not found in the catalog")]
    ProductNotFound(i64),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Owns the cart lines and serializes every mutation.
///
/// All operations go through one FIFO mutex, so two concurrent `add_item`
/// calls for the same product merge instead of losing an update. Catalog
/// lookups happen before the lock is taken; no network await ever holds it.
pub struct CartManager {
    api: ApiClient,
    cache: CacheStore,
    lines: Mutex<Vec<CartLine>>,
}

impl CartManager {
    /// Create the engine, loading any persisted cart. A corrupt cache
    /// yields an empty cart.
    pub fn new(api: ApiClient, cache: CacheStore) -> Self {
        let lines = cache.load_cart();
        Self {
            api,
            cache,
            lines: Mutex::new(lines),
        }
    }

    /// Current in-memory cart.
    pub async fn cart(&self) -> Cart {
        Cart {
            lines: self.lines.lock().await.clone(),
        }
    }

    /// Re-read the cart from the local cache.
    pub async fn load_cart(&self) -> Cart {
        let mut guard = self.lines.lock().await;
        *guard = self.cache.load_cart();
        Cart {
            lines: guard.clone(),
        }
    }

    /// Add a product to the cart, resolving a fresh snapshot from the
    /// catalog. An existing line for the product merges quantities and keeps
    /// its original `added_at`; a new line gets id max+1.
    pub async fn add_item(&self, product_id: i64, quantity: u32) -> Result<Cart, CartError> {
        // Resolve the snapshot before taking the cart lock; the merge below
        // must not hold the lock across a network await.
        let products = self.api.fetch_products(None).await?;
        let product = products
            .into_iter()
            .find(|product| product.id == product_id)
            .ok_or(CartError::ProductNotFound(product_id))?;

        let mut guard = self.lines.lock().await;
        if quantity == 0 {
            // Quantities are strictly positive; adding zero changes nothing.
            return Ok(Cart {
                lines: guard.clone(),
            });
        }

        match guard.iter().position(|line| line.product.id == product_id) {
            Some(index) => {
                let line = &mut guard[index];
                line.quantity += quantity;
                line.product = product;
                debug!(product_id, quantity = line.quantity, "Merged cart line");
            }
            None => {
                let id = guard.iter().map(|line| line.id).max().unwrap_or(0) + 1;
                guard.push(CartLine {
                    id,
                    product,
                    quantity,
                    added_at: Utc::now(),
                });
                debug!(product_id, quantity, "Added cart line");
            }
        }

        self.persist(&guard);
        Ok(Cart {
            lines: guard.clone(),
        })
    }

    /// Replace a line's quantity. Zero or negative removes the line; the
    /// snapshot and `added_at` are otherwise untouched.
    pub async fn set_quantity(&self, product_id: i64, quantity: i32) -> Cart {
        let mut guard = self.lines.lock().await;
        if quantity <= 0 {
            guard.retain(|line| line.product.id != product_id);
        } else if let Some(line) = guard
            .iter_mut()
            .find(|line| line.product.id == product_id)
        {
            line.quantity = quantity as u32;
        }

        self.persist(&guard);
        Cart {
            lines: guard.clone(),
        }
    }

    /// Remove the line for a product; no-op when absent.
    pub async fn remove_item(&self, product_id: i64) -> Cart {
        let mut guard = self.lines.lock().await;
        guard.retain(|line| line.product.id != product_id);

        self.persist(&guard);
        Cart {
            lines: guard.clone(),
        }
    }

    /// Empty the cart.
    pub async fn clear(&self) -> Cart {
        let mut guard = self.lines.lock().await;
        guard.clear();

        self.persist(&guard);
        Cart {
            lines: guard.clone(),
        }
    }

    /// Place an order from the current lines. Only product ids and
    /// quantities are sent; the backend re-prices authoritatively. The cart
    /// is cleared once the order is accepted.
    pub async fn checkout(&self) -> Result<Order, CartError> {
        let cart_items: Vec<CartItemDto> = {
            let guard = self.lines.lock().await;
            guard
                .iter()
                .map(|line| CartItemDto::new(line.product.id, line.quantity))
                .collect()
        };

        let order = self.api.checkout(&CheckoutRequest { cart_items }).await?;

        let mut guard = self.lines.lock().await;
        guard.clear();
        self.persist(&guard);
        Ok(order)
    }

    /// Synchronous write-through before the mutating call returns. A failed
    /// write is logged but never blocks the shopper.
    fn persist(&self, lines: &[CartLine]) {
        if let Err(err) = self.cache.save_cart(lines) {
            warn!(error = %err, "Failed to persist cart");
        }
    }
}
