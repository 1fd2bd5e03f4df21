//! JSON file cache for the cart.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use crate::cart::CartLine;

/// Cache file name for the cart, without extension.
const CART_CACHE: &str = "cart";

pub struct CacheStore {
    cache_dir: PathBuf,
}

impl CacheStore {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;
        Ok(Self { cache_dir })
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", name))
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.cache_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", name))?;
        let value: T = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", name))?;

        Ok(Some(value))
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let path = self.cache_path(name);
        let contents = serde_json::to_string_pretty(data)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write cache file: {}", name))?;
        Ok(())
    }

    // ===== Cart =====

    /// Load the cached cart lines. Corruption is not fatal: unreadable data
    /// yields an empty cart so the shopper can keep going.
    pub fn load_cart(&self) -> Vec<CartLine> {
        match self.load(CART_CACHE) {
            Ok(Some(lines)) => lines,
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(error = %err, "Cart cache is unreadable, starting empty");
                Vec::new()
            }
        }
    }

    pub fn save_cart(&self, lines: &[CartLine]) -> Result<()> {
        self.save(CART_CACHE, &lines)
    }
}
