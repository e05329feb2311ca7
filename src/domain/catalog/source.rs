use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::Product;

/// Where catalog snapshots come from. Called outside any lock.
pub trait CatalogSource: Send + Sync {
    fn load(&self) -> Result<Vec<Product>>;

    /// Human-readable origin for logs.
    fn describe(&self) -> String;
}

#[derive(Deserialize)]
struct CatalogFile {
    products: Vec<Product>,
}

/// Reads `{"products": [...]}` from disk on every load.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CatalogSource for JsonFileSource {
    fn load(&self) -> Result<Vec<Product>> {
        let data = std::fs::read(&self.path)
            .with_context(|| format!("failed to read catalog {}", self.path.display()))?;
        parse_catalog(&data)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn parse_catalog(data: &[u8]) -> Result<Vec<Product>> {
    let file: CatalogFile = serde_json::from_slice(data).context("invalid catalog JSON")?;
    Ok(file.products)
}

/// Fixed product list, seeded at construction.
#[cfg(test)]
pub struct StaticSource {
    products: Vec<Product>,
}

#[cfg(test)]
impl StaticSource {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }
}

#[cfg(test)]
impl CatalogSource for StaticSource {
    fn load(&self) -> Result<Vec<Product>> {
        Ok(self.products.clone())
    }

    fn describe(&self) -> String {
        format!("static ({} products)", self.products.len())
    }
}
