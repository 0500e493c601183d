//! Product lookup seam.
//!
//! The grocery database (Open Food Facts in the prototype rig) sits behind an
//! HTTP client that is not this crate's business. Lookup failures are mapped
//! to sentinel display strings so a flaky network can never take down the
//! monitor loop.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Product details as returned by the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub brand: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
}

#[derive(Debug, Clone)]
pub enum LookupOutcome {
    Found(Product),
    /// The barcode decoded fine but the catalog has never heard of it.
    NotInCatalog,
}

pub trait ProductLookup: Send + Sync {
    fn lookup(&self, code: &str) -> Result<LookupOutcome>;
}

/// Strip the spaces and dashes people type when reading codes off a package.
pub fn normalize_code(code: &str) -> String {
    code.chars().filter(|c| !matches!(c, ' ' | '-')).collect()
}

/// Map a lookup result to the line that gets logged and shown.
pub fn display_result(result: &Result<LookupOutcome>) -> String {
    match result {
        Ok(LookupOutcome::Found(product)) => {
            format!("Found it! {} by {}", product.name, product.brand)
        }
        Ok(LookupOutcome::NotInCatalog) => {
            "Barcode found, but not in the grocery catalog.".to_string()
        }
        Err(_) => "Connection error to the product database.".to_string(),
    }
}
