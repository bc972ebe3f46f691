//! Sample inventory used by demos and seeded tables

use crate::error::Result;
use crate::index::ProductIndex;

/// Demo products as `(key, label, count)`
pub const SAMPLE_PRODUCTS: &[(&str, &str, u32)] = &[
    ("A-100", "Wireless Mouse", 150),
    ("A-150", "Bluetooth Mouse", 50),
    ("M-100", "Monitor 24in", 40),
    ("K-106", "Gaming Keyboard", 80),
    ("L-301", "Acer Laptop 15in", 25),
    ("A-199", "USB-C Mouse", 75),
    ("L-302", "Dell Laptop 13in", 30),
];

/// Insert every sample product, returning how many were stored
///
/// Stops at the first rejection, so a table smaller than the sample set
/// reports [`Error::TableFull`](crate::error::Error::TableFull).
pub fn seed(index: &mut ProductIndex) -> Result<usize> {
    for (key, label, count) in SAMPLE_PRODUCTS {
        index.insert_or_update(key, label, *count)?;
    }
    Ok(SAMPLE_PRODUCTS.len())
}
