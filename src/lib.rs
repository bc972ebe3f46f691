// stockindex - Product Index
// A fixed-capacity open-addressing table with an insertion-ordered scan layer

#![warn(rust_2018_idioms)]

pub mod config;
pub mod index;
pub mod input;
pub mod observe;
pub mod sample;
pub mod shell;

// Re-exports for convenience
pub use config::IndexConfig;
pub use index::{ProductIndex, Record, SortKey, Upsert};
pub use observe::{IndexEvent, IndexObserver};

/// Product index error types
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum Error {
        #[error("Table full: no free slot among {capacity}")]
        TableFull { capacity: usize },

        #[error("Not found: {0}")]
        NotFound(String),

        #[error("Invalid range: '{start}' sorts after '{end}'")]
        InvalidRange { start: String, end: String },

        #[error("Invalid quantity: '{0}' is not a non-negative integer")]
        InvalidQuantity(String),

        #[error("Invalid key: {0}")]
        InvalidKey(String),

        #[error("Already exists: {0}")]
        DuplicateKey(String),

        #[error("Invalid argument: {0}")]
        InvalidArgument(String),

        #[error("Configuration error: {0}")]
        Config(String),

        #[error("Metrics error: {0}")]
        Metrics(String),

        #[error("Invariant violated: {0}")]
        InvariantViolation(String),
    }

    pub type Result<T> = std::result::Result<T, Error>;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
