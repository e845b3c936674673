#![forbid(unsafe_code)]

pub mod error;
pub mod hash;
pub mod record;
pub mod version;

pub mod container {
    pub mod history;
    pub mod metadata;
}

pub mod pack {
    pub mod writer;
}

pub mod read {
    pub mod extract;
}

// Re-exports: stable API surface
pub use error::{BundleError, Result};
pub use pack::writer::{BundleOptions, BundleSummary, bundle};
pub use read::extract::debundle;
