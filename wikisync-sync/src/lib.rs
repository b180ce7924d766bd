//! # wikisync-sync
//!
//! Scanner, gated update engine, and the full-sync pass.
//!
//! Call [`run_full_sync`] with a package source and a wiki gateway to
//! reconcile every managed page once.

pub mod engine;
pub mod error;
pub mod pipeline;
pub mod scan;

pub use engine::{GatedUpdater, PageChanges, PageFailure, AUTHOR_REMOVED_REASON};
pub use error::SyncError;
pub use pipeline::{run_full_sync, PassReport};
pub use scan::{scan, WikiScan};
