//! # wikisync-renderer
//!
//! Renders `Template:VPM/Version summary`: one table row per package with
//! links to its `Latest …` pages and every specific-version page the wiki
//! already has.
//!
//! ```rust,no_run
//! use wikisync_renderer::{render_summary, KnownVersionTags};
//! use wikisync_core::VersionSet;
//!
//! let markup = render_summary(&KnownVersionTags::new(), &VersionSet::new());
//! assert!(markup.is_ok());
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::{KnownVersionTags, SummaryContext, SummaryLink, SummaryRow};
pub use engine::{render_summary, SummaryRenderer};
pub use error::RenderError;
