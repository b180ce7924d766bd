//! wikisync core library: domain types, version resolution, page titles,
//! registry access, and startup configuration.
//!
//! - [`types`]: [`Package`] snapshots and per-name version sets
//! - [`version`]: latest / stable / unstable selection
//! - [`title`]: managed page title grammar and builders
//! - [`markup`]: escaping for interpolated wiki text
//! - [`registry`]: [`PackageSource`] and the HTTP registry client
//! - [`config`]: explicit configuration resolved at process startup
//! - [`error`]: [`RegistryError`], [`ConfigError`]

pub mod config;
pub mod error;
pub mod markup;
pub mod registry;
pub mod title;
pub mod types;
pub mod version;

pub use config::{Credentials, ExtraHeader, RegistryConfig, WikiConfig, WikiMode};
pub use error::{ConfigError, RegistryError};
pub use registry::{FilePackageSource, PackageSource, RegistryClient};
pub use title::{PageKind, ParsedTitle};
pub use types::{group_by_name, Package, PackageAuthor, VersionSet, MAX_AUTHORS};
pub use version::VersionTrio;
