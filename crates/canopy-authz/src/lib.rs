//! Canopy Authz — tenant hierarchy construction, authorization
//! resolution and access administration over any
//! [`DataStore`](canopy_core::DataStore).

pub mod admin;
pub mod builder;
pub mod config;
pub mod error;
pub mod forest;
pub mod report;
pub mod resolver;
pub mod seed;

pub use builder::TenantBuilder;
pub use config::AuthzConfig;
pub use error::AuthzError;
pub use forest::TenantForest;
pub use report::{Snapshot, render_report};
pub use resolver::Authorizer;
pub use seed::{Seed, SeedSummary};
