//! Compliance reporting dashboard over AWS resource inventory snapshots.
//!
//! Daily snapshots of AWS resource metadata (tags, load balancers, databases,
//! KMS keys, autoscaling groups) land in per-category Postgres tables. Every
//! report route follows the same shape: find the latest snapshot date, scan
//! that date's documents, bucket counts by owning team, render a template.
//! Detail routes re-scan and filter/search/paginate instead of aggregating.

pub mod aggregate;
pub mod compliance;
pub mod config;
pub mod detail;
pub mod error;
pub mod model;
pub mod render;
pub mod routes;
pub mod state;
pub mod store;
