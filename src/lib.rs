//! Planned-maintenance (PMR) submission timing analytics.
//!
//! Planned visits and inventory rows come from Postgres; [`aggregate::build_trends`]
//! classifies every visit by how promptly its site's inventory was filled in
//! and folds the results into week, area and NFO tallies.

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod performance;
pub mod pipeline;
pub mod report;
pub mod site_key;
pub mod submission;
pub mod timing;
pub mod weeks;

pub use aggregate::{build_trends, TrendOptions, TrendReport};
pub use error::TrendError;
