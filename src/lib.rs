//! panel-clean library crate
//!
//! Scans a 1Panel installation for reclaimable artifacts and deletes a
//! selection of them. The binary wraps this API in a CLI.

pub mod catalog;
pub mod category;
pub mod cleaner;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod report;
pub mod scanner;
pub mod service;
pub mod size;
pub mod stats;
pub mod store;
pub mod theme;
pub mod tree;

pub use catalog::PathCatalog;
pub use category::Category;
pub use cleaner::{CleanExecutor, CleanSummary};
pub use error::{Error, Result};
pub use report::{CleanReport, CleanSelection};
pub use tree::CleanNode;
