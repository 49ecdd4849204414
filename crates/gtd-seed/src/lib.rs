//! gtd-seed: first-boot bulk loader for the GTD graph.
//!
//! Reads GTD rows from a JSON file, dedups the place hierarchy through an
//! [`cache::UpsertCache`], and attributes every Event to its perpetrator
//! Group. Runs once, before the store serves traffic.

pub mod cache;
pub mod config;
pub mod error;
pub mod loader;
pub mod rows;

pub use cache::UpsertCache;
pub use config::SeedOptions;
pub use error::{Result, SeedError};
pub use loader::{SeedReport, Seeder};
