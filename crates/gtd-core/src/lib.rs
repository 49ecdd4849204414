//! gtd-core: Shared model for the Global Terrorism catalog.
//!
//! This crate provides the foundational types used across all catalog crates:
//! - Entity types (Region, Country, Province, City, Target, Event, Group, User)
//!   forming the acyclic entity graph
//! - DTO types and the bidirectional projection between DTOs and entities
//! - Static graph schemas describing labels, relationships, and natural keys
//! - Configuration management
//! - Common error types

pub mod config;
pub mod dto;
pub mod error;
pub mod schema;
pub mod types;

pub use config::AppConfig;
pub use error::GtdError;
pub use schema::{EntitySchema, RelationSchema};
pub use types::{City, Country, Entity, Event, Group, NodeId, Province, Region, Role, Target, User};
