//! GTD Resource — generic CRUD, patch, and validation engine.
//!
//! One engine serves every entity type. The type-level binding between an
//! entity and its DTO comes from `gtd_core::Entity`; per-type behaviour is
//! limited to the constraint list in [`validation`].
//!
//! A patch request runs fetch → patch → validate → save. Patching works on
//! a detached JSON copy and nothing is written until validation passes, so a
//! rejected patch leaves the store untouched.

pub mod catalog;
pub mod error;
pub mod handler;
pub mod patch;
pub mod service;
pub mod user;
pub mod validation;

pub use catalog::Catalog;
pub use error::{ResourceError, Result};
pub use handler::{Method, ResourceHandler};
pub use patch::{PatchEngine, PatchError};
pub use service::{ResourceService, UpsertOutcome};
pub use user::UserService;
pub use validation::{CountryDirectory, Validate, ValidationGate, Violation};
