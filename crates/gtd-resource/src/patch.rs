//! Patch application for any entity type.
//!
//! Both protocols operate on the entity's JSON form, never on the entity
//! itself: the input is left untouched and a new instance is produced. The
//! patched document is deserialized back into the entity type, so a path that
//! names no field, or a value of the wrong type, is rejected here rather than
//! silently dropped.

use gtd_core::Entity;
use serde_json::Value;
use thiserror::Error;

use crate::error::ResourceError;

#[derive(Error, Debug)]
pub enum PatchError {
    #[error("Invalid patch document: {0}")]
    InvalidDocument(String),

    #[error("Patch could not be applied: {0}")]
    Application(String),

    #[error("Patched document is not a valid {entity}: {reason}")]
    Shape { entity: &'static str, reason: String },
}

impl From<PatchError> for ResourceError {
    fn from(e: PatchError) -> Self {
        ResourceError::PatchMalformed(e.to_string())
    }
}

/// Stateless sequence-patch (RFC 6902) and merge-patch (RFC 7396) application.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatchEngine;

impl PatchEngine {
    /// Apply an ordered list of pointer-addressed operations atomically.
    pub fn apply_sequence_patch<T: Entity>(patch: &Value, target: &T) -> Result<T, PatchError> {
        let operations: json_patch::Patch = serde_json::from_value(patch.clone())
            .map_err(|e| PatchError::InvalidDocument(e.to_string()))?;

        let mut document = to_document(target)?;
        json_patch::patch(&mut document, &operations)
            .map_err(|e| PatchError::Application(e.to_string()))?;

        tracing::debug!(entity = T::NAME, ops = operations.0.len(), "Sequence patch applied");
        from_document(document)
    }

    /// Merge a partial document into the entity. Explicit nulls reset fields,
    /// arrays are replaced wholesale.
    pub fn apply_merge_patch<T: Entity>(patch: &Value, target: &T) -> Result<T, PatchError> {
        if !patch.is_object() {
            return Err(PatchError::InvalidDocument(
                "merge patch must be a JSON object".to_string(),
            ));
        }

        let mut document = to_document(target)?;
        json_patch::merge(&mut document, patch);

        tracing::debug!(entity = T::NAME, "Merge patch applied");
        from_document(document)
    }
}

fn to_document<T: Entity>(target: &T) -> Result<Value, PatchError> {
    serde_json::to_value(target).map_err(|e| PatchError::Shape {
        entity: T::NAME,
        reason: e.to_string(),
    })
}

fn from_document<T: Entity>(document: Value) -> Result<T, PatchError> {
    serde_json::from_value(document).map_err(|e| PatchError::Shape {
        entity: T::NAME,
        reason: e.to_string(),
    })
}
