//! Error types for the gtd-resource crate.

use thiserror::Error;

use crate::validation::Violation;

/// Typed failure surfaced through the transport contract.
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("Could not find {entity} with id: {id}.")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Validation failed: {}", join_messages(.0))]
    ValidationFailed(Vec<Violation>),

    #[error("Malformed patch: {0}")]
    PatchMalformed(String),

    #[error("Graph error: {0}")]
    Graph(#[from] gtd_graph::GraphError),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),
}

impl ResourceError {
    /// Violation messages, in evaluation order. Empty for other kinds.
    pub fn messages(&self) -> Vec<&str> {
        match self {
            ResourceError::ValidationFailed(violations) => {
                violations.iter().map(|v| v.message.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }
}

fn join_messages(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.message.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

pub type Result<T> = std::result::Result<T, ResourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_entity_and_id() {
        let err = ResourceError::NotFound {
            entity: "Group",
            id: 42,
        };
        assert_eq!(err.to_string(), "Could not find Group with id: 42.");
        assert!(err.messages().is_empty());
    }

    #[test]
    fn validation_failure_lists_every_message() {
        let err = ResourceError::ValidationFailed(vec![
            Violation::new("name", "Group name cannot be empty."),
            Violation::new("eventsCaused", "List of Events caused by the Group cannot be empty."),
        ]);
        assert_eq!(err.messages().len(), 2);
        assert!(err.to_string().contains("Group name cannot be empty."));
    }
}
