//! Error types for the gtd-seed crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed seed file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Graph error: {0}")]
    Graph(#[from] gtd_graph::GraphError),

    #[error("Resource error: {0}")]
    Resource(#[from] gtd_resource::ResourceError),
}

pub type Result<T> = std::result::Result<T, SeedError>;
