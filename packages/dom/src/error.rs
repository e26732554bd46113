//! Error types for the page model

use crate::NodeId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Node {0} has no parent")]
    Detached(NodeId),

    #[error("Cannot insert {node} into {parent}: node is an ancestor of the parent")]
    HierarchyRequest { node: NodeId, parent: NodeId },

    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("Empty selector")]
    Empty,

    #[error("Unexpected '{ch}' at position {position} in selector `{selector}`")]
    Unexpected {
        ch: char,
        position: usize,
        selector: String,
    },

    #[error("Expected identifier at position {position} in selector `{selector}`")]
    ExpectedIdent { position: usize, selector: String },

    #[error("Unterminated string in selector `{0}`")]
    UnterminatedString(String),
}

impl From<serde_json::Error> for DomError {
    fn from(e: serde_json::Error) -> Self {
        DomError::Snapshot(e.to_string())
    }
}

/// Result alias for page operations
pub type DomResult<T> = Result<T, DomError>;
