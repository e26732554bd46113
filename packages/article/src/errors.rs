//! Error types for the article controller

use crate::io::RequestId;
use hsuforum_dom::{DomError, NodeId, SelectorError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArticleError {
    /// The hidden editor container is absent from the page markup
    #[error("Failed to get editor: container `{0}` is missing")]
    MissingEditorContainer(String),

    /// The rich editor has not finished loading
    #[error("Advanced editor is not available yet")]
    MountUnavailable,

    #[error("Toggle control {0} has no plain text widget")]
    MissingWidget(NodeId),

    #[error("Toggle control {0} is no longer on the page")]
    DisconnectedControl(NodeId),

    #[error("DOM error: {0}")]
    Dom(#[from] DomError),

    #[error("Selector error: {0}")]
    Selector(#[from] SelectorError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Malformed server response: {0}")]
    Response(#[source] serde_json::Error),

    #[error("Failed to encode event: {0}")]
    EventEncoding(#[source] serde_json::Error),

    #[error("No pending request with id {0}")]
    UnknownRequest(RequestId),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid selector `{name}`: {source}")]
    Selector {
        name: &'static str,
        #[source]
        source: SelectorError,
    },
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Request payload must be an object")]
    InvalidPayload,

    #[error("Request rejected: {0}")]
    Rejected(String),
}

/// Result alias for controller operations
pub type ArticleResult<T> = Result<T, ArticleError>;
