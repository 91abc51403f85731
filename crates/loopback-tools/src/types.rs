//! Shared error type for the reference tools.

use crate::api_call::HttpMethod;

/// Errors that can occur while running a reference tool.
#[derive(thiserror::Error, Debug)]
pub enum ToolsError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid header '{0}'")]
    InvalidHeader(String),

    #[error("{0} requests cannot carry a body")]
    BodyNotAllowed(HttpMethod),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Convenience result type.
pub type ToolsResult<T> = Result<T, ToolsError>;
