//! Error types for route resolution and navigation.

use thiserror::Error;

/// Navigation-specific errors.
#[derive(Debug, Error)]
pub enum NavError {
    /// No declared route carries the requested name.
    #[error("route with name '{0}' not found")]
    RouteNotFound(String),

    /// A before-guard cancelled the navigation.
    #[error("navigation cancelled: {from} -> {to}")]
    NavigationCancelled {
        /// Full path of the route that was current when the navigation started.
        from: String,
        /// Full path of the rejected target.
        to: String,
    },

    /// Guards kept redirecting past the allowed depth.
    #[error("redirect limit of {limit} exceeded while navigating to {to}")]
    RedirectLimitExceeded {
        /// Maximum number of consecutive redirects.
        limit: usize,
        /// Full path of the last redirect target.
        to: String,
    },

    /// A declared path could not be compiled into a pattern.
    #[error("invalid path pattern '{path}': {source}")]
    InvalidPattern {
        /// The normalized declared path.
        path: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// A string location could not be parsed.
    #[error("invalid location '{location}': {source}")]
    InvalidLocation {
        /// The raw location string.
        location: String,
        /// Underlying URL parse error.
        #[source]
        source: url::ParseError,
    },

    /// A route table document failed to deserialize.
    #[error("invalid route table: {0}")]
    RouteTable(#[from] serde_json::Error),

    /// The history backend failed to perform an operation.
    #[error("history error: {0}")]
    History(String),
}

/// Result type alias for navigation operations.
pub type Result<T> = std::result::Result<T, NavError>;
