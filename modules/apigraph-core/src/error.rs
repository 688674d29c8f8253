//! Typed errors for description loading, schema compilation, and upstream calls.

use std::path::PathBuf;

use async_graphql::ErrorExtensions;
use thiserror::Error;

/// Errors raised while walking the shape graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// A reference names a shape absent from the table
    #[error("unknown shape: {0}")]
    UnknownShape(String),

    /// A chain of references loops without reaching a concrete shape
    #[error("cyclic shape reference through: {0}")]
    CyclicReference(String),
}

/// Errors that abort compilation. No partially-compiled schema is ever served.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("shape error: {0}")]
    Shape(#[from] ShapeError),

    /// None of the allow-listed endpoint prefixes matched a loaded description
    #[error("no loaded description matches the allowed services {allowed:?}")]
    NoMatchingServices { allowed: Vec<String> },

    /// Two extracted types share a name but differ structurally (strict mode only)
    #[error("conflicting definitions for types: {}", names.join(", "))]
    DuplicateTypeConflict { names: Vec<String> },

    #[error("failed to read description {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse description {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The schema library rejected the assembled types
    #[error("schema assembly failed: {0}")]
    Schema(String),
}

/// A backend remote call failed. Request-scoped; never fatal to the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamCallError {
    /// No client could be constructed for the service
    #[error("no client available for {service}: {message}")]
    Unavailable { service: String, message: String },

    /// Transport-level failure (connect, timeout, malformed body)
    #[error("{service}.{method} failed: {message}")]
    Transport {
        service: String,
        method: String,
        message: String,
    },

    /// The service answered with an error status
    #[error("{service}.{method} rejected (status {status}): {message}")]
    Rejected {
        service: String,
        method: String,
        status: u16,
        message: String,
    },
}

impl UpstreamCallError {
    /// GraphQL error carrying `extensions.code = "UPSTREAM_CALL_FAILED"`.
    pub fn to_graphql_error(&self) -> async_graphql::Error {
        let status = match self {
            UpstreamCallError::Rejected { status, .. } => Some(*status),
            _ => None,
        };
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| {
            e.set("code", "UPSTREAM_CALL_FAILED");
            if let Some(status) = status {
                e.set("status", i32::from(status));
            }
        })
    }
}

/// Result type alias for compilation.
pub type Result<T> = std::result::Result<T, CompileError>;
