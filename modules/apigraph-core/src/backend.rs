//! Seams to the backend client library.
//!
//! Each operation is bound once, at compile time, to a [`MethodRef`] naming
//! the owning service and the derived method. At call time the [`Backend`]
//! hands out a [`ServiceClient`] for that service and the call is made
//! through it.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::UpstreamCallError;
use crate::naming::method_name;

/// A backend method bound to one operation of one service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodRef {
    service_id: String,
    operation: String,
    method: String,
}

impl MethodRef {
    pub fn new(service_id: impl Into<String>, operation: impl Into<String>) -> Self {
        let operation = operation.into();
        Self {
            service_id: service_id.into(),
            method: method_name(&operation),
            operation,
        }
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Derived backend method name, e.g. `describeInstances`.
    pub fn method(&self) -> &str {
        &self.method
    }
}

/// A client bound to a single service.
#[async_trait]
pub trait ServiceClient: Send + Sync {
    /// Perform one remote call and return the result unmodified.
    async fn invoke(&self, method: &MethodRef, input: Value) -> Result<Value, UpstreamCallError>;
}

/// Constructs service clients. Implemented by the client library.
pub trait Backend: Send + Sync {
    /// Obtain (or construct) a client for `service_id`.
    fn client(&self, service_id: &str) -> Result<Arc<dyn ServiceClient>, UpstreamCallError>;

    /// Version string of the client library, reported as `sdkVersion`.
    fn version(&self) -> String;
}
