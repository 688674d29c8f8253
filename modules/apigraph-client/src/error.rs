use apigraph_core::{MethodRef, UpstreamCallError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response body: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Network(err.to_string())
    }
}

impl ClientError {
    /// Attach the call site so the error can surface through a resolver.
    pub fn into_upstream(self, method: &MethodRef) -> UpstreamCallError {
        let service = method.service_id().to_string();
        let method = method.method().to_string();
        match self {
            ClientError::Api { status, message } => UpstreamCallError::Rejected {
                service,
                method,
                status,
                message,
            },
            ClientError::Network(message) | ClientError::InvalidResponse(message) => {
                UpstreamCallError::Transport {
                    service,
                    method,
                    message,
                }
            }
        }
    }
}
