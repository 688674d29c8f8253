pub mod error;

pub use error::{ClientError, Result};

use std::sync::Arc;
use std::time::Duration;

use apigraph_core::{Backend, MethodRef, ServiceClient, UpstreamCallError};
use async_trait::async_trait;
use serde_json::Value;

const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the configured region on every call.
const REGION_HEADER: &str = "X-Region";

/// Explicit backend configuration, fixed before any client is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub base_url: String,
    pub region: String,
    pub timeout: Duration,
}

impl BackendConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            region: DEFAULT_REGION.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Backend that reaches every service over HTTP.
///
/// A call to `describeInstances` on service `EC2` becomes
/// `POST {base_url}/EC2/describeInstances` with the arguments as the JSON body.
pub struct HttpBackend {
    http: reqwest::Client,
    config: BackendConfig,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        tracing::info!(base_url = %config.base_url, region = %config.region, "HTTP backend configured");
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }
}

impl Backend for HttpBackend {
    fn client(&self, service_id: &str) -> std::result::Result<Arc<dyn ServiceClient>, UpstreamCallError> {
        if service_id.is_empty() {
            return Err(UpstreamCallError::Unavailable {
                service: service_id.to_string(),
                message: "empty service identifier".to_string(),
            });
        }
        Ok(Arc::new(HttpServiceClient {
            http: self.http.clone(),
            service_url: format!("{}/{}", self.config.base_url, service_id),
            region: self.config.region.clone(),
        }))
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }
}

/// Client bound to one service.
pub struct HttpServiceClient {
    http: reqwest::Client,
    service_url: String,
    region: String,
}

impl HttpServiceClient {
    fn method_url(&self, method: &MethodRef) -> String {
        format!("{}/{}", self.service_url, method.method())
    }

    async fn post(&self, method: &MethodRef, input: &Value) -> Result<Value> {
        let resp = self
            .http
            .post(self.method_url(method))
            .header(REGION_HEADER, &self.region)
            .json(input)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await?;
        parse_body(&body)
    }
}

#[async_trait]
impl ServiceClient for HttpServiceClient {
    async fn invoke(
        &self,
        method: &MethodRef,
        input: Value,
    ) -> std::result::Result<Value, UpstreamCallError> {
        tracing::debug!(url = %self.method_url(method), "Calling backend");
        self.post(method, &input)
            .await
            .map_err(|e| e.into_upstream(method))
    }
}

/// Empty bodies mean "no output" and become an empty object.
fn parse_body(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}
