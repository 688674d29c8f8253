//! Endpoint binding: per operation, an argument list, a result type, and a
//! resolver that forwards the call to the backend.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;

use crate::backend::{Backend, MethodRef};
use crate::description::{Operation, ShapeTable};
use crate::error::{ShapeError, UpstreamCallError};
use crate::extract::extract;
use crate::naming::type_name;
use crate::types::{ExtractedField, ExtractedType, TypeKind};

pub type Resolver =
    Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Value, UpstreamCallError>> + Send + Sync>;

#[derive(Clone)]
pub struct BoundEndpoint {
    pub operation_name: String,
    /// One argument per member of the operation's input structure.
    pub arguments: Vec<ExtractedField>,
    pub result_type: String,
    pub method: MethodRef,
    resolver: Resolver,
}

impl BoundEndpoint {
    /// Invoke the backend with the caller-supplied arguments.
    pub async fn call(&self, arguments: Value) -> Result<Value, UpstreamCallError> {
        (self.resolver)(arguments).await
    }
}

impl fmt::Debug for BoundEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundEndpoint")
            .field("operation_name", &self.operation_name)
            .field("arguments", &self.arguments)
            .field("result_type", &self.result_type)
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

/// An endpoint together with the types its arguments and result reference.
#[derive(Debug, Clone)]
pub struct BoundOperation {
    pub endpoint: BoundEndpoint,
    pub types: Vec<ExtractedType>,
}

pub fn bind_operation(
    service_id: &str,
    operation: &Operation,
    shapes: &ShapeTable,
    backend: Arc<dyn Backend>,
) -> Result<BoundOperation, ShapeError> {
    let input_types = extract(&operation.name, operation.input.as_ref(), shapes, TypeKind::Input)?;
    let mut output_types = extract(&operation.name, operation.output.as_ref(), shapes, TypeKind::Output)?;

    let input_name = type_name(&operation.name, TypeKind::Input);
    let arguments: Vec<ExtractedField> = input_types
        .iter()
        .find(|t| t.name == input_name)
        .map(|t| t.member_fields().cloned().collect())
        .unwrap_or_default();

    let result_type = type_name(&operation.name, TypeKind::Output);
    if !output_types.iter().any(|t| t.name == result_type) {
        output_types.insert(0, ExtractedType::marker(result_type.clone()));
    }

    let method = MethodRef::new(service_id, &operation.name);
    let endpoint = BoundEndpoint {
        operation_name: operation.name.clone(),
        arguments,
        result_type,
        resolver: forward_to(backend, method.clone()),
        method,
    };

    let mut types = input_types;
    types.extend(output_types);
    Ok(BoundOperation { endpoint, types })
}

fn forward_to(backend: Arc<dyn Backend>, method: MethodRef) -> Resolver {
    Arc::new(move |input: Value| {
        let backend = backend.clone();
        let method = method.clone();
        async move {
            let client = backend.client(method.service_id())?;
            tracing::debug!(
                service = method.service_id(),
                method = method.method(),
                "Forwarding operation to backend"
            );
            client.invoke(&method, input).await.inspect_err(|e| {
                tracing::warn!(
                    service = method.service_id(),
                    method = method.method(),
                    error = %e,
                    "Backend call failed"
                );
            })
        }
        .boxed()
    })
}
