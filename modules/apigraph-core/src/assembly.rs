//! Schema assembly: registers compiled types and endpoints with a dynamic
//! GraphQL schema.

use std::sync::Arc;

use async_graphql::dynamic::{
    DynamicRequest, Field, FieldFuture, FieldValue, InputObject, InputValue, Object,
    ResolverContext, Scalar, Schema, TypeRef,
};
use async_graphql::{Name, Response, Value};

use crate::binder::BoundEndpoint;
use crate::compiler::{CompiledApi, CompiledService};
use crate::error::{CompileError, Result};
use crate::types::{
    ExtractedField, ExtractedType, FieldTarget, ScalarType, TypeKind, JSON_SCALAR,
    PLACEHOLDER_FIELD, PLACEHOLDER_VALUE,
};

pub const QUERY_TYPE: &str = "Query";
pub const SDK_VERSION_FIELD: &str = "sdkVersion";

/// The servable schema plus the compilation output it was built from.
#[derive(Clone)]
pub struct AssembledSchema {
    schema: Schema,
    api: Arc<CompiledApi>,
}

impl std::fmt::Debug for AssembledSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssembledSchema")
            .field("api", &self.api)
            .finish_non_exhaustive()
    }
}

impl AssembledSchema {
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn api(&self) -> &CompiledApi {
        &self.api
    }

    pub async fn execute(&self, request: impl Into<DynamicRequest>) -> Response {
        self.schema.execute(request).await
    }

    pub fn sdl(&self) -> String {
        self.schema.sdl()
    }
}

pub fn assemble(api: CompiledApi, sdk_version: String) -> Result<AssembledSchema> {
    let mut query = Object::new(QUERY_TYPE).field(Field::new(
        SDK_VERSION_FIELD,
        TypeRef::named(TypeRef::STRING),
        move |_| {
            let version = sdk_version.clone();
            FieldFuture::new(async move { Ok(Some(Value::from(version))) })
        },
    ));

    let mut builder = Schema::build(QUERY_TYPE, None, None).register(Scalar::new(JSON_SCALAR));

    for ty in &api.types {
        builder = match ty.kind {
            TypeKind::Input => builder.register(input_object(ty)),
            TypeKind::Output => builder.register(output_object(ty)),
        };
    }

    for service in &api.services {
        builder = builder.register(service_object(service));
        query = query.field(Field::new(
            service.type_name.clone(),
            TypeRef::named(service.type_name.clone()),
            |_| {
                FieldFuture::new(async {
                    Ok(Some(FieldValue::value(Value::Object(Default::default()))))
                })
            },
        ));
    }

    let schema = builder
        .register(query)
        .finish()
        .map_err(|e| CompileError::Schema(e.to_string()))?;

    tracing::info!(
        services = api.services.len(),
        types = api.types.len(),
        "Assembled schema"
    );

    Ok(AssembledSchema {
        schema,
        api: Arc::new(api),
    })
}

fn type_ref(field: &ExtractedField) -> TypeRef {
    let name = field.target.type_name().to_string();
    match (field.is_list, field.required) {
        (false, false) => TypeRef::named(name),
        (false, true) => TypeRef::named_nn(name),
        (true, false) => TypeRef::named_list(name),
        (true, true) => TypeRef::named_list_nn(name),
    }
}

fn input_object(ty: &ExtractedType) -> InputObject {
    ty.fields.iter().fold(InputObject::new(ty.name.clone()), |object, field| {
        object.field(InputValue::new(field.name.clone(), type_ref(field)))
    })
}

fn output_object(ty: &ExtractedType) -> Object {
    ty.fields
        .iter()
        .fold(Object::new(ty.name.clone()), |object, field| {
            object.field(output_field(field))
        })
}

fn output_field(field: &ExtractedField) -> Field {
    if field.placeholder {
        return placeholder_field();
    }
    let key = Name::new(&field.name);
    let scalar = match field.target {
        FieldTarget::Scalar(scalar) => Some(scalar),
        FieldTarget::Type(_) => None,
    };
    let is_list = field.is_list;
    Field::new(field.name.clone(), type_ref(field), move |ctx| {
        let key = key.clone();
        FieldFuture::new(async move {
            member_value(ctx.parent_value.as_value(), &key, scalar, is_list)
        })
    })
}

fn placeholder_field() -> Field {
    Field::new(PLACEHOLDER_FIELD, TypeRef::named(TypeRef::STRING), |_| {
        FieldFuture::new(async { Ok(Some(Value::from(PLACEHOLDER_VALUE))) })
    })
}

/// Read a member out of the parent's JSON result.
///
/// Scalar members are coerced to the field's declared scalar; object members
/// pass through for their own fields to read.
fn member_value<'a>(
    parent: Option<&Value>,
    key: &Name,
    scalar: Option<ScalarType>,
    is_list: bool,
) -> async_graphql::Result<Option<FieldValue<'a>>> {
    let Some(Value::Object(members)) = parent else {
        return Ok(None);
    };
    let leaf = |value: &Value| match scalar {
        Some(scalar) => coerce_scalar(value, scalar),
        None => Ok(value.clone()),
    };
    match members.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::List(items)) if is_list => {
            let items = items.iter().map(leaf).collect::<async_graphql::Result<Vec<_>>>()?;
            Ok(Some(FieldValue::list(items.into_iter().map(FieldValue::value))))
        }
        Some(value) => Ok(Some(FieldValue::value(leaf(value)?))),
    }
}

/// Convert a backend leaf to a value `scalar` can represent.
///
/// Numbers and booleans serialize as strings for `String`. `Int` accepts
/// integral numbers within 32 bits, booleans, and numeric strings; anything
/// else is a field error rather than a silently mistyped value.
fn coerce_scalar(value: &Value, scalar: ScalarType) -> async_graphql::Result<Value> {
    let coerced = match (scalar, value) {
        (_, Value::Null) | (ScalarType::Json, _) => Some(value.clone()),
        (ScalarType::String, Value::String(_)) => Some(value.clone()),
        (ScalarType::String, Value::Number(n)) => Some(Value::String(n.to_string())),
        (ScalarType::String, Value::Boolean(b)) => Some(Value::String(b.to_string())),
        (ScalarType::Int, Value::Number(n)) => n
            .as_i64()
            .and_then(|i| i32::try_from(i).ok())
            .map(Value::from),
        (ScalarType::Int, Value::Boolean(b)) => Some(Value::from(i32::from(*b))),
        (ScalarType::Int, Value::String(s)) => s.trim().parse::<i32>().ok().map(Value::from),
        (ScalarType::Float, Value::Number(_)) => Some(value.clone()),
        (ScalarType::Boolean, Value::Boolean(_)) => Some(value.clone()),
        _ => None,
    };
    coerced.ok_or_else(|| {
        async_graphql::Error::new(format!(
            "{} cannot represent value: {value}",
            scalar.type_name()
        ))
    })
}

fn service_object(service: &CompiledService) -> Object {
    if service.endpoints.is_empty() {
        return Object::new(service.type_name.clone()).field(placeholder_field());
    }
    service
        .endpoints
        .iter()
        .fold(Object::new(service.type_name.clone()), |object, endpoint| {
            object.field(operation_field(endpoint.clone()))
        })
}

fn operation_field(endpoint: BoundEndpoint) -> Field {
    let name = endpoint.operation_name.clone();
    let result = TypeRef::named(endpoint.result_type.clone());
    let arguments: Vec<InputValue> = endpoint
        .arguments
        .iter()
        .map(|arg| InputValue::new(arg.name.clone(), type_ref(arg)))
        .collect();

    let endpoint = Arc::new(endpoint);
    let field = Field::new(name, result, move |ctx| {
        let endpoint = endpoint.clone();
        FieldFuture::new(async move {
            let input = arguments_json(&ctx)?;
            let output = endpoint
                .call(input)
                .await
                .map_err(|e| e.to_graphql_error())?;
            Ok(Some(FieldValue::value(Value::from_json(output)?)))
        })
    });

    arguments
        .into_iter()
        .fold(field, |field, argument| field.argument(argument))
}

/// Caller-supplied arguments as the JSON object forwarded to the backend.
fn arguments_json(ctx: &ResolverContext<'_>) -> async_graphql::Result<serde_json::Value> {
    let mut input = serde_json::Map::new();
    for (name, value) in ctx.args.iter() {
        let value = value.as_value();
        if matches!(value, Value::Null) {
            continue;
        }
        input.insert(name.to_string(), value.clone().into_json()?);
    }
    Ok(serde_json::Value::Object(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_with(types: Vec<ExtractedType>) -> CompiledApi {
        CompiledApi {
            services: Vec::new(),
            types,
            conflicts: Vec::new(),
        }
    }

    #[test]
    fn field_nullability_follows_required_and_list() {
        let field = |required, is_list| {
            ExtractedField::new("F", FieldTarget::Type("Tag".into()), required, is_list)
        };
        assert_eq!(type_ref(&field(false, false)).to_string(), "Tag");
        assert_eq!(type_ref(&field(true, false)).to_string(), "Tag!");
        assert_eq!(type_ref(&field(false, true)).to_string(), "[Tag]");
        assert_eq!(type_ref(&field(true, true)).to_string(), "[Tag]!");
    }

    #[test]
    fn empty_allow_list_exposes_only_sdk_version() {
        let schema = assemble(api_with(Vec::new()), "1.2.3".into()).unwrap();
        let sdl = schema.sdl();
        assert!(sdl.contains("sdkVersion: String"));
        assert!(sdl.contains("scalar JSON"));
    }

    #[test]
    fn registers_input_and_output_types() {
        let output = ExtractedType {
            name: "Tag".into(),
            kind: TypeKind::Output,
            fields: vec![ExtractedField::new(
                "Key",
                FieldTarget::Scalar(ScalarType::String),
                true,
                false,
            )],
        };
        let input = ExtractedType {
            name: "TagInputType".into(),
            kind: TypeKind::Input,
            fields: vec![ExtractedField::new(
                "Key",
                FieldTarget::Scalar(ScalarType::String),
                true,
                false,
            )],
        };
        let schema = assemble(api_with(vec![output, input]), "1.2.3".into()).unwrap();
        let sdl = schema.sdl();
        assert!(sdl.contains("type Tag {"));
        assert!(sdl.contains("input TagInputType {"));
        assert!(sdl.contains("Key: String!"));
    }

    #[test]
    fn scalar_leaves_match_declared_type() {
        let coerce = |value: serde_json::Value, scalar| {
            coerce_scalar(&Value::from_json(value).unwrap(), scalar).map(|v| v.into_json().unwrap())
        };
        assert_eq!(
            coerce(serde_json::json!(1700000000), ScalarType::String).unwrap(),
            serde_json::json!("1700000000")
        );
        assert_eq!(
            coerce(serde_json::json!(true), ScalarType::String).unwrap(),
            serde_json::json!("true")
        );
        assert_eq!(
            coerce(serde_json::json!("42"), ScalarType::Int).unwrap(),
            serde_json::json!(42)
        );
        assert_eq!(
            coerce(serde_json::json!(2.5), ScalarType::Float).unwrap(),
            serde_json::json!(2.5)
        );
        assert_eq!(
            coerce(serde_json::json!({ "a": [1] }), ScalarType::Json).unwrap(),
            serde_json::json!({ "a": [1] })
        );

        assert!(coerce(serde_json::json!(5000000000_i64), ScalarType::Int).is_err());
        assert!(coerce(serde_json::json!(1.5), ScalarType::Int).is_err());
        assert!(coerce(serde_json::json!("yes"), ScalarType::Boolean).is_err());
        assert!(coerce(serde_json::json!({ "a": 1 }), ScalarType::String).is_err());
    }
}
