//! Service API descriptions: the shape graph and operation table of one
//! remote service, as loaded from its JSON description document.

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{CompileError, Result};

/// Primitive leaf tag of a scalar shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarTag {
    String,
    Integer,
    Long,
    Float,
    Double,
    Boolean,
    Timestamp,
    Blob,
    Map,
    Other(String),
}

impl From<&str> for ScalarTag {
    fn from(tag: &str) -> Self {
        match tag {
            "string" => ScalarTag::String,
            "integer" => ScalarTag::Integer,
            "long" => ScalarTag::Long,
            "float" => ScalarTag::Float,
            "double" => ScalarTag::Double,
            "boolean" => ScalarTag::Boolean,
            "timestamp" => ScalarTag::Timestamp,
            "blob" => ScalarTag::Blob,
            "map" => ScalarTag::Map,
            other => ScalarTag::Other(other.to_string()),
        }
    }
}

/// One node of the source type graph.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawShape")]
pub enum ShapeDescription {
    Scalar(ScalarTag),
    Structure {
        members: IndexMap<String, Member>,
        required: Vec<String>,
    },
    List {
        member: Box<Member>,
    },
    /// Name to look up in the owning description's [`ShapeTable`].
    Reference(String),
}

impl ShapeDescription {
    pub fn structure<I, S>(members: I, required: &[&str]) -> Self
    where
        I: IntoIterator<Item = (S, ShapeDescription)>,
        S: Into<String>,
    {
        ShapeDescription::Structure {
            members: members
                .into_iter()
                .map(|(name, shape)| (name.into(), Member::new(shape)))
                .collect(),
            required: required.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn list(element: ShapeDescription) -> Self {
        ShapeDescription::List {
            member: Box::new(Member::new(element)),
        }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        ShapeDescription::Reference(name.into())
    }

    pub fn scalar(tag: &str) -> Self {
        ShapeDescription::Scalar(ScalarTag::from(tag))
    }
}

/// A structure member, or the element of a list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawShape")]
pub struct Member {
    pub shape: ShapeDescription,
}

impl Member {
    pub fn new(shape: ShapeDescription) -> Self {
        Self { shape }
    }
}

/// Named shapes of one description. Read-only once loaded.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ShapeTable(IndexMap<String, ShapeDescription>);

impl ShapeTable {
    pub fn get(&self, name: &str) -> Option<&ShapeDescription> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, ShapeDescription)> for ShapeTable {
    fn from_iter<T: IntoIterator<Item = (S, ShapeDescription)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub name: String,
    pub input: Option<ShapeDescription>,
    pub output: Option<ShapeDescription>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceMetadata {
    /// Identifier the backend client is constructed with.
    pub service_id: String,
    /// Stable short name of the service; becomes the root field.
    pub endpoint_prefix: String,
    pub api_version: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawDescription")]
pub struct ServiceApiDescription {
    pub metadata: ServiceMetadata,
    pub operations: IndexMap<String, Operation>,
    pub shapes: ShapeTable,
}

/// Parse a single description document.
pub fn parse_description(json: &str) -> serde_json::Result<ServiceApiDescription> {
    serde_json::from_str(json)
}

/// Load every `*.json` description in `dir`, ordered by file name.
pub fn load_descriptions(dir: &Path) -> Result<Vec<ServiceApiDescription>> {
    let entries = std::fs::read_dir(dir).map_err(|source| CompileError::Read {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| CompileError::Read {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut descriptions = Vec::with_capacity(paths.len());
    for path in paths {
        let content = std::fs::read_to_string(&path).map_err(|source| CompileError::Read {
            path: path.clone(),
            source,
        })?;
        let description = parse_description(&content)
            .map_err(|source| CompileError::Parse { path: path.clone(), source })?;
        tracing::debug!(
            path = %path.display(),
            endpoint_prefix = %description.metadata.endpoint_prefix,
            api_version = %description.metadata.api_version,
            operations = description.operations.len(),
            "Loaded service description"
        );
        descriptions.push(description);
    }

    tracing::info!(count = descriptions.len(), dir = %dir.display(), "Loaded service descriptions");
    Ok(descriptions)
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct RawShape {
    #[serde(rename = "type")]
    kind: Option<String>,
    shape: Option<String>,
    #[serde(default)]
    members: IndexMap<String, RawShape>,
    member: Option<Box<RawShape>>,
    #[serde(default)]
    required: Vec<String>,
}

impl From<RawShape> for ShapeDescription {
    fn from(raw: RawShape) -> Self {
        if let Some(name) = raw.shape {
            return ShapeDescription::Reference(name);
        }
        match raw.kind.as_deref() {
            Some("structure") => ShapeDescription::Structure {
                members: raw
                    .members
                    .into_iter()
                    .map(|(name, member)| (name, Member::from(member)))
                    .collect(),
                required: raw.required,
            },
            Some("list") => ShapeDescription::List {
                member: Box::new(raw.member.map(|m| Member::from(*m)).unwrap_or_default()),
            },
            Some(tag) => ShapeDescription::Scalar(ScalarTag::from(tag)),
            // Untyped members are strings in the description format.
            None => ShapeDescription::Scalar(ScalarTag::String),
        }
    }
}

impl From<RawShape> for Member {
    fn from(raw: RawShape) -> Self {
        Member::new(raw.into())
    }
}

impl Default for Member {
    fn default() -> Self {
        Member::new(ShapeDescription::Scalar(ScalarTag::String))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMetadata {
    service_id: Option<String>,
    endpoint_prefix: String,
    #[serde(default)]
    api_version: String,
}

#[derive(Debug, Deserialize)]
struct RawOperation {
    name: Option<String>,
    input: Option<RawShape>,
    output: Option<RawShape>,
}

#[derive(Debug, Deserialize)]
struct RawDescription {
    metadata: RawMetadata,
    #[serde(default)]
    operations: IndexMap<String, RawOperation>,
    #[serde(default)]
    shapes: ShapeTable,
}

impl From<RawDescription> for ServiceApiDescription {
    fn from(raw: RawDescription) -> Self {
        let metadata = ServiceMetadata {
            service_id: raw
                .metadata
                .service_id
                .unwrap_or_else(|| raw.metadata.endpoint_prefix.clone()),
            endpoint_prefix: raw.metadata.endpoint_prefix,
            api_version: raw.metadata.api_version,
        };
        let operations = raw
            .operations
            .into_iter()
            .map(|(key, op)| {
                let operation = Operation {
                    name: op.name.unwrap_or_else(|| key.clone()),
                    input: op.input.map(ShapeDescription::from),
                    output: op.output.map(ShapeDescription::from),
                };
                (key, operation)
            })
            .collect();
        Self {
            metadata,
            operations,
            shapes: raw.shapes,
        }
    }
}
