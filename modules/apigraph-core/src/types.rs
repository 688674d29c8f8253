use crate::description::ScalarTag;

/// Field name used when a structure declares no members.
pub const PLACEHOLDER_FIELD: &str = "ok";

/// Value the placeholder field resolves to.
pub const PLACEHOLDER_VALUE: &str = "ok";

/// Name of the opaque passthrough scalar.
pub const JSON_SCALAR: &str = "JSON";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Input,
    Output,
}

impl TypeKind {
    pub fn from_input(is_input: bool) -> Self {
        if is_input {
            TypeKind::Input
        } else {
            TypeKind::Output
        }
    }

    pub fn is_input(self) -> bool {
        self == TypeKind::Input
    }
}

/// Target scalar of a primitive leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    String,
    Int,
    Float,
    Boolean,
    Json,
}

impl ScalarType {
    pub fn type_name(self) -> &'static str {
        match self {
            ScalarType::String => "String",
            ScalarType::Int => "Int",
            ScalarType::Float => "Float",
            ScalarType::Boolean => "Boolean",
            ScalarType::Json => JSON_SCALAR,
        }
    }
}

impl From<&ScalarTag> for ScalarType {
    fn from(tag: &ScalarTag) -> Self {
        match tag {
            ScalarTag::String | ScalarTag::Blob | ScalarTag::Timestamp => ScalarType::String,
            ScalarTag::Integer | ScalarTag::Long => ScalarType::Int,
            ScalarTag::Float | ScalarTag::Double => ScalarType::Float,
            ScalarTag::Boolean => ScalarType::Boolean,
            ScalarTag::Map | ScalarTag::Other(_) => ScalarType::Json,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldTarget {
    Scalar(ScalarType),
    /// Another extracted type, by name.
    Type(String),
}

impl FieldTarget {
    pub fn type_name(&self) -> &str {
        match self {
            FieldTarget::Scalar(scalar) => scalar.type_name(),
            FieldTarget::Type(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtractedField {
    pub name: String,
    pub target: FieldTarget,
    pub required: bool,
    pub is_list: bool,
    /// Stands in for the members of an empty structure.
    pub placeholder: bool,
}

impl ExtractedField {
    pub fn new(name: impl Into<String>, target: FieldTarget, required: bool, is_list: bool) -> Self {
        Self {
            name: name.into(),
            target,
            required,
            is_list,
            placeholder: false,
        }
    }

    pub fn placeholder() -> Self {
        Self {
            name: PLACEHOLDER_FIELD.to_string(),
            target: FieldTarget::Scalar(ScalarType::String),
            required: false,
            is_list: false,
            placeholder: true,
        }
    }
}

/// A schema type produced by extraction. Identity is the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedType {
    pub name: String,
    pub kind: TypeKind,
    pub fields: Vec<ExtractedField>,
}

impl ExtractedType {
    /// Output type with only the placeholder field, for operations without output.
    pub fn marker(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Output,
            fields: vec![ExtractedField::placeholder()],
        }
    }

    pub fn field(&self, name: &str) -> Option<&ExtractedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields that correspond to declared members.
    pub fn member_fields(&self) -> impl Iterator<Item = &ExtractedField> {
        self.fields.iter().filter(|f| !f.placeholder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_lookup_table() {
        let cases = [
            ("string", ScalarType::String),
            ("blob", ScalarType::String),
            ("timestamp", ScalarType::String),
            ("integer", ScalarType::Int),
            ("long", ScalarType::Int),
            ("float", ScalarType::Float),
            ("double", ScalarType::Float),
            ("boolean", ScalarType::Boolean),
            ("map", ScalarType::Json),
            ("character", ScalarType::Json),
        ];
        for (tag, expected) in cases {
            assert_eq!(ScalarType::from(&ScalarTag::from(tag)), expected, "tag {tag}");
        }
    }

    #[test]
    fn marker_has_single_placeholder() {
        let marker = ExtractedType::marker("RebootInstances");
        assert_eq!(marker.kind, TypeKind::Output);
        assert_eq!(marker.fields.len(), 1);
        assert_eq!(marker.fields[0].name, PLACEHOLDER_FIELD);
        assert_eq!(marker.member_fields().count(), 0);
    }
}
