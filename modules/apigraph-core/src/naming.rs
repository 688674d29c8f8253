//! Name derivation for schema types and backend methods.

use crate::types::TypeKind;

/// Suffix distinguishing input types from output types of the same shape.
pub const INPUT_SUFFIX: &str = "InputType";

const RESERVED: &[&str] = &["Query", "JSON", "String", "Int", "Float", "Boolean", "ID"];

/// Backend method name for an operation: first character lowercased,
/// remainder untouched (`DescribeInstances` -> `describeInstances`).
pub fn method_name(operation: &str) -> String {
    let mut chars = operation.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Schema type name for a shape extracted under `parent`.
pub fn type_name(parent: &str, kind: TypeKind) -> String {
    let base = schema_name(parent);
    match kind {
        TypeKind::Input => format!("{base}{INPUT_SUFFIX}"),
        TypeKind::Output => base,
    }
}

/// Coerce an arbitrary identifier into a valid, non-reserved schema name.
pub fn schema_name(raw: &str) -> String {
    let mut name: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    if name.starts_with("__") || RESERVED.contains(&name.as_str()) {
        name.push_str("Shape");
    }
    name
}
