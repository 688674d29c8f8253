//! Type extraction: turns one shape into the schema types needed to express it.
//!
//! Every nested structure gets its own type named after the member that holds
//! it, so two operations referencing the same shape produce independently
//! named types; the deduplicator reconciles them afterwards.
//!
//! The walk keeps the `(parent name, kind)` pairs currently being expanded,
//! each with the structure it resolved to. Re-entering a pair with the same
//! structure means the shape graph looped back on itself; the field then
//! refers to the enclosing type by name instead of expanding it again. A
//! different structure under an enclosing name is expanded normally, and the
//! resulting same-named types are reported as a conflict by the deduplicator.

use std::ptr;

use indexmap::IndexMap;

use crate::description::{Member, ShapeDescription, ShapeTable};
use crate::error::ShapeError;
use crate::naming::type_name;
use crate::resolver::{resolve_concrete, ConcreteShape};
use crate::types::{ExtractedField, ExtractedType, FieldTarget, ScalarType, TypeKind};

/// Extract the types for `shape`, named after `parent_name`.
///
/// The type for the current level comes first, followed by every nested type
/// discovered beneath it. An absent shape yields no types.
pub fn extract(
    parent_name: &str,
    shape: Option<&ShapeDescription>,
    shapes: &ShapeTable,
    kind: TypeKind,
) -> Result<Vec<ExtractedType>, ShapeError> {
    let Some(shape) = shape else {
        return Ok(Vec::new());
    };
    Extractor::new(shapes, kind).walk(parent_name, shape)
}

struct Extractor<'a> {
    shapes: &'a ShapeTable,
    kind: TypeKind,
    in_progress: Vec<InProgress<'a>>,
}

struct InProgress<'a> {
    parent: String,
    kind: TypeKind,
    members: &'a IndexMap<String, Member>,
}

impl InProgress<'_> {
    fn is_same(&self, parent: &str, kind: TypeKind, members: &IndexMap<String, Member>) -> bool {
        self.parent == parent && self.kind == kind && ptr::eq(self.members, members)
    }
}

impl<'a> Extractor<'a> {
    fn new(shapes: &'a ShapeTable, kind: TypeKind) -> Self {
        Self {
            shapes,
            kind,
            in_progress: Vec::new(),
        }
    }

    fn walk(&mut self, parent: &str, shape: &'a ShapeDescription) -> Result<Vec<ExtractedType>, ShapeError> {
        // References keep the referencing context's name.
        match resolve_concrete(shape, self.shapes)? {
            ConcreteShape::Structure { members, required } => {
                self.walk_structure(parent, members, required)
            }
            ConcreteShape::List(member) => self.walk(parent, &member.shape),
            ConcreteShape::Scalar(_) => Ok(Vec::new()),
        }
    }

    fn walk_structure(
        &mut self,
        parent: &str,
        members: &'a IndexMap<String, Member>,
        required: &'a [String],
    ) -> Result<Vec<ExtractedType>, ShapeError> {
        let kind = self.kind;
        if self.in_progress.iter().any(|p| p.is_same(parent, kind, members)) {
            tracing::trace!(parent, ?kind, "Shape cycle, reusing enclosing type");
            return Ok(Vec::new());
        }
        if self.in_progress.iter().any(|p| p.parent == parent && p.kind == kind) {
            tracing::debug!(parent, ?kind, "Nested structure shares an enclosing type name");
        }
        self.in_progress.push(InProgress {
            parent: parent.to_string(),
            kind,
            members,
        });

        let mut nested = Vec::new();
        let mut fields = Vec::with_capacity(members.len().max(1));
        for (member_name, member) in members {
            let is_required = required.iter().any(|r| r == member_name);
            let field = self.member_field(member_name, &member.shape, is_required, &mut nested)?;
            fields.push(field);
        }
        if fields.is_empty() {
            fields.push(ExtractedField::placeholder());
        }

        self.in_progress.pop();

        let mut types = Vec::with_capacity(nested.len() + 1);
        types.push(ExtractedType {
            name: type_name(parent, self.kind),
            kind: self.kind,
            fields,
        });
        types.extend(nested);
        Ok(types)
    }

    fn member_field(
        &mut self,
        member_name: &str,
        shape: &'a ShapeDescription,
        required: bool,
        nested: &mut Vec<ExtractedType>,
    ) -> Result<ExtractedField, ShapeError> {
        let field = match resolve_concrete(shape, self.shapes)? {
            ConcreteShape::Scalar(tag) => {
                ExtractedField::new(member_name, FieldTarget::Scalar(tag.into()), required, false)
            }
            ConcreteShape::Structure { .. } => {
                nested.extend(self.walk(member_name, shape)?);
                ExtractedField::new(member_name, self.nested_target(member_name), required, false)
            }
            ConcreteShape::List(element) => {
                let target = match resolve_concrete(&element.shape, self.shapes)? {
                    ConcreteShape::Scalar(tag) => FieldTarget::Scalar(tag.into()),
                    ConcreteShape::Structure { .. } => {
                        nested.extend(self.walk(member_name, &element.shape)?);
                        self.nested_target(member_name)
                    }
                    // Only one list level is modelled; deeper nesting passes through.
                    ConcreteShape::List(_) => FieldTarget::Scalar(ScalarType::Json),
                };
                ExtractedField::new(member_name, target, required, true)
            }
        };
        Ok(field)
    }

    fn nested_target(&self, member_name: &str) -> FieldTarget {
        FieldTarget::Type(type_name(member_name, self.kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PLACEHOLDER_FIELD;

    fn names(types: &[ExtractedType]) -> Vec<&str> {
        types.iter().map(|t| t.name.as_str()).collect()
    }

    fn find<'t>(types: &'t [ExtractedType], name: &str) -> &'t ExtractedType {
        types
            .iter()
            .find(|t| t.name == name)
            .unwrap_or_else(|| panic!("missing type {name}"))
    }

    #[test]
    fn absent_shape_yields_nothing() {
        let types = extract("Noop", None, &ShapeTable::default(), TypeKind::Input).unwrap();
        assert!(types.is_empty());
    }

    #[test]
    fn empty_structure_gets_placeholder_field() {
        let empty = ShapeDescription::structure(Vec::<(String, ShapeDescription)>::new(), &[]);
        let types = extract("Ping", Some(&empty), &ShapeTable::default(), TypeKind::Output).unwrap();
        assert_eq!(types.len(), 1);
        assert_eq!(types[0].fields.len(), 1);
        assert_eq!(types[0].fields[0].name, PLACEHOLDER_FIELD);
        assert!(types[0].fields[0].placeholder);
    }

    #[test]
    fn input_and_output_names_differ() {
        let shape = ShapeDescription::structure([("Bucket", ShapeDescription::scalar("string"))], &["Bucket"]);
        let shapes = ShapeTable::default();
        let input = extract("GetObject", Some(&shape), &shapes, TypeKind::Input).unwrap();
        let output = extract("GetObject", Some(&shape), &shapes, TypeKind::Output).unwrap();
        assert_eq!(input[0].name, "GetObjectInputType");
        assert_eq!(output[0].name, "GetObject");
        assert_eq!(input[0].kind, TypeKind::Input);
        assert_eq!(output[0].kind, TypeKind::Output);
        assert_eq!(input[0].fields, output[0].fields);
    }

    #[test]
    fn required_set_marks_fields() {
        let shape = ShapeDescription::structure(
            [
                ("Bucket", ShapeDescription::scalar("string")),
                ("MaxKeys", ShapeDescription::scalar("integer")),
            ],
            &["Bucket"],
        );
        let types = extract("ListObjects", Some(&shape), &ShapeTable::default(), TypeKind::Input).unwrap();
        let ty = &types[0];
        assert!(ty.field("Bucket").unwrap().required);
        assert!(!ty.field("MaxKeys").unwrap().required);
        assert_eq!(ty.field("MaxKeys").unwrap().target, FieldTarget::Scalar(ScalarType::Int));
    }

    #[test]
    fn nested_types_are_named_after_members() {
        let shapes: ShapeTable = [(
            "Reservation",
            ShapeDescription::structure([("InstanceId", ShapeDescription::scalar("string"))], &[]),
        )]
        .into_iter()
        .collect();
        let output = ShapeDescription::structure(
            [("Reservations", ShapeDescription::list(ShapeDescription::reference("Reservation")))],
            &[],
        );

        let types = extract("DescribeInstances", Some(&output), &shapes, TypeKind::Output).unwrap();
        assert_eq!(names(&types), vec!["DescribeInstances", "Reservations"]);

        let field = find(&types, "DescribeInstances").field("Reservations").unwrap();
        assert!(field.is_list);
        assert_eq!(field.target, FieldTarget::Type("Reservations".into()));

        let inner = find(&types, "Reservations");
        assert_eq!(inner.fields.len(), 1);
        assert_eq!(inner.fields[0].target, FieldTarget::Scalar(ScalarType::String));
    }

    #[test]
    fn top_level_reference_keeps_parent_name() {
        let shapes: ShapeTable = [(
            "GetThingRequest",
            ShapeDescription::structure([("Id", ShapeDescription::scalar("string"))], &[]),
        )]
        .into_iter()
        .collect();
        let reference = ShapeDescription::reference("GetThingRequest");
        let types = extract("GetThing", Some(&reference), &shapes, TypeKind::Input).unwrap();
        assert_eq!(names(&types), vec!["GetThingInputType"]);
    }

    #[test]
    fn references_to_scalars_stay_scalar() {
        let shapes: ShapeTable = [
            ("InstanceType", ShapeDescription::scalar("string")),
            ("Ids", ShapeDescription::list(ShapeDescription::reference("InstanceType"))),
        ]
        .into_iter()
        .collect();
        let shape = ShapeDescription::structure(
            [
                ("Type", ShapeDescription::reference("InstanceType")),
                ("Ids", ShapeDescription::reference("Ids")),
            ],
            &[],
        );
        let types = extract("Run", Some(&shape), &shapes, TypeKind::Input).unwrap();
        assert_eq!(types.len(), 1);
        let ids = types[0].field("Ids").unwrap();
        assert!(ids.is_list);
        assert_eq!(ids.target, FieldTarget::Scalar(ScalarType::String));
    }

    #[test]
    fn nested_lists_pass_through_as_json() {
        let shape = ShapeDescription::structure(
            [(
                "Matrix",
                ShapeDescription::list(ShapeDescription::list(ShapeDescription::scalar("integer"))),
            )],
            &[],
        );
        let types = extract("Grid", Some(&shape), &ShapeTable::default(), TypeKind::Output).unwrap();
        let matrix = types[0].field("Matrix").unwrap();
        assert!(matrix.is_list);
        assert_eq!(matrix.target, FieldTarget::Scalar(ScalarType::Json));
    }

    #[test]
    fn direct_self_reference_terminates() {
        let shapes: ShapeTable = [(
            "Node",
            ShapeDescription::structure(
                [
                    ("Value", ShapeDescription::scalar("string")),
                    ("Node", ShapeDescription::reference("Node")),
                ],
                &[],
            ),
        )]
        .into_iter()
        .collect();
        let root = ShapeDescription::structure([("Node", ShapeDescription::reference("Node"))], &[]);

        let types = extract("GetTree", Some(&root), &shapes, TypeKind::Output).unwrap();
        assert_eq!(names(&types), vec!["GetTree", "Node"]);
        let node = find(&types, "Node");
        assert_eq!(node.field("Node").unwrap().target, FieldTarget::Type("Node".into()));
    }

    #[test]
    fn cycle_through_intermediate_terminates() {
        let shapes: ShapeTable = [
            (
                "Policy",
                ShapeDescription::structure(
                    [("Statements", ShapeDescription::list(ShapeDescription::reference("Statement")))],
                    &[],
                ),
            ),
            (
                "Statement",
                ShapeDescription::structure(
                    [
                        ("Effect", ShapeDescription::scalar("string")),
                        ("Policy", ShapeDescription::reference("Policy")),
                    ],
                    &[],
                ),
            ),
        ]
        .into_iter()
        .collect();
        let root = ShapeDescription::structure([("Policy", ShapeDescription::reference("Policy"))], &[]);

        for kind in [TypeKind::Input, TypeKind::Output] {
            let types = extract("GetPolicy", Some(&root), &shapes, kind).unwrap();
            assert_eq!(types.len(), 3, "{kind:?}");
            let statement = find(&types, &type_name("Statements", kind));
            assert_eq!(
                statement.field("Policy").unwrap().target,
                FieldTarget::Type(type_name("Policy", kind))
            );
        }
    }

    #[test]
    fn same_member_name_over_different_shape_is_expanded() {
        let shapes: ShapeTable = [
            (
                "Outer",
                ShapeDescription::structure(
                    [
                        ("Name", ShapeDescription::scalar("string")),
                        ("Config", ShapeDescription::reference("Inner")),
                    ],
                    &[],
                ),
            ),
            (
                "Inner",
                ShapeDescription::structure([("Depth", ShapeDescription::scalar("integer"))], &[]),
            ),
        ]
        .into_iter()
        .collect();
        let root = ShapeDescription::structure([("Config", ShapeDescription::reference("Outer"))], &[]);

        let types = extract("Get", Some(&root), &shapes, TypeKind::Output).unwrap();
        assert_eq!(names(&types), vec!["Get", "Config", "Config"]);
        assert!(types[1].field("Name").is_some());
        assert_eq!(
            types[2].fields,
            vec![ExtractedField::new(
                "Depth",
                FieldTarget::Scalar(ScalarType::Int),
                false,
                false
            )]
        );
    }

    #[test]
    fn unknown_reference_aborts() {
        let shape = ShapeDescription::structure([("Missing", ShapeDescription::reference("Nope"))], &[]);
        let err = extract("Broken", Some(&shape), &ShapeTable::default(), TypeKind::Output).unwrap_err();
        assert_eq!(err, ShapeError::UnknownShape("Nope".into()));
    }
}
