//! Shape resolution: dereferencing named shapes against a [`ShapeTable`].

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::description::{Member, ScalarTag, ShapeDescription, ShapeTable};
use crate::error::ShapeError;

/// A shape with every reference followed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConcreteShape<'a> {
    Scalar(&'a ScalarTag),
    Structure {
        members: &'a IndexMap<String, Member>,
        required: &'a [String],
    },
    List(&'a Member),
}

/// Look up a named shape. Pure; safe to call repeatedly.
pub fn resolve<'a>(name: &str, shapes: &'a ShapeTable) -> Result<&'a ShapeDescription, ShapeError> {
    shapes
        .get(name)
        .ok_or_else(|| ShapeError::UnknownShape(name.to_string()))
}

/// Follow a chain of references until a scalar, structure, or list is reached.
pub fn resolve_concrete<'a>(
    shape: &'a ShapeDescription,
    shapes: &'a ShapeTable,
) -> Result<ConcreteShape<'a>, ShapeError> {
    let mut current = shape;
    let mut seen: HashSet<&str> = HashSet::new();
    loop {
        match current {
            ShapeDescription::Reference(name) => {
                if !seen.insert(name.as_str()) {
                    return Err(ShapeError::CyclicReference(name.clone()));
                }
                current = resolve(name, shapes)?;
            }
            ShapeDescription::Scalar(tag) => return Ok(ConcreteShape::Scalar(tag)),
            ShapeDescription::Structure { members, required } => {
                return Ok(ConcreteShape::Structure {
                    members,
                    required: required.as_slice(),
                })
            }
            ShapeDescription::List { member } => return Ok(ConcreteShape::List(member)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ShapeTable {
        [
            ("Name", ShapeDescription::scalar("string")),
            ("Alias", ShapeDescription::reference("Name")),
            ("Tag", ShapeDescription::structure([("Key", ShapeDescription::reference("Alias"))], &[])),
            ("Loop", ShapeDescription::reference("LoopBack")),
            ("LoopBack", ShapeDescription::reference("Loop")),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn resolves_named_shape() {
        let shapes = table();
        assert_eq!(
            resolve("Name", &shapes).unwrap(),
            &ShapeDescription::Scalar(ScalarTag::String)
        );
        assert_eq!(resolve("Name", &shapes), resolve("Name", &shapes));
    }

    #[test]
    fn unknown_shape_is_an_error() {
        let shapes = table();
        assert_eq!(
            resolve("Missing", &shapes),
            Err(ShapeError::UnknownShape("Missing".into()))
        );
        let dangling = ShapeDescription::reference("Missing");
        assert!(matches!(
            resolve_concrete(&dangling, &shapes),
            Err(ShapeError::UnknownShape(_))
        ));
    }

    #[test]
    fn follows_reference_chains() {
        let shapes = table();
        let alias = ShapeDescription::reference("Alias");
        assert_eq!(
            resolve_concrete(&alias, &shapes).unwrap(),
            ConcreteShape::Scalar(&ScalarTag::String)
        );
        let tag = ShapeDescription::reference("Tag");
        assert!(matches!(
            resolve_concrete(&tag, &shapes).unwrap(),
            ConcreteShape::Structure { .. }
        ));
    }

    #[test]
    fn reference_loop_is_detected() {
        let shapes = table();
        let start = ShapeDescription::reference("Loop");
        assert!(matches!(
            resolve_concrete(&start, &shapes),
            Err(ShapeError::CyclicReference(_))
        ));
    }
}
