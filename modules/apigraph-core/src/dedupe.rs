//! Collapses repeated type definitions produced across operations and services.

use indexmap::map::Entry;
use indexmap::{IndexMap, IndexSet};

use crate::types::ExtractedType;

/// Two definitions shared a name but differed structurally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateTypeConflict {
    pub name: String,
    pub kept: ExtractedType,
    pub dropped: ExtractedType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupeOutcome {
    /// One entry per name, in first-occurrence order.
    pub types: Vec<ExtractedType>,
    pub conflicts: Vec<DuplicateTypeConflict>,
}

impl DedupeOutcome {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Each conflicting name once, in the order first reported.
    pub fn conflicting_names(&self) -> Vec<String> {
        self.conflicts
            .iter()
            .map(|c| c.name.clone())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Keep exactly one definition per type name.
///
/// Identical repeats collapse silently. Divergent repeats are recorded as
/// conflicts; the definition with more fields is kept (ties keep the earlier
/// one) at the position where the name first appeared.
pub fn dedupe<I>(types: I) -> DedupeOutcome
where
    I: IntoIterator<Item = ExtractedType>,
{
    let mut unique: IndexMap<String, ExtractedType> = IndexMap::new();
    let mut conflicts = Vec::new();

    for ty in types {
        match unique.entry(ty.name.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(ty);
            }
            Entry::Occupied(mut slot) => {
                if slot.get() == &ty {
                    continue;
                }
                let (kept, dropped) = if ty.fields.len() > slot.get().fields.len() {
                    let previous = slot.insert(ty);
                    (slot.get().clone(), previous)
                } else {
                    (slot.get().clone(), ty)
                };
                tracing::warn!(
                    name = %kept.name,
                    kept_fields = kept.fields.len(),
                    dropped_fields = dropped.fields.len(),
                    "Conflicting definitions share a type name"
                );
                conflicts.push(DuplicateTypeConflict {
                    name: kept.name.clone(),
                    kept,
                    dropped,
                });
            }
        }
    }

    DedupeOutcome {
        types: unique.into_values().collect(),
        conflicts,
    }
}
