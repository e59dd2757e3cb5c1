//! Material registration and ordered material subsets.

use std::fmt;

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::id::MaterialId;

/// Registry of materials, populated once at problem setup.
///
/// Registration is idempotent by name, matching the label registry's
/// contract.
#[derive(Debug, Default)]
pub struct MaterialRegistry {
    names: Vec<String>,
    by_name: IndexMap<String, MaterialId>,
}

impl MaterialRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a material by name, returning its id.
    ///
    /// A repeat call with the same name returns the existing id.
    pub fn register(&mut self, name: &str) -> MaterialId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = MaterialId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Look up a material by name.
    pub fn lookup(&self, name: &str) -> Option<MaterialId> {
        self.by_name.get(name).copied()
    }

    /// The name behind a material id, or `"<unknown>"`.
    pub fn name(&self, id: MaterialId) -> &str {
        self.names
            .get(id.0 as usize)
            .map_or("<unknown>", String::as_str)
    }

    /// Number of registered materials.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no materials are registered.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// A subset covering every registered material.
    pub fn all(&self) -> MaterialSubset {
        MaterialSubset::all(self.names.len() as u32)
    }
}

/// An ordered, duplicate-free set of material indices.
///
/// Tasks declare dependencies against a subset; the scheduler expands
/// graph keys over its members. Stored inline for up to 8 materials
/// (more than any observed multi-material problem uses per task).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaterialSubset {
    indices: SmallVec<[MaterialId; 8]>,
}

impl MaterialSubset {
    /// The subset `{0, 1, ..., n-1}`.
    pub fn all(n: u32) -> Self {
        Self {
            indices: (0..n).map(MaterialId).collect(),
        }
    }

    /// A subset of the given ids, sorted and deduplicated.
    pub fn of(ids: &[MaterialId]) -> Self {
        let mut indices: SmallVec<[MaterialId; 8]> = ids.iter().copied().collect();
        indices.sort_unstable();
        indices.dedup();
        Self { indices }
    }

    /// A single-material subset.
    pub fn one(id: MaterialId) -> Self {
        Self {
            indices: std::iter::once(id).collect(),
        }
    }

    /// Whether the subset contains `id`.
    pub fn contains(&self, id: MaterialId) -> bool {
        self.indices.binary_search(&id).is_ok()
    }

    /// Iterate over member ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = MaterialId> + '_ {
        self.indices.iter().copied()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether the subset is empty.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Whether any member is shared with `other`.
    pub fn intersects(&self, other: &Self) -> bool {
        self.iter().any(|id| other.contains(id))
    }
}

impl fmt::Display for MaterialSubset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, id) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{id}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_is_idempotent() {
        let mut reg = MaterialRegistry::new();
        let a = reg.register("steel");
        let b = reg.register("steel");
        assert_eq!(a, b);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn all_covers_every_material() {
        let mut reg = MaterialRegistry::new();
        reg.register("gas");
        reg.register("solid");
        let subset = reg.all();
        assert_eq!(subset.len(), 2);
        assert!(subset.contains(MaterialId(0)));
        assert!(subset.contains(MaterialId(1)));
        assert!(!subset.contains(MaterialId(2)));
    }

    #[test]
    fn of_sorts_and_dedups() {
        let subset = MaterialSubset::of(&[MaterialId(3), MaterialId(1), MaterialId(3)]);
        let members: Vec<_> = subset.iter().collect();
        assert_eq!(members, vec![MaterialId(1), MaterialId(3)]);
    }

    #[test]
    fn intersects_detects_overlap() {
        let a = MaterialSubset::of(&[MaterialId(0), MaterialId(2)]);
        let b = MaterialSubset::one(MaterialId(2));
        let c = MaterialSubset::one(MaterialId(1));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn display_lists_members() {
        let subset = MaterialSubset::of(&[MaterialId(0), MaterialId(2)]);
        assert_eq!(subset.to_string(), "{0, 2}");
    }
}
