//! Variable labels and the [`LabelRegistry`].
//!
//! A [`VariableLabel`] is a cheap `Copy` id naming a simulation field
//! ("mass", "velocity", ...). Labels are created once at problem setup
//! through [`LabelRegistry::get_or_create`] and are immutable for the
//! rest of the run.

use std::fmt;

use indexmap::IndexMap;

use crate::error::RegistryError;

/// Where a variable's values live on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// One value per cell center.
    Cell,
    /// One value per cell corner node.
    Node,
    /// One value per x-face.
    FaceX,
    /// One value per y-face.
    FaceY,
    /// One value per z-face.
    FaceZ,
    /// Values attached to particles rather than grid positions.
    Particle,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cell => write!(f, "cell"),
            Self::Node => write!(f, "node"),
            Self::FaceX => write!(f, "face-x"),
            Self::FaceY => write!(f, "face-y"),
            Self::FaceZ => write!(f, "face-z"),
            Self::Particle => write!(f, "particle"),
        }
    }
}

/// Value-type tag for a variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// A single double-precision value per grid position.
    Double,
    /// A single integer value per grid position (stored as f64).
    Int,
    /// A fixed-size vector of doubles per grid position.
    Vector {
        /// Number of components (e.g. 3 for velocity).
        dims: u32,
    },
}

impl ValueKind {
    /// Number of f64 storage slots this value kind requires per position.
    pub fn components(&self) -> u32 {
        match self {
            Self::Double | Self::Int => 1,
            Self::Vector { dims } => *dims,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Double => write!(f, "double"),
            Self::Int => write!(f, "int"),
            Self::Vector { dims } => write!(f, "vector[{dims}]"),
        }
    }
}

/// Identifies a registered variable.
///
/// `VariableLabel(n)` is the n-th label registered in the
/// [`LabelRegistry`]. Compare and hash by value; resolve the name and
/// kinds through the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableLabel(pub u32);

impl fmt::Display for VariableLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Definition of a registered variable: name plus storage and value kinds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelDef {
    /// Human-readable name, unique within the registry.
    pub name: String,
    /// Grid position the values attach to.
    pub storage: StorageKind,
    /// Value-type tag; determines per-position component count.
    pub value: ValueKind,
}

/// Registry of variable labels, populated once at problem setup.
///
/// Lookups by name are idempotent: a repeat `get_or_create` with matching
/// kinds returns the same label; a mismatched kind is a setup-time error
/// (a programming defect, not a transient fault).
#[derive(Debug, Default)]
pub struct LabelRegistry {
    defs: Vec<LabelDef>,
    by_name: IndexMap<String, VariableLabel>,
}

impl LabelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the label for `name`, creating it on first use.
    ///
    /// A repeat call with the same storage and value kinds returns the
    /// existing label. A repeat call with different kinds returns
    /// [`RegistryError::KindMismatch`].
    pub fn get_or_create(
        &mut self,
        name: &str,
        storage: StorageKind,
        value: ValueKind,
    ) -> Result<VariableLabel, RegistryError> {
        if let Some(&label) = self.by_name.get(name) {
            let existing = &self.defs[label.0 as usize];
            if existing.storage != storage || existing.value != value {
                return Err(RegistryError::KindMismatch {
                    name: name.to_string(),
                    existing_storage: existing.storage,
                    existing_value: existing.value,
                    requested_storage: storage,
                    requested_value: value,
                });
            }
            return Ok(label);
        }

        let label = VariableLabel(self.defs.len() as u32);
        self.defs.push(LabelDef {
            name: name.to_string(),
            storage,
            value,
        });
        self.by_name.insert(name.to_string(), label);
        Ok(label)
    }

    /// Look up an existing label by name.
    pub fn lookup(&self, name: &str) -> Option<VariableLabel> {
        self.by_name.get(name).copied()
    }

    /// The definition behind a label, or `None` for a foreign label.
    pub fn def(&self, label: VariableLabel) -> Option<&LabelDef> {
        self.defs.get(label.0 as usize)
    }

    /// The name behind a label, or `"<unknown>"` for a foreign label.
    ///
    /// Intended for diagnostics; prefer [`LabelRegistry::def`] in logic.
    pub fn name(&self, label: VariableLabel) -> &str {
        self.def(label).map_or("<unknown>", |d| d.name.as_str())
    }

    /// Number of registered labels.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Whether no labels are registered.
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Iterate over `(label, def)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (VariableLabel, &LabelDef)> {
        self.defs
            .iter()
            .enumerate()
            .map(|(i, d)| (VariableLabel(i as u32), d))
    }
}
