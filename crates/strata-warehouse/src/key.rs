//! The [`Key`] addressing one committed variable instance.

use std::fmt;

use strata_core::{MaterialId, PatchId, VariableLabel};

/// Addresses one variable instance: a label on a patch for a material.
///
/// The unit of the single-writer discipline. Every warehouse map entry,
/// graph producer record, and dependency edge is keyed by this triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Key {
    /// Which variable.
    pub label: VariableLabel,
    /// Which patch.
    pub patch: PatchId,
    /// Which material.
    pub material: MaterialId,
}

impl Key {
    /// Build a key from its parts.
    pub fn new(label: VariableLabel, patch: PatchId, material: MaterialId) -> Self {
        Self {
            label,
            patch,
            material,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "label #{} patch {} material {}",
            self.label, self.patch, self.material
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_all_three_parts() {
        let key = Key::new(VariableLabel(2), PatchId(1), MaterialId(0));
        assert_eq!(key.to_string(), "label #2 patch 1 material 0");
    }
}
