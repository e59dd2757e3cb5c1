//! Setup-time registry errors.
//!
//! Registry violations indicate a programming defect in problem setup,
//! never a transient fault; callers propagate them to the driver, which
//! aborts the run.

use std::error::Error;
use std::fmt;

use crate::label::{StorageKind, ValueKind};

/// Errors from the variable-label registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// `get_or_create` was called with kinds that do not match the
    /// existing registration for the same name.
    KindMismatch {
        /// The contested variable name.
        name: String,
        /// Storage kind of the existing registration.
        existing_storage: StorageKind,
        /// Value kind of the existing registration.
        existing_value: ValueKind,
        /// Storage kind of the conflicting request.
        requested_storage: StorageKind,
        /// Value kind of the conflicting request.
        requested_value: ValueKind,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KindMismatch {
                name,
                existing_storage,
                existing_value,
                requested_storage,
                requested_value,
            } => write!(
                f,
                "variable '{name}' already registered as {existing_storage}/{existing_value}, \
                 requested {requested_storage}/{requested_value}"
            ),
        }
    }
}

impl Error for RegistryError {}
