//! Spatial decomposition for the Strata runtime.
//!
//! A [`Level`] splits the simulation domain into rectangular [`Patch`]es
//! with wired neighbor adjacency. Ghost-region resolution maps a
//! patch-plus-ghost-extent to the neighbor sub-boxes whose data a
//! stencil needs.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod ghost;
pub mod level;
pub mod patch;

pub use error::GridError;
pub use ghost::{ghost_regions, GhostRegion};
pub use level::Level;
pub use patch::Patch;
