//! The generation-rotated [`DataWarehouse`].
//!
//! Task bodies never pass data to each other directly; everything flows
//! through the warehouse under a single-writer discipline. Each
//! timestep writes into the new generation while reading the previous
//! timestep's state from the old one, and the scheduler rotates the two
//! when the step completes.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod buffer;
pub mod error;
pub mod key;
pub mod view;
pub mod warehouse;

pub use buffer::GridBuffer;
pub use error::WarehouseError;
pub use key::Key;
pub use view::GridView;
pub use warehouse::DataWarehouse;
