//! OCAT - Object Classification Annotation Tool
//!
//! Classification engine for segmented 3D images. Every object carries a
//! manual, a filter and a classifier class, packed into one integer flag that
//! is painted over the object's voxels and mirrored in a per-object table.
//! The engine keeps both in step while the user selects and reclassifies
//! objects, filters by attribute range, applies a classifier oracle, samples
//! candidates for review and walks through them one at a time.

pub mod classifier;
pub mod codec;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod filter;
pub mod image;
pub mod manual_log;
pub mod model;
pub mod oracle;
pub mod sampling;
pub mod selection;
pub mod stats;
pub mod store;
pub mod synthetic;
pub mod traversal;

#[cfg(test)]
mod tests;

pub use codec::{ClassificationCodec, Flag};
pub use config::EngineConfig;
pub use engine::{Engine, LoadReport};
pub use error::{EngineError, Result};
pub use manual_log::{ManualClassLog, ManualLog};
pub use model::{Attribute, Axis, ClassTriple, FilterClass, ObjectClass, ObjectNumber, Voxel};
pub use oracle::{CentroidOracle, ClassifierOracle, Prediction};
pub use selection::{ReclassifyOutcome, SelectMode};
pub use traversal::{SharedEngine, TraversalController, TraversalState};
