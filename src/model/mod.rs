//! Data models for the OCAT engine.

mod attribute;
mod class;
mod object;

pub use attribute::Attribute;
pub use class::{Axis, ClassTriple, ClassifierClass, FilterClass, ManualClass, ObjectClass};
pub use object::{BoundingBox3, ObjectNumber, ObjectRecord, Voxel};
