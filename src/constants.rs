//! Global constants for the OCAT engine

/// Flag value reserved for background voxels (no object).
pub const BACKGROUND_FLAG: u32 = 0;

/// Default offset added to every encoded classification flag.
pub const DEFAULT_FLAG_BASE: u32 = 1;

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Default seed for randomized candidate sampling.
pub const DEFAULT_SAMPLING_SEED: u64 = 42;

/// Default number of sub-intervals for stratified sampling.
pub const DEFAULT_SAMPLING_DIVISIONS: usize = 10;

/// Default edge length of a synthetic test volume (voxels).
pub const DEFAULT_SYNTHETIC_EXTENT: usize = 64;

/// Default number of objects in a synthetic test volume.
pub const DEFAULT_SYNTHETIC_OBJECTS: usize = 40;
