//! Synthetic segmented volumes for demos and tests.
//!
//! Objects are axis-aligned boxes with a per-object base intensity. The
//! generator places one box per grid cell and keeps the last voxel layer of
//! each cell empty, so objects never touch.

use ndarray::Array3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::classifier::BASELINE_CLASS;
use crate::constants::{DEFAULT_SYNTHETIC_EXTENT, DEFAULT_SYNTHETIC_OBJECTS};
use crate::model::{Attribute, ClassTriple, FilterClass, ManualClass, ObjectRecord, Voxel};
use crate::store::{ObjectTable, VoxelVolume};

/// One box object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxObject {
    /// Lowest corner, which is also the object's first voxel
    pub origin: Voxel,
    /// Size along x, y and z
    pub size: (usize, usize, usize),
    /// Base voxel intensity
    pub intensity: f64,
}

impl BoxObject {
    pub fn new(origin: Voxel, size: (usize, usize, usize), intensity: f64) -> Self {
        Self {
            origin,
            size,
            intensity,
        }
    }

    /// A run of `length` voxels along x.
    pub fn line(origin: Voxel, length: usize, intensity: f64) -> Self {
        Self::new(origin, (length, 1, 1), intensity)
    }
}

/// Generated volume with its object table.
#[derive(Debug, Clone)]
pub struct SyntheticVolume {
    pub voxels: VoxelVolume,
    pub table: ObjectTable,
}

/// Intensity of one voxel: the object's base plus a small ripple.
fn voxel_intensity(base: f64, voxel: Voxel) -> f64 {
    base + ((voxel.x + voxel.y + voxel.z) % 5) as f64
}

impl SyntheticVolume {
    /// Generate `objects` random boxes in a cube of `extent` voxels.
    pub fn generate(extent: usize, objects: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        let mut per_axis = 1;
        while per_axis * per_axis * per_axis < objects {
            per_axis += 1;
        }
        let cell = extent / per_axis;
        if cell < 2 {
            log::warn!(
                "Synthetic extent {} too small for {} objects, generating none",
                extent,
                objects
            );
            return Self::from_boxes((extent, extent, extent), &[]);
        }

        let mut boxes = Vec::with_capacity(objects);
        'cells: for cz in 0..per_axis {
            for cy in 0..per_axis {
                for cx in 0..per_axis {
                    if boxes.len() == objects {
                        break 'cells;
                    }
                    // Leave the cell's last layer empty on every axis.
                    let mut span = |c: usize| {
                        let size = rng.gen_range(1..cell);
                        let offset = rng.gen_range(0..cell - size);
                        (c * cell + offset, size)
                    };
                    let (x, sx) = span(cx);
                    let (y, sy) = span(cy);
                    let (z, sz) = span(cz);
                    let intensity = rng.gen_range(10.0..250.0);
                    boxes.push(BoxObject::new(Voxel::new(x, y, z), (sx, sy, sz), intensity));
                }
            }
        }

        log::debug!(
            "Generated {} synthetic objects in a {}^3 volume (seed {})",
            boxes.len(),
            extent,
            seed
        );
        Self::from_boxes((extent, extent, extent), &boxes)
    }

    /// Generate with the default extent and object count.
    pub fn with_defaults(seed: u64) -> Self {
        Self::generate(DEFAULT_SYNTHETIC_EXTENT, DEFAULT_SYNTHETIC_OBJECTS, seed)
    }

    /// Build a volume of `(x, y, z)` dimensions from explicit boxes.
    ///
    /// Object `i + 1` is `boxes[i]`. Voxels outside the volume are clipped and
    /// boxes must not overlap. Every object starts unclassified, passing the
    /// filter, with the baseline classifier class.
    pub fn from_boxes(dimensions: (usize, usize, usize), boxes: &[BoxObject]) -> Self {
        let (dx, dy, dz) = dimensions;
        let mut labels = Array3::<u32>::zeros((dz, dy, dx));
        let mut members: Vec<Vec<Voxel>> = Vec::with_capacity(boxes.len());

        for (i, object) in boxes.iter().enumerate() {
            let label = i as u32 + 1;
            let (sx, sy, sz) = object.size;
            let mut voxels = Vec::new();
            for z in object.origin.z..(object.origin.z + sz).min(dz) {
                for y in object.origin.y..(object.origin.y + sy).min(dy) {
                    for x in object.origin.x..(object.origin.x + sx).min(dx) {
                        labels[[z, y, x]] = label;
                        voxels.push(Voxel::new(x, y, z));
                    }
                }
            }
            members.push(voxels);
        }

        let records = boxes
            .iter()
            .zip(&members)
            .enumerate()
            .filter(|(_, (_, voxels))| !voxels.is_empty())
            .map(|(i, (object, voxels))| {
                Self::measure(&labels, i as u32 + 1, object, voxels)
            })
            .collect();

        Self {
            voxels: VoxelVolume::from_labels(labels),
            table: ObjectTable::new(records),
        }
    }

    fn measure(labels: &Array3<u32>, label: u32, object: &BoxObject, voxels: &[Voxel]) -> ObjectRecord {
        let (dz, dy, dx) = labels.dim();
        let same = |x: Option<usize>, y: Option<usize>, z: Option<usize>| match (x, y, z) {
            (Some(x), Some(y), Some(z)) if x < dx && y < dy && z < dz => labels[[z, y, x]] == label,
            _ => false,
        };

        let mut surface = 0usize;
        let mut sum = 0.0;
        let mut max = f64::MIN;
        let (mut lo, mut hi) = ([usize::MAX; 3], [0usize; 3]);
        for v in voxels {
            let neighbours = [
                (v.x.checked_sub(1), Some(v.y), Some(v.z)),
                (Some(v.x + 1), Some(v.y), Some(v.z)),
                (Some(v.x), v.y.checked_sub(1), Some(v.z)),
                (Some(v.x), Some(v.y + 1), Some(v.z)),
                (Some(v.x), Some(v.y), v.z.checked_sub(1)),
                (Some(v.x), Some(v.y), Some(v.z + 1)),
            ];
            surface += neighbours.iter().filter(|(x, y, z)| !same(*x, *y, *z)).count();

            let value = voxel_intensity(object.intensity, *v);
            sum += value;
            max = max.max(value);
            for (axis, c) in [v.x, v.y, v.z].into_iter().enumerate() {
                lo[axis] = lo[axis].min(c);
                hi[axis] = hi[axis].max(c);
            }
        }

        let volume = voxels.len() as f64;
        let surface = surface as f64;
        let spans: Vec<f64> = (0..3).map(|a| (hi[a] - lo[a] + 1) as f64).collect();
        let longest = spans.iter().copied().fold(f64::MIN, f64::max);
        let shortest = spans.iter().copied().fold(f64::MAX, f64::min);

        ObjectRecord::new(0, voxels[0])
            .with_attribute(Attribute::Volume, volume)
            .with_attribute(Attribute::SurfaceArea, surface)
            .with_attribute(
                Attribute::Compactness,
                36.0 * std::f64::consts::PI * volume * volume / surface.powi(3),
            )
            .with_attribute(Attribute::Elongation, longest / shortest)
            .with_attribute(Attribute::MeanIntensity, sum / volume)
            .with_attribute(Attribute::MaxIntensity, max)
            .with_attribute(Attribute::IntegratedDensity, sum)
            .with_classes(ClassTriple::new(
                ManualClass::Unclassified,
                FilterClass::Passed,
                BASELINE_CLASS,
            ))
    }
}
