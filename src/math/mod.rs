pub mod bounds;
pub mod frustum;
pub mod polyhedron;

pub use bounds::{BoundingBox, FloatRange, Intersection, Sphere, LARGE_EPSILON, LARGE_VALUE};
pub use frustum::{Frustum, Plane};
pub use polyhedron::Polyhedron;

use glam::Vec3;

pub fn safe_normalize(vec: Vec3, fallback: Vec3) -> Vec3 {
    if vec.length_squared() > 1e-6 {
        vec.normalize()
    } else {
        fallback
    }
}

/// Mixes `value` into `seed`, order dependent.
pub fn combine_hash(seed: &mut u32, value: u32) {
    *seed ^= value
        .wrapping_add(0x9e37_79b9)
        .wrapping_add(*seed << 6)
        .wrapping_add(*seed >> 2);
}

pub fn make_hash_f32(value: f32) -> u32 {
    value.to_bits()
}
