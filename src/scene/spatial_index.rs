use std::sync::Arc;

use glam::Vec3;

use super::drawable::{Drawable, DrawableFlags};
use super::light::Light;
use super::zone::ZoneLookup;
use crate::math::{BoundingBox, Frustum, Intersection, Sphere};

/// Volume a spatial query tests against.
#[derive(Debug, Clone, Copy)]
pub enum QueryVolume<'a> {
    Frustum(&'a Frustum),
    Sphere(Sphere),
    Box(BoundingBox),
}

impl QueryVolume<'_> {
    pub fn intersects(&self, bounds: &BoundingBox) -> bool {
        match self {
            Self::Frustum(frustum) => frustum.is_inside_fast(bounds) != Intersection::Outside,
            Self::Sphere(sphere) => sphere.is_inside_fast(bounds) != Intersection::Outside,
            Self::Box(volume) => volume.intersects(bounds),
        }
    }
}

/// Objects found by a spatial query, in no particular order.
#[derive(Debug, Default)]
pub struct QueryResult {
    /// Indices into [`SpatialIndex::drawables`].
    pub geometries: Vec<usize>,
    pub lights: Vec<Arc<Light>>,
}

impl QueryResult {
    pub fn clear(&mut self) {
        self.geometries.clear();
        self.lights.clear();
    }
}

/// Read-only scene access used by the pipeline. Shared between workers.
pub trait SpatialIndex: Sync {
    fn drawables(&self) -> &[Drawable];

    /// Appends objects matching `flags` and `view_mask` that intersect the volume.
    fn query(
        &self,
        volume: &QueryVolume<'_>,
        flags: DrawableFlags,
        view_mask: u32,
        result: &mut QueryResult,
    );

    fn query_zone(&self, position: Vec3, zone_mask: u32) -> ZoneLookup;
}

/// Baked lighting sampled for the ambient term of lit objects.
pub trait GlobalIllumination: Sync {
    fn sample_ambient(&self, position: Vec3) -> Vec3;
}
