use glam::Vec3;

use crate::math::BoundingBox;

/// Region providing ambient lighting to the drawables inside it.
#[derive(Debug, Clone)]
pub struct Zone {
    pub bounds: BoundingBox,
    pub ambient: Vec3,
    pub priority: i32,
    pub zone_mask: u32,
}

impl Zone {
    pub fn new(bounds: BoundingBox, ambient: Vec3) -> Self {
        Self {
            bounds,
            ambient,
            priority: 0,
            zone_mask: u32::MAX,
        }
    }
}

/// Result of a zone lookup at a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneLookup {
    pub zone: Option<usize>,
    pub ambient: Vec3,
    /// The lookup stays valid while the point moves less than this.
    pub invalidation_distance: f32,
}

/// Zone lookup cached per drawable, refreshed when the drawable moves too far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachedZone {
    pub zone: Option<usize>,
    pub ambient: Vec3,
    pub cache_position: Vec3,
    pub invalidation_distance_squared: f32,
}

impl Default for CachedZone {
    fn default() -> Self {
        Self {
            zone: None,
            ambient: Vec3::ZERO,
            cache_position: Vec3::splat(f32::INFINITY),
            invalidation_distance_squared: 0.0,
        }
    }
}

impl CachedZone {
    pub fn needs_refresh(&self, position: Vec3) -> bool {
        let distance_squared = self.cache_position.distance_squared(position);
        !distance_squared.is_finite() || distance_squared >= self.invalidation_distance_squared
    }

    pub fn refresh(&mut self, position: Vec3, lookup: ZoneLookup) {
        self.zone = lookup.zone;
        self.ambient = lookup.ambient;
        self.cache_position = position;
        self.invalidation_distance_squared = lookup.invalidation_distance.powi(2);
    }
}
