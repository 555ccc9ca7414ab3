use std::sync::Arc;

use glam::Vec3;
use log::debug;

use super::drawable::{Drawable, DrawableFlags};
use super::light::{Light, LightId};
use super::spatial_index::{QueryResult, QueryVolume, SpatialIndex};
use super::zone::{Zone, ZoneLookup};

/// Lookups stay valid at least this far when no zone boundary is closer.
const MAX_ZONE_INVALIDATION_DISTANCE: f32 = 1000.0;

/// Flat scene container with linear-scan queries.
#[derive(Default)]
pub struct Scene {
    drawables: Vec<Drawable>,
    lights: Vec<Arc<Light>>,
    zones: Vec<Zone>,
    default_ambient: Vec3,
    next_light_id: u32,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_drawable(&mut self, drawable: Drawable) -> usize {
        let index = self.drawables.len();
        self.drawables.push(drawable);
        index
    }

    pub fn drawable_mut(&mut self, index: usize) -> Option<&mut Drawable> {
        self.drawables.get_mut(index)
    }

    pub fn add_light(&mut self, mut light: Light) -> LightId {
        let id = LightId(self.next_light_id);
        self.next_light_id += 1;
        light.id = id;
        self.lights.push(Arc::new(light));
        id
    }

    pub fn light(&self, id: LightId) -> Option<&Arc<Light>> {
        self.lights.iter().find(|light| light.id == id)
    }

    pub fn lights(&self) -> &[Arc<Light>] {
        &self.lights
    }

    /// Replaces the light with an edited copy. The id is kept.
    pub fn update_light<F: FnOnce(&mut Light)>(&mut self, id: LightId, f: F) -> bool {
        let Some(slot) = self.lights.iter_mut().find(|light| light.id == id) else {
            return false;
        };
        let mut light = Light::clone(slot);
        f(&mut light);
        light.id = id;
        *slot = Arc::new(light);
        true
    }

    pub fn remove_light(&mut self, id: LightId) -> Option<Arc<Light>> {
        let index = self.lights.iter().position(|light| light.id == id)?;
        debug!("Removing light {:?}", id);
        Some(self.lights.remove(index))
    }

    pub fn add_zone(&mut self, zone: Zone) -> usize {
        let index = self.zones.len();
        self.zones.push(zone);
        index
    }

    pub fn set_default_ambient(&mut self, ambient: Vec3) {
        self.default_ambient = ambient;
    }
}

impl SpatialIndex for Scene {
    fn drawables(&self) -> &[Drawable] {
        &self.drawables
    }

    fn query(
        &self,
        volume: &QueryVolume<'_>,
        flags: DrawableFlags,
        view_mask: u32,
        result: &mut QueryResult,
    ) {
        if flags.contains(DrawableFlags::GEOMETRY) {
            result.geometries.extend(
                self.drawables
                    .iter()
                    .enumerate()
                    .filter(|(_, d)| {
                        d.view_mask & view_mask != 0 && volume.intersects(&d.world_bounds)
                    })
                    .map(|(index, _)| index),
            );
        }

        if flags.contains(DrawableFlags::LIGHT) {
            result.lights.extend(
                self.lights
                    .iter()
                    .filter(|l| {
                        l.view_mask & view_mask != 0 && volume.intersects(&l.world_bounds())
                    })
                    .cloned(),
            );
        }
    }

    fn query_zone(&self, position: Vec3, zone_mask: u32) -> ZoneLookup {
        let mut best: Option<usize> = None;
        let mut invalidation_distance = MAX_ZONE_INVALIDATION_DISTANCE;

        for (index, zone) in self.zones.iter().enumerate() {
            if zone.zone_mask & zone_mask == 0 {
                continue;
            }

            let inside = zone.bounds.contains_point(position);
            let border_distance = if inside {
                let to_min = position - zone.bounds.min;
                let to_max = zone.bounds.max - position;
                to_min.min(to_max).min_element()
            } else {
                zone.bounds.distance_to_point(position)
            };
            invalidation_distance = invalidation_distance.min(border_distance);

            if inside && best.map_or(true, |b| zone.priority > self.zones[b].priority) {
                best = Some(index);
            }
        }

        ZoneLookup {
            zone: best,
            ambient: best.map_or(self.default_ambient, |b| self.zones[b].ambient),
            invalidation_distance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{BoundingBox, Frustum, Sphere};
    use glam::Mat4;

    fn cube(center: Vec3) -> Drawable {
        Drawable::new(BoundingBox::from_center_half_size(center, Vec3::splat(0.5)))
    }

    #[test]
    fn query_filters_by_volume_and_mask() {
        let mut scene = Scene::new();
        scene.add_drawable(cube(Vec3::new(0.0, 0.0, -5.0)));
        scene.add_drawable(cube(Vec3::new(0.0, 0.0, 5.0)));
        let mut hidden = cube(Vec3::new(0.0, 0.0, -6.0));
        hidden.view_mask = 0b10;
        scene.add_drawable(hidden);

        let frustum = Frustum::perspective(1.0, 1.0, 1.0, 0.1, 100.0, &Mat4::IDENTITY);
        let mut result = QueryResult::default();
        scene.query(&QueryVolume::Frustum(&frustum), DrawableFlags::GEOMETRY, 0b01, &mut result);

        assert_eq!(result.geometries, vec![0]);
        assert!(result.lights.is_empty());
    }

    #[test]
    fn lights_are_found_by_their_bounds() {
        let mut scene = Scene::new();
        scene.add_light(Light::point(Vec3::new(20.0, 0.0, 0.0), 5.0));
        let near = scene.add_light(Light::point(Vec3::new(2.0, 0.0, 0.0), 5.0));

        let mut result = QueryResult::default();
        let volume = QueryVolume::Sphere(Sphere::new(Vec3::ZERO, 1.0));
        scene.query(&volume, DrawableFlags::LIGHT, u32::MAX, &mut result);

        assert_eq!(result.lights.len(), 1);
        assert_eq!(result.lights[0].id, near);
    }

    #[test]
    fn updating_light_keeps_id() {
        let mut scene = Scene::new();
        let id = scene.add_light(Light::point(Vec3::ZERO, 5.0));
        assert!(scene.update_light(id, |light| light.range = 8.0));
        assert_eq!(scene.light(id).map(|l| l.range), Some(8.0));
        assert!(scene.remove_light(id).is_some());
        assert!(scene.light(id).is_none());
    }

    #[test]
    fn zone_lookup_prefers_priority_and_reports_border_distance() {
        let mut scene = Scene::new();
        scene.set_default_ambient(Vec3::splat(0.05));
        let outer_bounds = BoundingBox::new(Vec3::splat(-10.0), Vec3::splat(10.0));
        scene.add_zone(Zone::new(outer_bounds, Vec3::splat(0.2)));
        let inner_bounds = BoundingBox::new(Vec3::splat(-2.0), Vec3::splat(2.0));
        let mut inner = Zone::new(inner_bounds, Vec3::splat(0.5));

        inner.priority = 1;
        let inner_index = scene.add_zone(inner);

        let lookup = scene.query_zone(Vec3::new(1.0, 0.0, 0.0), u32::MAX);
        assert_eq!(lookup.zone, Some(inner_index));
        assert_eq!(lookup.ambient, Vec3::splat(0.5));
        assert!((lookup.invalidation_distance - 1.0).abs() < 1e-5);

        let outside = scene.query_zone(Vec3::splat(50.0), u32::MAX);
        assert_eq!(outside.zone, None);
        assert_eq!(outside.ambient, Vec3::splat(0.05));
    }
}
