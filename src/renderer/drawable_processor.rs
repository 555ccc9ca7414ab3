use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use glam::Vec3;
use log::{error, trace};
use rayon::prelude::*;

use super::batch::GeometryBatch;
use super::frame::{FrameInfo, GeometryRenderFlags};
use super::internal::WorkerBuffers;
use super::light_accumulator::{light_penalty, LightAccumulator, LightAccumulatorContext};
use super::light_processor::{LightProcessor, LightProcessorCallback, LightUpdateContext};
use super::light_processor_cache::LightProcessorCache;
use super::scene_pass::ScenePass;
use crate::error::PipelineError;
use crate::math::{combine_hash, BoundingBox, FloatRange, Intersection, LARGE_EPSILON, LARGE_VALUE};
use crate::scene::{
    CachedZone, Camera, Drawable, GlobalIlluminationType, Light, LightType, QueryResult, ZoneLookup,
};
use crate::settings::{
    DrawableProcessorSettings, LightCacheSettings, MaterialQuality, ShadowSettings,
};

/// View-space depth range of a bounding box, `None` for unbounded boxes.
pub fn geometry_z_range(camera: &Camera, bounds: &BoundingBox) -> Option<FloatRange> {
    if !bounds.is_defined() || bounds.size().max_element() >= LARGE_VALUE {
        return None;
    }
    let view = camera.view();
    let center = camera.view_depth(bounds.center());
    let edge = view.row(2).truncate().abs().dot(bounds.half_size());
    let range = FloatRange::new(center - edge, center + edge);
    (range.first.is_finite() && range.second.is_finite()).then_some(range)
}

/// Pipeline hash of a drawable inside its current zone.
fn zoned_drawable_hash(drawable: &Drawable, zone: Option<usize>) -> u32 {
    let mut hash = drawable.pipeline_state_hash;
    combine_hash(&mut hash, zone.map_or(0, |zone| zone as u32 + 1));
    hash
}

/// Per-frame classification of drawables, indexed like the scene's drawables.
///
/// Shared read-only with light processors while they run on workers. The
/// update flags are the only state written concurrently.
#[derive(Debug, Default)]
pub struct GeometryStates {
    flags: Vec<GeometryRenderFlags>,
    z_ranges: Vec<FloatRange>,
    distances: Vec<f32>,
    updated: Vec<AtomicBool>,
    scene_z_range: FloatRange,
    visible_geometries: Vec<usize>,
}

/// Inputs of [`GeometryStates::preprocess_shadow_casters`] for one split.
#[derive(Debug, Clone, Copy)]
pub struct ShadowCasterQuery<'a> {
    pub camera: &'a Camera,
    pub drawables: &'a [Drawable],
    pub split_z_range: FloatRange,
    pub light_type: LightType,
    pub shadow_camera: &'a Camera,
}

impl GeometryStates {
    fn reset(&mut self, num_drawables: usize) {
        self.flags.clear();
        self.flags.resize(num_drawables, GeometryRenderFlags::empty());
        self.z_ranges.clear();
        self.z_ranges.resize(num_drawables, FloatRange::EMPTY);
        self.distances.clear();
        self.distances.resize(num_drawables, 0.0);
        self.updated.resize_with(num_drawables, AtomicBool::default);
        for updated in &mut self.updated {
            *updated.get_mut() = false;
        }
        self.scene_z_range = FloatRange::EMPTY;
        self.visible_geometries.clear();
    }

    pub fn flags(&self, index: usize) -> GeometryRenderFlags {
        self.flags.get(index).copied().unwrap_or_default()
    }

    /// `(LARGE_VALUE, LARGE_VALUE)` for unbounded drawables.
    pub fn z_range(&self, index: usize) -> FloatRange {
        self.z_ranges.get(index).copied().unwrap_or(FloatRange::EMPTY)
    }

    /// Camera distance of visible drawables and processed shadow casters.
    pub fn distance(&self, index: usize) -> f32 {
        self.distances.get(index).copied().unwrap_or(0.0)
    }

    /// Union of all finite drawable depth ranges.
    pub fn scene_z_range(&self) -> FloatRange {
        self.scene_z_range
    }

    /// Visible drawables in ascending index order.
    pub fn visible_geometries(&self) -> &[usize] {
        &self.visible_geometries
    }

    /// Claims the drawable for this frame. Only the first caller wins.
    pub(crate) fn try_claim(&self, index: usize) -> bool {
        self.updated
            .get(index)
            .is_some_and(|updated| !updated.swap(true, Ordering::Relaxed))
    }

    /// Keeps candidates whose shadow can fall into the visible part of the
    /// split. Casters no other stage processed yet are reported in `claimed`.
    pub(crate) fn preprocess_shadow_casters(
        &self,
        query: &ShadowCasterQuery<'_>,
        candidates: &[usize],
        casters: &mut Vec<usize>,
        claimed: &mut Vec<usize>,
    ) {
        let split_z = if query.light_type == LightType::Directional {
            self.scene_z_range & query.split_z_range
        } else {
            self.scene_z_range
        };
        if !split_z.is_valid() {
            return;
        }

        let shadow_view = query.shadow_camera.view();
        let light_view_frustum = query
            .camera
            .split_frustum(split_z.first, split_z.second)
            .transformed(&shadow_view);
        if light_view_frustum.is_degenerate() {
            trace!("Skipping shadow casters of a degenerate split frustum");
            return;
        }
        let light_view_frustum_box = light_view_frustum.bounding_box();
        let shadow_frustum = query.shadow_camera.frustum();
        let orthographic = query.shadow_camera.is_orthographic();
        let extrusion_distance = query.shadow_camera.far;

        for &index in candidates {
            let Some(drawable) = query.drawables.get(index) else {
                continue;
            };
            if query.light_type == LightType::Point
                && shadow_frustum.is_inside_fast(&drawable.world_bounds) == Intersection::Outside
            {
                continue;
            }

            let visible = self.flags(index).contains(GeometryRenderFlags::VISIBLE) || {
                let mut light_view_box = drawable.world_bounds.transformed(&shadow_view);
                extrude_light_view_box(
                    &mut light_view_box,
                    orthographic,
                    extrusion_distance,
                    &light_view_frustum_box,
                );
                light_view_frustum.is_inside_fast(&light_view_box) != Intersection::Outside
            };
            if !visible {
                continue;
            }

            casters.push(index);
            if self.try_claim(index) {
                claimed.push(index);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn mark_visible_for_tests(
        &mut self,
        index: &dyn crate::scene::SpatialIndex,
        camera: &Camera,
    ) {
        let drawables = index.drawables();
        self.reset(drawables.len());
        for (i, drawable) in drawables.iter().enumerate() {
            self.try_claim(i);
            self.flags[i] = GeometryRenderFlags::VISIBLE | GeometryRenderFlags::LIT;
            self.distances[i] = camera.distance(drawable.world_bounds.center());
            match geometry_z_range(camera, &drawable.world_bounds) {
                Some(range) => {
                    self.z_ranges[i] = range;
                    self.scene_z_range |= range;
                }
                None => self.z_ranges[i] = FloatRange::new(LARGE_VALUE, LARGE_VALUE),
            }
            self.visible_geometries.push(i);
        }
    }
}

/// Shadows fall away from the light, so a caster box is stretched along the
/// shadow camera's view direction before testing it against the frustum.
fn extrude_light_view_box(
    light_view_box: &mut BoundingBox,
    orthographic: bool,
    extrusion_distance: f32,
    frustum_box: &BoundingBox,
) {
    if orthographic {
        light_view_box.min.z = light_view_box.min.z.min(frustum_box.min.z);
        return;
    }

    let center = light_view_box.center();
    let original_distance = center
        .length()
        .clamp(LARGE_EPSILON, extrusion_distance.max(LARGE_EPSILON));
    let size_factor = extrusion_distance / original_distance;
    let new_center = crate::math::safe_normalize(center, Vec3::NEG_Z) * extrusion_distance;
    let new_half_size = light_view_box.size() * size_factor * 0.5;
    light_view_box.merge(&BoundingBox::new(new_center - new_half_size, new_center + new_half_size));
}

/// Result of processing one visible drawable on a worker.
#[derive(Debug)]
struct VisibleGeometry {
    index: usize,
    center: Vec3,
    distance: f32,
    z_range: Option<FloatRange>,
    flags: GeometryRenderFlags,
    zone: Option<ZoneLookup>,
    gi_ambient: Vec3,
    /// Raw batches per scene pass.
    batches: Vec<Vec<GeometryBatch>>,
}

/// Visibility and lighting of drawables for one camera.
///
/// Owns the per-drawable frame state, the visible light list and the light
/// processors. Stages run in order: visible drawables, lights, forward
/// lighting, then queued shadow casters.
#[derive(Debug)]
pub struct DrawableProcessor {
    settings: DrawableProcessorSettings,
    frame_number: u64,
    geometry: GeometryStates,
    lighting: Vec<LightAccumulator>,
    zones: Vec<CachedZone>,
    drawable_hashes: Vec<u32>,
    visible_lights: Vec<Arc<Light>>,
    light_slots: Vec<usize>,
    light_processors: LightProcessorCache,
    queued_updates: Vec<usize>,
    visible_buffers: WorkerBuffers<VisibleGeometry>,
}

impl DrawableProcessor {
    pub fn new(settings: &DrawableProcessorSettings, cache_settings: &LightCacheSettings) -> Self {
        Self {
            settings: settings.clone(),
            frame_number: 0,
            geometry: GeometryStates::default(),
            lighting: Vec::new(),
            zones: Vec::new(),
            drawable_hashes: Vec::new(),
            visible_lights: Vec::new(),
            light_slots: Vec::new(),
            light_processors: LightProcessorCache::new(cache_settings),
            queued_updates: Vec::new(),
            visible_buffers: WorkerBuffers::default(),
        }
    }

    pub fn settings(&self) -> &DrawableProcessorSettings {
        &self.settings
    }

    pub fn material_quality(&self) -> MaterialQuality {
        self.settings.material_quality
    }

    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    pub fn geometry(&self) -> &GeometryStates {
        &self.geometry
    }

    pub fn flags(&self, index: usize) -> GeometryRenderFlags {
        self.geometry.flags(index)
    }

    pub fn lighting(&self, index: usize) -> Option<&LightAccumulator> {
        self.lighting.get(index)
    }

    /// Drawable pipeline hash combined with its zone.
    pub fn drawable_hash(&self, index: usize) -> u32 {
        self.drawable_hashes.get(index).copied().unwrap_or(0)
    }

    pub fn cached_zone(&self, index: usize) -> Option<&CachedZone> {
        self.zones.get(index)
    }

    /// Visible lights sorted by id. Light indices refer to this list.
    pub fn visible_lights(&self) -> &[Arc<Light>] {
        &self.visible_lights
    }

    pub fn light_processor(&self, light_index: usize) -> Option<&LightProcessor> {
        self.light_slots
            .get(light_index)
            .and_then(|&slot| self.light_processors.get(slot))
    }

    /// This frame's processors in light index order.
    pub fn light_processors(&self) -> impl Iterator<Item = &LightProcessor> + '_ {
        self.light_slots
            .iter()
            .filter_map(|&slot| self.light_processors.get(slot))
    }

    pub fn light_processor_cache(&self) -> &LightProcessorCache {
        &self.light_processors
    }

    /// Drawables claimed as shadow casters outside the visible set.
    pub fn queued_updates(&self) -> &[usize] {
        &self.queued_updates
    }

    /// Classifies visible drawables, hands their batches to `passes` and
    /// collects visible lights.
    pub fn process_visible_drawables(
        &mut self,
        frame: &FrameInfo<'_>,
        visible: &QueryResult,
        passes: &mut [ScenePass],
    ) {
        let drawables = frame.index.drawables();
        let num_drawables = drawables.len();

        self.frame_number = frame.frame_number;
        self.geometry.reset(num_drawables);
        self.lighting.resize_with(num_drawables, LightAccumulator::default);
        self.zones.resize(num_drawables, CachedZone::default());
        self.drawable_hashes.resize(num_drawables, 0);
        self.queued_updates.clear();

        let mut geometries: Vec<usize> = visible
            .geometries
            .iter()
            .copied()
            .filter(|&index| index < num_drawables)
            .collect();
        geometries.sort_unstable();
        geometries.dedup();

        self.visible_buffers.reset(frame.num_workers);
        {
            let geometry = &self.geometry;
            let zones = &self.zones;
            let quality = self.settings.material_quality;
            let passes: &[ScenePass] = passes;
            self.visible_buffers.for_each_chunk(&geometries, |&index, out| {
                let item = process_visible_geometry(frame, geometry, zones, quality, passes, index);
                out.extend(item);
            });
        }

        for item in self.visible_buffers.drain() {
            let index = item.index;
            self.geometry.flags[index] = item.flags;
            self.geometry.distances[index] = item.distance;
            self.geometry.z_ranges[index] = match item.z_range {
                Some(range) => {
                    self.geometry.scene_z_range |= range;
                    range
                }
                None => FloatRange::new(LARGE_VALUE, LARGE_VALUE),
            };
            self.geometry.visible_geometries.push(index);

            if let Some(lookup) = item.zone {
                self.zones[index].refresh(item.center, lookup);
            }
            self.drawable_hashes[index] =
                zoned_drawable_hash(&drawables[index], self.zones[index].zone);

            let lighting = &mut self.lighting[index];
            lighting.reset_lights();
            lighting.ambient = if item.flags.contains(GeometryRenderFlags::LIT) {
                item.gi_ambient + self.zones[index].ambient
            } else {
                Vec3::ZERO
            };

            for (pass, batches) in passes.iter_mut().zip(item.batches) {
                for batch in batches {
                    pass.push_geometry_batch(batch);
                }
            }
        }

        self.process_visible_lights(visible);
    }

    fn process_visible_lights(&mut self, visible: &QueryResult) {
        self.light_processors.evict_unused(self.frame_number);

        self.visible_lights.clear();
        self.visible_lights.extend(
            visible
                .lights
                .iter()
                .filter(|light| light.effective_color() != Vec3::ZERO && light.light_mask != 0)
                .cloned(),
        );
        self.visible_lights.sort_by_key(|light| light.id);
        self.visible_lights.dedup_by_key(|light| light.id);

        let frame_number = self.frame_number;
        let cache = &mut self.light_processors;
        self.light_slots.clear();
        self.light_slots.extend(
            self.visible_lights
                .iter()
                .map(|light| cache.get_or_create(light, frame_number)),
        );
        trace!(
            "Frame {}: {} visible geometries, {} visible lights",
            frame_number,
            self.geometry.visible_geometries.len(),
            self.visible_lights.len()
        );
    }

    /// Runs the three light processor phases for every visible light and
    /// queues newly found shadow casters.
    pub fn process_lights(
        &mut self,
        frame: &FrameInfo<'_>,
        callback: &mut dyn LightProcessorCallback,
        shadows: &ShadowSettings,
    ) {
        for (light_index, &slot) in self.light_slots.iter().enumerate() {
            if let Some(processor) = self.light_processors.get_mut(slot) {
                processor.begin_update(&self.visible_lights[light_index], light_index, &*callback);
            }
        }

        {
            let ctx = LightUpdateContext {
                frame: *frame,
                geometry: &self.geometry,
                shadows,
            };
            let lights = &self.visible_lights;
            self.light_processors
                .par_slots_mut(&self.light_slots)
                .for_each(|(light_index, processor)| {
                    if let Some(light) = lights.get(light_index) {
                        processor.update(light, &ctx);
                    }
                });
        }

        self.queued_updates.clear();
        for &slot in &self.light_slots {
            if let Some(processor) = self.light_processors.get(slot) {
                self.queued_updates.extend_from_slice(processor.claimed_drawables());
            }
        }
        self.queued_updates.sort_unstable();
        self.queued_updates.dedup();

        let mut order: Vec<usize> = (0..self.light_slots.len()).collect();
        let shadow_map_length = |light_index: usize| {
            self.light_processor(light_index)
                .map_or(0.0, |processor| processor.shadow_map_size().as_vec2().length())
        };
        order.sort_by(|&a, &b| {
            shadow_map_length(b)
                .total_cmp(&shadow_map_length(a))
                .then(self.visible_lights[a].id.cmp(&self.visible_lights[b].id))
        });

        for light_index in order {
            let slot = self.light_slots[light_index];
            if let Some(processor) = self.light_processors.get_mut(slot) {
                let light = &self.visible_lights[light_index];
                processor.end_update(light, frame.camera, callback, shadows);
            }
        }
    }

    /// Accumulates one light into the forward lit drawables it touches.
    pub fn process_forward_lighting(
        &mut self,
        frame: &FrameInfo<'_>,
        light_index: usize,
        lit_geometries: &[usize],
    ) {
        let Some(light) = self.visible_lights.get(light_index) else {
            let err = PipelineError::InvalidLightIndex {
                index: light_index,
                count: self.visible_lights.len(),
            };
            error!("Cannot process forward lighting: {}", err);
            return;
        };
        accumulate_light(
            frame,
            &self.geometry,
            &mut self.lighting,
            &self.settings,
            light,
            light_index,
            lit_geometries,
        );
    }

    /// [`DrawableProcessor::process_forward_lighting`] for every light with
    /// forward lit geometry, in light index order.
    pub fn process_forward_lighting_for_all_lights(&mut self, frame: &FrameInfo<'_>) {
        for (light_index, &slot) in self.light_slots.iter().enumerate() {
            let Some(processor) = self.light_processors.get(slot) else {
                continue;
            };
            if !processor.has_forward_lit_geometries() {
                continue;
            }
            accumulate_light(
                frame,
                &self.geometry,
                &mut self.lighting,
                &self.settings,
                &self.visible_lights[light_index],
                light_index,
                processor.lit_geometries(),
            );
        }
    }

    /// Refreshes zones and distances of queued shadow casters.
    pub fn process_shadow_casters(&mut self, frame: &FrameInfo<'_>) {
        let drawables = frame.index.drawables();
        let camera = frame.camera;
        let zones = &self.zones;

        let updates: Vec<(usize, Vec3, f32, Option<ZoneLookup>)> = self
            .queued_updates
            .par_iter()
            .filter_map(|&index| {
                let drawable = drawables.get(index)?;
                let center = drawable.world_bounds.center();
                let lookup = zones[index]
                    .needs_refresh(center)
                    .then(|| frame.index.query_zone(center, drawable.zone_mask));
                Some((index, center, camera.distance(center), lookup))
            })
            .collect();

        for (index, center, distance, lookup) in updates {
            self.geometry.distances[index] = distance;
            if let Some(lookup) = lookup {
                self.zones[index].refresh(center, lookup);
            }
            self.drawable_hashes[index] =
                zoned_drawable_hash(&drawables[index], self.zones[index].zone);
        }
    }
}

fn process_visible_geometry(
    frame: &FrameInfo<'_>,
    geometry: &GeometryStates,
    zones: &[CachedZone],
    quality: MaterialQuality,
    passes: &[ScenePass],
    index: usize,
) -> Option<VisibleGeometry> {
    if !geometry.try_claim(index) {
        return None;
    }

    let drawable = &frame.index.drawables()[index];
    let camera = frame.camera;
    let center = drawable.world_bounds.center();
    let distance = camera.distance(center);
    if drawable.draw_distance > 0.0 && distance > drawable.draw_distance {
        return None;
    }

    let zone = zones[index]
        .needs_refresh(center)
        .then(|| frame.index.query_zone(center, drawable.zone_mask));

    let lod_distance = camera.lod_distance(distance, 1.0);
    let mut batches = vec![Vec::new(); passes.len()];
    let mut forward_lit = false;
    let mut need_ambient = false;
    for (source_index, source) in drawable.source_batches.iter().enumerate() {
        let Some(material) = source.material.or(frame.default_material) else {
            continue;
        };
        let Some((_, technique)) = frame.assets.technique_for(material, lod_distance, quality)
        else {
            continue;
        };
        for (pass, pass_batches) in passes.iter().zip(&mut batches) {
            let result = pass.add_batch(index, source_index, technique, pass_batches);
            if result.added {
                forward_lit |= result.lit_added;
                need_ambient |= result.lit_added || pass.needs_ambient();
            }
        }
    }

    let uses_probes = drawable.global_illumination == GlobalIlluminationType::BlendLightProbes;
    let gi_ambient = match frame.gi {
        Some(gi) if need_ambient && uses_probes => gi.sample_ambient(center),
        _ => Vec3::ZERO,
    };

    let mut flags = GeometryRenderFlags::VISIBLE;
    flags.set(GeometryRenderFlags::LIT, need_ambient);
    flags.set(GeometryRenderFlags::FORWARD_LIT, forward_lit);

    Some(VisibleGeometry {
        index,
        center,
        distance,
        z_range: geometry_z_range(camera, &drawable.world_bounds),
        flags,
        zone,
        gi_ambient,
        batches,
    })
}

fn accumulate_light(
    frame: &FrameInfo<'_>,
    geometry: &GeometryStates,
    lighting: &mut [LightAccumulator],
    settings: &DrawableProcessorSettings,
    light: &Light,
    light_index: usize,
    lit_geometries: &[usize],
) {
    let drawables = frame.index.drawables();
    let ctx = LightAccumulatorContext {
        max_pixel_lights: settings.max_pixel_lights,
        max_vertex_lights: settings.max_vertex_lights,
        importance: light.importance,
        light_index,
    };
    let intensity_divisor = light.intensity_divisor();

    let penalties: Vec<(usize, f32)> = lit_geometries
        .par_iter()
        .filter(|&&index| {
            index < lighting.len()
                && geometry.flags(index).contains(GeometryRenderFlags::FORWARD_LIT)
        })
        .filter_map(|&index| {
            let drawable = drawables.get(index)?;
            let distance = light.distance_to(&drawable.world_bounds).max(LARGE_EPSILON);
            let intensity_penalty = distance / intensity_divisor;
            let penalty = light_penalty(intensity_penalty, light.importance, light.light_type);
            Some((index, penalty))
        })
        .collect();

    for (index, penalty) in penalties {
        lighting[index].accumulate(&ctx, penalty);
    }
}
