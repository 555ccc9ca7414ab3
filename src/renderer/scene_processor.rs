use std::sync::Arc;

use glam::UVec2;
use log::debug;

use super::batch::LightVolumeBatch;
use super::batch_state_cache::{
    BatchStateCacheCallback, LightVolumeStateCache, LightVolumeStateKey,
};
use super::drawable_processor::DrawableProcessor;
use super::frame::FrameInfo;
use super::light_processor::LightProcessorCallback;
use super::scene_pass::ScenePass;
use super::shadow_map_allocator::{ShadowMapAllocator, ShadowMapRegion};
use crate::error::Result;
use crate::scene::{
    Camera, DrawableFlags, Light, LightImportance, LightType, QueryResult, QueryVolume,
};
use crate::settings::{PipelineSettings, ShadowSettings};

/// Shadow policy and shadow map space for one frame's light processors.
struct ShadowMapRequests<'a> {
    settings: &'a ShadowSettings,
    camera: &'a Camera,
    allocator: &'a mut ShadowMapAllocator,
}

impl LightProcessorCallback for ShadowMapRequests<'_> {
    fn is_light_shadowed(&self, light: &Light) -> bool {
        is_light_shadowed(self.settings, self.camera, light)
    }

    fn allocate_transient_shadow_map(&mut self, size: UVec2) -> Result<ShadowMapRegion> {
        self.allocator.allocate(size)
    }
}

/// Shadows are rendered for important enough lights within their shadow
/// distance whose shadows are not fully transparent.
pub fn is_light_shadowed(settings: &ShadowSettings, camera: &Camera, light: &Light) -> bool {
    if !settings.enable_shadows
        || !light.cast_shadows
        || light.importance == LightImportance::NotImportant
        || light.shadow_intensity >= 1.0
    {
        return false;
    }
    if light.shadow_distance > 0.0 && light.light_type != LightType::Directional {
        return camera.distance(light.position()) <= light.shadow_distance;
    }
    true
}

/// Brightest visible directional light.
pub fn find_main_light(lights: &[Arc<Light>]) -> Option<usize> {
    lights
        .iter()
        .enumerate()
        .filter(|(_, light)| light.light_type == LightType::Directional)
        .fold(None, |best: Option<(usize, f32)>, (index, light)| {
            let brightness = light.intensity_divisor();
            match best {
                Some((_, best_brightness)) if best_brightness >= brightness => best,
                _ => Some((index, brightness)),
            }
        })
        .map(|(index, _)| index)
}

/// Runs the per-frame scene stages for one camera and owns their results.
pub struct SceneProcessor {
    settings: PipelineSettings,
    drawable_processor: DrawableProcessor,
    passes: Vec<ScenePass>,
    shadow_allocator: ShadowMapAllocator,
    light_volume_cache: LightVolumeStateCache,
    light_volume_batches: Vec<LightVolumeBatch>,
    main_light_index: Option<usize>,
    visible: QueryResult,
}

impl SceneProcessor {
    pub fn new(settings: PipelineSettings, passes: Vec<ScenePass>) -> Self {
        Self {
            drawable_processor: DrawableProcessor::new(&settings.drawable, &settings.light_cache),
            shadow_allocator: ShadowMapAllocator::new(&settings.shadows),
            passes,
            light_volume_cache: LightVolumeStateCache::default(),
            light_volume_batches: Vec::new(),
            main_light_index: None,
            visible: QueryResult::default(),
            settings,
        }
    }

    /// Opaque, alpha and shadow passes.
    pub fn with_default_passes(settings: PipelineSettings) -> Self {
        Self::new(settings, vec![ScenePass::opaque(), ScenePass::alpha(), ScenePass::shadow()])
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn drawable_processor(&self) -> &DrawableProcessor {
        &self.drawable_processor
    }

    pub fn passes(&self) -> &[ScenePass] {
        &self.passes
    }

    pub fn pass(&self, name: &str) -> Option<&ScenePass> {
        self.passes.iter().find(|pass| pass.name() == name)
    }

    pub fn main_light_index(&self) -> Option<usize> {
        self.main_light_index
    }

    pub fn light_volume_batches(&self) -> &[LightVolumeBatch] {
        &self.light_volume_batches
    }

    pub fn shadow_map_allocator(&self) -> &ShadowMapAllocator {
        &self.shadow_allocator
    }

    /// Processes one frame. Pipeline states missing from the caches are
    /// created through `callback` on the calling thread.
    pub fn update(&mut self, frame: &FrameInfo<'_>, callback: &mut dyn BatchStateCacheCallback) {
        self.shadow_allocator.reset();

        self.visible.clear();
        let frustum = frame.camera.frustum();
        frame.index.query(
            &QueryVolume::Frustum(&frustum),
            DrawableFlags::GEOMETRY | DrawableFlags::LIGHT,
            frame.camera.view_mask,
            &mut self.visible,
        );

        for pass in &mut self.passes {
            pass.begin_frame(frame.num_workers);
        }
        self.drawable_processor
            .process_visible_drawables(frame, &self.visible, &mut self.passes);

        let mut requests = ShadowMapRequests {
            settings: &self.settings.shadows,
            camera: frame.camera,
            allocator: &mut self.shadow_allocator,
        };
        self.drawable_processor
            .process_lights(frame, &mut requests, &self.settings.shadows);
        self.drawable_processor.process_forward_lighting_for_all_lights(frame);
        self.drawable_processor.process_shadow_casters(frame);

        self.main_light_index = find_main_light(self.drawable_processor.visible_lights());

        let shadows_enabled = self.settings.shadows.enable_shadows;
        for pass in &mut self.passes {
            if matches!(pass, ScenePass::Shadow(_)) && !shadows_enabled {
                continue;
            }
            let main_light_index = self.main_light_index;
            pass.collect_batches(frame, &self.drawable_processor, main_light_index, callback);
        }

        self.light_volume_batches.clear();
        if self.settings.lighting.deferred {
            self.collect_light_volume_batches(frame.camera, callback);
        }

        for pass in &mut self.passes {
            pass.sort_batches(frame);
        }

        debug!(
            "Frame {}: {} lights, {} light volumes, {} shadow map pages",
            frame.frame_number,
            self.drawable_processor.visible_lights().len(),
            self.light_volume_batches.len(),
            self.shadow_allocator.num_pages()
        );
    }

    fn collect_light_volume_batches(
        &mut self,
        camera: &Camera,
        callback: &mut dyn BatchStateCacheCallback,
    ) {
        let lights = self.drawable_processor.visible_lights();
        for (light_index, light) in lights.iter().enumerate() {
            let Some(processor) = self.drawable_processor.light_processor(light_index) else {
                continue;
            };
            if !processor.has_lit_geometries() {
                continue;
            }
            let key = LightVolumeStateKey {
                light_hash: processor.light_volume_hash(),
                light_index,
            };
            let pipeline_state =
                self.light_volume_cache.get_or_create(&key, light, camera, callback);
            self.light_volume_batches.push(LightVolumeBatch {
                light_index,
                pipeline_state,
            });
        }
    }

    /// Forces every cached pipeline state to be recreated on next use.
    pub fn invalidate_pipeline_state_cache(&mut self) {
        for pass in &mut self.passes {
            pass.invalidate_pipeline_state_cache();
        }
        self.light_volume_cache.invalidate();
    }
}
