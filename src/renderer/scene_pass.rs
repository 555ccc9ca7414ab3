use std::sync::Arc;

use log::error;
use rayon::prelude::*;

use super::batch::{GeometryBatch, PipelineBatch};
use super::batch_sorter::{
    sort_batches_back_to_front, sort_batches_by_state, PipelineBatchBackToFront,
    PipelineBatchByState,
};
use super::batch_state_cache::{
    BatchStateCache, BatchStateCacheCallback, BatchStateCreateContext, BatchStateCreateKey,
    BatchStateLookupKey,
};
use super::drawable_processor::DrawableProcessor;
use super::frame::FrameInfo;
use super::internal::WorkerBuffers;
use super::pipeline_state::PipelineState;
use crate::asset::{Handle, Material, Pass, Technique};
use crate::error::PipelineError;
use crate::math::combine_hash;
use crate::scene::{Drawable, SourceBatch};

/// Technique pass used to render shadow casters.
pub const SHADOW_PASS_NAME: &str = "shadow";

const UNLIT_BASE_SUBPASS: usize = 0;
const LIT_BASE_SUBPASS: usize = 1;
const LIGHT_SUBPASS: usize = 2;

/// Whether a pass accepted a batch, and whether it will be lit per pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddBatchResult {
    pub added: bool,
    pub lit_added: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardSortMode {
    ByState,
    BackToFront,
}

/// Batch whose state is either known or still has to be created.
#[derive(Debug)]
enum CollectedBatch {
    Ready {
        subpass: usize,
        batch: PipelineBatch,
    },
    Delayed {
        subpass: usize,
        create_key: BatchStateCreateKey,
        lightmap_index: u32,
        distance: f32,
    },
}

fn make_batch(
    create_key: &BatchStateCreateKey,
    lightmap_index: u32,
    distance: f32,
    state: Arc<PipelineState>,
) -> PipelineBatch {
    let key = &create_key.key;
    PipelineBatch {
        drawable_index: create_key.drawable_index,
        source_batch_index: create_key.source_batch_index,
        light_index: create_key.pixel_light_index,
        geometry_type: key.geometry_type,
        geometry: key.geometry,
        material: key.material,
        pass: key.pass,
        lightmap_index,
        distance,
        pipeline_state: state,
    }
}

/// Source batch of a drawable and its resolved material.
fn source_batch<'a>(
    drawables: &'a [Drawable],
    drawable_index: usize,
    source_batch_index: usize,
    default_material: Option<Handle<Material>>,
) -> Option<(&'a SourceBatch, Handle<Material>)> {
    let Some(drawable) = drawables.get(drawable_index) else {
        error!("Drawable {} is out of range", drawable_index);
        return None;
    };
    let Some(source) = drawable.source_batches.get(source_batch_index) else {
        let err = PipelineError::InvalidSourceBatch {
            drawable: drawable_index,
            index: source_batch_index,
            count: drawable.source_batches.len(),
        };
        error!("Skipping batch: {}", err);
        return None;
    };
    let material = source.material.or(default_material)?;
    Some((source, material))
}

/// Forward rendered pass with optional per-pixel lighting.
///
/// Each drawable gets either a lit base batch (its first pixel light is the
/// main light) or an unlit base batch, followed by one additive batch per
/// remaining pixel light.
#[derive(Debug)]
pub struct ForwardPass {
    name: String,
    unlit_base_pass: String,
    lit_base_pass: Option<String>,
    light_pass: Option<String>,
    needs_ambient: bool,
    sort_mode: ForwardSortMode,

    geometry_batches: Vec<GeometryBatch>,
    base_batches: Vec<PipelineBatch>,
    light_batches: Vec<PipelineBatch>,
    sorted_base_batches: Vec<PipelineBatchByState>,
    sorted_light_batches: Vec<PipelineBatchByState>,
    sorted_back_to_front: Vec<PipelineBatchBackToFront>,

    caches: [BatchStateCache; 3],
    collected: WorkerBuffers<CollectedBatch>,
}

impl ForwardPass {
    pub fn new(
        name: impl Into<String>,
        unlit_base_pass: impl Into<String>,
        lit_base_pass: Option<&str>,
        light_pass: Option<&str>,
        needs_ambient: bool,
        sort_mode: ForwardSortMode,
    ) -> Self {
        Self {
            name: name.into(),
            unlit_base_pass: unlit_base_pass.into(),
            lit_base_pass: lit_base_pass.map(str::to_owned),
            light_pass: light_pass.map(str::to_owned),
            needs_ambient,
            sort_mode,
            geometry_batches: Vec::new(),
            base_batches: Vec::new(),
            light_batches: Vec::new(),
            sorted_base_batches: Vec::new(),
            sorted_light_batches: Vec::new(),
            sorted_back_to_front: Vec::new(),
            caches: Default::default(),
            collected: WorkerBuffers::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn needs_ambient(&self) -> bool {
        self.needs_ambient
    }

    pub fn sort_mode(&self) -> ForwardSortMode {
        self.sort_mode
    }

    /// Unlit and lit base batches.
    pub fn base_batches(&self) -> &[PipelineBatch] {
        &self.base_batches
    }

    pub fn light_batches(&self) -> &[PipelineBatch] {
        &self.light_batches
    }

    pub fn sorted_base_batches(&self) -> &[PipelineBatchByState] {
        &self.sorted_base_batches
    }

    pub fn sorted_light_batches(&self) -> &[PipelineBatchByState] {
        &self.sorted_light_batches
    }

    /// Indices past the base batches address light batches.
    pub fn sorted_back_to_front(&self) -> &[PipelineBatchBackToFront] {
        &self.sorted_back_to_front
    }

    /// Base batches first, then light batches.
    pub fn batch(&self, index: usize) -> Option<&PipelineBatch> {
        self.base_batches
            .get(index)
            .or_else(|| self.light_batches.get(index.checked_sub(self.base_batches.len())?))
    }

    fn begin_frame(&mut self, num_workers: usize) {
        self.geometry_batches.clear();
        self.base_batches.clear();
        self.light_batches.clear();
        self.sorted_base_batches.clear();
        self.sorted_light_batches.clear();
        self.sorted_back_to_front.clear();
        self.collected.reset(num_workers);
    }

    fn admit(
        &self,
        drawable_index: usize,
        source_batch_index: usize,
        technique: &Technique,
    ) -> Option<GeometryBatch> {
        let unlit_base_pass = technique.pass(&self.unlit_base_pass)?;
        let light_pass = self.light_pass.as_deref().and_then(|name| technique.pass(name));
        let lit_base_pass = light_pass
            .and(self.lit_base_pass.as_deref())
            .and_then(|name| technique.pass(name));
        Some(GeometryBatch {
            drawable_index,
            source_batch_index,
            unlit_base_pass,
            lit_base_pass,
            light_pass,
        })
    }

    fn collect_batches(
        &mut self,
        frame: &FrameInfo<'_>,
        drawables: &DrawableProcessor,
        main_light_index: Option<usize>,
        callback: &mut dyn BatchStateCacheCallback,
    ) {
        {
            let caches = &self.caches;
            self.collected.for_each_chunk(&self.geometry_batches, |batch, out| {
                collect_forward_batch(frame, drawables, caches, main_light_index, batch, out);
            });
        }

        let lights = drawables.visible_lights();
        for item in self.collected.drain() {
            let (subpass, batch) = match item {
                CollectedBatch::Ready { subpass, batch } => (subpass, batch),
                CollectedBatch::Delayed {
                    subpass,
                    create_key,
                    lightmap_index,
                    distance,
                } => {
                    let ctx = BatchStateCreateContext {
                        pass_name: &self.name,
                        subpass_index: subpass,
                        camera: frame.camera,
                        light: create_key
                            .pixel_light_index
                            .and_then(|index| lights.get(index))
                            .map(|light| &**light),
                    };
                    let state = self.caches[subpass].get_or_create(
                        &create_key,
                        &ctx,
                        frame.assets,
                        callback,
                    );
                    (subpass, make_batch(&create_key, lightmap_index, distance, state))
                }
            };
            if subpass == LIGHT_SUBPASS {
                self.light_batches.push(batch);
            } else {
                self.base_batches.push(batch);
            }
        }
    }

    fn sort_batches(&mut self, frame: &FrameInfo<'_>) {
        match self.sort_mode {
            ForwardSortMode::ByState => {
                self.sorted_base_batches.clear();
                self.sorted_light_batches.clear();
                sort_batches_by_state(
                    &self.base_batches,
                    0,
                    frame.assets,
                    &mut self.sorted_base_batches,
                );
                sort_batches_by_state(
                    &self.light_batches,
                    0,
                    frame.assets,
                    &mut self.sorted_light_batches,
                );
            }
            ForwardSortMode::BackToFront => {
                self.sorted_back_to_front.clear();
                sort_batches_back_to_front(
                    &self.base_batches,
                    0,
                    frame.assets,
                    &mut self.sorted_back_to_front,
                );
                sort_batches_back_to_front(
                    &self.light_batches,
                    self.base_batches.len(),
                    frame.assets,
                    &mut self.sorted_back_to_front,
                );
            }
        }
    }

    fn invalidate_pipeline_state_cache(&mut self) {
        for cache in &mut self.caches {
            cache.invalidate();
        }
    }
}

fn collect_forward_batch(
    frame: &FrameInfo<'_>,
    drawables: &DrawableProcessor,
    caches: &[BatchStateCache; 3],
    main_light_index: Option<usize>,
    geometry_batch: &GeometryBatch,
    out: &mut Vec<CollectedBatch>,
) {
    let drawable_index = geometry_batch.drawable_index;
    let Some((source, material)) = source_batch(
        frame.index.drawables(),
        drawable_index,
        geometry_batch.source_batch_index,
        frame.default_material,
    ) else {
        return;
    };
    let Some(lighting) = drawables.lighting(drawable_index) else {
        return;
    };

    let num_vertex_lights = lighting.vertex_lights().iter().flatten().count() as u32;
    let mut drawable_hash = drawables.drawable_hash(drawable_index);
    combine_hash(&mut drawable_hash, num_vertex_lights);
    let distance = drawables.geometry().distance(drawable_index);

    let mut push = |subpass: usize, pass: Handle<Pass>, light_index: Option<usize>| {
        let light_hash = light_index
            .and_then(|index| drawables.light_processor(index))
            .map_or(0, |processor| processor.forward_lit_hash());
        let create_key = BatchStateCreateKey {
            key: BatchStateLookupKey {
                drawable_hash,
                pixel_light_hash: light_hash,
                geometry_type: source.geometry_type,
                geometry: source.geometry,
                material,
                pass,
            },
            drawable_index,
            source_batch_index: geometry_batch.source_batch_index,
            pixel_light_index: light_index,
        };
        let item = match caches[subpass].lookup(&create_key.key, frame.assets) {
            Some(state) => CollectedBatch::Ready {
                subpass,
                batch: make_batch(&create_key, source.lightmap_index, distance, state),
            },
            None => CollectedBatch::Delayed {
                subpass,
                create_key,
                lightmap_index: source.lightmap_index,
                distance,
            },
        };
        out.push(item);
    };

    let pixel_lights = lighting.pixel_lights();
    let first_pixel_light = pixel_lights.first().map(|&(_, index)| index);
    let main_light_first = main_light_index.is_some() && first_pixel_light == main_light_index;
    let lit_base = geometry_batch.lit_base_pass.filter(|_| main_light_first);

    let first_light = match lit_base {
        Some(pass) => {
            push(LIT_BASE_SUBPASS, pass, main_light_index);
            1
        }
        None => {
            push(UNLIT_BASE_SUBPASS, geometry_batch.unlit_base_pass, None);
            0
        }
    };

    if let Some(light_pass) = geometry_batch.light_pass {
        for &(_, light_index) in pixel_lights.iter().skip(first_light) {
            push(LIGHT_SUBPASS, light_pass, Some(light_index));
        }
    }
}

/// Shadow caster batches of one light split.
#[derive(Debug, Default)]
pub struct ShadowSplitBatches {
    pub light_index: usize,
    pub split_index: usize,
    pub batches: Vec<PipelineBatch>,
    pub sorted: Vec<PipelineBatchByState>,
}

/// Shadow caster pass. Batches are grouped per light split.
#[derive(Debug)]
pub struct ShadowPass {
    name: String,
    pass_name: String,
    cache: BatchStateCache,
    splits: Vec<ShadowSplitBatches>,
}

impl ShadowPass {
    pub fn new(name: impl Into<String>, pass_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pass_name: pass_name.into(),
            cache: BatchStateCache::new(),
            splits: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn split_batches(&self) -> &[ShadowSplitBatches] {
        &self.splits
    }

    /// Batches of one light split, empty if the split has none.
    pub fn batches_for(&self, light_index: usize, split_index: usize) -> &[PipelineBatch] {
        self.splits
            .iter()
            .find(|split| split.light_index == light_index && split.split_index == split_index)
            .map(|split| split.batches.as_slice())
            .unwrap_or_default()
    }

    fn begin_frame(&mut self) {
        self.splits.clear();
    }

    fn collect_batches(
        &mut self,
        frame: &FrameInfo<'_>,
        drawables: &DrawableProcessor,
        callback: &mut dyn BatchStateCacheCallback,
    ) {
        let mut tasks = Vec::new();
        for light_index in 0..drawables.visible_lights().len() {
            let processor = drawables.light_processor(light_index);
            let Some(processor) = processor.filter(|p| p.has_shadow()) else {
                continue;
            };
            for split in processor.splits() {
                if split.has_shadow_casters() {
                    tasks.push((light_index, split.index()));
                }
            }
        }

        let collected: Vec<Vec<CollectedBatch>> = {
            let cache = &self.cache;
            let pass_name = self.pass_name.as_str();
            tasks
                .par_iter()
                .map(|&(light_index, split_index)| {
                    let mut out = Vec::new();
                    collect_shadow_split(
                        frame,
                        drawables,
                        cache,
                        pass_name,
                        light_index,
                        split_index,
                        &mut out,
                    );
                    out
                })
                .collect()
        };

        let lights = drawables.visible_lights();
        for (&(light_index, split_index), items) in tasks.iter().zip(collected) {
            let mut split_batches = ShadowSplitBatches {
                light_index,
                split_index,
                ..ShadowSplitBatches::default()
            };
            for item in items {
                let batch = match item {
                    CollectedBatch::Ready { batch, .. } => batch,
                    CollectedBatch::Delayed {
                        create_key,
                        lightmap_index,
                        distance,
                        ..
                    } => {
                        let ctx = BatchStateCreateContext {
                            pass_name: &self.name,
                            subpass_index: 0,
                            camera: frame.camera,
                            light: lights.get(light_index).map(|light| &**light),
                        };
                        let state =
                            self.cache.get_or_create(&create_key, &ctx, frame.assets, callback);
                        make_batch(&create_key, lightmap_index, distance, state)
                    }
                };
                split_batches.batches.push(batch);
            }
            self.splits.push(split_batches);
        }
    }

    fn sort_batches(&mut self, frame: &FrameInfo<'_>) {
        for split in &mut self.splits {
            split.sorted.clear();
            sort_batches_by_state(&split.batches, 0, frame.assets, &mut split.sorted);
        }
    }
}

fn collect_shadow_split(
    frame: &FrameInfo<'_>,
    drawables: &DrawableProcessor,
    cache: &BatchStateCache,
    pass_name: &str,
    light_index: usize,
    split_index: usize,
    out: &mut Vec<CollectedBatch>,
) {
    let light = drawables.visible_lights().get(light_index);
    let processor = drawables.light_processor(light_index);
    let (Some(light), Some(processor)) = (light, processor) else {
        return;
    };
    let Some(split) = processor.splits().get(split_index) else {
        return;
    };
    let split_hash = processor.split_shadow_hash(split_index);
    let scene_drawables = frame.index.drawables();
    let geometry = drawables.geometry();

    for &drawable_index in split.shadow_casters() {
        let Some(drawable) = scene_drawables.get(drawable_index) else {
            continue;
        };
        if !drawable.cast_shadows || drawable.shadow_mask & light.light_mask == 0 {
            continue;
        }
        let distance = geometry.distance(drawable_index);
        let shadow_distance = drawable.effective_shadow_distance();
        if shadow_distance > 0.0 && distance > shadow_distance {
            continue;
        }

        let lod_distance = frame.camera.lod_distance(distance, 1.0);
        for (source_batch_index, source) in drawable.source_batches.iter().enumerate() {
            let Some(material) = source.material.or(frame.default_material) else {
                continue;
            };
            let Some(pass) = frame
                .assets
                .technique_for(material, lod_distance, drawables.material_quality())
                .and_then(|(_, technique)| technique.pass(pass_name))
            else {
                continue;
            };

            let create_key = BatchStateCreateKey {
                key: BatchStateLookupKey {
                    drawable_hash: drawables.drawable_hash(drawable_index),
                    pixel_light_hash: split_hash,
                    geometry_type: source.geometry_type,
                    geometry: source.geometry,
                    material,
                    pass,
                },
                drawable_index,
                source_batch_index,
                pixel_light_index: Some(light_index),
            };
            let item = match cache.lookup(&create_key.key, frame.assets) {
                Some(state) => CollectedBatch::Ready {
                    subpass: 0,
                    batch: make_batch(&create_key, source.lightmap_index, distance, state),
                },
                None => CollectedBatch::Delayed {
                    subpass: 0,
                    create_key,
                    lightmap_index: source.lightmap_index,
                    distance,
                },
            };
            out.push(item);
        }
    }
}

/// Closed set of scene passes. Forward variants admit batches from visible
/// drawables; the shadow pass collects casters from light processors.
#[derive(Debug)]
pub enum ScenePass {
    Opaque(ForwardPass),
    Alpha(ForwardPass),
    Unlit(ForwardPass),
    Shadow(ShadowPass),
}

impl ScenePass {
    /// `base`, `litbase` and `light` technique passes, sorted by state.
    pub fn opaque() -> Self {
        Self::Opaque(ForwardPass::new(
            "opaque",
            "base",
            Some("litbase"),
            Some("light"),
            true,
            ForwardSortMode::ByState,
        ))
    }

    /// `alpha`, `litalpha` and `light` technique passes, sorted back to front.
    pub fn alpha() -> Self {
        Self::Alpha(ForwardPass::new(
            "alpha",
            "alpha",
            Some("litalpha"),
            Some("light"),
            true,
            ForwardSortMode::BackToFront,
        ))
    }

    /// Single unlit technique pass, e.g. `postopaque`.
    pub fn unlit(pass_name: &str) -> Self {
        Self::Unlit(ForwardPass::new(
            pass_name,
            pass_name,
            None,
            None,
            false,
            ForwardSortMode::ByState,
        ))
    }

    pub fn shadow() -> Self {
        Self::Shadow(ShadowPass::new("shadow", SHADOW_PASS_NAME))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Opaque(pass) | Self::Alpha(pass) | Self::Unlit(pass) => pass.name(),
            Self::Shadow(pass) => pass.name(),
        }
    }

    pub fn as_forward(&self) -> Option<&ForwardPass> {
        match self {
            Self::Opaque(pass) | Self::Alpha(pass) | Self::Unlit(pass) => Some(pass),
            Self::Shadow(_) => None,
        }
    }

    pub fn as_shadow(&self) -> Option<&ShadowPass> {
        match self {
            Self::Shadow(pass) => Some(pass),
            _ => None,
        }
    }

    pub fn needs_ambient(&self) -> bool {
        self.as_forward().is_some_and(ForwardPass::needs_ambient)
    }

    pub fn begin_frame(&mut self, num_workers: usize) {
        match self {
            Self::Opaque(pass) | Self::Alpha(pass) | Self::Unlit(pass) => {
                pass.begin_frame(num_workers)
            }
            Self::Shadow(pass) => pass.begin_frame(),
        }
    }

    /// Offers a drawable's source batch to the pass. The raw batch is pushed
    /// to `batches` when the technique has this pass. Called from workers.
    pub fn add_batch(
        &self,
        drawable_index: usize,
        source_batch_index: usize,
        technique: &Technique,
        batches: &mut Vec<GeometryBatch>,
    ) -> AddBatchResult {
        let admitted = match self {
            Self::Opaque(pass) | Self::Alpha(pass) | Self::Unlit(pass) => {
                pass.admit(drawable_index, source_batch_index, technique)
            }
            Self::Shadow(_) => None,
        };
        let Some(batch) = admitted else {
            return AddBatchResult::default();
        };
        batches.push(batch);
        AddBatchResult {
            added: true,
            lit_added: batch.light_pass.is_some(),
        }
    }

    pub(crate) fn push_geometry_batch(&mut self, batch: GeometryBatch) {
        if let Self::Opaque(pass) | Self::Alpha(pass) | Self::Unlit(pass) = self {
            pass.geometry_batches.push(batch);
        }
    }

    pub fn num_geometry_batches(&self) -> usize {
        self.as_forward().map_or(0, |pass| pass.geometry_batches.len())
    }

    /// Resolves pipeline states for this frame's batches. States missing
    /// from the cache are created here, on the calling thread.
    pub fn collect_batches(
        &mut self,
        frame: &FrameInfo<'_>,
        drawables: &DrawableProcessor,
        main_light_index: Option<usize>,
        callback: &mut dyn BatchStateCacheCallback,
    ) {
        match self {
            Self::Opaque(pass) | Self::Alpha(pass) | Self::Unlit(pass) => {
                pass.collect_batches(frame, drawables, main_light_index, callback)
            }
            Self::Shadow(pass) => pass.collect_batches(frame, drawables, callback),
        }
    }

    pub fn sort_batches(&mut self, frame: &FrameInfo<'_>) {
        match self {
            Self::Opaque(pass) | Self::Alpha(pass) | Self::Unlit(pass) => pass.sort_batches(frame),
            Self::Shadow(pass) => pass.sort_batches(frame),
        }
    }

    pub fn invalidate_pipeline_state_cache(&mut self) {
        match self {
            Self::Opaque(pass) | Self::Alpha(pass) | Self::Unlit(pass) => {
                pass.invalidate_pipeline_state_cache()
            }
            Self::Shadow(pass) => pass.cache.invalidate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn technique(passes: &[(&str, usize)]) -> Technique {
        passes
            .iter()
            .fold(Technique::new("test"), |t, &(name, index)| t.with_pass(name, Handle::new(index)))
    }

    #[test]
    fn opaque_admits_lit_and_unlit_techniques() {
        let pass = ScenePass::opaque();
        let lit = technique(&[("base", 0), ("litbase", 1), ("light", 2)]);
        let unlit = technique(&[("base", 0)]);
        let alpha_only = technique(&[("alpha", 3)]);
        let mut batches = Vec::new();

        let result = pass.add_batch(4, 1, &lit, &mut batches);
        assert_eq!(result, AddBatchResult { added: true, lit_added: true });
        let result = pass.add_batch(5, 0, &unlit, &mut batches);
        assert_eq!(result, AddBatchResult { added: true, lit_added: false });
        assert_eq!(pass.add_batch(6, 0, &alpha_only, &mut batches), AddBatchResult::default());

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].lit_base_pass, Some(Handle::new(1)));
        assert_eq!(batches[0].drawable_index, 4);
        assert_eq!(batches[0].source_batch_index, 1);
        assert_eq!(batches[1].light_pass, None);
    }

    #[test]
    fn lit_base_requires_light_pass() {
        let pass = ScenePass::opaque();
        let mut batches = Vec::new();
        let result = pass.add_batch(0, 0, &technique(&[("base", 0), ("litbase", 1)]), &mut batches);
        assert_eq!(result, AddBatchResult { added: true, lit_added: false });
        assert_eq!(batches[0].lit_base_pass, None);
        assert_eq!(batches[0].light_pass, None);
    }

    #[test]
    fn unlit_and_shadow_passes_never_light() {
        let unlit = ScenePass::unlit("postopaque");
        let t = technique(&[("postopaque", 0), ("light", 1)]);
        let mut batches = Vec::new();
        let result = unlit.add_batch(0, 0, &t, &mut batches);
        assert_eq!(result, AddBatchResult { added: true, lit_added: false });
        assert!(!unlit.needs_ambient());

        let shadow = ScenePass::shadow();
        let result = shadow.add_batch(0, 0, &technique(&[("shadow", 0)]), &mut batches);
        assert_eq!(result, AddBatchResult::default());
        assert_eq!(batches.len(), 1);
        assert_eq!(shadow.name(), "shadow");
    }

    #[test]
    fn push_and_reset_geometry_batches() {
        let mut pass = ScenePass::alpha();
        let mut batches = Vec::new();
        pass.add_batch(0, 0, &technique(&[("alpha", 0)]), &mut batches);
        pass.add_batch(1, 0, &technique(&[("alpha", 0)]), &mut batches);
        for batch in batches {
            pass.push_geometry_batch(batch);
        }
        assert_eq!(pass.num_geometry_batches(), 2);

        pass.begin_frame(2);
        assert_eq!(pass.num_geometry_batches(), 0);
    }
}
