use std::sync::Arc;

use super::pipeline_state::PipelineState;
use crate::asset::{Geometry, GeometryType, Handle, Material, Pass};

/// Raw (drawable, source batch) pair admitted by a forward pass, with the
/// technique passes it may be drawn with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryBatch {
    pub drawable_index: usize,
    pub source_batch_index: usize,
    pub unlit_base_pass: Handle<Pass>,
    /// Only set when the technique also has a light pass.
    pub lit_base_pass: Option<Handle<Pass>>,
    pub light_pass: Option<Handle<Pass>>,
}

/// A draw of one source batch with a resolved pipeline state.
#[derive(Debug, Clone)]
pub struct PipelineBatch {
    pub drawable_index: usize,
    pub source_batch_index: usize,
    /// Per-pixel light for lit base and light batches.
    pub light_index: Option<usize>,
    pub geometry_type: GeometryType,
    pub geometry: Handle<Geometry>,
    pub material: Handle<Material>,
    pub pass: Handle<Pass>,
    pub lightmap_index: u32,
    /// Camera distance of the drawable.
    pub distance: f32,
    pub pipeline_state: Arc<PipelineState>,
}

impl PipelineBatch {
    pub fn is_lit(&self) -> bool {
        self.light_index.is_some()
    }
}

/// Deferred lighting draw of a light's volume.
#[derive(Debug, Clone)]
pub struct LightVolumeBatch {
    pub light_index: usize,
    pub pipeline_state: Arc<PipelineState>,
}
