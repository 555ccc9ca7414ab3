pub mod batch;
pub mod batch_sorter;
pub mod batch_state_cache;
pub mod drawable_processor;
pub mod frame;
pub(crate) mod internal;
pub mod light_accumulator;
pub mod light_processor;
pub mod light_processor_cache;
pub mod pipeline_state;
pub mod scene_pass;
pub mod scene_processor;
pub mod shadow_map_allocator;
pub mod shadow_split;

pub use batch::{GeometryBatch, LightVolumeBatch, PipelineBatch};
pub use batch_sorter::{
    sort_batches_back_to_front, sort_batches_by_state, PipelineBatchBackToFront,
    PipelineBatchByState,
};
pub use batch_state_cache::{
    BatchStateCache, BatchStateCacheCallback, BatchStateCreateContext, BatchStateCreateKey,
    BatchStateLookupKey, LightVolumeStateCache, LightVolumeStateKey,
};
pub use drawable_processor::{geometry_z_range, DrawableProcessor, GeometryStates};
pub use frame::{FrameInfo, GeometryRenderFlags};
pub use light_accumulator::{LightAccumulator, LightAccumulatorContext, MAX_VERTEX_LIGHTS};
pub use light_processor::{
    CookedLightParams, LightProcessor, LightProcessorCallback, LightUpdateContext,
};
pub use light_processor_cache::LightProcessorCache;
pub use pipeline_state::PipelineState;
pub use scene_pass::{
    AddBatchResult, ForwardPass, ForwardSortMode, ScenePass, ShadowPass, ShadowSplitBatches,
};

pub use scene_processor::{find_main_light, is_light_shadowed, SceneProcessor};
pub use shadow_map_allocator::{ShadowMapAllocator, ShadowMapRect, ShadowMapRegion};
pub use shadow_split::ShadowSplit;
