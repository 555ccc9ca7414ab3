pub mod camera;
pub mod drawable;
pub mod light;
pub mod scene_core;
pub mod spatial_index;
pub mod transform;
pub mod zone;

pub use camera::{Camera, Projection};
pub use drawable::{Drawable, DrawableFlags, GlobalIlluminationType, SourceBatch};
pub use light::{
    BiasParameters, CascadeParameters, FocusParameters, Light, LightId, LightImportance, LightType,
    MAX_CASCADE_SPLITS, MAX_LIGHT_SPLITS,
};
pub use scene_core::Scene;
pub use spatial_index::{GlobalIllumination, QueryResult, QueryVolume, SpatialIndex};
pub use transform::Transform;
pub use zone::{CachedZone, Zone, ZoneLookup};
