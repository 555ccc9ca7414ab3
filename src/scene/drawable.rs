use bitflags::bitflags;

use crate::asset::{Geometry, GeometryType, Handle, Material};
use crate::math::BoundingBox;

bitflags! {
    /// Kinds of objects a spatial query may return.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DrawableFlags: u8 {
        const GEOMETRY = 1 << 0;
        const LIGHT = 1 << 1;
        const ZONE = 1 << 2;
    }
}

/// Baked lighting an object samples for its ambient term.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GlobalIlluminationType {
    #[default]
    None,
    LightMap,
    BlendLightProbes,
}

#[derive(Debug, Clone, Copy)]
pub struct SourceBatch {
    pub geometry: Handle<Geometry>,
    /// Falls back to the frame's default material when absent.
    pub material: Option<Handle<Material>>,
    pub geometry_type: GeometryType,
    pub lightmap_index: u32,
}

impl SourceBatch {
    pub fn new(geometry: Handle<Geometry>, material: Handle<Material>) -> Self {
        Self {
            geometry,
            material: Some(material),
            geometry_type: GeometryType::Static,
            lightmap_index: 0,
        }
    }
}

/// Renderable object owned by the scene. The pipeline addresses drawables by
/// their index in the scene and never keeps references across frames.
#[derive(Debug, Clone)]
pub struct Drawable {
    pub world_bounds: BoundingBox,
    /// Zero disables distance culling.
    pub draw_distance: f32,
    /// Zero disables shadow distance culling.
    pub shadow_distance: f32,
    pub view_mask: u32,
    pub light_mask: u32,
    pub shadow_mask: u32,
    pub zone_mask: u32,
    pub cast_shadows: bool,
    pub global_illumination: GlobalIlluminationType,
    pub source_batches: Vec<SourceBatch>,
    pub pipeline_state_hash: u32,
}

impl Default for Drawable {
    fn default() -> Self {
        Self {
            world_bounds: BoundingBox::UNDEFINED,
            draw_distance: 0.0,
            shadow_distance: 0.0,
            view_mask: u32::MAX,
            light_mask: u32::MAX,
            shadow_mask: u32::MAX,
            zone_mask: u32::MAX,
            cast_shadows: false,
            global_illumination: GlobalIlluminationType::None,
            source_batches: Vec::new(),
            pipeline_state_hash: 0,
        }
    }
}

impl Drawable {
    pub fn new(world_bounds: BoundingBox) -> Self {
        Self {
            world_bounds,
            ..Self::default()
        }
    }

    pub fn with_batch(mut self, batch: SourceBatch) -> Self {
        self.source_batches.push(batch);
        self
    }

    pub fn with_cast_shadows(mut self, cast_shadows: bool) -> Self {
        self.cast_shadows = cast_shadows;
        self
    }

    pub fn with_draw_distance(mut self, draw_distance: f32) -> Self {
        self.draw_distance = draw_distance;
        self
    }

    /// Shadow distance after the draw distance override: a positive draw
    /// distance wins when it is shorter or when no shadow distance is set.
    pub fn effective_shadow_distance(&self) -> f32 {
        let overrides = self.shadow_distance <= 0.0 || self.draw_distance < self.shadow_distance;
        if self.draw_distance > 0.0 && overrides {
            self.draw_distance
        } else {
            self.shadow_distance
        }
    }
}
