use bitflags::bitflags;

use crate::asset::{AssetLibrary, Handle, Material};
use crate::scene::{Camera, GlobalIllumination, SpatialIndex};

bitflags! {
    /// Per-frame classification of a visible geometry.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct GeometryRenderFlags: u8 {
        const VISIBLE = 1 << 0;
        /// Receives ambient lighting.
        const LIT = 1 << 1;
        /// Has at least one batch with a per-light pass.
        const FORWARD_LIT = 1 << 2;
    }
}

/// Everything a frame's stages read but never modify.
#[derive(Clone, Copy)]
pub struct FrameInfo<'a> {
    pub frame_number: u64,
    pub num_workers: usize,
    pub camera: &'a Camera,
    pub index: &'a dyn SpatialIndex,
    pub assets: &'a AssetLibrary,
    pub gi: Option<&'a dyn GlobalIllumination>,
    /// Used by source batches without a material.
    pub default_material: Option<Handle<Material>>,
}

impl<'a> FrameInfo<'a> {
    pub fn new(
        frame_number: u64,
        camera: &'a Camera,
        index: &'a dyn SpatialIndex,
        assets: &'a AssetLibrary,
    ) -> Self {
        Self {
            frame_number,
            num_workers: rayon::current_num_threads().max(1),
            camera,
            index,
            assets,
            gi: None,
            default_material: None,
        }
    }

    pub fn with_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers.max(1);
        self
    }

    pub fn with_default_material(mut self, material: Handle<Material>) -> Self {
        self.default_material = Some(material);
        self
    }

    pub fn with_gi(mut self, gi: &'a dyn GlobalIllumination) -> Self {
        self.gi = Some(gi);
        self
    }
}
