pub mod cache;
pub mod handle;
pub mod material;

pub use cache::AssetCache;
pub use handle::Handle;
pub use material::{Geometry, GeometryType, Material, Pass, Technique, TechniqueEntry};

use crate::settings::MaterialQuality;

/// Resource tables consumed by the pipeline. Contents are loaded elsewhere.
pub struct AssetLibrary {
    pub geometries: AssetCache<Geometry>,
    pub materials: AssetCache<Material>,
    pub techniques: AssetCache<Technique>,
    pub passes: AssetCache<Pass>,
}

impl AssetLibrary {
    pub fn new() -> Self {
        Self {
            geometries: AssetCache::new(),
            materials: AssetCache::new(),
            techniques: AssetCache::new(),
            passes: AssetCache::new(),
        }
    }

    /// Technique selected for a material at the given distance and quality.
    pub fn technique_for(
        &self,
        material: Handle<Material>,
        lod_distance: f32,
        quality: MaterialQuality,
    ) -> Option<(Handle<Technique>, &Technique)> {
        let entry = self.materials.get(material)?.find_technique(lod_distance, quality)?;
        let technique = self.techniques.get(entry.technique)?;
        Some((entry.technique, technique))
    }

    pub fn geometry_hash(&self, geometry: Handle<Geometry>) -> u32 {
        self.geometries.get(geometry).map_or(0, |g| g.pipeline_state_hash)
    }

    pub fn material_hash(&self, material: Handle<Material>) -> u32 {
        self.materials.get(material).map_or(0, |m| m.pipeline_state_hash)
    }

    pub fn pass_hash(&self, pass: Handle<Pass>) -> u32 {
        self.passes.get(pass).map_or(0, |p| p.pipeline_state_hash)
    }

    pub fn render_order(&self, material: Handle<Material>) -> u8 {
        self.materials
            .get(material)
            .map_or(Material::DEFAULT_RENDER_ORDER, |m| m.render_order)
    }
}

impl Default for AssetLibrary {
    fn default() -> Self {
        Self::new()
    }
}
