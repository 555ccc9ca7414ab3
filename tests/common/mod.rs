#![allow(dead_code)]

use std::sync::Arc;

use glam::Vec3;
use scene_pipeline::asset::{AssetLibrary, Geometry, Handle, Material, Pass, Technique};
use scene_pipeline::math::BoundingBox;
use scene_pipeline::renderer::{
    BatchStateCacheCallback, BatchStateCreateContext, BatchStateCreateKey, LightVolumeStateKey,
    PipelineState,
};
use scene_pipeline::scene::{Camera, Drawable, Light, Scene, SourceBatch, Transform};
use scene_pipeline::settings::MaterialQuality;

pub const LIT_MATERIAL: usize = 0;
pub const UNLIT_MATERIAL: usize = 1;
pub const NO_SHADOW_MATERIAL: usize = 2;

/// Backend stub that hands out a fresh state per request and counts them.
#[derive(Default)]
pub struct CountingBackend {
    pub batch_states: u64,
    pub light_volume_states: u64,
}

impl BatchStateCacheCallback for CountingBackend {
    fn create_batch_pipeline_state(
        &mut self,
        key: &BatchStateCreateKey,
        _ctx: &BatchStateCreateContext<'_>,
    ) -> Option<Arc<PipelineState>> {
        self.batch_states += 1;
        Some(PipelineState::new(key.key.pixel_light_hash ^ key.key.drawable_hash))
    }

    fn create_light_volume_pipeline_state(
        &mut self,
        key: &LightVolumeStateKey,
        _light: &Light,
        _camera: &Camera,
    ) -> Option<Arc<PipelineState>> {
        self.light_volume_states += 1;
        Some(PipelineState::new(key.light_hash))
    }
}

/// Three materials: forward lit with a shadow pass, unlit, and lit without
/// a shadow pass. One cube geometry.
/// Captures library log records in the test harness output.
pub fn init_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

pub fn assets() -> AssetLibrary {
    init_logging();
    let mut assets = AssetLibrary::new();
    let base = assets.passes.insert(Pass::new("base", 1));
    let litbase = assets.passes.insert(Pass::new("litbase", 2));
    let light = assets.passes.insert(Pass::new("light", 3));
    let shadow = assets.passes.insert(Pass::new("shadow", 4));

    let lit = assets.techniques.insert(
        Technique::new("lit")
            .with_pass("base", base)
            .with_pass("litbase", litbase)
            .with_pass("light", light)
            .with_pass("shadow", shadow),
    );
    let unlit = assets.techniques.insert(Technique::new("unlit").with_pass("base", base));
    let no_shadow = assets.techniques.insert(
        Technique::new("lit_no_shadow")
            .with_pass("base", base)
            .with_pass("litbase", litbase)
            .with_pass("light", light),
    );

    assets
        .materials
        .insert(Material::new("lit", 10).with_technique(lit, MaterialQuality::Low, 0.0));
    assets
        .materials
        .insert(Material::new("unlit", 20).with_technique(unlit, MaterialQuality::Low, 0.0));
    assets.materials.insert(
        Material::new("lit_no_shadow", 30).with_technique(no_shadow, MaterialQuality::Low, 0.0),
    );

    assets.geometries.insert(Geometry::new("cube", 1));
    assets
}

pub fn cube(center: Vec3, material: usize) -> Drawable {
    Drawable::new(BoundingBox::from_center_half_size(center, Vec3::splat(0.5)))
        .with_batch(SourceBatch::new(Handle::new(0), Handle::new(material)))
        .with_cast_shadows(true)
}

/// Camera at the origin looking down -Z.
pub fn camera(far: f32) -> Camera {
    Camera::perspective(Transform::IDENTITY, 60f32.to_radians(), 1.0, 1.0, far)
}

pub fn scene_with_cubes(centers: &[Vec3], material: usize) -> Scene {
    let mut scene = Scene::new();
    for &center in centers {
        scene.add_drawable(cube(center, material));
    }
    scene
}
