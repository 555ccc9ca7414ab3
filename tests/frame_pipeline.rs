mod common;

use std::sync::Arc;

use common::{CountingBackend, LIT_MATERIAL};
use glam::Vec3;
use scene_pipeline::asset::{AssetLibrary, Handle};
use scene_pipeline::renderer::{
    BatchStateCache, BatchStateCreateContext, BatchStateCreateKey, BatchStateLookupKey, ForwardPass,
    GeometryRenderFlags, PipelineBatch, ScenePass,
};
use scene_pipeline::scene::{Camera, Light, Scene};
use scene_pipeline::{FrameInfo, PipelineSettings, SceneProcessor};

fn run_frame(
    processor: &mut SceneProcessor,
    backend: &mut CountingBackend,
    frame_number: u64,
    scene: &Scene,
    camera: &Camera,
    assets: &AssetLibrary,
) {
    let frame = FrameInfo::new(frame_number, camera, scene, assets).with_workers(4);
    processor.update(&frame, backend);
}

fn opaque(processor: &SceneProcessor) -> &ForwardPass {
    processor
        .pass("opaque")
        .and_then(ScenePass::as_forward)
        .expect("opaque pass")
}

fn state_of<'a>(batches: &'a [PipelineBatch], drawable_index: usize) -> &'a PipelineBatch {
    batches
        .iter()
        .find(|batch| batch.drawable_index == drawable_index)
        .expect("batch for drawable")
}

#[test]
fn draw_distance_excludes_far_drawables() {
    let assets = common::assets();
    let camera = common::camera(100.0);
    let mut scene = Scene::new();
    let near_cube = common::cube(Vec3::new(0.0, 0.0, -2.0), LIT_MATERIAL).with_draw_distance(3.0);
    let far_cube = common::cube(Vec3::new(0.0, 0.0, -5.0), LIT_MATERIAL).with_draw_distance(3.0);
    let near = scene.add_drawable(near_cube);
    let far = scene.add_drawable(far_cube);
    let unlimited = scene.add_drawable(common::cube(Vec3::new(0.0, 0.0, -50.0), LIT_MATERIAL));

    let mut processor = SceneProcessor::with_default_passes(PipelineSettings::default());
    let mut backend = CountingBackend::default();
    run_frame(&mut processor, &mut backend, 1, &scene, &camera, &assets);

    let drawables = processor.drawable_processor();
    assert!(drawables.flags(near).contains(GeometryRenderFlags::VISIBLE));
    assert!(!drawables.flags(far).contains(GeometryRenderFlags::VISIBLE));
    assert!(drawables.flags(unlimited).contains(GeometryRenderFlags::VISIBLE));
    assert!(opaque(&processor).base_batches().iter().all(|batch| batch.drawable_index != far));
}

#[test]
fn identical_drawables_share_pipeline_states() {
    let mut assets = common::assets();
    let camera = common::camera(100.0);
    let centers = [Vec3::new(-1.0, 0.0, -5.0), Vec3::new(1.0, 0.0, -5.0)];
    let mut scene = common::scene_with_cubes(&centers, LIT_MATERIAL);

    scene.add_light(Light::point(Vec3::new(0.0, 0.0, -5.0), 10.0));

    let mut settings = PipelineSettings::default();
    settings.drawable.max_pixel_lights = 1;
    let mut processor = SceneProcessor::with_default_passes(settings);
    let mut backend = CountingBackend::default();
    run_frame(&mut processor, &mut backend, 1, &scene, &camera, &assets);

    let pass = opaque(&processor);
    assert_eq!(pass.base_batches().len(), 2);
    assert_eq!(pass.light_batches().len(), 2);
    assert!(Arc::ptr_eq(
        &pass.base_batches()[0].pipeline_state,
        &pass.base_batches()[1].pipeline_state
    ));
    assert!(Arc::ptr_eq(
        &pass.light_batches()[0].pipeline_state,
        &pass.light_batches()[1].pipeline_state
    ));
    // one unlit base state and one light state
    assert_eq!(backend.batch_states, 2);

    run_frame(&mut processor, &mut backend, 2, &scene, &camera, &assets);
    assert_eq!(backend.batch_states, 2);

    // A second light reaching only the left cube becomes its vertex light.
    scene.add_light(Light::point(Vec3::new(-3.0, 0.0, -5.0), 2.5));
    run_frame(&mut processor, &mut backend, 3, &scene, &camera, &assets);
    let pass = opaque(&processor);
    assert!(!Arc::ptr_eq(
        &state_of(pass.base_batches(), 0).pipeline_state,
        &state_of(pass.base_batches(), 1).pipeline_state
    ));
    let after_light_change = backend.batch_states;
    assert!(after_light_change > 2);

    let material = assets.materials.get_mut(Handle::new(LIT_MATERIAL)).expect("material");
    material.pipeline_state_hash += 1;
    run_frame(&mut processor, &mut backend, 4, &scene, &camera, &assets);
    assert!(backend.batch_states > after_light_change);
}

#[test]
fn main_light_gets_lit_base_batches() {
    let assets = common::assets();
    let camera = common::camera(100.0);
    let mut scene = common::scene_with_cubes(&[Vec3::new(0.0, 0.0, -5.0)], LIT_MATERIAL);
    scene.add_light(Light::directional(Vec3::new(0.0, -1.0, -0.5)));
    scene.add_light(Light::point(Vec3::new(0.0, 1.0, -5.0), 5.0));

    let mut processor = SceneProcessor::with_default_passes(PipelineSettings::default());
    let mut backend = CountingBackend::default();
    run_frame(&mut processor, &mut backend, 1, &scene, &camera, &assets);

    assert_eq!(processor.main_light_index(), Some(0));
    let pass = opaque(&processor);
    assert_eq!(pass.base_batches().len(), 1);
    assert_eq!(pass.base_batches()[0].light_index, Some(0));
    assert_eq!(pass.light_batches().len(), 1);
    assert_eq!(pass.light_batches()[0].light_index, Some(1));
    assert_eq!(pass.sorted_base_batches().len(), 1);
    assert_eq!(pass.sorted_light_batches().len(), 1);
}

#[test]
fn deferred_lighting_emits_light_volumes() {
    let assets = common::assets();
    let camera = common::camera(100.0);
    let mut scene = common::scene_with_cubes(&[Vec3::new(0.0, 0.0, -5.0)], LIT_MATERIAL);
    scene.add_light(Light::point(Vec3::new(0.0, 1.0, -5.0), 5.0));
    scene.add_light(Light::point(Vec3::new(10.0, 0.0, -50.0), 1.0));

    let mut settings = PipelineSettings::default();
    settings.lighting.deferred = true;
    let mut processor = SceneProcessor::with_default_passes(settings);
    let mut backend = CountingBackend::default();
    run_frame(&mut processor, &mut backend, 1, &scene, &camera, &assets);

    let volumes = processor.light_volume_batches();
    assert_eq!(volumes.len(), 1);
    assert_eq!(volumes[0].light_index, 0);
    assert_eq!(backend.light_volume_states, 1);

    run_frame(&mut processor, &mut backend, 2, &scene, &camera, &assets);
    assert_eq!(backend.light_volume_states, 1);
    processor.invalidate_pipeline_state_cache();
    run_frame(&mut processor, &mut backend, 3, &scene, &camera, &assets);
    assert_eq!(backend.light_volume_states, 2);
}

#[test]
fn removed_lights_release_their_processors() {
    let assets = common::assets();
    let camera = common::camera(100.0);
    let mut scene = common::scene_with_cubes(&[Vec3::new(0.0, 0.0, -5.0)], LIT_MATERIAL);
    let id = scene.add_light(Light::point(Vec3::new(0.0, 1.0, -5.0), 5.0));

    let mut processor = SceneProcessor::with_default_passes(PipelineSettings::default());
    let mut backend = CountingBackend::default();
    run_frame(&mut processor, &mut backend, 1, &scene, &camera, &assets);
    assert!(processor.drawable_processor().light_processor_cache().find(id).is_some());

    scene.remove_light(id);
    // the previous frame's visible list still holds the light
    run_frame(&mut processor, &mut backend, 2, &scene, &camera, &assets);
    run_frame(&mut processor, &mut backend, 3, &scene, &camera, &assets);
    assert!(processor.drawable_processor().light_processor_cache().is_empty());
}

#[test]
fn cache_lookup_is_idempotent_and_round_trips() {
    let assets = common::assets();
    let camera = common::camera(100.0);
    let key = BatchStateCreateKey {
        key: BatchStateLookupKey {
            drawable_hash: 7,
            pixel_light_hash: 0,
            geometry_type: Default::default(),
            geometry: Handle::new(0),
            material: Handle::new(LIT_MATERIAL),
            pass: Handle::new(0),
        },
        drawable_index: 0,
        source_batch_index: 0,
        pixel_light_index: None,
    };
    let ctx = BatchStateCreateContext {
        pass_name: "opaque",
        subpass_index: 0,
        camera: &camera,
        light: None,
    };

    let mut cache = BatchStateCache::new();
    assert!(cache.lookup(&key.key, &assets).is_none());
    assert!(cache.lookup(&key.key, &assets).is_none());
    assert!(cache.is_empty());

    let mut backend = CountingBackend::default();
    let created = cache.get_or_create(&key, &ctx, &assets, &mut backend);
    for _ in 0..3 {
        let found = cache.lookup(&key.key, &assets).expect("cached state");
        assert!(Arc::ptr_eq(&created, &found));
    }
    assert_eq!(cache.len(), 1);
    assert_eq!(backend.batch_states, 1);
}
