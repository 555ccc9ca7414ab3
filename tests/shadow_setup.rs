mod common;

use common::{CountingBackend, LIT_MATERIAL, NO_SHADOW_MATERIAL};
use glam::{UVec2, Vec2, Vec3};
use scene_pipeline::asset::AssetLibrary;
use scene_pipeline::math::FloatRange;
use scene_pipeline::renderer::shadow_split::quantize_view_size;
use scene_pipeline::renderer::{ScenePass, ShadowPass, ShadowSplit};
use scene_pipeline::scene::{Camera, CascadeParameters, FocusParameters, Light, Scene};
use scene_pipeline::{FrameInfo, PipelineSettings, SceneProcessor};

fn process(
    settings: PipelineSettings,
    scene: &Scene,
    camera: &Camera,
    assets: &AssetLibrary,
) -> SceneProcessor {
    let mut processor = SceneProcessor::with_default_passes(settings);
    let mut backend = CountingBackend::default();
    let frame = FrameInfo::new(1, camera, scene, assets).with_workers(4);
    processor.update(&frame, &mut backend);
    processor
}

fn shadow_pass(processor: &SceneProcessor) -> &ShadowPass {
    processor
        .pass("shadow")
        .and_then(ScenePass::as_shadow)
        .expect("shadow pass")
}

fn spot() -> Light {
    Light::spot(Vec3::new(0.0, 5.0, -5.0), Vec3::NEG_Y, 90f32.to_radians(), 20.0).with_shadows(true)
}

#[test]
fn directional_light_uses_four_cascades() {
    let assets = common::assets();
    let camera = common::camera(1000.0);
    let mut scene = common::scene_with_cubes(
        &[
            Vec3::new(0.0, 0.0, -5.0),
            Vec3::new(0.0, 0.0, -50.0),
            Vec3::new(0.0, 0.0, -200.0),
            Vec3::new(0.0, 0.0, -900.0),
        ],
        LIT_MATERIAL,
    );
    scene.add_light(
        Light::directional(Vec3::new(0.0, -1.0, -0.1))
            .with_shadows(true)
            .with_cascade(CascadeParameters::new([10.0, 100.0, 400.0, 1000.0], 0.8, 1.0)),
    );

    let processor = process(PipelineSettings::default(), &scene, &camera, &assets);
    let light = processor.drawable_processor().light_processor(0).expect("light processor");

    assert!(light.has_shadow());
    let ranges: Vec<FloatRange> = light.splits().iter().map(ShadowSplit::z_range).collect();
    assert_eq!(
        ranges,
        vec![
            FloatRange::new(1.0, 10.0),
            FloatRange::new(10.0, 100.0),
            FloatRange::new(100.0, 400.0),
            FloatRange::new(400.0, 1000.0),
        ]
    );
    assert_eq!(light.shadow_map_size(), UVec2::splat(1024));
    assert!(!shadow_pass(&processor).split_batches().is_empty());
}

#[test]
fn split_counts_follow_light_type() {
    let assets = common::assets();
    let camera = common::camera(50.0);
    let centers = [Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, -40.0)];
    let mut scene = common::scene_with_cubes(&centers, LIT_MATERIAL);
    scene.add_light(
        Light::directional(Vec3::NEG_Y)
            .with_shadows(true)
            .with_cascade(CascadeParameters::new([10.0, 100.0, 400.0, 1000.0], 0.8, 1.0)),
    );
    scene.add_light(spot());
    scene.add_light(Light::point(Vec3::new(0.0, 2.0, -5.0), 10.0).with_shadows(true));

    let processor = process(PipelineSettings::default(), &scene, &camera, &assets);
    let splits: Vec<usize> = processor
        .drawable_processor()
        .light_processors()
        .map(|light| light.num_splits())
        .collect();
    // the cascades starting beyond the far clip are dropped
    assert_eq!(splits, vec![2, 1, 6]);
}

#[test]
fn non_casters_never_reach_shadow_batches() {
    let assets = common::assets();
    let camera = common::camera(100.0);
    let mut scene = Scene::new();
    scene.add_drawable(common::cube(Vec3::new(-1.0, 0.0, -5.0), LIT_MATERIAL));
    let hidden = scene.add_drawable(
        common::cube(Vec3::new(1.0, 0.0, -5.0), LIT_MATERIAL).with_cast_shadows(false),
    );
    let no_pass = scene.add_drawable(common::cube(Vec3::new(0.0, 0.0, -7.0), NO_SHADOW_MATERIAL));
    scene.add_light(spot());
    scene.add_light(Light::point(Vec3::new(0.0, 2.0, -5.0), 10.0).with_shadows(true));
    scene.add_light(Light::directional(Vec3::new(0.0, -1.0, -0.2)).with_shadows(true));

    let processor = process(PipelineSettings::default(), &scene, &camera, &assets);
    let pass = shadow_pass(&processor);
    assert!(!pass.split_batches().is_empty());
    for split in pass.split_batches() {
        assert!(split.batches.iter().all(|batch| batch.drawable_index != hidden));
        assert!(split.batches.iter().all(|batch| batch.drawable_index != no_pass));
        assert_eq!(split.sorted.len(), split.batches.len());
    }
    assert!(pass.batches_for(0, 0).iter().any(|batch| batch.drawable_index == 0));
}

#[test]
fn failed_point_allocation_drops_its_shadows() {
    let assets = common::assets();
    let camera = common::camera(100.0);
    let mut scene = common::scene_with_cubes(&[Vec3::new(0.0, 0.0, -5.0)], LIT_MATERIAL);
    scene.add_light(Light::point(Vec3::new(0.0, 2.0, -5.0), 10.0).with_shadows(true));

    let mut settings = PipelineSettings::default();
    settings.shadows.max_pages = 0;
    let processor = process(settings, &scene, &camera, &assets);

    let light = processor.drawable_processor().light_processor(0).expect("light processor");
    assert!(!light.has_shadow());
    assert!(light.shadow_map().is_none());
    assert!(light.has_lit_geometries());
    assert!(shadow_pass(&processor).split_batches().is_empty());
}

#[test]
fn disabled_shadows_skip_the_shadow_pass() {
    let assets = common::assets();
    let camera = common::camera(100.0);
    let mut scene = common::scene_with_cubes(&[Vec3::new(0.0, 0.0, -5.0)], LIT_MATERIAL);
    scene.add_light(spot());

    let mut settings = PipelineSettings::default();
    settings.shadows.enable_shadows = false;
    let processor = process(settings, &scene, &camera, &assets);

    let light = processor.drawable_processor().light_processor(0);
    assert!(!light.is_some_and(|light| light.has_shadow()));
    assert!(shadow_pass(&processor).split_batches().is_empty());
    assert_eq!(processor.shadow_map_allocator().num_pages(), 0);
}

#[test]
fn quantized_view_size_is_stable() {
    let focus = FocusParameters::default();
    let sizes = [
        Vec2::new(0.3, 0.7),
        Vec2::new(4.2, 9.9),
        Vec2::new(37.0, 12.5),
        Vec2::splat(250.0),
    ];
    for size in sizes {
        let once = quantize_view_size(size, &focus);
        assert!(once.x >= size.x && once.y >= size.y);
        assert_eq!(quantize_view_size(once, &focus), once);
    }
}
