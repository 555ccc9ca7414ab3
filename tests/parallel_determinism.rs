mod common;

use common::{CountingBackend, LIT_MATERIAL, NO_SHADOW_MATERIAL, UNLIT_MATERIAL};
use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use scene_pipeline::renderer::{PipelineBatch, ScenePass};
use scene_pipeline::scene::{Light, Scene};
use scene_pipeline::{FrameInfo, PipelineSettings, SceneProcessor};

type BatchSignature = (usize, usize, Option<usize>, usize, u32);

fn signature(batches: &[PipelineBatch]) -> Vec<BatchSignature> {
    batches
        .iter()
        .map(|batch| {
            (
                batch.drawable_index,
                batch.source_batch_index,
                batch.light_index,
                batch.pass.index(),
                batch.pipeline_state.shader_hash(),
            )
        })
        .collect()
}

fn random_scene(seed: u64) -> Scene {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut scene = Scene::new();
    let materials = [LIT_MATERIAL, UNLIT_MATERIAL, NO_SHADOW_MATERIAL];
    for _ in 0..300 {
        let center = Vec3::new(
            rng.gen_range(-30.0..30.0),
            rng.gen_range(-5.0..5.0),
            rng.gen_range(-80.0..-2.0),
        );
        let material = materials[rng.gen_range(0..materials.len())];
        let mut drawable = common::cube(center, material).with_cast_shadows(rng.gen_bool(0.8));
        if rng.gen_bool(0.1) {
            drawable.draw_distance = rng.gen_range(10.0..60.0);
        }
        scene.add_drawable(drawable);
    }
    for _ in 0..12 {
        let position = Vec3::new(
            rng.gen_range(-30.0..30.0),
            rng.gen_range(0.0..8.0),
            rng.gen_range(-80.0..-2.0),
        );
        let light = if rng.gen_bool(0.5) {
            Light::point(position, rng.gen_range(3.0..15.0))
        } else {
            Light::spot(position, Vec3::NEG_Y, rng.gen_range(0.5..1.5), rng.gen_range(5.0..20.0))
        };
        scene.add_light(light.with_shadows(rng.gen_bool(0.5)));
    }
    scene.add_light(Light::directional(Vec3::new(0.3, -1.0, -0.4)).with_shadows(true));
    scene
}

/// Everything a frame produced, in output order.
#[derive(Debug, PartialEq)]
struct FrameOutput {
    visible: Vec<usize>,
    queued: Vec<usize>,
    base: Vec<Vec<BatchSignature>>,
    light: Vec<Vec<BatchSignature>>,
    shadow: Vec<(usize, usize, Vec<BatchSignature>)>,
    shadowed_lights: Vec<bool>,
}

fn update(processor: &mut SceneProcessor, scene: &Scene, frame_number: u64, num_workers: usize) {
    let assets = common::assets();
    let camera = common::camera(100.0);
    let mut backend = CountingBackend::default();
    let frame = FrameInfo::new(frame_number, &camera, scene, &assets).with_workers(num_workers);
    processor.update(&frame, &mut backend);
}

fn run(scene: &Scene, num_workers: usize) -> FrameOutput {
    let mut processor = SceneProcessor::with_default_passes(PipelineSettings::default());
    update(&mut processor, scene, 1, num_workers);
    capture(&processor)
}

fn capture(processor: &SceneProcessor) -> FrameOutput {
    let drawables = processor.drawable_processor();
    let mut output = FrameOutput {
        visible: drawables.geometry().visible_geometries().to_vec(),
        queued: drawables.queued_updates().to_vec(),
        base: Vec::new(),
        light: Vec::new(),
        shadow: Vec::new(),
        shadowed_lights: drawables.light_processors().map(|light| light.has_shadow()).collect(),
    };
    for pass in processor.passes() {
        match pass {
            ScenePass::Shadow(shadow) => {
                for split in shadow.split_batches() {
                    output
                        .shadow
                        .push((split.light_index, split.split_index, signature(&split.batches)));
                }
            }
            _ => {
                if let Some(forward) = pass.as_forward() {
                    output.base.push(signature(forward.base_batches()));
                    output.light.push(signature(forward.light_batches()));
                }
            }
        }
    }
    output
}

#[test]
fn worker_count_does_not_change_results() {
    for seed in [1, 7, 42] {
        let scene = random_scene(seed);
        let single = run(&scene, 1);
        assert!(!single.visible.is_empty());
        for workers in [2, 3, 8] {
            assert_eq!(single, run(&scene, workers), "seed {seed}, {workers} workers");
        }
    }
}

#[test]
fn repeated_frame_number_ignores_lights_that_left() {
    for seed in [1, 7] {
        let full = random_scene(seed);
        let mut reduced = random_scene(seed);
        let removed: Vec<_> = reduced.lights().iter().rev().skip(2).map(|light| light.id).collect();
        for id in removed {
            reduced.remove_light(id);
        }
        assert_eq!(reduced.lights().len(), 2);

        let fresh = run(&reduced, 4);
        assert!(!fresh.queued.is_empty(), "seed {seed}");

        let mut processor = SceneProcessor::with_default_passes(PipelineSettings::default());
        update(&mut processor, &full, 1, 4);
        update(&mut processor, &reduced, 1, 4);
        assert_eq!(fresh, capture(&processor), "seed {seed}");
    }
}
