use glam::Vec3;

use crate::scene::{LightImportance, LightType};

/// Number of vertex light slots exposed to shaders.
pub const MAX_VERTEX_LIGHTS: usize = 4;

/// Per-frame parameters shared by all drawables lit by one light.
#[derive(Debug, Clone, Copy)]
pub struct LightAccumulatorContext {
    pub max_pixel_lights: usize,
    pub max_vertex_lights: usize,
    pub importance: LightImportance,
    pub light_index: usize,
}

/// Ranking of a light for one drawable. Lower is better:
/// -2 important directional, -1 other important, 0..2 automatic, 3..5 not important.
pub fn light_penalty(
    intensity_penalty: f32,
    importance: LightImportance,
    light_type: LightType,
) -> f32 {
    match importance {
        LightImportance::Important => {
            if light_type == LightType::Directional {
                -2.0
            } else {
                -1.0
            }
        }
        LightImportance::Auto => {
            if intensity_penalty <= 1.0 {
                intensity_penalty
            } else {
                2.0 - 1.0 / intensity_penalty
            }
        }
        LightImportance::NotImportant => {
            if intensity_penalty <= 1.0 {
                3.0 + intensity_penalty
            } else {
                5.0 - 1.0 / intensity_penalty
            }
        }
    }
}

/// Lights affecting one drawable, kept sorted by `(penalty, light index)`.
#[derive(Debug, Clone, Default)]
pub struct LightAccumulator {
    lights: Vec<(f32, usize)>,
    num_important: usize,
    first_vertex_light: usize,
    /// Ambient color from GI and zone.
    pub ambient: Vec3,
}

impl LightAccumulator {
    pub fn reset_lights(&mut self) {
        self.lights.clear();
        self.num_important = 0;
        self.first_vertex_light = 0;
    }

    pub fn accumulate(&mut self, ctx: &LightAccumulatorContext, penalty: f32) {
        let penalty = if ctx.importance == LightImportance::Important {
            self.num_important += 1;
            -1.0
        } else {
            penalty
        };

        let entry = (penalty, ctx.light_index);
        let position = self
            .lights
            .partition_point(|&(p, i)| p.total_cmp(&penalty).then(i.cmp(&ctx.light_index)).is_lt());
        self.lights.insert(position, entry);

        self.first_vertex_light = ctx.max_pixel_lights.max(self.num_important);
        let max_lights = self.first_vertex_light + ctx.max_vertex_lights.min(MAX_VERTEX_LIGHTS);
        self.lights.truncate(max_lights);
    }

    /// Pixel lights, best first, as `(penalty, light index)`.
    pub fn pixel_lights(&self) -> &[(f32, usize)] {
        &self.lights[..self.first_vertex_light.min(self.lights.len())]
    }

    pub fn vertex_lights(&self) -> [Option<usize>; MAX_VERTEX_LIGHTS] {
        std::array::from_fn(|i| {
            self.lights
                .get(self.first_vertex_light + i)
                .map(|&(_, index)| index)
        })
    }

    pub fn num_lights(&self) -> usize {
        self.lights.len()
    }
}
