use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::Transform;
use crate::math::{BoundingBox, Frustum, Sphere, LARGE_VALUE};

/// Minimum near clip of light frusta.
pub const MIN_NEAR_CLIP: f32 = 0.01;
/// Maximum number of directional light cascades.
pub const MAX_CASCADE_SPLITS: usize = 4;
/// Maximum number of shadow splits of any light (cube faces of a point light).
pub const MAX_LIGHT_SPLITS: usize = 6;

/// Stable light identity. The scene never reuses an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct LightId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightType {
    Directional,
    Spot,
    Point,
}

impl LightType {
    pub fn max_splits(self) -> usize {
        match self {
            Self::Directional => MAX_CASCADE_SPLITS,
            Self::Spot => 1,
            Self::Point => MAX_LIGHT_SPLITS,
        }
    }

    pub(crate) fn hash_bits(self) -> u32 {
        match self {
            Self::Directional => 0,
            Self::Spot => 1,
            Self::Point => 2,
        }
    }
}

/// How a light competes for the per-object light budget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightImportance {
    Important,
    #[default]
    Auto,
    NotImportant,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiasParameters {
    pub constant_bias: f32,
    pub slope_scaled_bias: f32,
    pub normal_offset: f32,
}

impl Default for BiasParameters {
    fn default() -> Self {
        Self {
            constant_bias: 0.0002,
            slope_scaled_bias: 0.5,
            normal_offset: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CascadeParameters {
    /// Far view depth of each cascade. Non-positive entries end the table.
    pub splits: [f32; MAX_CASCADE_SPLITS],
    /// Fraction of the shadow range where shadows start fading out.
    pub fade_start: f32,
    /// How much the depth bias grows with cascade size.
    pub bias_auto_adjust: f32,
}

impl Default for CascadeParameters {
    fn default() -> Self {
        Self {
            splits: [1000.0, 0.0, 0.0, 0.0],
            fade_start: 0.8,
            bias_auto_adjust: 1.0,
        }
    }
}

impl CascadeParameters {
    pub fn new(splits: [f32; MAX_CASCADE_SPLITS], fade_start: f32, bias_auto_adjust: f32) -> Self {
        Self {
            splits,
            fade_start,
            bias_auto_adjust,
        }
    }

    pub fn num_splits(&self) -> usize {
        self.splits.iter().take_while(|&&split| split > 0.0).count().max(1)
    }

    pub fn shadow_range(&self) -> f32 {
        self.splits.iter().copied().fold(0.0, f32::max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocusParameters {
    /// Clip cascades to the bounds of lit geometry.
    pub focus: bool,
    /// Fit a box instead of a sphere.
    pub non_uniform: bool,
    /// Size quantization step.
    pub quantize: f32,
    /// Minimum view size.
    pub min_view: f32,
}

impl Default for FocusParameters {
    fn default() -> Self {
        Self {
            focus: true,
            non_uniform: true,
            quantize: 0.5,
            min_view: 3.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Light {
    pub id: LightId,
    pub light_type: LightType,
    pub transform: Transform,
    pub color: Vec3,
    /// Negative brightness produces a subtractive light.
    pub brightness: f32,
    pub specular_intensity: f32,
    pub range: f32,
    pub fov_radians: f32,
    pub aspect: f32,
    pub radius: f32,
    pub length: f32,
    pub importance: LightImportance,
    pub view_mask: u32,
    pub light_mask: u32,
    pub cast_shadows: bool,
    /// Shadow darkness, 0 is fully dark and 1 disables the shadow.
    pub shadow_intensity: f32,
    pub shadow_distance: f32,
    pub shadow_fade_distance: f32,
    pub fade_distance: f32,
    pub draw_distance: f32,
    pub shadow_near_far_ratio: f32,
    pub shadow_max_extrusion: f32,
    pub shadow_bias: BiasParameters,
    pub shadow_cascade: CascadeParameters,
    pub shadow_focus: FocusParameters,
    pub has_cookie: bool,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            id: LightId::default(),
            light_type: LightType::Point,
            transform: Transform::IDENTITY,
            color: Vec3::ONE,
            brightness: 1.0,
            specular_intensity: 1.0,
            range: 10.0,
            fov_radians: 30f32.to_radians(),
            aspect: 1.0,
            radius: 0.0,
            length: 0.0,
            importance: LightImportance::Auto,
            view_mask: u32::MAX,
            light_mask: u32::MAX,
            cast_shadows: false,
            shadow_intensity: 0.0,
            shadow_distance: 0.0,
            shadow_fade_distance: 0.0,
            fade_distance: 0.0,
            draw_distance: 0.0,
            shadow_near_far_ratio: 0.002,
            shadow_max_extrusion: 1000.0,
            shadow_bias: BiasParameters::default(),
            shadow_cascade: CascadeParameters::default(),
            shadow_focus: FocusParameters::default(),
            has_cookie: false,
        }
    }
}

impl Light {
    pub fn directional(direction: Vec3) -> Self {
        Self {
            light_type: LightType::Directional,
            transform: Transform::looking_to(Vec3::ZERO, direction),
            ..Self::default()
        }
    }

    pub fn point(position: Vec3, range: f32) -> Self {
        Self {
            light_type: LightType::Point,
            transform: Transform::from_translation_rotation(position, Quat::IDENTITY),
            range,
            ..Self::default()
        }
    }

    pub fn spot(position: Vec3, direction: Vec3, fov_radians: f32, range: f32) -> Self {
        Self {
            light_type: LightType::Spot,
            transform: Transform::looking_to(position, direction),
            fov_radians,
            range,
            ..Self::default()
        }
    }

    pub fn with_shadows(mut self, cast_shadows: bool) -> Self {
        self.cast_shadows = cast_shadows;
        self
    }

    pub fn with_color(mut self, color: Vec3, brightness: f32) -> Self {
        self.color = color;
        self.brightness = brightness;
        self
    }

    pub fn with_importance(mut self, importance: LightImportance) -> Self {
        self.importance = importance;
        self
    }

    pub fn with_cascade(mut self, cascade: CascadeParameters) -> Self {
        self.shadow_cascade = cascade;
        self
    }

    pub fn position(&self) -> Vec3 {
        self.transform.translation
    }

    pub fn direction(&self) -> Vec3 {
        self.transform.forward()
    }

    pub fn effective_color(&self) -> Vec3 {
        self.color * self.brightness
    }

    pub fn effective_specular_intensity(&self) -> f32 {
        self.specular_intensity * self.brightness.abs()
    }

    pub fn is_negative(&self) -> bool {
        self.effective_color().element_sum() < 0.0
    }

    /// Divides distance when ranking lights, so brighter lights rank higher.
    pub fn intensity_divisor(&self) -> f32 {
        self.effective_color().abs().element_sum() + f32::EPSILON
    }

    /// Normalized distance from the light to a bounding box. Zero for directional lights.
    pub fn distance_to(&self, bounds: &BoundingBox) -> f32 {
        match self.light_type {
            LightType::Directional => 0.0,
            _ => bounds.distance_to_point(self.position()) / self.range.max(f32::EPSILON),
        }
    }

    pub fn num_shadow_splits(&self) -> usize {
        match self.light_type {
            LightType::Directional => self.shadow_cascade.num_splits(),
            LightType::Spot => 1,
            LightType::Point => MAX_LIGHT_SPLITS,
        }
    }

    /// Spot light volume in world space.
    pub fn frustum(&self) -> Frustum {
        let world = Mat4::from_rotation_translation(self.transform.rotation, self.position());
        Frustum::perspective(self.fov_radians, self.aspect, 1.0, MIN_NEAR_CLIP, self.range, &world)
    }

    pub fn sphere(&self) -> Sphere {
        Sphere::new(self.position(), self.range)
    }

    pub fn world_bounds(&self) -> BoundingBox {
        match self.light_type {
            LightType::Directional => {
                BoundingBox::new(Vec3::splat(-LARGE_VALUE), Vec3::splat(LARGE_VALUE))
            }

            LightType::Spot => self.frustum().bounding_box(),
            LightType::Point => self.sphere().bounding_box(),
        }
    }
}
