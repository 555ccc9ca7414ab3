use glam::{Mat4, UVec2, Vec2, Vec3, Vec4};
use log::warn;

use super::drawable_processor::{GeometryStates, ShadowCasterQuery};
use super::frame::{FrameInfo, GeometryRenderFlags};
use super::shadow_map_allocator::ShadowMapRegion;
use super::shadow_split::{ShadowSplit, CUBE_SHADOW_MAP_PADDING};
use crate::error::Result;
use crate::math::{
    combine_hash, make_hash_f32, BoundingBox, FloatRange, Intersection, LARGE_EPSILON, LARGE_VALUE,
};
use crate::scene::{
    Camera, DrawableFlags, Light, LightId, LightType, QueryResult, QueryVolume, MAX_CASCADE_SPLITS,
    MAX_LIGHT_SPLITS,
};
use crate::settings::{ClipSpace, ShadowSettings};

/// Frames split storage survives after a light stops casting shadows.
pub const SPLIT_STORAGE_TTL: u32 = 600;

/// Shadow requests and shadow map space, provided by the scene processor.
pub trait LightProcessorCallback {
    fn is_light_shadowed(&self, light: &Light) -> bool;

    /// Fails when no space is left; the light then renders unshadowed.
    fn allocate_transient_shadow_map(&mut self, size: UVec2) -> Result<ShadowMapRegion>;
}

/// Read-only inputs of [`LightProcessor::update`], shared by all workers.
#[derive(Clone, Copy)]
pub struct LightUpdateContext<'a> {
    pub frame: FrameInfo<'a>,
    pub geometry: &'a GeometryStates,
    pub shadows: &'a ShadowSettings,
}

/// Shader constants of one light, ready for upload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CookedLightParams {
    pub position: Vec3,
    /// Points towards the light.
    pub direction: Vec3,
    /// Zero for directional lights.
    pub inv_range: f32,
    pub radius: f32,
    pub length: f32,
    pub fade: f32,
    pub color: Vec3,
    pub color_linear: Vec3,
    pub specular_intensity: f32,
    pub cutoff: f32,
    pub inv_cutoff: f32,
    pub num_light_matrices: usize,
    pub light_matrices: [Mat4; MAX_CASCADE_SPLITS],
    pub shadow_map_inv_size: Vec2,
    pub shadow_cube_uv_bias: Vec2,
    /// Scale in `xy`, offset in `zw`.
    pub shadow_cube_adjust: Vec4,
    /// `(q, r, fade start, 1 / fade range)`.
    pub shadow_depth_fade: Vec4,
    /// `(1 - intensity, intensity)`.
    pub shadow_intensity: Vec2,
    pub shadow_splits: Vec4,
    pub normal_offset_scale: Vec4,
    pub shadow_depth_bias_multiplier: [f32; MAX_CASCADE_SPLITS],
}

impl Default for CookedLightParams {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            direction: Vec3::Z,
            inv_range: 0.0,
            radius: 0.0,
            length: 0.0,
            fade: 1.0,
            color: Vec3::ZERO,
            color_linear: Vec3::ZERO,
            specular_intensity: 0.0,
            cutoff: -2.0,
            inv_cutoff: 1.0,
            num_light_matrices: 0,
            light_matrices: [Mat4::IDENTITY; MAX_CASCADE_SPLITS],
            shadow_map_inv_size: Vec2::ZERO,
            shadow_cube_uv_bias: Vec2::ZERO,
            shadow_cube_adjust: Vec4::ZERO,
            shadow_depth_fade: Vec4::ZERO,
            shadow_intensity: Vec2::new(0.0, 1.0),
            shadow_splits: Vec4::splat(LARGE_VALUE),
            normal_offset_scale: Vec4::ZERO,
            shadow_depth_bias_multiplier: [1.0; MAX_CASCADE_SPLITS],
        }
    }
}

/// Per-light frame state: lit geometry, shadow cameras and cooked constants.
///
/// Cached across frames by [`super::LightProcessorCache`]. The processor
/// never holds the light itself; every phase receives it explicitly.
#[derive(Debug)]
pub struct LightProcessor {
    light_id: LightId,
    light_index: usize,

    has_shadow: bool,
    num_splits: usize,
    splits: Vec<ShadowSplit>,
    split_ttl: u32,

    lit_geometries: Vec<usize>,
    has_forward_lit_geometries: bool,
    shadow_caster_candidates: Vec<usize>,
    claimed_drawables: Vec<usize>,
    camera_inside_volume: bool,

    shadow_map_size: UVec2,
    shadow_map: Option<ShadowMapRegion>,

    params: CookedLightParams,
    forward_lit_hash: u32,
    light_volume_hash: u32,
    split_shadow_hashes: [u32; MAX_LIGHT_SPLITS],
}

impl LightProcessor {
    pub fn new(light_id: LightId) -> Self {
        Self {
            light_id,
            light_index: 0,
            has_shadow: false,
            num_splits: 0,
            splits: Vec::new(),
            split_ttl: 0,
            lit_geometries: Vec::new(),
            has_forward_lit_geometries: false,
            shadow_caster_candidates: Vec::new(),
            claimed_drawables: Vec::new(),
            camera_inside_volume: false,
            shadow_map_size: UVec2::ZERO,
            shadow_map: None,
            params: CookedLightParams::default(),
            forward_lit_hash: 0,
            light_volume_hash: 0,
            split_shadow_hashes: [0; MAX_LIGHT_SPLITS],
        }
    }

    pub fn light_id(&self) -> LightId {
        self.light_id
    }

    /// Index of the light in this frame's visible lights.
    pub fn light_index(&self) -> usize {
        self.light_index
    }

    pub fn has_shadow(&self) -> bool {
        self.has_shadow
    }

    pub fn num_splits(&self) -> usize {
        self.num_splits
    }

    /// Active shadow splits.
    pub fn splits(&self) -> &[ShadowSplit] {
        &self.splits[..self.num_splits.min(self.splits.len())]
    }

    pub fn lit_geometries(&self) -> &[usize] {
        &self.lit_geometries
    }

    pub fn has_lit_geometries(&self) -> bool {
        !self.lit_geometries.is_empty()
    }

    pub fn has_forward_lit_geometries(&self) -> bool {
        self.has_forward_lit_geometries
    }

    pub fn camera_inside_volume(&self) -> bool {
        self.camera_inside_volume
    }

    pub fn shadow_map_size(&self) -> UVec2 {
        self.shadow_map_size
    }

    pub fn shadow_map(&self) -> Option<&ShadowMapRegion> {
        self.shadow_map.as_ref()
    }

    pub fn params(&self) -> &CookedLightParams {
        &self.params
    }

    /// Hash of everything about the light that affects forward shaders.
    pub fn forward_lit_hash(&self) -> u32 {
        self.forward_lit_hash
    }

    pub fn light_volume_hash(&self) -> u32 {
        self.light_volume_hash
    }

    pub fn split_shadow_hash(&self, split: usize) -> u32 {
        self.split_shadow_hashes.get(split).copied().unwrap_or(0)
    }

    /// Drawables this light claimed as shadow casters while they had not
    /// been processed yet this frame.
    pub(crate) fn claimed_drawables(&self) -> &[usize] {
        &self.claimed_drawables
    }

    /// Main thread, before [`LightProcessor::update`].
    pub fn begin_update(
        &mut self,
        light: &Light,
        light_index: usize,
        callback: &dyn LightProcessorCallback,
    ) {
        self.light_index = light_index;
        self.lit_geometries.clear();
        self.shadow_caster_candidates.clear();
        self.claimed_drawables.clear();
        self.has_forward_lit_geometries = false;
        self.shadow_map = None;
        self.shadow_map_size = UVec2::ZERO;

        self.has_shadow = callback.is_light_shadowed(light);
        if self.has_shadow {
            self.split_ttl = SPLIT_STORAGE_TTL;
            self.num_splits = light.num_shadow_splits();
            let max_splits = light.light_type.max_splits();
            while self.splits.len() < max_splits {
                let index = self.splits.len();
                self.splits.push(ShadowSplit::new(index));
            }
        } else {
            self.num_splits = 0;
            self.split_ttl = self.split_ttl.saturating_sub(1);
            if self.split_ttl == 0 {
                self.splits = Vec::new();
            }
        }

        for split in &mut self.splits {
            split.reset();
        }
    }

    /// Worker thread. Collects lit geometry, sets up shadow cameras and
    /// filters shadow casters for every split.
    pub fn update(&mut self, light: &Light, ctx: &LightUpdateContext<'_>) {
        let camera = ctx.frame.camera;

        self.camera_inside_volume = match light.light_type {
            LightType::Directional => true,
            LightType::Spot => light.frustum().is_inside_point(camera.position()),
            LightType::Point => light.sphere().contains_point(camera.position()),
        };

        self.collect_lit_geometries(light, ctx);
        self.has_forward_lit_geometries = self
            .lit_geometries
            .iter()
            .any(|&index| ctx.geometry.flags(index).contains(GeometryRenderFlags::FORWARD_LIT));

        if !self.has_shadow {
            return;
        }

        self.setup_shadow_cameras(light, ctx);
        self.collect_shadow_casters(light, ctx);

        if !self.splits().iter().any(ShadowSplit::has_shadow_casters) {
            self.has_shadow = false;
            self.num_splits = 0;
            return;
        }

        let split_size = if light.light_type == LightType::Point {
            ctx.shadows.point_split_size
        } else {
            ctx.shadows.split_size
        };
        self.shadow_map_size = UVec2::splat(split_size) * self.splits_grid_size();
    }

    /// Main thread, in shadow map size order. Allocates the shadow map and
    /// cooks shader parameters.
    pub fn end_update(
        &mut self,
        light: &Light,
        camera: &Camera,
        callback: &mut dyn LightProcessorCallback,
        shadows: &ShadowSettings,
    ) {
        if self.has_shadow {
            match callback.allocate_transient_shadow_map(self.shadow_map_size) {
                Ok(region) => {
                    let grid = self.splits_grid_size();
                    let num_splits = self.num_splits;
                    for (index, split) in self.splits.iter_mut().take(num_splits).enumerate() {
                        split.finalize(light, region.split(index, grid));
                    }
                    self.shadow_map = Some(region);
                }
                Err(err) => {
                    warn!("Shadows disabled for light {:?} this frame: {}", light.id, err);
                    self.has_shadow = false;
                    self.num_splits = 0;
                    for split in &mut self.splits {
                        split.reset();
                    }
                }
            }
        }

        self.update_hashes(light);
        self.cook_parameters(light, camera, shadows.sub_pixel_offset, shadows.clip_space);
    }

    fn collect_lit_geometries(&mut self, light: &Light, ctx: &LightUpdateContext<'_>) {
        let drawables = ctx.frame.index.drawables();
        let light_mask = light.light_mask;

        if light.light_type == LightType::Directional {
            self.lit_geometries.extend(
                ctx.geometry
                    .visible_geometries()
                    .iter()
                    .copied()
                    .filter(|&index| drawables[index].light_mask & light_mask != 0),
            );
            return;
        }

        let mut query = QueryResult::default();
        let frustum = light.frustum();
        let volume = match light.light_type {
            LightType::Spot => QueryVolume::Frustum(&frustum),
            _ => QueryVolume::Sphere(light.sphere()),
        };
        ctx.frame
            .index
            .query(&volume, DrawableFlags::GEOMETRY, ctx.frame.camera.view_mask, &mut query);
        query.geometries.sort_unstable();
        query.geometries.dedup();

        for &index in &query.geometries {
            let Some(drawable) = drawables.get(index) else {
                continue;
            };
            let visible = ctx.geometry.flags(index).contains(GeometryRenderFlags::VISIBLE);
            if visible && drawable.light_mask & light_mask != 0 {
                self.lit_geometries.push(index);
            }
            if self.has_shadow && drawable.cast_shadows && drawable.shadow_mask & light_mask != 0 {
                self.shadow_caster_candidates.push(index);
            }
        }
    }

    fn setup_shadow_cameras(&mut self, light: &Light, ctx: &LightUpdateContext<'_>) {
        let camera = ctx.frame.camera;
        let drawables = ctx.frame.index.drawables();

        match light.light_type {
            LightType::Directional => {
                let cascade = &light.shadow_cascade;
                let scene_z_range = ctx.geometry.scene_z_range();
                let mut near_split = camera.effective_near();
                let mut num_splits = 0;

                for index in 0..light.num_shadow_splits() {
                    if near_split > camera.far {
                        break;
                    }
                    let far_split = camera.far.min(cascade.splits[index]);
                    if far_split <= near_split {
                        break;
                    }

                    let z_range = FloatRange::new(near_split, far_split);
                    let focus_z = if light.shadow_focus.focus {
                        scene_z_range & z_range
                    } else {
                        z_range
                    };
                    let mut focus_box = BoundingBox::UNDEFINED;
                    if light.shadow_focus.focus {
                        for &lit in &self.lit_geometries {
                            if ctx.geometry.z_range(lit).intersects(&focus_z) {
                                focus_box.merge(&drawables[lit].world_bounds);
                            }
                        }
                    }

                    self.splits[index].setup_directional(
                        light,
                        camera,
                        z_range,
                        scene_z_range,
                        &focus_box,
                    );
                    near_split = far_split;
                    num_splits += 1;
                }
                self.num_splits = num_splits;
            }
            LightType::Spot => {
                self.splits[0].setup_spot(light);
                self.num_splits = 1;
            }
            LightType::Point => {
                for (face, split) in self.splits.iter_mut().enumerate().take(MAX_LIGHT_SPLITS) {
                    split.setup_point(light, face);
                }
                self.num_splits = MAX_LIGHT_SPLITS;
            }
        }
    }

    fn collect_shadow_casters(&mut self, light: &Light, ctx: &LightUpdateContext<'_>) {
        let camera = ctx.frame.camera;
        let camera_frustum = camera.frustum();
        let scene_z_range = ctx.geometry.scene_z_range();
        let drawables = ctx.frame.index.drawables();

        let Self {
            splits,
            num_splits,
            shadow_caster_candidates,
            claimed_drawables,
            ..
        } = self;
        let mut directional_candidates = Vec::new();
        let mut query = QueryResult::default();

        for split in splits.iter_mut().take(*num_splits) {
            split.shadow_casters.clear();
            let shadow_frustum = split.shadow_camera().frustum();

            let candidates: &[usize] = match light.light_type {
                LightType::Point => {
                    let face_box = shadow_frustum.bounding_box();
                    if camera_frustum.is_inside_fast(&face_box) == Intersection::Outside {
                        continue;
                    }
                    shadow_caster_candidates.as_slice()
                }
                LightType::Spot => shadow_caster_candidates.as_slice(),
                LightType::Directional => {
                    if !scene_z_range.intersects(&split.z_range()) {
                        continue;
                    }
                    query.clear();
                    ctx.frame.index.query(
                        &QueryVolume::Frustum(&shadow_frustum),
                        DrawableFlags::GEOMETRY,
                        camera.view_mask,
                        &mut query,
                    );
                    directional_candidates.clear();
                    directional_candidates.extend(query.geometries.iter().copied().filter(|&index| {
                        drawables.get(index).is_some_and(|d| {
                            d.cast_shadows && d.shadow_mask & light.light_mask != 0
                        })
                    }));
                    directional_candidates.sort_unstable();
                    directional_candidates.dedup();
                    &directional_candidates
                }
            };

            let shadow_camera = *split.shadow_camera();
            let caster_query = ShadowCasterQuery {
                camera,
                drawables,
                split_z_range: split.z_range(),
                light_type: light.light_type,
                shadow_camera: &shadow_camera,
            };
            ctx.geometry.preprocess_shadow_casters(
                &caster_query,
                candidates,
                &mut split.shadow_casters,
                claimed_drawables,
            );
        }
    }

    /// Layout of split cells inside the light's shadow map.
    pub fn splits_grid_size(&self) -> UVec2 {
        match self.num_splits {
            0 | 1 => UVec2::new(1, 1),
            2 => UVec2::new(2, 1),
            3..=5 => UVec2::new(2, 2),
            _ => UVec2::new(3, 2),
        }
    }

    fn depth_bias_multiplier(&self, light: &Light, split: usize) -> f32 {
        if light.light_type != LightType::Directional {
            return 1.0;
        }
        let splits = self.splits();
        let (Some(first), Some(current)) = (splits.first(), splits.get(split)) else {
            return 1.0;
        };
        let ratio = (current.z_range().second / first.z_range().second.max(LARGE_EPSILON)).max(1.0);
        1.0 + (ratio - 1.0) * light.shadow_cascade.bias_auto_adjust
    }

    fn update_hashes(&mut self, light: &Light) {
        let bias = &light.shadow_bias;

        let mut hash = light.light_type.hash_bits() & 0x3;
        hash |= u32::from(self.has_shadow) << 2;
        hash |= u32::from(light.has_cookie) << 3;
        hash |= u32::from(light.specular_intensity > 0.0) << 4;
        hash |= u32::from(bias.normal_offset > 0.0) << 5;
        combine_hash(&mut hash, make_hash_f32(bias.constant_bias));
        combine_hash(&mut hash, make_hash_f32(bias.slope_scaled_bias));
        self.forward_lit_hash = hash;

        let mut volume_hash = hash;
        combine_hash(&mut volume_hash, u32::from(self.camera_inside_volume));
        self.light_volume_hash = volume_hash;

        self.split_shadow_hashes = [0; MAX_LIGHT_SPLITS];
        for index in 0..self.num_splits.min(MAX_LIGHT_SPLITS) {
            let multiplier = self.depth_bias_multiplier(light, index);
            let mut split_hash = light.light_type.hash_bits();
            combine_hash(&mut split_hash, make_hash_f32(bias.constant_bias));
            combine_hash(&mut split_hash, make_hash_f32(bias.slope_scaled_bias));
            combine_hash(&mut split_hash, make_hash_f32(multiplier));
            let orthographic = self.splits[index].shadow_camera().is_orthographic();
            combine_hash(&mut split_hash, u32::from(orthographic));
            self.split_shadow_hashes[index] = split_hash;
        }
    }

    fn cook_parameters(
        &mut self,
        light: &Light,
        camera: &Camera,
        sub_pixel_offset: f32,
        clip_space: ClipSpace,
    ) {
        let light_type = light.light_type;
        let fade = light_fade(light, camera);
        let mut params = CookedLightParams {
            position: light.position(),
            direction: light.transform.rotation * Vec3::Z,
            inv_range: if light_type == LightType::Directional {
                0.0
            } else {
                1.0 / light.range.max(f32::EPSILON)
            },
            radius: light.radius,
            length: light.length,
            fade,
            color: light.effective_color().abs() * fade,
            color_linear: srgb_to_linear(light.effective_color().abs()) * fade,
            specular_intensity: light.effective_specular_intensity() * fade,
            ..CookedLightParams::default()
        };

        if light_type == LightType::Spot {
            params.cutoff = (light.fov_radians * 0.5).cos();
            params.inv_cutoff = 1.0 / (1.0 - params.cutoff).max(f32::EPSILON);
        }

        match light_type {
            LightType::Directional => params.num_light_matrices = 0,
            LightType::Spot => {
                params.light_matrices[0] = spot_matrix(light, clip_space);
                params.num_light_matrices = 1;
            }
            LightType::Point => {
                params.light_matrices[0] = Mat4::from_quat(light.transform.rotation);
                params.num_light_matrices = 1;
            }
        }

        let Some(shadow_map) = self.shadow_map else {
            self.params = params;
            return;
        };

        let texture_size = shadow_map.texture_size.as_vec2();
        params.shadow_map_inv_size = Vec2::ONE / texture_size;

        match light_type {
            LightType::Directional => {
                params.num_light_matrices = MAX_CASCADE_SPLITS;
                for (index, split) in self.splits().iter().enumerate().take(MAX_CASCADE_SPLITS) {
                    params.light_matrices[index] =
                        split.shadow_matrix(sub_pixel_offset, clip_space);
                }
            }
            LightType::Spot => {
                params.light_matrices[1] =
                    self.splits[0].shadow_matrix(sub_pixel_offset, clip_space);
                params.num_light_matrices = 2;
            }
            LightType::Point => {
                if let Some(face) = self.splits[0].shadow_map() {
                    let relative_size = face.rect.size().as_vec2() / texture_size;
                    let relative_offset = face.rect.min.as_vec2() / texture_size;
                    let padding = 2.0 * CUBE_SHADOW_MAP_PADDING * params.shadow_map_inv_size;
                    params.shadow_cube_uv_bias = Vec2::ONE - padding / relative_size;
                    let (scale, offset) = match clip_space {
                        ClipSpace::OpenGl => (
                            relative_size * Vec2::new(1.0, -1.0),
                            Vec2::new(0.0, 1.0) + relative_offset * Vec2::new(1.0, -1.0),
                        ),
                        ClipSpace::Direct3D => (relative_size, relative_offset),
                    };
                    params.shadow_cube_adjust = Vec4::new(scale.x, scale.y, offset.x, offset.y);
                }
            }
        }

        let first_camera = self.splits[0].shadow_camera();
        let (near, far) = (first_camera.effective_near(), first_camera.far);
        let q = far / (far - near).max(LARGE_EPSILON);
        let r = -q * near;
        let shadow_range = light.shadow_cascade.shadow_range();
        let view_far = camera.far.max(LARGE_EPSILON);
        let fade_start = light.shadow_cascade.fade_start * shadow_range / view_far;
        let fade_end = shadow_range / view_far;
        let inv_fade_range = 1.0 / (fade_end - fade_start).max(LARGE_EPSILON);
        params.shadow_depth_fade = Vec4::new(q, r, fade_start, inv_fade_range);

        let mut intensity = light.shadow_intensity;
        let (fade_start, fade_end) = (light.shadow_fade_distance, light.shadow_distance);
        if fade_start > 0.0 && fade_end > fade_start {
            let t = ((light_distance(light, camera) - fade_start) / (fade_end - fade_start))
                .clamp(0.0, 1.0);
            intensity += (1.0 - intensity) * t;
        }
        params.shadow_intensity = Vec2::new(1.0 - intensity, intensity);

        let splits = self.splits();
        let mut split_distances = [LARGE_VALUE; 4];
        for (index, distance) in split_distances.iter_mut().enumerate().take(3) {
            if splits.len() > index + 1 {
                *distance = splits[index].z_range().second / view_far;
            }
        }
        params.shadow_splits = Vec4::from_array(split_distances);

        let mut normal_offset = [0.0; 4];
        for (index, split) in splits.iter().enumerate().take(4) {
            normal_offset[index] = split.world_texel_size() * light.shadow_bias.normal_offset;
            params.shadow_depth_bias_multiplier[index] = self.depth_bias_multiplier(light, index);
        }
        params.normal_offset_scale = Vec4::from_array(normal_offset);

        self.params = params;
    }
}

/// Distance from the camera to a local light, zero for directional lights.
fn light_distance(light: &Light, camera: &Camera) -> f32 {
    match light.light_type {
        LightType::Directional => 0.0,
        _ => camera.distance(light.position()),
    }
}

/// Linear fade between the fade distance and the draw distance.
pub fn light_fade(light: &Light, camera: &Camera) -> f32 {
    let (fade_start, fade_end) = (light.fade_distance, light.draw_distance);
    if light.light_type != LightType::Directional
        && fade_start > 0.0
        && fade_end > 0.0
        && fade_start < fade_end
    {
        (1.0 - (light_distance(light, camera) - fade_start) / (fade_end - fade_start)).min(1.0)
    } else {
        1.0
    }
}

/// Projects world positions into the spot light's texture space. The
/// projection is slightly wider than the cone to prevent light spill.
pub fn spot_matrix(light: &Light, clip_space: ClipSpace) -> Mat4 {
    let spot_view =
        Mat4::from_rotation_translation(light.transform.rotation, light.position()).inverse();
    let h = 1.005 / (light.fov_radians * 0.5).tan();
    let w = h / light.aspect.max(f32::EPSILON);
    let spot_proj = Mat4::from_cols(
        Vec4::new(w, 0.0, 0.0, 0.0),
        Vec4::new(0.0, h, 0.0, 0.0),
        Vec4::new(0.0, 0.0, -1.0 / light.range.max(f32::EPSILON), -1.0),
        Vec4::ZERO,
    );
    let (translation, scale) = match clip_space {
        ClipSpace::OpenGl => (Vec3::new(0.5, 0.5, 0.5), Vec3::new(0.5, -0.5, 0.5)),
        ClipSpace::Direct3D => (Vec3::new(0.5, 0.5, 0.0), Vec3::new(0.5, -0.5, 1.0)),
    };
    let tex_adjust =
        Mat4::from_scale_rotation_translation(scale, glam::Quat::IDENTITY, translation);
    tex_adjust * spot_proj * spot_view
}

fn srgb_to_linear(color: Vec3) -> Vec3 {
    let channel = |c: f32| {
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    Vec3::new(channel(color.x), channel(color.y), channel(color.z))
}
