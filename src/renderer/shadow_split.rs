use glam::{Mat4, Quat, Vec2, Vec3};

use super::shadow_map_allocator::ShadowMapRegion;
use crate::math::{BoundingBox, FloatRange, Polyhedron, Sphere};
use crate::scene::{Camera, FocusParameters, Light, LightType, Projection, Transform};
use crate::settings::ClipSpace;

/// Texels kept free around each point light face so filtering never crosses
/// into a neighbouring face.
pub const CUBE_SHADOW_MAP_PADDING: f32 = 2.0;

/// Absorbs float noise so that quantizing a quantized size is a no-op.
const QUANTIZE_EPSILON: f32 = 1e-4;

const CUBE_FACE_DIRECTIONS: [Vec3; 6] =
    [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z];
const CUBE_FACE_UPS: [Vec3; 6] = [Vec3::Y, Vec3::Y, Vec3::Z, Vec3::NEG_Z, Vec3::Y, Vec3::Y];

/// One shadow-casting camera of a light: a cascade, the spot frustum or a
/// cube face.
#[derive(Debug, Clone)]
pub struct ShadowSplit {
    index: usize,
    z_range: FloatRange,
    camera: Camera,
    shadow_map: Option<ShadowMapRegion>,
    world_texel_size: f32,
    pub(crate) shadow_casters: Vec<usize>,
}

impl ShadowSplit {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            z_range: FloatRange::EMPTY,
            camera: Camera::default(),
            shadow_map: None,
            world_texel_size: 0.0,
            shadow_casters: Vec::new(),
        }
    }

    /// Position in the owning light processor's split list.
    pub fn index(&self) -> usize {
        self.index
    }

    /// View depth range covered by a cascade.
    pub fn z_range(&self) -> FloatRange {
        self.z_range
    }

    pub fn shadow_camera(&self) -> &Camera {
        &self.camera
    }

    pub fn shadow_map(&self) -> Option<&ShadowMapRegion> {
        self.shadow_map.as_ref()
    }

    pub fn shadow_casters(&self) -> &[usize] {
        &self.shadow_casters
    }

    pub fn has_shadow_casters(&self) -> bool {
        !self.shadow_casters.is_empty()
    }

    /// Size of one shadow map texel in world units.
    pub fn world_texel_size(&self) -> f32 {
        self.world_texel_size
    }

    pub(crate) fn reset(&mut self) {
        self.shadow_casters.clear();
        self.shadow_map = None;
        self.world_texel_size = 0.0;
    }

    /// Orthographic camera covering `z_range` of the cull camera.
    ///
    /// `focus_box` is the bounds of lit geometry overlapping the range; with
    /// focusing enabled the covered volume is clipped to it.
    pub(crate) fn setup_directional(
        &mut self,
        light: &Light,
        cull_camera: &Camera,
        z_range: FloatRange,
        scene_z_range: FloatRange,
        focus_box: &BoundingBox,
    ) {
        let focus = &light.shadow_focus;
        self.z_range = z_range;

        let extrusion = cull_camera.far.min(light.shadow_max_extrusion);
        let position = cull_camera.position() - light.direction() * extrusion;
        self.camera = Camera {
            transform: Transform::from_translation_rotation(position, light.transform.rotation),
            projection: Projection::Orthographic { size: 1.0 },
            near: 0.0,
            far: 1.0,
            aspect: 1.0,
            zoom: 1.0,
            lod_bias: 1.0,
            view_mask: cull_camera.view_mask,
        };

        let split_z = if focus.focus { scene_z_range & z_range } else { z_range };
        let split_frustum = cull_camera.split_frustum(split_z.first, split_z.second);
        let mut volume = Polyhedron::from_frustum(&split_frustum);

        if focus.focus && focus_box.is_defined() {
            volume.clip_box(focus_box);
            if volume.is_empty() {
                log::debug!(
                    "Focused shadow volume of light {:?} is empty, using the whole split",
                    light.id
                );
                volume = Polyhedron::from_frustum(&split_frustum);
            }
        }

        volume.transform(&self.camera.view());
        let shadow_box = if focus.non_uniform {
            volume.bounding_box()
        } else {
            Sphere::from_points(volume.vertices())
                .map_or_else(|| volume.bounding_box(), |s| s.bounding_box())
        };

        self.camera.far = (-shadow_box.min.z).max(crate::math::LARGE_EPSILON);
        self.shadow_map = None;
        self.quantize_directional(focus, &shadow_box);
    }

    pub(crate) fn setup_spot(&mut self, light: &Light) {
        self.z_range = FloatRange::EMPTY;
        self.camera = Camera {
            transform: Transform::from_translation_rotation(
                light.position(),
                light.transform.rotation,
            ),
            projection: Projection::Perspective {
                fov_y_radians: light.fov_radians,
            },
            near: light.shadow_near_far_ratio * light.range,
            far: light.range,
            aspect: light.aspect,
            zoom: 1.0,
            lod_bias: 1.0,
            view_mask: u32::MAX,
        };
    }

    /// Cube face `face` of a point light, axis aligned regardless of the
    /// light's rotation.
    pub(crate) fn setup_point(&mut self, light: &Light, face: usize) {
        let direction = CUBE_FACE_DIRECTIONS[face % 6];
        let up = CUBE_FACE_UPS[face % 6];
        let rotation = Quat::from_mat4(&Mat4::look_to_rh(Vec3::ZERO, direction, up).inverse());

        self.z_range = FloatRange::EMPTY;
        self.camera = Camera {
            transform: Transform::from_translation_rotation(light.position(), rotation),
            projection: Projection::Perspective {
                fov_y_radians: std::f32::consts::FRAC_PI_2,
            },
            near: light.shadow_near_far_ratio * light.range,
            far: light.range,
            aspect: 1.0,
            zoom: 1.0,
            lod_bias: 1.0,
            view_mask: u32::MAX,
        };
    }

    /// Sizes the orthographic camera to `view_box` (light view space) and
    /// centers it. Once the shadow map is known the position is also snapped
    /// to whole texels.
    fn quantize_directional(&mut self, focus: &FocusParameters, view_box: &BoundingBox) {
        let center = Vec2::new(view_box.center().x, view_box.center().y);
        let raw_size = Vec2::new(view_box.size().x, view_box.size().y);
        let view_size = quantize_view_size(raw_size, focus);

        self.camera.projection = Projection::Orthographic { size: view_size.y };
        self.camera.aspect = view_size.x / view_size.y.max(crate::math::LARGE_EPSILON);

        let rotation = self.camera.transform.rotation;
        self.camera.transform.translation += rotation * center.extend(0.0);

        if let Some(region) = self.shadow_map {
            let width = region.rect.width() as f32;
            // Border texels are never sampled.
            let texel = view_size / (width - 2.0).max(1.0);
            let view_position = rotation.inverse() * self.camera.transform.translation;
            let snap = Vec3::new(-(view_position.x % texel.x), -(view_position.y % texel.y), 0.0);
            self.camera.transform.translation += rotation * snap;
        }
    }

    /// Binds the split to its shadow map cell and applies the final texel
    /// snapping and border zoom.
    pub(crate) fn finalize(&mut self, light: &Light, region: ShadowMapRegion) {
        self.shadow_map = Some(region);
        let width = region.rect.width() as f32;

        if light.light_type == LightType::Directional {
            if let Projection::Orthographic { size } = self.camera.projection {
                let half = Vec2::new(size * self.camera.aspect, size) * 0.5;
                let view_box = BoundingBox::new(-half.extend(0.0), half.extend(0.0));
                self.quantize_directional(&light.shadow_focus, &view_box);
            }
        }

        if self.camera.zoom >= 1.0 && width > 0.0 {
            let border = if light.light_type == LightType::Point {
                2.0 * CUBE_SHADOW_MAP_PADDING
            } else {
                2.0
            };
            self.camera.zoom *= ((width - border) / width).max(0.0);
        }

        let zoom = self.camera.zoom.max(f32::EPSILON);
        let view_size = match self.camera.projection {
            Projection::Orthographic { size } => size,
            Projection::Perspective { fov_y_radians } => {
                2.0 * (fov_y_radians * 0.5).tan() * self.camera.far
            }
        };
        self.world_texel_size = view_size / zoom / width.max(1.0);
    }

    /// World to shadow map texture space, including the viewport of this
    /// split inside the page. Identity without a shadow map.
    pub fn shadow_matrix(&self, sub_pixel_offset: f32, clip_space: ClipSpace) -> Mat4 {
        let Some(region) = self.shadow_map else {
            return Mat4::IDENTITY;
        };

        let texture_size = region.texture_size.as_vec2();
        let viewport_min = region.rect.min.as_vec2();
        let viewport_size = region.rect.size().as_vec2();

        let mut scale = (0.5 * viewport_size / texture_size).extend(1.0);
        let mut offset =
            (viewport_min / texture_size).extend(0.0) + Vec3::new(scale.x, scale.y, 0.0);

        match clip_space {
            ClipSpace::OpenGl => {
                offset.z = 0.5;
                scale.z = 0.5;
                offset.y = 1.0 - offset.y;
            }
            ClipSpace::Direct3D => scale.y = -scale.y,
        }

        offset.x -= sub_pixel_offset / texture_size.x;
        offset.y -= sub_pixel_offset / texture_size.y;

        let tex_adjust = Mat4::from_scale_rotation_translation(scale, Quat::IDENTITY, offset);
        tex_adjust * self.camera.gpu_projection(clip_space) * self.camera.view()
    }
}

/// Rounds each side up to the next `k² · quantize` step, never below
/// `min_view`. Uniform fitting without focus keeps the raw size.
pub fn quantize_view_size(size: Vec2, focus: &FocusParameters) -> Vec2 {
    let quantize = focus.quantize.max(f32::EPSILON);
    let step = |value: f32| {
        let value = value.max(focus.min_view);
        let k = ((value / quantize).sqrt() - QUANTIZE_EPSILON).ceil().max(1.0);
        k * k * quantize
    };

    if focus.non_uniform {
        Vec2::new(step(size.x), step(size.y))
    } else if focus.focus {
        Vec2::splat(step(size.x.max(size.y)))
    } else {
        size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Intersection;
    use crate::scene::CascadeParameters;
    use crate::settings::ClipSpace;
    use glam::{UVec2, Vec4Swizzles};

    use super::super::shadow_map_allocator::ShadowMapRect;

    const EPS: f32 = 1e-3;

    fn cull_camera() -> Camera {
        Camera::perspective(Transform::IDENTITY, 60f32.to_radians(), 1.0, 1.0, 1000.0)
    }

    fn sun() -> Light {
        Light::directional(Vec3::new(0.3, -1.0, -0.2))
            .with_shadows(true)
            .with_cascade(CascadeParameters::new([10.0, 100.0, 400.0, 1000.0], 0.8, 1.0))
    }

    fn region(size: u32) -> ShadowMapRegion {
        ShadowMapRegion {
            page_index: 0,
            rect: ShadowMapRect::new(UVec2::ZERO, UVec2::splat(size)),
            texture_size: UVec2::splat(size),
        }
    }

    #[test]
    fn quantized_size_is_stable() {
        let focus = FocusParameters::default();
        for raw in [0.1, 2.9, 3.0, 7.3, 41.0, 512.7] {
            let once = quantize_view_size(Vec2::new(raw, raw * 0.5), &focus);
            let twice = quantize_view_size(once, &focus);
            assert_eq!(once, twice, "size {raw}");
            assert!(once.cmpge(Vec2::splat(focus.min_view)).all());
            assert!(once.x >= raw);
        }
    }

    #[test]
    fn uniform_focus_uses_largest_side() {
        let focus = FocusParameters {
            non_uniform: false,
            ..FocusParameters::default()
        };
        let size = quantize_view_size(Vec2::new(4.0, 9.0), &focus);
        assert_eq!(size.x, size.y);
        assert!(size.x >= 9.0);

        let unfocused = FocusParameters {
            focus: false,
            non_uniform: false,
            ..FocusParameters::default()
        };
        assert_eq!(quantize_view_size(Vec2::new(4.0, 9.0), &unfocused), Vec2::new(4.0, 9.0));
    }

    #[test]
    fn directional_split_covers_its_range() {
        let light = sun();
        let camera = cull_camera();
        let mut split = ShadowSplit::new(1);
        split.setup_directional(
            &light,
            &camera,
            FloatRange::new(10.0, 100.0),
            FloatRange::new(1.0, 1000.0),
            &BoundingBox::UNDEFINED,
        );

        let shadow_camera = split.shadow_camera();
        let Projection::Orthographic { size } = shadow_camera.projection else {
            panic!("directional split must be orthographic");
        };
        let half = Vec2::new(size * shadow_camera.aspect, size) * 0.5;
        let view = shadow_camera.view();
        for corner in camera.split_frustum(10.0, 100.0).vertices {
            let p = view.transform_point3(corner);
            let far = shadow_camera.far;
            assert!(p.x.abs() <= half.x + EPS && p.y.abs() <= half.y + EPS, "{p:?} outside");
            assert!(p.z <= EPS && p.z >= -far - EPS, "{p:?} beyond far {far}");
        }
    }

    #[test]
    fn finalize_snaps_to_texels_idempotently() {
        let light = sun();
        let mut split = ShadowSplit::new(0);
        split.setup_directional(
            &light,
            &cull_camera(),
            FloatRange::new(1.0, 10.0),
            FloatRange::new(1.0, 10.0),
            &BoundingBox::UNDEFINED,
        );
        split.finalize(&light, region(512));

        let Projection::Orthographic { size } = split.shadow_camera().projection else {
            panic!("directional split must be orthographic");
        };
        let position = split.shadow_camera().position();
        let texel = size / 510.0;
        let view_position = split.shadow_camera().transform.rotation.inverse() * position;
        let remainder = (view_position.x % texel).abs();
        assert!(remainder < 1e-2 * texel || (texel - remainder) < 1e-2 * texel);
        assert!(split.world_texel_size() > 0.0);
        assert!(split.shadow_camera().zoom < 1.0);
    }

    #[test]
    fn point_faces_cover_all_axes() {
        let light = Light::point(Vec3::new(1.0, 2.0, 3.0), 10.0).with_shadows(true);
        for (face, direction) in CUBE_FACE_DIRECTIONS.iter().enumerate() {
            let mut split = ShadowSplit::new(face);
            split.setup_point(&light, face);
            assert!(split.shadow_camera().forward().abs_diff_eq(*direction, 1e-5));
            let target = light.position() + *direction * 5.0;
            assert!(split.shadow_camera().frustum().is_inside_point(target));
        }
    }

    #[test]
    fn spot_camera_matches_light() {
        let light = Light::spot(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y, 45f32.to_radians(), 20.0);
        let mut split = ShadowSplit::new(0);
        split.setup_spot(&light);
        let camera = split.shadow_camera();
        assert!(camera.forward().abs_diff_eq(Vec3::NEG_Y, 1e-5));
        assert!((camera.far - 20.0).abs() < EPS);
        let unit_box = BoundingBox::from_center_half_size(Vec3::ZERO, Vec3::splat(0.5));
        assert_eq!(camera.frustum().is_inside_fast(&unit_box), Intersection::Inside);
    }

    #[test]
    fn shadow_matrix_maps_into_viewport() {
        let light = Light::spot(Vec3::ZERO, Vec3::NEG_Z, 60f32.to_radians(), 10.0);
        let mut split = ShadowSplit::new(0);
        split.setup_spot(&light);
        assert_eq!(split.shadow_matrix(0.0, ClipSpace::Direct3D), Mat4::IDENTITY);

        let page = ShadowMapRegion {
            page_index: 0,
            rect: ShadowMapRect::new(UVec2::new(512, 0), UVec2::new(1024, 512)),
            texture_size: UVec2::splat(1024),
        };
        split.finalize(&light, page);

        for clip_space in [ClipSpace::Direct3D, ClipSpace::OpenGl] {
            let matrix = split.shadow_matrix(0.0, clip_space);
            let p = matrix * Vec3::new(0.0, 0.0, -5.0).extend(1.0);
            let uv = p.xy() / p.w;
            assert!((uv.x - 0.75).abs() < EPS, "{clip_space:?}: {uv:?}");
            let expected_v = if clip_space.is_opengl() { 0.75 } else { 0.25 };
            assert!((uv.y - expected_v).abs() < EPS, "{clip_space:?}: {uv:?}");
        }
    }
}
