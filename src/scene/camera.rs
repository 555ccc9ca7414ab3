use glam::{Mat4, Quat, Vec3};

use super::Transform;
use crate::math::Frustum;
use crate::settings::ClipSpace;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Projection {
    Perspective { fov_y_radians: f32 },
    /// `size` is the full view height.
    Orthographic { size: f32 },
}

/// Viewer looking down its local -Z axis.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub transform: Transform,
    pub projection: Projection,
    pub near: f32,
    pub far: f32,
    pub aspect: f32,
    pub zoom: f32,
    pub lod_bias: f32,
    pub view_mask: u32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            transform: Transform::from_translation_rotation(
                Vec3::new(0.0, 0.0, 3.0),
                Quat::IDENTITY,
            ),
            projection: Projection::Perspective {
                fov_y_radians: 60f32.to_radians(),
            },
            near: 0.1,
            far: 100.0,
            aspect: 1.0,
            zoom: 1.0,
            lod_bias: 1.0,
            view_mask: u32::MAX,
        }
    }
}

impl Camera {
    pub fn perspective(
        transform: Transform,
        fov_y_radians: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            transform,
            projection: Projection::Perspective { fov_y_radians },
            near,
            far,
            aspect,
            ..Self::default()
        }
    }

    pub fn orthographic(transform: Transform, size: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            transform,
            projection: Projection::Orthographic { size },
            near,
            far,
            aspect,
            ..Self::default()
        }
    }

    pub fn is_orthographic(&self) -> bool {
        matches!(self.projection, Projection::Orthographic { .. })
    }

    pub fn position(&self) -> Vec3 {
        self.transform.translation
    }

    pub fn forward(&self) -> Vec3 {
        self.transform.forward()
    }

    /// Orthographic cameras always start at the eye plane.
    pub fn effective_near(&self) -> f32 {
        if self.is_orthographic() {
            0.0
        } else {
            self.near
        }
    }

    pub fn view(&self) -> Mat4 {
        self.transform.view_matrix()
    }

    pub fn gpu_projection(&self, clip_space: ClipSpace) -> Mat4 {
        let near = self.effective_near();
        let mut projection = match (self.projection, clip_space) {
            (Projection::Perspective { fov_y_radians }, ClipSpace::Direct3D) => {
                Mat4::perspective_rh(fov_y_radians, self.aspect, near, self.far)
            }
            (Projection::Perspective { fov_y_radians }, ClipSpace::OpenGl) => {
                Mat4::perspective_rh_gl(fov_y_radians, self.aspect, near, self.far)
            }
            (Projection::Orthographic { size }, clip) => {
                let half_h = size * 0.5;
                let half_w = half_h * self.aspect;
                if clip.is_opengl() {
                    Mat4::orthographic_rh_gl(-half_w, half_w, -half_h, half_h, near, self.far)
                } else {
                    Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, near, self.far)
                }
            }
        };
        projection.x_axis.x *= self.zoom;
        projection.y_axis.y *= self.zoom;
        projection
    }

    pub fn view_proj(&self, clip_space: ClipSpace) -> Mat4 {
        self.gpu_projection(clip_space) * self.view()
    }

    pub fn frustum(&self) -> Frustum {
        self.split_frustum(self.effective_near(), self.far)
    }

    /// Sub-frustum between two view depths, clamped to the clip range.
    pub fn split_frustum(&self, near: f32, far: f32) -> Frustum {
        let near = near.max(self.effective_near());
        let far = far.min(self.far).max(near);
        let world =
            Mat4::from_rotation_translation(self.transform.rotation, self.transform.translation);
        match self.projection {
            Projection::Perspective { fov_y_radians } => {
                Frustum::perspective(fov_y_radians, self.aspect, self.zoom, near, far, &world)
            }
            Projection::Orthographic { size } => {
                Frustum::orthographic(size, self.aspect, self.zoom, near, far, &world)
            }
        }
    }

    /// Positive distance along the view direction.
    pub fn view_depth(&self, point: Vec3) -> f32 {
        -self.view().transform_point3(point).z
    }

    /// Distance used for draw distance and light sorting.
    pub fn distance(&self, point: Vec3) -> f32 {
        if self.is_orthographic() {
            self.view_depth(point).abs()
        } else {
            (point - self.position()).length()
        }
    }

    pub fn lod_distance(&self, distance: f32, scale: f32) -> f32 {
        let divisor = (self.lod_bias * scale * self.zoom).max(f32::EPSILON);
        match self.projection {
            Projection::Orthographic { size } => size / divisor,
            Projection::Perspective { .. } => distance / divisor,
        }
    }

    pub fn half_view_size(&self) -> f32 {
        match self.projection {
            Projection::Orthographic { size } => size * 0.5 / self.zoom,
            Projection::Perspective { fov_y_radians } => (fov_y_radians * 0.5).tan() / self.zoom,
        }
    }
}
