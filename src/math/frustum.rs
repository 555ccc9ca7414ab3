use glam::{Mat4, Vec3};

use super::bounds::{BoundingBox, Intersection, Sphere};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f32,
}

impl Plane {
    pub fn from_points(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        let normal = (v1 - v0).cross(v2 - v0).normalize_or_zero();
        Self {
            normal,
            d: -normal.dot(v0),
        }
    }

    pub fn from_normal_point(normal: Vec3, point: Vec3) -> Self {
        Self {
            normal,
            d: -normal.dot(point),
        }
    }

    pub fn distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.d
    }

    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            d: -self.d,
        }
    }
}

/// Eight corners and six inward-facing planes.
///
/// Corners 0..4 lie on the near plane and 4..8 on the far plane, in the same
/// winding. A frustum whose near and far corners coincide is degenerate and
/// contains nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub vertices: [Vec3; 8],
    pub planes: [Plane; 6],
}

impl Default for Frustum {
    fn default() -> Self {
        Self::from_vertices([Vec3::ZERO; 8])
    }
}

impl Frustum {
    pub const PLANE_NEAR: usize = 0;
    pub const PLANE_LEFT: usize = 1;
    pub const PLANE_RIGHT: usize = 2;
    pub const PLANE_UP: usize = 3;
    pub const PLANE_DOWN: usize = 4;
    pub const PLANE_FAR: usize = 5;

    /// Vertex indices of each face, matching the plane order.
    pub const FACES: [[usize; 4]; 6] = [
        [0, 1, 2, 3],
        [3, 7, 6, 2],
        [1, 5, 4, 0],
        [0, 4, 7, 3],
        [6, 5, 1, 2],
        [5, 6, 7, 4],
    ];

    /// Perspective frustum in view space (looking down -Z) moved by `transform`.
    pub fn perspective(
        fov_y: f32,
        aspect: f32,
        zoom: f32,
        near: f32,
        far: f32,
        transform: &Mat4,
    ) -> Self {
        let half_tan = (fov_y * 0.5).tan() / zoom.max(f32::EPSILON);
        let near_half = Vec3::new(near * half_tan * aspect, near * half_tan, near);
        let far_half = Vec3::new(far * half_tan * aspect, far * half_tan, far);
        Self::from_half_extents(near_half, far_half, transform)
    }

    /// Orthographic frustum; `ortho_size` is the full view height.
    pub fn orthographic(
        ortho_size: f32,
        aspect: f32,
        zoom: f32,
        near: f32,
        far: f32,
        transform: &Mat4,
    ) -> Self {
        let half_h = ortho_size * 0.5 / zoom.max(f32::EPSILON);
        let half_w = half_h * aspect;
        let near_half = Vec3::new(half_w, half_h, near);
        let far_half = Vec3::new(half_w, half_h, far);
        Self::from_half_extents(near_half, far_half, transform)
    }

    fn from_half_extents(near: Vec3, far: Vec3, transform: &Mat4) -> Self {
        let corner = |h: Vec3, sx: f32, sy: f32| {
            transform.transform_point3(Vec3::new(h.x * sx, h.y * sy, -h.z))
        };
        Self::from_vertices([
            corner(near, 1.0, 1.0),
            corner(near, 1.0, -1.0),
            corner(near, -1.0, -1.0),
            corner(near, -1.0, 1.0),
            corner(far, 1.0, 1.0),
            corner(far, 1.0, -1.0),
            corner(far, -1.0, -1.0),
            corner(far, -1.0, 1.0),
        ])
    }

    pub fn from_vertices(vertices: [Vec3; 8]) -> Self {
        let centroid = vertices.iter().copied().sum::<Vec3>() / 8.0;
        let planes = Self::FACES.map(|face| {
            let plane = Self::face_plane(&vertices, face);
            if plane.distance(centroid) < 0.0 {
                plane.flipped()
            } else {
                plane
            }
        });
        Self { vertices, planes }
    }

    // A face may collapse to a point on one side (apex of a zero-near frustum),
    // so pick the first non-degenerate triangle of the quad.
    fn face_plane(vertices: &[Vec3; 8], face: [usize; 4]) -> Plane {
        let v = face.map(|i| vertices[i]);
        for (a, b, c) in [(0, 1, 2), (0, 2, 3), (0, 1, 3), (1, 2, 3)] {
            let plane = Plane::from_points(v[a], v[b], v[c]);
            if plane.normal != Vec3::ZERO {
                return plane;
            }
        }
        Plane::from_normal_point(Vec3::ZERO, v[0])
    }

    pub fn is_degenerate(&self) -> bool {
        self.vertices[0] == self.vertices[4]
    }

    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self::from_vertices(self.vertices.map(|v| matrix.transform_point3(v)))
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.vertices)
    }

    pub fn is_inside_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|p| p.distance(point) >= 0.0)
    }

    pub fn is_inside_box(&self, bounds: &BoundingBox) -> Intersection {
        let center = bounds.center();
        let edge = bounds.half_size();
        let mut all_inside = true;
        for plane in &self.planes {
            let dist = plane.distance(center);
            let abs_dist = plane.normal.abs().dot(edge);
            if dist < -abs_dist {
                return Intersection::Outside;
            }
            if dist < abs_dist {
                all_inside = false;
            }
        }
        if all_inside {
            Intersection::Inside
        } else {
            Intersection::Intersects
        }
    }

    /// Like [`Frustum::is_inside_box`] but never reports `Intersects`.
    pub fn is_inside_fast(&self, bounds: &BoundingBox) -> Intersection {
        if self.is_degenerate() {
            return Intersection::Outside;
        }
        let center = bounds.center();
        let edge = bounds.half_size();
        for plane in &self.planes {
            if plane.distance(center) < -plane.normal.abs().dot(edge) {
                return Intersection::Outside;
            }
        }
        Intersection::Inside
    }

    pub fn is_inside_sphere_fast(&self, sphere: &Sphere) -> Intersection {
        if self.is_degenerate() {
            return Intersection::Outside;
        }
        for plane in &self.planes {
            if plane.distance(sphere.center) < -sphere.radius {
                return Intersection::Outside;
            }
        }
        Intersection::Inside
    }
}
