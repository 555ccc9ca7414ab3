use glam::{Mat4, Vec3};

use super::bounds::BoundingBox;
use super::frustum::{Frustum, Plane};

const CLIP_EPSILON: f32 = 1e-6;

/// Convex volume stored as a list of polygonal faces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polyhedron {
    pub faces: Vec<Vec<Vec3>>,
}

impl Polyhedron {
    pub fn from_frustum(frustum: &Frustum) -> Self {
        let faces = Frustum::FACES
            .iter()
            .map(|face| face.iter().map(|&i| frustum.vertices[i]).collect())
            .collect();
        Self { faces }
    }

    pub fn from_box(bounds: &BoundingBox) -> Self {
        Self::from_frustum(&Frustum::from_vertices(box_vertices(bounds)))
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn vertices(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.faces.iter().flatten().copied()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.vertices())
    }

    pub fn transform(&mut self, matrix: &Mat4) {
        for vertex in self.faces.iter_mut().flatten() {
            *vertex = matrix.transform_point3(*vertex);
        }
    }

    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let mut result = self.clone();
        result.transform(matrix);
        result
    }

    /// Keeps the part of the volume on the positive side of the plane and
    /// closes the cut with a new face.
    pub fn clip_plane(&mut self, plane: &Plane) {
        let mut cut_points: Vec<Vec3> = Vec::new();
        let mut faces = Vec::with_capacity(self.faces.len() + 1);

        for face in self.faces.drain(..) {
            let mut clipped = Vec::with_capacity(face.len() + 1);
            for (i, &current) in face.iter().enumerate() {
                let next = face[(i + 1) % face.len()];
                let d0 = plane.distance(current);
                let d1 = plane.distance(next);

                if d0 >= 0.0 {
                    clipped.push(current);
                }
                if (d0 >= 0.0) != (d1 >= 0.0) {
                    let t = d0 / (d0 - d1);
                    let point = current + (next - current) * t;
                    clipped.push(point);
                    cut_points.push(point);
                }
            }
            if clipped.len() >= 3 {
                faces.push(clipped);
            }
        }

        if let Some(cap) = close_cut(plane, cut_points) {
            faces.push(cap);
        }

        self.faces = faces;
    }

    pub fn clip_box(&mut self, bounds: &BoundingBox) {
        let planes = [
            Plane::from_normal_point(Vec3::X, bounds.min),
            Plane::from_normal_point(Vec3::NEG_X, bounds.max),
            Plane::from_normal_point(Vec3::Y, bounds.min),
            Plane::from_normal_point(Vec3::NEG_Y, bounds.max),
            Plane::from_normal_point(Vec3::Z, bounds.min),
            Plane::from_normal_point(Vec3::NEG_Z, bounds.max),
        ];
        for plane in &planes {
            if self.is_empty() {
                break;
            }
            self.clip_plane(plane);
        }
    }
}

fn box_vertices(bounds: &BoundingBox) -> [Vec3; 8] {
    let (min, max) = (bounds.min, bounds.max);
    [
        Vec3::new(max.x, max.y, min.z),
        Vec3::new(max.x, min.y, min.z),
        Vec3::new(min.x, min.y, min.z),
        Vec3::new(min.x, max.y, min.z),
        Vec3::new(max.x, max.y, max.z),
        Vec3::new(max.x, min.y, max.z),
        Vec3::new(min.x, min.y, max.z),
        Vec3::new(min.x, max.y, max.z),
    ]
}

/// Orders the cut points into a convex polygon lying on the plane.
fn close_cut(plane: &Plane, mut points: Vec<Vec3>) -> Option<Vec<Vec3>> {
    let mut unique: Vec<Vec3> = Vec::with_capacity(points.len());
    for point in points.drain(..) {
        if !unique.iter().any(|u| u.distance_squared(point) <= CLIP_EPSILON) {
            unique.push(point);
        }
    }
    if unique.len() < 3 {
        return None;
    }

    let center = unique.iter().copied().sum::<Vec3>() / unique.len() as f32;
    let axis_u = (unique[0] - center).normalize_or_zero();
    let axis_v = plane.normal.cross(axis_u);
    unique.sort_by(|a, b| {
        let angle = |p: &Vec3| {
            let offset = *p - center;
            offset.dot(axis_v).atan2(offset.dot(axis_u))
        };
        angle(a).total_cmp(&angle(b))
    });
    Some(unique)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn frustum_polyhedron_has_six_faces() {
        let frustum = Frustum::orthographic(2.0, 1.0, 1.0, 0.0, 10.0, &Mat4::IDENTITY);
        let poly = Polyhedron::from_frustum(&frustum);
        assert_eq!(poly.faces.len(), 6);
        assert!(poly.bounding_box().min.abs_diff_eq(Vec3::new(-1.0, -1.0, -10.0), EPS));
    }

    #[test]
    fn clipping_by_box_shrinks_volume() {
        let frustum = Frustum::orthographic(20.0, 1.0, 1.0, 0.0, 100.0, &Mat4::IDENTITY);
        let mut poly = Polyhedron::from_frustum(&frustum);
        poly.clip_box(&BoundingBox::new(Vec3::new(-2.0, -3.0, -50.0), Vec3::new(4.0, 3.0, -40.0)));

        let bounds = poly.bounding_box();
        assert!(!poly.is_empty());
        assert!(bounds.min.abs_diff_eq(Vec3::new(-2.0, -3.0, -50.0), EPS));
        assert!(bounds.max.abs_diff_eq(Vec3::new(4.0, 3.0, -40.0), EPS));
    }

    #[test]
    fn clipping_by_disjoint_box_empties_volume() {
        let frustum = Frustum::orthographic(2.0, 1.0, 1.0, 0.0, 10.0, &Mat4::IDENTITY);
        let mut poly = Polyhedron::from_frustum(&frustum);
        poly.clip_box(&BoundingBox::new(Vec3::splat(50.0), Vec3::splat(60.0)));
        assert!(poly.is_empty());
    }

    #[test]
    fn transformed_polyhedron_moves_vertices() {
        let poly = Polyhedron::from_box(&BoundingBox::new(Vec3::ZERO, Vec3::ONE));
        let moved = poly.transformed(&Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0)));
        let bounds = moved.bounding_box();
        assert!(bounds.min.abs_diff_eq(Vec3::new(0.0, 5.0, 0.0), EPS));
        assert!(bounds.max.abs_diff_eq(Vec3::new(1.0, 6.0, 1.0), EPS));
    }
}
