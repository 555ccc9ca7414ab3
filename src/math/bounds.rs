use std::ops::{BitAnd, BitOr, BitOrAssign};

use glam::{Mat4, Vec3};

/// Anything at least this far away or this large is treated as "infinite".
pub const LARGE_VALUE: f32 = 100_000_000.0;

/// Smallest distance used in divisions.
pub const LARGE_EPSILON: f32 = 0.00005;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intersection {
    Outside,
    Intersects,
    Inside,
}

/// Axis-aligned bounding box. A box with `min > max` is undefined and absorbs
/// the first merged point or box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::UNDEFINED
    }
}

impl BoundingBox {
    pub const UNDEFINED: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_center_half_size(center: Vec3, half_size: Vec3) -> Self {
        Self {
            min: center - half_size,
            max: center + half_size,
        }
    }

    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        let mut bounds = Self::UNDEFINED;
        for point in points {
            bounds.merge_point(point);
        }
        bounds
    }

    pub fn is_defined(&self) -> bool {
        self.min.x <= self.max.x
    }

    pub fn merge_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn merge(&mut self, other: &BoundingBox) {
        if other.is_defined() {
            self.min = self.min.min(other.min);
            self.max = self.max.max(other.max);
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn half_size(&self) -> Vec3 {
        self.size() * 0.5
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (min, max) = (self.min, self.max);
        [
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(min.x, max.y, max.z),
            Vec3::new(max.x, max.y, max.z),
        ]
    }

    /// Bounds of this box after an affine transform.
    pub fn transformed(&self, matrix: &Mat4) -> BoundingBox {
        if !self.is_defined() {
            return *self;
        }

        let center = matrix.transform_point3(self.center());
        let edge = self.half_size();
        let abs_edge = matrix.x_axis.truncate().abs() * edge.x
            + matrix.y_axis.truncate().abs() * edge.y
            + matrix.z_axis.truncate().abs() * edge.z;

        BoundingBox::from_center_half_size(center, abs_edge)
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
    }

    /// Distance from the point to the closest point of the box, zero inside.
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        let offset = (self.min - point).max(point - self.max).max(Vec3::ZERO);
        offset.length()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Grows a sphere around the points one at a time. Not minimal, but stable
    /// for a given point order.
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let mut sphere = Sphere::new(iter.next()?, 0.0);
        for point in iter {
            sphere.merge_point(point);
        }
        Some(sphere)
    }

    pub fn merge_point(&mut self, point: Vec3) {
        let offset = point - self.center;
        let dist = offset.length();
        if dist > self.radius {
            let half = (dist - self.radius) * 0.5;
            self.radius += half;
            self.center += offset * (half / dist);
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_center_half_size(self.center, Vec3::splat(self.radius))
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        (point - self.center).length_squared() <= self.radius * self.radius
    }

    pub fn is_inside_fast(&self, bounds: &BoundingBox) -> Intersection {
        let closest = self.center.clamp(bounds.min, bounds.max);
        if (closest - self.center).length_squared() >= self.radius * self.radius {
            Intersection::Outside
        } else {
            Intersection::Intersects
        }
    }
}

/// View-space depth range. `first > second` marks an empty range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatRange {
    pub first: f32,
    pub second: f32,
}

impl Default for FloatRange {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl FloatRange {
    pub const EMPTY: Self = Self {
        first: f32::INFINITY,
        second: f32::NEG_INFINITY,
    };

    pub fn new(first: f32, second: f32) -> Self {
        Self { first, second }
    }

    pub fn is_valid(&self) -> bool {
        self.first <= self.second
    }

    pub fn intersects(&self, other: &FloatRange) -> bool {
        other.first <= self.second && other.second >= self.first
    }
}

impl BitOr for FloatRange {
    type Output = FloatRange;

    fn bitor(self, rhs: FloatRange) -> FloatRange {
        if !self.is_valid() {
            rhs
        } else if !rhs.is_valid() {
            self
        } else {
            FloatRange::new(self.first.min(rhs.first), self.second.max(rhs.second))
        }
    }
}

impl BitOrAssign for FloatRange {
    fn bitor_assign(&mut self, rhs: FloatRange) {
        *self = *self | rhs;
    }
}

impl BitAnd for FloatRange {
    type Output = FloatRange;

    fn bitand(self, rhs: FloatRange) -> FloatRange {
        FloatRange::new(self.first.max(rhs.first), self.second.min(rhs.second))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    const EPS: f32 = 1e-5;

    #[test]
    fn undefined_box_absorbs_first_merge() {
        let mut bounds = BoundingBox::UNDEFINED;
        assert!(!bounds.is_defined());

        bounds.merge(&BoundingBox::new(Vec3::ONE, Vec3::splat(2.0)));
        assert!(bounds.is_defined());
        assert!(bounds.min.abs_diff_eq(Vec3::ONE, EPS));

        bounds.merge(&BoundingBox::UNDEFINED);
        assert!(bounds.max.abs_diff_eq(Vec3::splat(2.0), EPS));
    }

    #[test]
    fn transformed_box_covers_rotated_corners() {
        let bounds = BoundingBox::new(Vec3::new(-1.0, -2.0, -3.0), Vec3::new(1.0, 2.0, 3.0));
        let matrix = Mat4::from_rotation_translation(
            Quat::from_rotation_y(0.7),
            Vec3::new(5.0, 0.0, -2.0),
        );

        let transformed = bounds.transformed(&matrix);
        for corner in bounds.corners() {
            let p = matrix.transform_point3(corner);
            assert!(p.cmpge(transformed.min - EPS).all() && p.cmple(transformed.max + EPS).all());
        }
    }

    #[test]
    fn distance_to_point_is_zero_inside() {
        let bounds = BoundingBox::new(Vec3::ZERO, Vec3::ONE);
        assert_eq!(bounds.distance_to_point(Vec3::splat(0.5)), 0.0);
        assert!((bounds.distance_to_point(Vec3::new(3.0, 0.5, 0.5)) - 2.0).abs() < EPS);
    }

    #[test]
    fn sphere_grows_to_contain_points() {
        let points = [
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 3.0, 0.0),
        ];
        let sphere = Sphere::from_points(points).unwrap();
        for p in points {
            assert!((p - sphere.center).length() <= sphere.radius + EPS);
        }
        assert!(Sphere::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn float_range_union_ignores_empty() {
        let mut range = FloatRange::EMPTY;
        range |= FloatRange::new(2.0, 5.0);
        range |= FloatRange::EMPTY;
        range |= FloatRange::new(1.0, 3.0);
        assert_eq!(range, FloatRange::new(1.0, 5.0));
    }

    #[test]
    fn float_range_intersection_and_overlap() {
        let a = FloatRange::new(1.0, 10.0);
        let b = FloatRange::new(5.0, 20.0);
        assert_eq!(a & b, FloatRange::new(5.0, 10.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&FloatRange::new(11.0, 12.0)));
        assert!(!(a & FloatRange::new(11.0, 12.0)).is_valid());
    }
}
