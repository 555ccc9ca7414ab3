use glam::{Mat4, Quat, Vec3};

use crate::math::safe_normalize;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    pub fn from_trs(t: Vec3, r: Quat, s: Vec3) -> Self {
        Self {
            translation: t,
            rotation: r,
            scale: s,
        }
    }

    pub fn from_translation_rotation(t: Vec3, r: Quat) -> Self {
        Self::from_trs(t, r, Vec3::ONE)
    }

    /// Unscaled transform at `position` whose forward axis (-Z) points along `direction`.
    pub fn looking_to(position: Vec3, direction: Vec3) -> Self {
        let direction = safe_normalize(direction, Vec3::NEG_Z);
        Self::from_translation_rotation(position, Quat::from_rotation_arc(Vec3::NEG_Z, direction))
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// World-to-local matrix ignoring scale.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.translation).inverse()
    }
}
