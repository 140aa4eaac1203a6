use glam::{Quat, Vec3};

/// A translation and rotation describing where an actor is and which way it faces.
///
/// The actor faces down `+Z` with `+Y` up, so `+X` is to its right.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Transform {
    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// Create a transform facing `yaw` degrees clockwise (seen from above) from `+Z`.
    pub fn from_yaw_degrees(yaw: f32) -> Self {
        Self::new(Vec3::ZERO, Quat::from_rotation_y(yaw.to_radians()))
    }

    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    #[inline]
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }
}

/// Signed angle in degrees between `from` and `to` projected onto the horizontal plane.
///
/// Positive angles turn clockwise seen from above (towards `+X` when `from` is `+Z`).
/// Returns `0.0` when either vector has no horizontal component.
pub fn horizontal_angle(from: Vec3, to: Vec3) -> f32 {
    let from = Vec3::new(from.x, 0.0, from.z);
    let to = Vec3::new(to.x, 0.0, to.z);

    if from.length_squared() <= f32::EPSILON || to.length_squared() <= f32::EPSILON {
        return 0.0;
    }

    let from = from.normalize();
    let to = to.normalize();

    let cross = from.cross(to).y;
    let dot = from.dot(to);
    cross.atan2(dot).to_degrees()
}

/// Normalize a quaternion and fall back to identity when invalid.
#[inline]
pub fn normalize_rotation_or_identity(rotation: Quat) -> Quat {
    let length_sq = rotation.length_squared();
    if !length_sq.is_finite() || length_sq <= f32::EPSILON {
        Quat::IDENTITY
    } else {
        rotation / length_sq.sqrt()
    }
}
