//! Pose type definition

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Rigid transform (position and orientation)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Transform a point from this pose's local frame into its parent frame
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * point
    }

    /// Apply `local` after `self` (self ⊗ local)
    pub fn compose(&self, local: &Pose) -> Pose {
        Pose {
            position: self.transform_point(local.position),
            rotation: (self.rotation * local.rotation).normalize(),
        }
    }

    pub fn inverse(&self) -> Pose {
        let rotation = self.rotation.inverse();
        Pose {
            position: rotation * -self.position,
            rotation,
        }
    }

    /// Check whether two poses match within a position tolerance and a
    /// per-component quaternion tolerance. Antipodal quaternions compare equal.
    pub fn abs_diff_eq(&self, other: &Pose, position_eps: f32, rotation_eps: f32) -> bool {
        self.position.abs_diff_eq(other.position, position_eps)
            && (self.rotation.abs_diff_eq(other.rotation, rotation_eps)
                || self.rotation.abs_diff_eq(-other.rotation, rotation_eps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_compose_inverse_is_identity() {
        let pose = Pose::new(
            Vec3::new(1.0, -2.0, 0.5),
            Quat::from_euler(glam::EulerRot::XYZ, 0.3, -0.7, 1.1),
        );
        let identity = pose.compose(&pose.inverse());
        assert_relative_eq!(identity.position.length(), 0.0, epsilon = 1e-5);
        assert!(identity.abs_diff_eq(&Pose::IDENTITY, 1e-5, 1e-5));
    }

    #[test]
    fn test_transform_point() {
        let pose = Pose::new(Vec3::X, Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        let p = pose.transform_point(Vec3::X);
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_abs_diff_eq_accepts_antipodal_quaternion() {
        let a = Pose::new(Vec3::ONE, Quat::from_rotation_y(0.4));
        let b = Pose::new(Vec3::ONE, -Quat::from_rotation_y(0.4));
        assert!(a.abs_diff_eq(&b, 1e-6, 1e-4));
    }
}
