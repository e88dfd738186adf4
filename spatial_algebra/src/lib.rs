use nalgebra::{Matrix3, UnitQuaternion, Vector3, Vector6};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};
use thiserror::Error;

/// Angle below which the logarithm falls back to its Taylor expansion.
const SMALL_ANGLE: f64 = 1e-8;

/// Tolerance used when validating a raw rotation matrix.
const ORTHONORMAL_TOL: f64 = 1e-6;

/// Errors that can occur when building spatial quantities from raw data.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum SpatialError {
    #[error("rotation matrix is not orthonormal")]
    NonOrthonormalRotation,
    #[error("rotation matrix determinant is {0}, expected +1")]
    ImproperRotation(f64),
}

fn skew(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(0.0, -v.z, v.y, v.z, 0.0, -v.x, -v.y, v.x, 0.0)
}

/// A rigid transform (element of SE(3)): a rotation followed by a translation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SE3 {
    pub rotation: UnitQuaternion<f64>,
    pub translation: Vector3<f64>,
}

impl Default for SE3 {
    fn default() -> Self {
        Self::identity()
    }
}

impl SE3 {
    /// Creates a new `SE3` from a unit quaternion and a translation.
    pub fn new(rotation: UnitQuaternion<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// The identity transform (no rotation, no translation).
    pub fn identity() -> Self {
        Self::new(UnitQuaternion::identity(), Vector3::zeros())
    }

    /// Creates a new `SE3` from a raw rotation matrix and a translation.
    ///
    /// # Arguments
    ///
    /// * `rotation` - The rotation block, which must be orthonormal with determinant +1.
    /// * `translation` - The translation component.
    ///
    /// # Returns
    ///
    /// The validated transform, or a `SpatialError` if the rotation block is
    /// not a proper rotation.
    pub fn from_matrix(
        rotation: Matrix3<f64>,
        translation: Vector3<f64>,
    ) -> Result<Self, SpatialError> {
        let gram = rotation * rotation.transpose() - Matrix3::identity();
        if gram.norm() > ORTHONORMAL_TOL {
            return Err(SpatialError::NonOrthonormalRotation);
        }
        let det = rotation.determinant();
        if (det - 1.0).abs() > ORTHONORMAL_TOL {
            return Err(SpatialError::ImproperRotation(det));
        }
        let rotation = UnitQuaternion::from_rotation_matrix(
            &nalgebra::Rotation3::from_matrix_unchecked(rotation),
        );
        Ok(Self::new(rotation, translation))
    }

    /// Returns the rotation component as a matrix.
    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        self.rotation.to_rotation_matrix().into_inner()
    }

    /// Returns the inverse transform.
    pub fn inv(&self) -> Self {
        let rotation = self.rotation.inverse();
        let translation = -(rotation * self.translation);
        Self::new(rotation, translation)
    }

    /// Transforms a point from this transform's source frame to its target frame.
    pub fn transform_point(&self, p: Vector3<f64>) -> Vector3<f64> {
        self.rotation * p + self.translation
    }

    /// Expresses in the target frame a motion given in this transform's source frame.
    ///
    /// For a placement `oMc` (contact frame to world), `act_motion` takes a
    /// motion expressed at the contact frame and returns the same motion
    /// expressed at the world origin.
    pub fn act_motion(&self, m: &Motion) -> Motion {
        let angular = self.rotation * m.angular;
        let linear = self.rotation * m.linear + self.translation.cross(&angular);
        Motion::new(angular, linear)
    }

    /// Expresses in the target frame a force given in this transform's source frame.
    pub fn act_force(&self, f: &Force) -> Force {
        let linear = self.rotation * f.linear;
        let angular = self.rotation * f.angular + self.translation.cross(&linear);
        Force::new(angular, linear)
    }

    /// The logarithmic map of the transform.
    ///
    /// Returns the motion whose exponential is this transform: the rotation
    /// vector of the rotation part, and the translation pulled back through
    /// the inverse of the left Jacobian of the rotation.
    pub fn log(&self) -> Motion {
        let angular = self.rotation.scaled_axis();
        let theta = angular.norm();
        let w = skew(&angular);
        let coeff = if theta < SMALL_ANGLE {
            1.0 / 12.0
        } else {
            (1.0 - theta * theta.sin() / (2.0 * (1.0 - theta.cos()))) / (theta * theta)
        };
        let v_inv = Matrix3::identity() - 0.5 * w + coeff * (w * w);
        let linear = v_inv * self.translation;
        Motion::new(angular, linear)
    }
}

impl Mul<SE3> for SE3 {
    type Output = SE3;
    fn mul(self, rhs: SE3) -> SE3 {
        SE3::new(
            self.rotation * rhs.rotation,
            self.translation + self.rotation * rhs.translation,
        )
    }
}

/// A spatial motion vector (angular and linear components).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    pub angular: Vector3<f64>,
    pub linear: Vector3<f64>,
}

impl Motion {
    pub fn new(angular: Vector3<f64>, linear: Vector3<f64>) -> Self {
        Self { angular, linear }
    }

    pub fn zero() -> Self {
        Self::new(Vector3::zeros(), Vector3::zeros())
    }

    /// Stacks the components into a 6-vector, angular first.
    pub fn vector(&self) -> Vector6<f64> {
        Vector6::new(
            self.angular.x,
            self.angular.y,
            self.angular.z,
            self.linear.x,
            self.linear.y,
            self.linear.z,
        )
    }

    /// Featherstone 2.33
    pub fn cross_motion(&self, rhs: &Motion) -> Motion {
        let angular = self.angular.cross(&rhs.angular);
        let linear = self.angular.cross(&rhs.linear) + self.linear.cross(&rhs.angular);
        Motion::new(angular, linear)
    }

    /// Featherstone 2.34
    pub fn cross_force(&self, rhs: &Force) -> Force {
        let angular = self.angular.cross(&rhs.angular) + self.linear.cross(&rhs.linear);
        let linear = self.angular.cross(&rhs.linear);
        Force::new(angular, linear)
    }
}

impl From<Vector6<f64>> for Motion {
    fn from(v: Vector6<f64>) -> Motion {
        Motion::new(Vector3::new(v[0], v[1], v[2]), Vector3::new(v[3], v[4], v[5]))
    }
}

impl Add<Motion> for Motion {
    type Output = Motion;
    #[inline]
    fn add(self, rhs: Motion) -> Motion {
        Motion::new(self.angular + rhs.angular, self.linear + rhs.linear)
    }
}

impl Sub<Motion> for Motion {
    type Output = Motion;
    #[inline]
    fn sub(self, rhs: Motion) -> Motion {
        Motion::new(self.angular - rhs.angular, self.linear - rhs.linear)
    }
}

impl Neg for Motion {
    type Output = Motion;
    #[inline]
    fn neg(self) -> Motion {
        Motion::new(-self.angular, -self.linear)
    }
}

/// A spatial force vector (wrench): a moment and a linear force.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Force {
    pub angular: Vector3<f64>,
    pub linear: Vector3<f64>,
}

impl Force {
    pub fn new(angular: Vector3<f64>, linear: Vector3<f64>) -> Self {
        Self { angular, linear }
    }

    pub fn zero() -> Self {
        Self::new(Vector3::zeros(), Vector3::zeros())
    }

    /// Stacks the components into a 6-vector, angular first.
    pub fn vector(&self) -> Vector6<f64> {
        Vector6::new(
            self.angular.x,
            self.angular.y,
            self.angular.z,
            self.linear.x,
            self.linear.y,
            self.linear.z,
        )
    }
}

impl From<Vector6<f64>> for Force {
    fn from(v: Vector6<f64>) -> Force {
        Force::new(Vector3::new(v[0], v[1], v[2]), Vector3::new(v[3], v[4], v[5]))
    }
}

impl Add<Force> for Force {
    type Output = Force;
    #[inline]
    fn add(self, rhs: Force) -> Force {
        Force::new(self.angular + rhs.angular, self.linear + rhs.linear)
    }
}

impl Sub<Force> for Force {
    type Output = Force;
    #[inline]
    fn sub(self, rhs: Force) -> Force {
        Force::new(self.angular - rhs.angular, self.linear - rhs.linear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    const TOL: f64 = 1e-12;

    fn rot_z(angle: f64) -> UnitQuaternion<f64> {
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angle)
    }

    #[test]
    fn test_compose_with_inverse_is_identity() {
        let t = SE3::new(rot_z(0.7), Vector3::new(1.0, -2.0, 3.0));
        let id = t * t.inv();
        assert_abs_diff_eq!(id.translation.norm(), 0.0, epsilon = TOL);
        assert_abs_diff_eq!(id.rotation.angle(), 0.0, epsilon = TOL);

        let p = Vector3::new(0.4, 0.5, -0.6);
        let back = t.inv().transform_point(t.transform_point(p));
        assert_abs_diff_eq!((back - p).norm(), 0.0, epsilon = TOL);
    }

    #[test]
    fn test_from_matrix_accepts_proper_rotation() {
        let r = rot_z(PI / 3.0).to_rotation_matrix().into_inner();
        let t = SE3::from_matrix(r, Vector3::new(0.1, 0.2, 0.3)).unwrap();
        assert_abs_diff_eq!(t.rotation.angle(), PI / 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!((t.rotation_matrix() - r).norm(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_from_matrix_rejects_scaled_matrix() {
        let r = Matrix3::identity() * 2.0;
        let result = SE3::from_matrix(r, Vector3::zeros());
        assert_eq!(result, Err(SpatialError::NonOrthonormalRotation));
    }

    #[test]
    fn test_from_matrix_rejects_reflection() {
        let r = Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, -1.0));
        match SE3::from_matrix(r, Vector3::zeros()) {
            Err(SpatialError::ImproperRotation(det)) => {
                assert_abs_diff_eq!(det, -1.0, epsilon = TOL)
            }
            other => panic!("expected ImproperRotation, got {:?}", other),
        }
    }

    #[test]
    fn test_log_of_identity_is_zero() {
        let m = SE3::identity().log();
        assert_abs_diff_eq!(m.vector().norm(), 0.0, epsilon = TOL);
    }

    #[test]
    fn test_log_of_pure_translation() {
        let t = Vector3::new(0.5, -1.0, 2.0);
        let m = SE3::new(UnitQuaternion::identity(), t).log();
        assert_abs_diff_eq!(m.angular.norm(), 0.0, epsilon = TOL);
        assert_abs_diff_eq!((m.linear - t).norm(), 0.0, epsilon = TOL);
    }

    #[test]
    fn test_log_angular_part_is_rotation_vector() {
        let t = SE3::new(rot_z(0.9), Vector3::new(1.0, 0.0, 0.0));
        let m = t.log();
        assert_abs_diff_eq!((m.angular - Vector3::new(0.0, 0.0, 0.9)).norm(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_log_linear_part_small_angle_expansion() {
        // For small rotations, V^-1 t ~ t - 0.5 w x t.
        let w = Vector3::new(0.0, 0.0, 1e-5);
        let t = Vector3::new(1.0, 2.0, 3.0);
        let m = SE3::new(UnitQuaternion::from_scaled_axis(w), t).log();
        let expected = t - 0.5 * w.cross(&t);
        assert_abs_diff_eq!((m.linear - expected).norm(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_act_motion_pure_translation_shifts_moment_point() {
        let p = Vector3::new(0.0, 1.0, 0.0);
        let placement = SE3::new(UnitQuaternion::identity(), p);
        let m = Motion::new(Vector3::new(0.0, 0.0, 2.0), Vector3::new(1.0, 0.0, 0.0));
        let out = placement.act_motion(&m);
        assert_abs_diff_eq!((out.angular - m.angular).norm(), 0.0, epsilon = TOL);
        let expected = m.linear + p.cross(&m.angular);
        assert_abs_diff_eq!((out.linear - expected).norm(), 0.0, epsilon = TOL);
    }

    #[test]
    fn test_act_motion_inverse_round_trip() {
        let placement = SE3::new(rot_z(1.2), Vector3::new(0.3, 0.4, -0.5));
        let m = Motion::new(Vector3::new(0.1, -0.2, 0.3), Vector3::new(-1.0, 2.0, 0.5));
        let back = placement.inv().act_motion(&placement.act_motion(&m));
        assert_abs_diff_eq!((back.vector() - m.vector()).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cross_motion_with_self_is_zero() {
        let v = Motion::new(Vector3::new(0.1, 0.2, 0.3), Vector3::new(-1.0, 0.5, 2.0));
        let out = v.cross_motion(&v);
        assert_abs_diff_eq!(out.vector().norm(), 0.0, epsilon = TOL);
    }

    #[test]
    fn test_act_force_preserves_power() {
        // Power f . v is frame invariant under a common transform.
        let placement = SE3::new(rot_z(0.4), Vector3::new(1.0, -1.0, 0.2));
        let v = Motion::new(Vector3::new(0.2, 0.1, -0.3), Vector3::new(0.5, 0.0, 1.0));
        let f = Force::new(Vector3::new(-0.1, 0.4, 0.2), Vector3::new(2.0, 1.0, -1.0));
        let power = f.vector().dot(&v.vector());
        let power_after = placement
            .act_force(&f)
            .vector()
            .dot(&placement.act_motion(&v).vector());
        assert_abs_diff_eq!(power, power_after, epsilon = 1e-12);
    }
}
