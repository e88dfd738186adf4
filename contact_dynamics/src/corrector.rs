use crate::ContactError;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// Gains of the Baumgarte corrector attached to a contact.
///
/// The corrector adds a PD term to the target constraint acceleration to
/// counteract the drift a discrete-time integrator introduces in an
/// acceleration-level constraint. Zero gains (the default) make it a no-op,
/// which is a supported configuration for constraints already enforced
/// exactly at the velocity level.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BaumgarteCorrectorParameters {
    /// Proportional corrector gain, one entry per constraint row.
    pub kp: DVector<f64>,
    /// Damping corrector gain, one entry per constraint row.
    pub kd: DVector<f64>,
}

impl BaumgarteCorrectorParameters {
    /// Creates zero gains of the given contact dimension.
    pub fn new(dim: usize) -> Self {
        Self {
            kp: DVector::zeros(dim),
            kd: DVector::zeros(dim),
        }
    }

    /// Creates uniform gains of the given contact dimension.
    pub fn from_scalar_gains(dim: usize, kp: f64, kd: f64) -> Self {
        Self {
            kp: DVector::from_element(dim, kp),
            kd: DVector::from_element(dim, kd),
        }
    }

    /// Number of constraint rows the gains apply to.
    pub fn dim(&self) -> usize {
        self.kp.len()
    }

    /// Whether both gain vectors are finite and of matching length.
    pub fn is_valid(&self) -> bool {
        self.kp.len() == self.kd.len()
            && self.kp.iter().all(|g| g.is_finite())
            && self.kd.iter().all(|g| g.is_finite())
    }

    /// Evaluates the correction law `-kp .* e_p - kd .* e_v`.
    ///
    /// # Arguments
    ///
    /// * `placement_error` - The current constraint placement error.
    /// * `velocity_error` - The current constraint velocity error.
    ///
    /// # Returns
    ///
    /// The corrective acceleration to add to the target acceleration, or a
    /// dimension mismatch error if either operand does not match the gains.
    pub fn apply(
        &self,
        placement_error: &DVector<f64>,
        velocity_error: &DVector<f64>,
    ) -> Result<DVector<f64>, ContactError> {
        let dim = self.dim();
        if placement_error.len() != dim {
            return Err(ContactError::DimensionMismatch {
                field: "placement_error",
                expected: dim,
                got: placement_error.len(),
            });
        }
        if velocity_error.len() != dim {
            return Err(ContactError::DimensionMismatch {
                field: "velocity_error",
                expected: dim,
                got: velocity_error.len(),
            });
        }
        Ok(-self.kp.component_mul(placement_error) - self.kd.component_mul(velocity_error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_gains_are_a_noop() {
        let corrector = BaumgarteCorrectorParameters::new(6);
        let e_p = DVector::from_vec(vec![1.0, -2.0, 3.0, 0.5, 0.0, 4.0]);
        let e_v = DVector::from_vec(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
        let out = corrector.apply(&e_p, &e_v).unwrap();
        assert_eq!(out, DVector::zeros(6));
    }

    #[test]
    fn test_proportional_gain_scales_placement_error() {
        let corrector = BaumgarteCorrectorParameters::from_scalar_gains(6, 10.0, 0.0);
        let e_p = DVector::from_vec(vec![1.0, -1.0, 2.0, 0.0, 0.5, -3.0]);
        let e_v = DVector::zeros(6);
        let out = corrector.apply(&e_p, &e_v).unwrap();
        assert_eq!(out, -10.0 * &e_p);
    }

    #[test]
    fn test_zero_placement_error_contributes_nothing() {
        let corrector = BaumgarteCorrectorParameters::from_scalar_gains(3, 1e6, 0.0);
        let out = corrector.apply(&DVector::zeros(3), &DVector::zeros(3)).unwrap();
        assert_eq!(out, DVector::zeros(3));
    }

    #[test]
    fn test_damping_term() {
        let corrector = BaumgarteCorrectorParameters::from_scalar_gains(3, 0.0, 2.0);
        let e_v = DVector::from_vec(vec![1.0, 0.0, -4.0]);
        let out = corrector.apply(&DVector::zeros(3), &e_v).unwrap();
        assert_eq!(out, -2.0 * &e_v);
    }

    #[test]
    fn test_apply_rejects_wrong_dimension() {
        let corrector = BaumgarteCorrectorParameters::new(3);
        let err = corrector
            .apply(&DVector::zeros(6), &DVector::zeros(3))
            .unwrap_err();
        assert_eq!(
            err,
            ContactError::DimensionMismatch {
                field: "placement_error",
                expected: 3,
                got: 6
            }
        );
    }

    #[test]
    fn test_is_valid_rejects_non_finite_gains() {
        let mut corrector = BaumgarteCorrectorParameters::from_scalar_gains(3, 1.0, 1.0);
        assert!(corrector.is_valid());
        corrector.kp[1] = f64::NAN;
        assert!(!corrector.is_valid());
    }
}
