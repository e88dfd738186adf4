use crate::model::ContactModel;
use crate::{ContactError, ContactType};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use spatial_algebra::{Motion, SE3};

/// Flattens a motion to the contact dimension: all six rows for a rigid
/// contact, the linear rows only for a point contact.
fn reduce(m: &Motion, contact_type: ContactType) -> DVector<f64> {
    match contact_type {
        ContactType::Point3D => DVector::from_column_slice(m.linear.as_slice()),
        ContactType::Rigid6D => DVector::from_column_slice(m.vector().as_slice()),
    }
}

macro_rules! checked_setters {
    ($($(#[$doc:meta])* $setter:ident => $field:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $setter(&mut self, value: DVector<f64>) -> Result<(), ContactError> {
                if value.len() != self.dim {
                    return Err(ContactError::DimensionMismatch {
                        field: stringify!($field),
                        expected: self.dim,
                        got: value.len(),
                    });
                }
                self.$field = value;
                Ok(())
            }
        )*
    };
}

/// Per-evaluation working data of one rigid contact constraint.
///
/// Created once by [`ContactModel::create_data`] and overwritten every solver
/// iteration. All contact-space vectors have dimension `model.size()` and are
/// expressed in the model's reference frame. Reading before an evaluation has
/// populated the record yields the zero/identity defaults; no staleness is
/// tracked here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContactData {
    /// Placement of contact frame 1 with respect to the world frame.
    pub contact1_placement: SE3,
    /// Placement of contact frame 2 with respect to the world frame.
    pub contact2_placement: SE3,
    /// Relative displacement of frame 2 in frame 1, re-derived from the two
    /// world placements at every evaluation.
    pub relative_placement: SE3,
    /// Placement error between the two contact frames, as a motion error.
    pub contact_placement_error: DVector<f64>,
    /// Spatial velocity of contact frame 1.
    pub contact1_velocity: DVector<f64>,
    /// Spatial velocity of contact frame 2.
    pub contact2_velocity: DVector<f64>,
    /// Relative velocity of the two contact frames (frame 1 minus frame 2).
    pub contact_velocity_error: DVector<f64>,
    /// Current spatial acceleration of the constraint.
    pub contact_acceleration: DVector<f64>,
    /// Desired contact acceleration, copied from the model.
    pub contact_acceleration_desired: DVector<f64>,
    /// Acceleration error introduced by the integration step.
    pub contact_acceleration_error: DVector<f64>,
    /// Drift acceleration of contact frame 1: the acceleration the frame
    /// would have from Coriolis and centrifugal effects alone, with zero
    /// generalized accelerations.
    pub contact1_acceleration_drift: DVector<f64>,
    /// Drift acceleration of contact frame 2.
    pub contact2_acceleration_drift: DVector<f64>,
    /// Right-hand-side correction term: desired acceleration plus Baumgarte
    /// correction minus drift.
    pub contact_acceleration_deviation: DVector<f64>,
    /// Constraint force, written back by the solver after the dynamics solve.
    pub contact_force: DVector<f64>,
    contact_type: ContactType,
    dim: usize,
}

impl ContactData {
    /// Creates the zero/identity-initialized data for a model.
    pub fn new(model: &ContactModel) -> Self {
        let dim = model.size();
        Self {
            contact1_placement: SE3::identity(),
            contact2_placement: SE3::identity(),
            relative_placement: SE3::identity(),
            contact_placement_error: DVector::zeros(dim),
            contact1_velocity: DVector::zeros(dim),
            contact2_velocity: DVector::zeros(dim),
            contact_velocity_error: DVector::zeros(dim),
            contact_acceleration: DVector::zeros(dim),
            contact_acceleration_desired: DVector::zeros(dim),
            contact_acceleration_error: DVector::zeros(dim),
            contact1_acceleration_drift: DVector::zeros(dim),
            contact2_acceleration_drift: DVector::zeros(dim),
            contact_acceleration_deviation: DVector::zeros(dim),
            contact_force: DVector::zeros(dim),
            contact_type: model.contact_type,
            dim,
        }
    }

    /// Dimension of every contact-space vector held here.
    pub fn dim(&self) -> usize {
        self.dim
    }

    checked_setters! {
        /// Sets the placement error, rejecting a wrong-length vector.
        set_contact_placement_error => contact_placement_error,
        /// Sets the velocity of contact frame 1, rejecting a wrong-length vector.
        set_contact1_velocity => contact1_velocity,
        /// Sets the velocity of contact frame 2, rejecting a wrong-length vector.
        set_contact2_velocity => contact2_velocity,
        /// Sets the velocity error, rejecting a wrong-length vector.
        set_contact_velocity_error => contact_velocity_error,
        /// Sets the current constraint acceleration, rejecting a wrong-length vector.
        set_contact_acceleration => contact_acceleration,
        /// Sets the desired acceleration, rejecting a wrong-length vector.
        set_contact_acceleration_desired => contact_acceleration_desired,
        /// Sets the integration acceleration error, rejecting a wrong-length vector.
        set_contact_acceleration_error => contact_acceleration_error,
        /// Sets the drift acceleration of frame 1, rejecting a wrong-length vector.
        set_contact1_acceleration_drift => contact1_acceleration_drift,
        /// Sets the drift acceleration of frame 2, rejecting a wrong-length vector.
        set_contact2_acceleration_drift => contact2_acceleration_drift,
        /// Sets the acceleration deviation, rejecting a wrong-length vector.
        set_contact_acceleration_deviation => contact_acceleration_deviation,
        /// Sets the constraint force, rejecting a wrong-length vector.
        set_contact_force => contact_force,
    }

    /// Recomputes the contact placements and the placement error from the
    /// current world placements of the two parent joints.
    ///
    /// The relative placement is always re-derived from the two composed
    /// world placements. The error is the negated logarithm of the relative
    /// placement for a rigid contact, and the negated relative translation
    /// for a point contact, expressed in the model's reference frame.
    pub fn update_placements(
        &mut self,
        model: &ContactModel,
        joint1_placement_in_world: &SE3,
        joint2_placement_in_world: &SE3,
    ) {
        self.contact1_placement = *joint1_placement_in_world * model.joint1_placement;
        self.contact2_placement = *joint2_placement_in_world * model.joint2_placement;
        self.relative_placement = self.contact1_placement.inv() * self.contact2_placement;

        let error_local = match model.contact_type {
            ContactType::Rigid6D => -self.relative_placement.log(),
            ContactType::Point3D => {
                Motion::new(nalgebra::Vector3::zeros(), -self.relative_placement.translation)
            }
        };
        let error = model
            .reference_frame
            .from_local(&self.contact1_placement, &error_local);
        self.contact_placement_error = reduce(&error, model.contact_type);
    }

    /// Recomputes the contact-frame velocities and the velocity error from
    /// the spatial velocities of the two parent joints, each expressed in its
    /// own joint frame.
    ///
    /// Call after [`update_placements`](Self::update_placements): the world
    /// and locally-world-aligned expressions need the current placements.
    pub fn update_velocities(
        &mut self,
        model: &ContactModel,
        joint1_velocity: &Motion,
        joint2_velocity: &Motion,
    ) {
        let v1_local = model.joint1_placement.inv().act_motion(joint1_velocity);
        let v2_local = model.joint2_placement.inv().act_motion(joint2_velocity);

        let frame = model.reference_frame;
        let v1 = frame.from_local(&self.contact1_placement, &v1_local);
        let v2 = frame.from_local(&self.contact2_placement, &v2_local);
        self.contact1_velocity = reduce(&v1, model.contact_type);
        self.contact2_velocity = reduce(&v2, model.contact_type);

        // Bring the frame 2 velocity into frame 1 coordinates before differencing.
        let error_local = v1_local - self.relative_placement.act_motion(&v2_local);
        let error = frame.from_local(&self.contact1_placement, &error_local);
        self.contact_velocity_error = reduce(&error, model.contact_type);
    }

    /// Recomputes the acceleration deviation, the right-hand-side correction
    /// term of the constrained dynamics:
    /// desired acceleration + Baumgarte correction - relative drift.
    ///
    /// The desired acceleration is refreshed from the model first. The drift
    /// term is the difference of the two per-frame drift accelerations, which
    /// collapses to the frame 1 drift when frame 2 is the static environment.
    pub fn update_acceleration_deviation(
        &mut self,
        model: &ContactModel,
    ) -> Result<(), ContactError> {
        if model.desired_contact_acceleration.len() != self.dim {
            return Err(ContactError::DimensionMismatch {
                field: "desired_contact_acceleration",
                expected: self.dim,
                got: model.desired_contact_acceleration.len(),
            });
        }
        for (field, drift) in [
            ("contact1_acceleration_drift", &self.contact1_acceleration_drift),
            ("contact2_acceleration_drift", &self.contact2_acceleration_drift),
        ] {
            if drift.len() != self.dim {
                return Err(ContactError::DimensionMismatch {
                    field,
                    expected: self.dim,
                    got: drift.len(),
                });
            }
        }

        let correction = model
            .corrector
            .apply(&self.contact_placement_error, &self.contact_velocity_error)?;
        self.contact_acceleration_desired = model.desired_contact_acceleration.clone();
        let drift = &self.contact1_acceleration_drift - &self.contact2_acceleration_drift;
        self.contact_acceleration_deviation =
            &self.contact_acceleration_desired + correction - drift;
        Ok(())
    }
}
