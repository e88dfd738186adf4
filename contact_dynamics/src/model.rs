use crate::corrector::BaumgarteCorrectorParameters;
use crate::data::ContactData;
use crate::{ContactError, ContactType, INVALID_JOINT_ID, JointIndex, ReferenceFrame, WORLD_JOINT_ID};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use spatial_algebra::SE3;

/// The description of one rigid contact constraint.
///
/// A model couples a frame attached to `joint1` with a frame attached to
/// `joint2` (the tree root when the contact is with the environment), fixes
/// the frame in which all kinematic and error quantities are expressed, and
/// carries the target kinematics and corrector gains the solver drives the
/// contact toward. It is read-only during a solve; per-iteration results
/// live in the [`ContactData`] its factory creates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContactModel {
    /// Name of the contact.
    pub name: String,
    /// Kind of constraint the contact enforces.
    pub contact_type: ContactType,
    /// Index of the first parent joint in the kinematic tree.
    pub joint1_id: JointIndex,
    /// Index of the second parent joint in the kinematic tree.
    pub joint2_id: JointIndex,
    /// Placement of the contact frame with respect to the frame of joint1.
    pub joint1_placement: SE3,
    /// Placement of the contact frame with respect to the frame of joint2.
    pub joint2_placement: SE3,
    /// Frame in which the contact's quantities are expressed.
    pub reference_frame: ReferenceFrame,
    /// Target contact placement.
    pub desired_contact_placement: SE3,
    /// Target contact velocity, dimension `size()`.
    pub desired_contact_velocity: DVector<f64>,
    /// Target contact acceleration, dimension `size()`.
    pub desired_contact_acceleration: DVector<f64>,
    /// Gains of the attached Baumgarte corrector.
    pub corrector: BaumgarteCorrectorParameters,
}

impl ContactModel {
    /// Creates a contact model coupling frames on two joints.
    ///
    /// # Arguments
    ///
    /// * `contact_type` - The kind of constraint.
    /// * `joint1_id` - Index of the first parent joint.
    /// * `joint1_placement` - Placement of the contact frame in the joint1 frame.
    /// * `joint2_id` - Index of the second parent joint.
    /// * `joint2_placement` - Placement of the contact frame in the joint2 frame.
    /// * `reference_frame` - Frame in which the contact's quantities are expressed.
    ///
    /// # Returns
    ///
    /// The model, or an error if `joint1_id` is the invalid sentinel.
    pub fn new(
        contact_type: ContactType,
        joint1_id: JointIndex,
        joint1_placement: SE3,
        joint2_id: JointIndex,
        joint2_placement: SE3,
        reference_frame: ReferenceFrame,
    ) -> Result<Self, ContactError> {
        if joint1_id == INVALID_JOINT_ID {
            return Err(ContactError::InvalidJointIndex);
        }
        let size = contact_type.size();
        Ok(Self {
            name: String::new(),
            contact_type,
            joint1_id,
            joint2_id,
            joint1_placement,
            joint2_placement,
            reference_frame,
            desired_contact_placement: SE3::identity(),
            desired_contact_velocity: DVector::zeros(size),
            desired_contact_acceleration: DVector::zeros(size),
            corrector: BaumgarteCorrectorParameters::new(size),
        })
    }

    /// Creates a contact model from the first joint only, with the tree root
    /// as the second body and an identity placement on its side.
    pub fn with_joint1(
        contact_type: ContactType,
        joint1_id: JointIndex,
        joint1_placement: SE3,
        reference_frame: ReferenceFrame,
    ) -> Result<Self, ContactError> {
        Self::new(
            contact_type,
            joint1_id,
            joint1_placement,
            WORLD_JOINT_ID,
            SE3::identity(),
            reference_frame,
        )
    }

    /// Creates a contact model against the environment: the tree root is the
    /// second body and both placements are the identity.
    pub fn against_world(
        contact_type: ContactType,
        joint1_id: JointIndex,
        reference_frame: ReferenceFrame,
    ) -> Result<Self, ContactError> {
        Self::with_joint1(contact_type, joint1_id, SE3::identity(), reference_frame)
    }

    /// Dimension of every contact-space quantity of this contact.
    pub fn size(&self) -> usize {
        self.contact_type.size()
    }

    /// Creates the working data bound to this model, with identity placements
    /// and zero vectors.
    pub fn create_data(&self) -> ContactData {
        ContactData::new(self)
    }

    /// Sets the target contact velocity, rejecting a wrong-length vector.
    pub fn set_desired_contact_velocity(
        &mut self,
        velocity: DVector<f64>,
    ) -> Result<(), ContactError> {
        if velocity.len() != self.size() {
            return Err(ContactError::DimensionMismatch {
                field: "desired_contact_velocity",
                expected: self.size(),
                got: velocity.len(),
            });
        }
        self.desired_contact_velocity = velocity;
        Ok(())
    }

    /// Sets the target contact acceleration, rejecting a wrong-length vector.
    pub fn set_desired_contact_acceleration(
        &mut self,
        acceleration: DVector<f64>,
    ) -> Result<(), ContactError> {
        if acceleration.len() != self.size() {
            return Err(ContactError::DimensionMismatch {
                field: "desired_contact_acceleration",
                expected: self.size(),
                got: acceleration.len(),
            });
        }
        self.desired_contact_acceleration = acceleration;
        Ok(())
    }

    /// Sets the corrector gains, rejecting wrong-length or non-finite gains.
    pub fn set_corrector(
        &mut self,
        corrector: BaumgarteCorrectorParameters,
    ) -> Result<(), ContactError> {
        if corrector.dim() != self.size() {
            return Err(ContactError::DimensionMismatch {
                field: "corrector",
                expected: self.size(),
                got: corrector.dim(),
            });
        }
        if !corrector.is_valid() {
            return Err(ContactError::NonFiniteGains);
        }
        self.corrector = corrector;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::INVALID_JOINT_ID;
    use nalgebra::{UnitQuaternion, Vector3};

    fn rigid_model() -> ContactModel {
        ContactModel::new(
            ContactType::Rigid6D,
            2,
            SE3::identity(),
            0,
            SE3::identity(),
            ReferenceFrame::Local,
        )
        .unwrap()
    }

    #[test]
    fn test_size_follows_contact_type() {
        assert_eq!(rigid_model().size(), 6);
        let point = ContactModel::against_world(ContactType::Point3D, 1, ReferenceFrame::World)
            .unwrap();
        assert_eq!(point.size(), 3);
    }

    #[test]
    fn test_against_world_defaults() {
        let model =
            ContactModel::against_world(ContactType::Point3D, 5, ReferenceFrame::Local).unwrap();
        assert_eq!(model.joint2_id, WORLD_JOINT_ID);
        assert_eq!(model.joint2_placement, SE3::identity());
        assert_eq!(model.joint1_placement, SE3::identity());
        assert_eq!(model.size(), 3);
    }

    #[test]
    fn test_invalid_joint1_is_rejected() {
        let result = ContactModel::against_world(
            ContactType::Rigid6D,
            INVALID_JOINT_ID,
            ReferenceFrame::World,
        );
        assert_eq!(result.unwrap_err(), ContactError::InvalidJointIndex);
    }

    #[test]
    fn test_create_data_is_zero_initialized() {
        let model = rigid_model();
        let data = model.create_data();
        assert_eq!(data.contact_force, DVector::zeros(6));
        assert_eq!(data.contact_velocity_error, DVector::zeros(6));
        assert_eq!(data.contact_acceleration_deviation, DVector::zeros(6));
        assert_eq!(data.contact1_placement, SE3::identity());
        assert_eq!(data.relative_placement, SE3::identity());
    }

    #[test]
    fn test_equality_is_structural() {
        let a = rigid_model();
        let b = rigid_model();
        assert_eq!(a, b);

        let mut c = rigid_model();
        c.joint1_placement = SE3::new(
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.1),
            Vector3::zeros(),
        );
        assert_ne!(a, c);

        let mut d = rigid_model();
        d.name = "left_foot".to_string();
        assert_ne!(a, d);
    }

    #[test]
    fn test_desired_setters_check_dimension() {
        let mut model = rigid_model();
        let err = model
            .set_desired_contact_velocity(DVector::zeros(3))
            .unwrap_err();
        assert_eq!(
            err,
            ContactError::DimensionMismatch {
                field: "desired_contact_velocity",
                expected: 6,
                got: 3
            }
        );
        assert!(model.set_desired_contact_acceleration(DVector::zeros(6)).is_ok());
    }

    #[test]
    fn test_set_corrector_rejects_bad_gains() {
        let mut model = rigid_model();
        let err = model
            .set_corrector(BaumgarteCorrectorParameters::new(3))
            .unwrap_err();
        assert!(matches!(err, ContactError::DimensionMismatch { .. }));

        let mut gains = BaumgarteCorrectorParameters::from_scalar_gains(6, 1.0, 0.1);
        gains.kd[0] = f64::INFINITY;
        assert_eq!(model.set_corrector(gains).unwrap_err(), ContactError::NonFiniteGains);
    }
}
