pub mod corrector;
pub mod data;
pub mod model;

use serde::{Deserialize, Serialize};
use spatial_algebra::{Motion, SE3, SpatialError};
use thiserror::Error;

pub use corrector::BaumgarteCorrectorParameters;
pub use data::ContactData;
pub use model::ContactModel;

/// Index of a joint in the external kinematic tree.
pub type JointIndex = usize;

/// The root of the kinematic tree, standing in for the environment when a
/// contact couples a body with the world.
pub const WORLD_JOINT_ID: JointIndex = 0;

/// Sentinel for an unset joint index.
pub const INVALID_JOINT_ID: JointIndex = usize::MAX;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ContactError {
    #[error("dimension mismatch for {field}: expected {expected}, got {got}")]
    DimensionMismatch {
        field: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("joint1 index is invalid")]
    InvalidJointIndex,
    #[error("corrector gains must be finite")]
    NonFiniteGains,
    #[error("{0}")]
    Spatial(#[from] SpatialError),
}

/// The kind of constraint a contact enforces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactType {
    /// Pins the translation of the two contact frames together (3 constraint rows).
    Point3D,
    /// Pins the full placement of the two contact frames together (6 constraint rows).
    Rigid6D,
}

impl ContactType {
    /// Dimension of every contact-space quantity for this kind of contact.
    pub fn size(&self) -> usize {
        match self {
            ContactType::Point3D => 3,
            ContactType::Rigid6D => 6,
        }
    }
}

/// The frame in which a contact's kinematic and error quantities are expressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceFrame {
    /// Quantities expressed at the world origin, world axes.
    World,
    /// Quantities expressed at the contact frame, contact axes.
    Local,
    /// Quantities expressed at the contact frame origin but along world axes.
    LocalWorldAligned,
}

impl ReferenceFrame {
    /// Expresses a world-frame motion in this reference frame.
    ///
    /// # Arguments
    ///
    /// * `placement` - The placement of the contact frame in the world.
    /// * `world_motion` - The motion expressed at the world origin.
    ///
    /// # Returns
    ///
    /// The same motion expressed per this frame convention.
    pub fn express_motion(&self, placement: &SE3, world_motion: &Motion) -> Motion {
        match self {
            ReferenceFrame::World => *world_motion,
            ReferenceFrame::Local => placement.inv().act_motion(world_motion),
            ReferenceFrame::LocalWorldAligned => {
                SE3::new(nalgebra::UnitQuaternion::identity(), placement.translation)
                    .inv()
                    .act_motion(world_motion)
            }
        }
    }

    /// Expresses a motion given in the contact frame's local coordinates in
    /// this reference frame.
    pub fn from_local(&self, placement: &SE3, local_motion: &Motion) -> Motion {
        match self {
            ReferenceFrame::World => placement.act_motion(local_motion),
            ReferenceFrame::Local => *local_motion,
            ReferenceFrame::LocalWorldAligned => Motion::new(
                placement.rotation * local_motion.angular,
                placement.rotation * local_motion.linear,
            ),
        }
    }
}
