//! # Placement Math
//!
//! Small rotation helpers shared by the gesture interpreter and the marker
//! settle machine. The central piece is the horizontal-facing rule: a placed
//! object should face the camera, but only in the horizontal plane, so a
//! viewer looking down at a table never tilts the model backwards.

use cgmath::{Deg, InnerSpace, Quaternion, Rad, Rotation3, Vector3};

/// A world-space position plus orientation, as reported by a tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
}

impl Pose {
    pub fn new(position: Vector3<f32>, rotation: Quaternion<f32>) -> Self {
        Self { position, rotation }
    }

    /// Pose at a position with identity orientation.
    pub fn at(position: Vector3<f32>) -> Self {
        Self {
            position,
            rotation: Quaternion::from_angle_y(Rad(0.0)),
        }
    }
}

/// Directions shorter than this are treated as degenerate (camera directly
/// above the placement point).
const MIN_FACING_DISTANCE_SQ: f32 = 1e-8;

/// Computes the horizontal-facing rotation for an object placed at `point`.
///
/// Takes the vector from the placement point to the camera, zeroes its
/// vertical component, and yaws the object's forward axis (+z) along the
/// result. Height differences between camera and object are ignored, so the
/// rotation is always a pure yaw. Returns identity when the camera sits
/// directly above the point and no horizontal direction exists.
pub fn facing_rotation(camera_position: Vector3<f32>, point: Vector3<f32>) -> Quaternion<f32> {
    let mut direction = camera_position - point;
    direction.y = 0.0;

    if direction.magnitude2() < MIN_FACING_DISTANCE_SQ {
        return Quaternion::from_angle_y(Rad(0.0));
    }

    // Yaw that carries +z onto the horizontal direction.
    Quaternion::from_angle_y(Rad(direction.x.atan2(direction.z)))
}

/// Composes a world-up yaw onto an existing rotation.
///
/// Used by drag-rotate: the delta is applied around the global up axis so a
/// horizontal finger drag always spins the model upright, regardless of the
/// model's current orientation.
pub fn apply_yaw(rotation: Quaternion<f32>, delta: Deg<f32>) -> Quaternion<f32> {
    Quaternion::from_angle_y(delta) * rotation
}

/// The world-space forward axis of a rotation (rotated +z).
pub fn forward(rotation: Quaternion<f32>) -> Vector3<f32> {
    rotation * Vector3::unit_z()
}
