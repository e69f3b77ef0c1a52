//! Session configuration.
//!
//! One explicit struct handed to [`Session::new`](crate::session::Session::new)
//! at construction, replacing any notion of globally shared "selected model /
//! selected mode" state. Serde derives let embedders ship it as JSON alongside
//! their asset catalogs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::gesture::PlacementMode;
use crate::scene::ModelKey;

/// Default yaw degrees per screen unit of horizontal drag.
pub const DEFAULT_ROTATE_SENSITIVITY: f32 = 0.25;

/// Default screen-distance threshold below which a pinch is treated as
/// accidental.
pub const DEFAULT_MIN_FINGER_DISTANCE: f32 = 0.1;

/// Default dwell time between first stable tracking and the spawn commit.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Everything a placement session needs to know up front.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Placement surface: detected plane or printed image marker.
    pub mode: PlacementMode,
    /// Model variant to spawn, resolved against the scene host once.
    pub model: ModelKey,
    /// Yaw degrees applied per screen unit of horizontal drag.
    pub rotate_sensitivity: f32,
    /// Pinches tighter than this screen distance are ignored.
    pub min_finger_distance: f32,
    /// Optional floor for pinch-scale candidates (x component). `None`
    /// disables the floor.
    pub min_scale: Option<f32>,
    /// Settle dwell before a marker spawn or reposition commits.
    pub settle_delay: Duration,
    /// Whether losing a marker destroys its spawned object.
    pub destroy_on_loss: bool,
}

impl SessionConfig {
    /// Plane-mode configuration with default gesture tuning.
    pub fn plane(model: ModelKey) -> Self {
        Self {
            mode: PlacementMode::Plane,
            model,
            rotate_sensitivity: DEFAULT_ROTATE_SENSITIVITY,
            min_finger_distance: DEFAULT_MIN_FINGER_DISTANCE,
            min_scale: None,
            settle_delay: DEFAULT_SETTLE_DELAY,
            destroy_on_loss: false,
        }
    }

    /// Marker-mode configuration with default gesture tuning and settle delay.
    pub fn marker(model: ModelKey) -> Self {
        Self {
            mode: PlacementMode::Marker,
            ..Self::plane(model)
        }
    }

    /// Rejects values the session cannot meaningfully run with.
    pub fn validate(&self) -> Result<(), SessionError> {
        if !self.rotate_sensitivity.is_finite() || self.rotate_sensitivity <= 0.0 {
            return Err(SessionError::InvalidConfig(
                "rotate_sensitivity must be positive",
            ));
        }
        if !self.min_finger_distance.is_finite() || self.min_finger_distance <= 0.0 {
            return Err(SessionError::InvalidConfig(
                "min_finger_distance must be positive",
            ));
        }
        if let Some(floor) = self.min_scale {
            if !floor.is_finite() || floor <= 0.0 {
                return Err(SessionError::InvalidConfig("min_scale must be positive"));
            }
        }
        if self.mode == PlacementMode::Marker && self.settle_delay.is_zero() {
            return Err(SessionError::InvalidConfig(
                "settle_delay must be non-zero in marker mode",
            ));
        }
        Ok(())
    }
}
