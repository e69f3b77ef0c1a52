//! Raw touch input as delivered by the host platform.
//!
//! The interpreter never talks to a touchscreen directly; the embedding
//! application collects whatever its input layer reports each frame and hands
//! the samples over as a plain slice.

use cgmath::{MetricSpace, Vector2};

/// Lifecycle phase of a single touch, one report per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    /// Finger just landed on the screen.
    Began,
    /// Finger moved since the previous frame.
    Moved,
    /// Finger is down but has not moved.
    Stationary,
    /// Finger lifted off the screen.
    Ended,
    /// The platform aborted the touch (incoming call, palm rejection).
    Canceled,
}

/// One active touch, sampled once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchSample {
    /// Stable identifier for the finger across frames.
    pub id: u64,
    /// Position in screen coordinates.
    pub position: Vector2<f32>,
    pub phase: TouchPhase,
}

impl TouchSample {
    pub fn new(id: u64, position: Vector2<f32>, phase: TouchPhase) -> Self {
        Self {
            id,
            position,
            phase,
        }
    }
}

/// Screen-space distance between the first two touches of a pinch.
pub fn two_finger_distance(first: &TouchSample, second: &TouchSample) -> f32 {
    first.position.distance(second.position)
}
