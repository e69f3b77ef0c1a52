//! # Placement Gesture Interpreter
//!
//! Turns raw multi-touch samples into semantic intents for a single placed
//! object. The interpreter owns no scene objects; it only reports what the
//! user asked for and leaves applying the result to the session layer.
//!
//! ## Gesture vocabulary
//!
//! - **One finger, nothing placed** (plane mode): tap on a detected surface
//!   places the model there, facing the camera.
//! - **One finger, object placed**: drag moves the model across the surface
//!   (plane mode, until the first touch sequence ends) or spins it around the
//!   up axis (marker mode).
//! - **Two fingers, object placed**: pinch rescales the model relative to the
//!   scale it had when the pinch started.

use cgmath::{Deg, Quaternion, Vector2, Vector3};
use log::{debug, warn};

use crate::input::{two_finger_distance, TouchPhase, TouchSample};
use crate::math::facing_rotation;

/// Which surface the session places against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PlacementMode {
    /// Tap-to-place on detected horizontal planes.
    Plane,
    /// Spawn driven by a printed image marker; touches only adjust the object.
    Marker,
}

/// Hit-test result against a detected placement surface.
///
/// Only meaningful for the frame it was produced in; the session queries the
/// planar tracker anew every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementHit {
    pub position: Vector3<f32>,
}

impl PlacementHit {
    pub fn new(position: Vector3<f32>) -> Self {
        Self { position }
    }
}

/// Everything the interpreter needs for one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    /// Active touches this frame, in platform order.
    pub touches: &'a [TouchSample],
    /// Surface hit under the primary touch, if the tracker found one.
    pub hit: Option<PlacementHit>,
    /// Camera position from the pose provider, for the facing rule.
    pub camera_position: Vector3<f32>,
    /// Current scale of the placed object, if one exists.
    pub object_scale: Option<Vector3<f32>>,
}

/// A semantic request produced from one frame of touch input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    /// Spawn the session model at a surface point, facing the camera.
    Place {
        position: Vector3<f32>,
        rotation: Quaternion<f32>,
    },
    /// Slide the placed object to a new surface point, re-facing the camera.
    Move {
        position: Vector3<f32>,
        rotation: Quaternion<f32>,
    },
    /// Yaw the placed object around the world up axis.
    Rotate { delta_yaw: Deg<f32> },
    /// Set the placed object's scale outright.
    Scale { scale: Vector3<f32> },
}

#[derive(Debug, Clone, Copy)]
struct PinchState {
    initial_distance: f32,
    initial_scale: Vector3<f32>,
}

/// Stateful touch-gesture interpreter for one placement session.
///
/// Feed it every frame via [`update`](Self::update); it emits at most a
/// handful of [`Intent`]s per frame. One finger drives place/move/rotate, two
/// fingers drive pinch-scale; the two never overlap within a frame.
pub struct GestureInterpreter {
    mode: PlacementMode,
    /// Degrees of yaw per screen unit of horizontal drag.
    rotate_sensitivity: f32,
    /// Pinches tighter than this are ignored as accidental.
    min_finger_distance: f32,
    /// Optional floor on the x component of a candidate scale.
    min_scale: Option<f32>,

    placed: bool,
    movement_locked: bool,
    rotating: bool,
    last_touch_position: Vector2<f32>,
    pinch: Option<PinchState>,
}

impl GestureInterpreter {
    pub fn new(
        mode: PlacementMode,
        rotate_sensitivity: f32,
        min_finger_distance: f32,
        min_scale: Option<f32>,
    ) -> Self {
        Self {
            mode,
            rotate_sensitivity,
            min_finger_distance,
            min_scale,
            placed: false,
            movement_locked: false,
            rotating: false,
            last_touch_position: Vector2::new(0.0, 0.0),
            pinch: None,
        }
    }

    /// Interprets one frame of touch input.
    ///
    /// Missing hits, empty touch lists, and sub-threshold pinches suppress
    /// emission silently; they are expected conditions, not errors.
    pub fn update(&mut self, input: &FrameInput) -> Vec<Intent> {
        let mut intents = Vec::new();

        if self.placed && input.touches.len() >= 2 {
            self.rotating = false;
            self.handle_two_finger(input, &mut intents);
        } else {
            self.pinch = None;
            self.handle_single_finger(input, &mut intents);
        }

        intents
    }

    /// Whether a `Place` intent has been emitted (or a marker spawn reported)
    /// this session.
    pub fn is_placed(&self) -> bool {
        self.placed
    }

    /// Whether single-finger movement has been locked for the session.
    pub fn movement_locked(&self) -> bool {
        self.movement_locked
    }

    /// Marks the object as placed by an external path (marker spawn).
    pub fn notify_placed(&mut self) {
        self.placed = true;
    }

    /// Marks the object as gone again (marker lost, object destroyed).
    pub fn notify_removed(&mut self) {
        self.placed = false;
        self.rotating = false;
        self.pinch = None;
    }

    /// Returns the interpreter to its pre-placement state.
    pub fn reset(&mut self) {
        self.placed = false;
        self.movement_locked = false;
        self.rotating = false;
        self.pinch = None;
    }

    fn handle_single_finger(&mut self, input: &FrameInput, intents: &mut Vec<Intent>) {
        let Some(touch) = input.touches.first() else {
            return;
        };

        match self.mode {
            PlacementMode::Plane => self.handle_plane_touch(*touch, input, intents),
            PlacementMode::Marker => self.handle_marker_touch(*touch, intents),
        }
    }

    /// Plane mode: every phase is gated on a surface hit under the finger.
    fn handle_plane_touch(
        &mut self,
        touch: TouchSample,
        input: &FrameInput,
        intents: &mut Vec<Intent>,
    ) {
        let Some(hit) = input.hit else {
            return;
        };

        match touch.phase {
            TouchPhase::Began if !self.placed && input.touches.len() == 1 => {
                let rotation = facing_rotation(input.camera_position, hit.position);
                debug!("placing object at {:?}", hit.position);
                self.placed = true;
                intents.push(Intent::Place {
                    position: hit.position,
                    rotation,
                });
            }
            TouchPhase::Moved if self.placed && !self.movement_locked => {
                let rotation = facing_rotation(input.camera_position, hit.position);
                intents.push(Intent::Move {
                    position: hit.position,
                    rotation,
                });
            }
            TouchPhase::Ended if self.placed => {
                // First completed drag freezes the object in place for the
                // rest of the session.
                debug!("movement locked");
                self.movement_locked = true;
            }
            _ => (),
        }
    }

    /// Marker mode: the object spawns elsewhere; one finger only spins it.
    fn handle_marker_touch(&mut self, touch: TouchSample, intents: &mut Vec<Intent>) {
        if !self.placed {
            return;
        }

        match touch.phase {
            TouchPhase::Began => {
                self.last_touch_position = touch.position;
                self.rotating = true;
            }
            TouchPhase::Moved if self.rotating => {
                let delta_x = touch.position.x - self.last_touch_position.x;
                // Dragging right turns the visible face left.
                intents.push(Intent::Rotate {
                    delta_yaw: Deg(-(delta_x * self.rotate_sensitivity)),
                });
                self.last_touch_position = touch.position;
            }
            TouchPhase::Ended | TouchPhase::Canceled => {
                self.rotating = false;
            }
            _ => (),
        }
    }

    fn handle_two_finger(&mut self, input: &FrameInput, intents: &mut Vec<Intent>) {
        let first = &input.touches[0];
        let second = &input.touches[1];

        let distance = two_finger_distance(first, second);
        if distance < self.min_finger_distance {
            // Near-coincident fingers: almost certainly not a real pinch.
            return;
        }

        if first.phase == TouchPhase::Began || second.phase == TouchPhase::Began {
            let Some(object_scale) = input.object_scale else {
                debug_assert!(false, "pinch began with no placed object scale");
                warn!("pinch began with no placed object scale, ignoring");
                return;
            };
            self.pinch = Some(PinchState {
                initial_distance: distance,
                initial_scale: object_scale,
            });
        } else if first.phase == TouchPhase::Moved || second.phase == TouchPhase::Moved {
            let Some(pinch) = self.pinch else {
                return;
            };

            let factor = distance / pinch.initial_distance;
            let candidate = pinch.initial_scale * factor;

            if let Some(floor) = self.min_scale {
                if candidate.x <= floor {
                    return;
                }
            }

            intents.push(Intent::Scale { scale: candidate });
        }
    }
}
