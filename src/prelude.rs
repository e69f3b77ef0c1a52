//! # Placard Prelude
//!
//! Convenient imports for typical embedders. Brings the session types, the
//! gesture and marker vocabularies, and the scene host surface into scope:
//!
//! ```rust
//! use placard::prelude::*;
//! ```

pub use crate::error::SessionError;
pub use crate::gesture::{FrameInput, GestureInterpreter, Intent, PlacementHit, PlacementMode};
pub use crate::input::{TouchPhase, TouchSample};
pub use crate::marker::{Commit, ImageEvent, MarkerId, SettleMachine, TrackingState};
pub use crate::math::{facing_rotation, Pose};
pub use crate::scene::{MemoryScene, ModelKey, ObjectHandle, SceneHost, Transform};
pub use crate::session::{Session, SessionConfig};
