// src/lib.rs
//! Placard AR Placement Core
//!
//! Engine-independent logic for mobile AR "tap to place" experiences: a
//! touch-gesture interpreter (place, move, rotate, pinch-scale) and a marker
//! settle state machine that debounces noisy image-tracker poses before
//! committing spawns. Rendering, tracking, and asset loading stay in the
//! embedding engine, reached through the [`scene::SceneHost`] trait.

pub mod error;
pub mod gesture;
pub mod input;
pub mod marker;
pub mod math;
pub mod prelude;
pub mod scene;
pub mod session;

// Re-export main types for convenience
pub use error::SessionError;
pub use session::{Session, SessionConfig};

use scene::{ModelKey, SceneHost};

/// Creates a plane-mode session with default gesture tuning.
pub fn plane_session<H: SceneHost>(model: ModelKey, host: H) -> Result<Session<H>, SessionError> {
    Session::new(SessionConfig::plane(model), host)
}

/// Creates a marker-mode session with default gesture tuning and settle delay.
pub fn marker_session<H: SceneHost>(model: ModelKey, host: H) -> Result<Session<H>, SessionError> {
    Session::new(SessionConfig::marker(model), host)
}
