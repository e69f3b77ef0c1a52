pub mod interpreter;

// Re-export main types
pub use interpreter::{FrameInput, GestureInterpreter, Intent, PlacementHit, PlacementMode};
