pub mod touch;

// Re-export main types
pub use touch::{two_finger_distance, TouchPhase, TouchSample};
