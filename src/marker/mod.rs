pub mod settle;

// Re-export main types
pub use settle::{Commit, ImageEvent, MarkerId, SettleMachine, SpawnGate, TrackingState};
