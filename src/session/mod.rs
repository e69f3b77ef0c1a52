pub mod config;
pub mod controller;

// Re-export main types
pub use config::SessionConfig;
pub use controller::Session;
