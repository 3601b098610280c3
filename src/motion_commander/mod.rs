//! Motion Commander Module
//!
//! Validated, clamped, logged movement commands for one PTZ camera.

pub mod service;
pub mod types;

pub use service::MotionCommander;
pub use types::*;
