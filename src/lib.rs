//! PTZ Core Library
//!
//! Motion-command and tracking-bridge core for PTZ cameras
//!
//! ## Architecture (7 Components)
//!
//! 1. MotionCommander - Validated absolute/continuous/relative moves, stop, position
//! 2. SmoothPlanner - Interpolated multi-step moves
//! 3. PatrolManager - Preset goto/set/remove and cyclic patrol
//! 4. CalibrationEngine - Axis limit probing and snapshot persistence
//! 5. MovementHistory - Bounded ring buffer of recent commands
//! 6. DetectionBridge - Vision pipeline to tracking controller gateway
//! 7. SystemFacade - Lifecycle delegation contract
//!
//! ## Design Principles
//!
//! - One session per camera, commands serialized through it
//! - Command failures are booleans; only connection and validation
//!   failures are structured errors
//! - Cancellation is honored between steps, never mid-call

pub mod calibration_engine;
pub mod cancel;
pub mod config;
pub mod detection_bridge;
pub mod device_session;
pub mod error;
pub mod facade;
pub mod motion_commander;
pub mod movement_history;
pub mod patrol_manager;
pub mod smooth_planner;

pub use calibration_engine::{CalibrationEngine, CalibrationLimits, CalibrationStore, JsonFileStore};
pub use cancel::CancelFlag;
pub use config::MotionConfig;
pub use detection_bridge::{
    BoundingBox, BridgeStatus, DetectionBridge, DetectionItem, FrameSize, TrackingController,
};
pub use device_session::{
    DeviceCapabilities, DeviceConnector, DeviceEndpoint, DeviceSession, DeviceStatus,
    OnvifConnector, OnvifSession,
};
pub use error::{Error, Result};
pub use facade::{SystemController, SystemFacade};
pub use motion_commander::{ConnectionState, MotionCommander, PtzPosition, PtzVelocity};
pub use movement_history::{MoveAction, MoveRecord, MovementHistory};
pub use patrol_manager::PatrolManager;
pub use smooth_planner::SmoothPlanner;
