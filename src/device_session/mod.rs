//! Device Session Module
//!
//! Trait seam between the motion core and the wire-level device client,
//! plus the production ONVIF implementation.

pub mod onvif;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;

pub use onvif::{OnvifConnector, OnvifSession};
pub use types::*;
