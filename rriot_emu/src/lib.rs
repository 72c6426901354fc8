//! Cycle-level emulation of the MOS 6530 RRIOT.
#![allow(clippy::module_name_repetitions)]

pub mod chips;
pub mod event;
pub mod systems;

pub use chips::m6530::config::{Config, ConfigError};
pub use chips::m6530::M6530;
