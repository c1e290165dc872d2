//! Configuration module for loading channel descriptions.
//!
//! Channels deserialize from JSON and build into ready-to-run drivers;
//! literature-derived defaults include citations to their source
//! publications.

mod parameters;

pub use parameters::{ChannelParameters, GateParameters, KineticsSpec};
