//! Channel Kinetics - Hodgkin-Huxley ion channel gating engine
//!
//! This library computes voltage- and concentration-dependent gating
//! kinetics for ion channels: rate curves in tabulated or expression form,
//! and a per-timestep driver that combines gate states into a channel
//! conductance and current.

pub mod channel;
pub mod config;
pub mod error;
pub mod expr;
pub mod gates;

pub use channel::{GateId, GatingSolver, InputSelector, KineticsForm, SharedGate, Signal};
pub use config::{ChannelParameters, GateParameters, KineticsSpec};
pub use error::KineticsError;
pub use gates::{
    ChannelId, GateKinetics, Parameterization, RateFormula, RateFormula2D, RateTable, TableForm,
    SINGULARITY,
};
