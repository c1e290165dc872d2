//! Input-selector enumeration for gate slots.
//!
//! A channel carries three signals (membrane voltage and two
//! concentrations) and each gate consumes one or two of them. The
//! selector, assigned as one of six fixed strings, maps the channel's
//! signals onto the gate's positional inputs. The string is resolved into
//! signal indices exactly once, at assignment; the per-step path never
//! parses anything.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KineticsError;

/// One of the channel's three input signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Membrane voltage (V).
    Volt,
    /// First concentration input (mM).
    Conc1,
    /// Second concentration input (mM).
    Conc2,
}

/// Mapping from channel signals onto a gate's one or two inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum InputSelector {
    /// Voltage only.
    #[default]
    Volt,
    /// First concentration only.
    C1,
    /// Second concentration only.
    C2,
    /// Voltage to the first input, concentration 1 to the second.
    VoltC1,
    /// Voltage to the first input, concentration 2 to the second.
    VoltC2,
    /// Concentration 1 to the first input, concentration 2 to the second.
    C1C2,
}

/// The recognized selector strings, in the vocabulary modelers use.
pub const SELECTOR_NAMES: [(&str, InputSelector); 6] = [
    ("VOLT_INDEX", InputSelector::Volt),
    ("C1_INDEX", InputSelector::C1),
    ("C2_INDEX", InputSelector::C2),
    ("VOLT_C1_INDEX", InputSelector::VoltC1),
    ("VOLT_C2_INDEX", InputSelector::VoltC2),
    ("C1_C2_INDEX", InputSelector::C1C2),
];

impl InputSelector {
    /// The signal feeding the gate's first input.
    pub fn primary(self) -> Signal {
        match self {
            InputSelector::Volt | InputSelector::VoltC1 | InputSelector::VoltC2 => Signal::Volt,
            InputSelector::C1 | InputSelector::C1C2 => Signal::Conc1,
            InputSelector::C2 => Signal::Conc2,
        }
    }

    /// The signal feeding the gate's second input, if the selector maps
    /// two.
    pub fn secondary(self) -> Option<Signal> {
        match self {
            InputSelector::Volt | InputSelector::C1 | InputSelector::C2 => None,
            InputSelector::VoltC1 => Some(Signal::Conc1),
            InputSelector::VoltC2 | InputSelector::C1C2 => Some(Signal::Conc2),
        }
    }

    /// The selector's canonical string form.
    pub fn as_str(self) -> &'static str {
        match self {
            InputSelector::Volt => "VOLT_INDEX",
            InputSelector::C1 => "C1_INDEX",
            InputSelector::C2 => "C2_INDEX",
            InputSelector::VoltC1 => "VOLT_C1_INDEX",
            InputSelector::VoltC2 => "VOLT_C2_INDEX",
            InputSelector::C1C2 => "C1_C2_INDEX",
        }
    }
}

impl FromStr for InputSelector {
    type Err = KineticsError;

    /// An unrecognized name is a recoverable configuration error, not an
    /// invariant breach; prior selector state stays in force.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SELECTOR_NAMES
            .iter()
            .find(|(name, _)| *name == s)
            .map(|&(_, sel)| sel)
            .ok_or_else(|| KineticsError::UnknownSelector(s.to_string()))
    }
}

impl fmt::Display for InputSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for InputSelector {
    type Error = KineticsError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<InputSelector> for String {
    fn from(sel: InputSelector) -> Self {
        sel.as_str().to_string()
    }
}
