//! Gate kinetics for Hodgkin-Huxley style channels.
//!
//! A gate is a single first-order kinetic variable (activation `m`,
//! inactivation `h`, ...) described by a forward rate A and a combined rate
//! B; the state relaxes toward `A/B` with time constant `1/B`. Two
//! interchangeable strategies compute (A, B) from the gate's inputs:
//!
//! - [`RateTable`]: pre-tabulated values over a bounded input range, with
//!   direct or linearly interpolated lookup. Fast, the classic GENESIS
//!   tabchannel approach.
//! - [`RateFormula`] / [`RateFormula2D`]: compiled expressions evaluated on
//!   demand. Slower, but exact, which matters when an input (typically a
//!   calcium concentration) spans an exponential scale.
//!
//! Reference: Hodgkin AL, Huxley AF. J Physiol. 1952;117:500-544

pub mod formula;
pub mod formula2d;
pub mod table;

use std::sync::atomic::{AtomicU64, Ordering};

pub use formula::RateFormula;
pub use formula2d::RateFormula2D;
pub use table::{Parameterization, RateTable, TableForm};

use crate::error::KineticsError;

/// Rate magnitudes below this are treated as singular: table entries get
/// repaired, denominators get sidestepped.
pub const SINGULARITY: f64 = 1.0e-6;

/// Identity of a channel instance, used as the ownership tag on shared
/// gates. When a channel is copied the copies reference the original's gate
/// objects; only the channel whose id matches the gate's `original` tag may
/// mutate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(u64);

impl ChannelId {
    /// Allocate a fresh process-unique id.
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// A gate's rate computation, either strategy.
#[derive(Debug, Clone)]
pub enum GateKinetics {
    /// Tabulated lookup over one input.
    Table(RateTable),
    /// Compiled expressions over one input.
    Formula(RateFormula),
    /// Compiled expressions over two inputs.
    Formula2D(RateFormula2D),
}

impl GateKinetics {
    /// Compute (A, B) from the mapped inputs. `x2` is only consulted by the
    /// two-variable form; a missing second input there is a degenerate
    /// lookup, reported as an error so the caller can skip the step.
    pub fn rates(&self, x: f64, x2: Option<f64>) -> Result<(f64, f64), KineticsError> {
        match self {
            GateKinetics::Table(gate) => Ok(gate.lookup_both(x)),
            GateKinetics::Formula(gate) => gate.lookup_both(x),
            GateKinetics::Formula2D(gate) => {
                let c = x2.ok_or(KineticsError::MissingInput {
                    expected: 2,
                    got: 1,
                })?;
                gate.lookup_both(x, c)
            }
        }
    }

    /// Id of the channel that owns this gate.
    pub fn original(&self) -> ChannelId {
        match self {
            GateKinetics::Table(gate) => gate.original(),
            GateKinetics::Formula(gate) => gate.original(),
            GateKinetics::Formula2D(gate) => gate.original(),
        }
    }
}

/// Ownership check shared by every mutating gate entry point.
pub(crate) fn check_original(
    original: ChannelId,
    caller: ChannelId,
    field: &'static str,
) -> Result<(), KineticsError> {
    if original == caller {
        Ok(())
    } else {
        log::warn!("rejecting mutation of `{field}` from a copied channel");
        Err(KineticsError::NotOriginal { field })
    }
}
