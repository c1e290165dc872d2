//! Expression-form rate curves over two input variables.
//!
//! Extends the single-variable formula gate with a second bound variable
//! `c`, for channels whose kinetics depend on both voltage and a
//! concentration (calcium-dependent potassium channels being the usual
//! case). Direct evaluation matters here: a concentration input can span an
//! exponential scale that a fixed-resolution table resolves poorly, and a
//! two-dimensional table of useful resolution gets large.
//!
//! While the variable names say voltage and concentration, they are just
//! the gate's two positional inputs; the channel's input selector decides
//! which signals feed them.

use crate::error::KineticsError;
use crate::expr::Bindings;
use crate::gates::{ChannelId, RateFormula};

/// A pair of compiled rate expressions over inputs `v` and `c`.
#[derive(Debug, Clone)]
pub struct RateFormula2D {
    inner: RateFormula,
}

impl RateFormula2D {
    /// Create an empty two-variable formula gate owned by `original`.
    pub fn new(original: ChannelId) -> Self {
        Self {
            inner: RateFormula::new(original),
        }
    }

    /// Id of the owning channel.
    pub fn original(&self) -> ChannelId {
        self.inner.original()
    }

    /// Whether the expressions are interpreted as tau/inf.
    pub fn uses_tau_inf(&self) -> bool {
        self.inner.uses_tau_inf()
    }

    /// Set the forward-rate (alpha) expression.
    pub fn set_alpha(&mut self, caller: ChannelId, source: &str) -> Result<(), KineticsError> {
        self.inner.set_alpha(caller, source)
    }

    /// Set the backward-rate (beta) expression.
    pub fn set_beta(&mut self, caller: ChannelId, source: &str) -> Result<(), KineticsError> {
        self.inner.set_beta(caller, source)
    }

    /// Set the time-constant (tau) expression, switching to tau/inf mode.
    pub fn set_tau(&mut self, caller: ChannelId, source: &str) -> Result<(), KineticsError> {
        self.inner.set_tau(caller, source)
    }

    /// Set the steady-state (inf) expression, switching to tau/inf mode.
    pub fn set_inf(&mut self, caller: ChannelId, source: &str) -> Result<(), KineticsError> {
        self.inner.set_inf(caller, source)
    }

    /// The alpha source text, empty when tau/inf mode is live.
    pub fn alpha_source(&self) -> &str {
        self.inner.alpha_source()
    }

    /// The beta source text, empty when tau/inf mode is live.
    pub fn beta_source(&self) -> &str {
        self.inner.beta_source()
    }

    /// The tau source text, empty in alpha/beta mode.
    pub fn tau_source(&self) -> &str {
        self.inner.tau_source()
    }

    /// The inf source text, empty in alpha/beta mode.
    pub fn inf_source(&self) -> &str {
        self.inner.inf_source()
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    /// Compute the A rate from a slice of input values `[v, c]`.
    ///
    /// Fewer than two values is a degenerate call: a diagnostic is emitted
    /// and the documented failure value 0.0 returned. Values beyond the
    /// first two are ignored with a warning.
    pub fn lookup_a_slice(&self, inputs: &[f64]) -> f64 {
        match self.checked_inputs(inputs, "lookup_a") {
            Some((v, c)) => self.lookup_both(v, c).map(|(a, _)| a).unwrap_or_else(|e| {
                log::warn!("{e}");
                0.0
            }),
            None => 0.0,
        }
    }

    /// Compute the B rate from a slice of input values `[v, c]`. Failure
    /// semantics as in [`lookup_a_slice`](Self::lookup_a_slice).
    pub fn lookup_b_slice(&self, inputs: &[f64]) -> f64 {
        match self.checked_inputs(inputs, "lookup_b") {
            Some((v, c)) => self.lookup_both(v, c).map(|(_, b)| b).unwrap_or_else(|e| {
                log::warn!("{e}");
                0.0
            }),
            None => 0.0,
        }
    }

    /// Compute both rates, binding both variables once.
    pub fn lookup_both(&self, v: f64, c: f64) -> Result<(f64, f64), KineticsError> {
        self.inner.eval_both(&Bindings::two(v, c))
    }

    fn checked_inputs(&self, inputs: &[f64], op: &str) -> Option<(f64, f64)> {
        if inputs.len() < 2 {
            log::warn!("{op}: 2 input values needed for a two-variable gate, got {}", inputs.len());
            return None;
        }
        if inputs.len() > 2 {
            log::warn!(
                "{op}: only 2 input values needed for a two-variable gate, got {}; using the first 2",
                inputs.len()
            );
        }
        Some((inputs[0], inputs[1]))
    }
}
