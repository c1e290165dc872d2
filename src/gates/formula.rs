//! Expression-form rate curves over a single input variable.
//!
//! Instead of tabulating, this gate keeps two compiled expressions and
//! evaluates them on demand. Slower than a table lookup but exact, and free
//! of the range/resolution bookkeeping.
//!
//! The two expression slots carry either the alpha/beta (forward/backward
//! rate) pair or the tau/inf (time constant / steady state) pair; a flag
//! records which interpretation is live and setting one pair clears the
//! other's interpretation. In tau/inf mode the returned rates are
//! `A = inf/tau` and `B = 1/tau`, so the channel-side integration never has
//! to care which form the modeler wrote.

use crate::error::KineticsError;
use crate::expr::{Bindings, RateExpr};
use crate::gates::{check_original, ChannelId};

/// A pair of compiled rate expressions over one input variable `v`.
#[derive(Debug, Clone)]
pub struct RateFormula {
    original: ChannelId,
    /// Holds alpha, or tau when `tau_inf` is set.
    forward: Option<RateExpr>,
    /// Holds beta, or inf when `tau_inf` is set.
    backward: Option<RateExpr>,
    tau_inf: bool,
}

impl RateFormula {
    /// Create an empty formula gate owned by `original`. Until both
    /// expressions compile the gate is non-functional and lookups fail.
    pub fn new(original: ChannelId) -> Self {
        Self {
            original,
            forward: None,
            backward: None,
            tau_inf: false,
        }
    }

    /// Id of the owning channel.
    pub fn original(&self) -> ChannelId {
        self.original
    }

    /// Whether the expressions are interpreted as tau/inf.
    pub fn uses_tau_inf(&self) -> bool {
        self.tau_inf
    }

    // ------------------------------------------------------------------
    // Expression assignment
    // ------------------------------------------------------------------

    /// Set the forward-rate (alpha) expression. A compile failure leaves
    /// any prior expression in place.
    pub fn set_alpha(&mut self, caller: ChannelId, source: &str) -> Result<(), KineticsError> {
        check_original(self.original, caller, "alpha")?;
        let expr = RateExpr::compile(source).map_err(warn_compile)?;
        self.tau_inf = false;
        self.forward = Some(expr);
        Ok(())
    }

    /// Set the backward-rate (beta) expression.
    pub fn set_beta(&mut self, caller: ChannelId, source: &str) -> Result<(), KineticsError> {
        check_original(self.original, caller, "beta")?;
        let expr = RateExpr::compile(source).map_err(warn_compile)?;
        self.tau_inf = false;
        self.backward = Some(expr);
        Ok(())
    }

    /// Set the time-constant (tau) expression, switching to tau/inf mode.
    pub fn set_tau(&mut self, caller: ChannelId, source: &str) -> Result<(), KineticsError> {
        check_original(self.original, caller, "tau")?;
        let expr = RateExpr::compile(source).map_err(warn_compile)?;
        self.tau_inf = true;
        self.forward = Some(expr);
        Ok(())
    }

    /// Set the steady-state (inf) expression, switching to tau/inf mode.
    pub fn set_inf(&mut self, caller: ChannelId, source: &str) -> Result<(), KineticsError> {
        check_original(self.original, caller, "inf")?;
        let expr = RateExpr::compile(source).map_err(warn_compile)?;
        self.tau_inf = true;
        self.backward = Some(expr);
        Ok(())
    }

    /// The alpha source text, empty when tau/inf mode is live.
    pub fn alpha_source(&self) -> &str {
        if self.tau_inf {
            ""
        } else {
            self.forward.as_ref().map_or("", RateExpr::source)
        }
    }

    /// The beta source text, empty when tau/inf mode is live.
    pub fn beta_source(&self) -> &str {
        if self.tau_inf {
            ""
        } else {
            self.backward.as_ref().map_or("", RateExpr::source)
        }
    }

    /// The tau source text, empty in alpha/beta mode.
    pub fn tau_source(&self) -> &str {
        if self.tau_inf {
            self.forward.as_ref().map_or("", RateExpr::source)
        } else {
            ""
        }
    }

    /// The inf source text, empty in alpha/beta mode.
    pub fn inf_source(&self) -> &str {
        if self.tau_inf {
            self.backward.as_ref().map_or("", RateExpr::source)
        } else {
            ""
        }
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    /// Compute the A rate at input `v`.
    pub fn lookup_a(&self, v: f64) -> Result<f64, KineticsError> {
        self.eval_both(&Bindings::one(v)).map(|(a, _)| a)
    }

    /// Compute the B rate at input `v`.
    pub fn lookup_b(&self, v: f64) -> Result<f64, KineticsError> {
        self.eval_both(&Bindings::one(v)).map(|(_, b)| b)
    }

    /// Compute both rates at input `v`, binding the input once.
    pub fn lookup_both(&self, v: f64) -> Result<(f64, f64), KineticsError> {
        self.eval_both(&Bindings::one(v))
    }

    pub(crate) fn eval_both(&self, bindings: &Bindings) -> Result<(f64, f64), KineticsError> {
        let (Some(forward), Some(backward)) = (&self.forward, &self.backward) else {
            return Err(KineticsError::EmptyExpression("formula"));
        };
        let fwd = forward.eval(bindings)?;
        let bwd = backward.eval(bindings)?;
        if self.tau_inf {
            // forward = tau, backward = inf.
            Ok((bwd / fwd, 1.0 / fwd))
        } else {
            Ok((fwd, fwd + bwd))
        }
    }
}

fn warn_compile(err: KineticsError) -> KineticsError {
    log::warn!("{err}");
    err
}
