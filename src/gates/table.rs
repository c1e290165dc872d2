//! Tabulated rate curves with clamped, optionally interpolated lookup.
//!
//! The classic tabchannel approach: rather than evaluating rate formulas at
//! every timestep, the forward rate A and combined rate B = alpha + beta are
//! sampled once over a bounded input range and looked up by direct scaling
//! to an integer index, or by linear interpolation for smoother curves.
//!
//! Tables can be populated two ways:
//! - directly, by assigning precomputed A and B arrays, or
//! - parametrically, from 5-coefficient rational-exponential curves
//!   `y(x) = (A + B*x) / (C + exp((x + D) / F))`, into which the original
//!   Hodgkin-Huxley rate equations can readily be cast.
//!
//! The parametric form can describe either the alpha/beta rates or the
//! tau/inf (time constant / steady state) pair; the two are alternate
//! parameterizations of the same table and only one is active at a time.
//!
//! Table setup follows GENESIS `new_interp.c` (setup_tab_values, as tuned by
//! Erik De Schutter): samples that land on a near-singular denominator are
//! estimated by averaging evaluations at `x ± dx/10`, and any entry left
//! NaN, infinite, or vanishingly small is repaired by linear interpolation
//! from its nearest valid neighbors.

use crate::error::KineticsError;
use crate::expr::{Bindings, RateExpr};
use crate::gates::{check_original, ChannelId, SINGULARITY};

/// Which 5-tuple pair currently drives table generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameterization {
    /// Forward/backward rate curves (alpha, beta).
    AlphaBeta,
    /// Time-constant / steady-state curves (tau, inf).
    TauInf,
}

/// How the tables were populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableForm {
    /// Raw arrays assigned directly.
    RawTable,
    /// Generated from alpha/beta coefficient tuples.
    AlphaBetaParametric,
    /// Generated from tau/inf coefficient tuples.
    TauInfParametric,
}

/// A pair of lookup tables for the A and B rate terms of one gate.
#[derive(Debug, Clone)]
pub struct RateTable {
    original: ChannelId,
    table_a: Vec<f64>,
    table_b: Vec<f64>,
    xmin: f64,
    xmax: f64,
    inv_dx: f64,
    use_interpolation: bool,
    direct_table: bool,
    active: Parameterization,
    alpha: Option<[f64; 5]>,
    beta: Option<[f64; 5]>,
    tau: Option<[f64; 5]>,
    inf: Option<[f64; 5]>,
}

impl RateTable {
    /// Create an empty table owned by `original`. The default domain is
    /// [0, 1] with a single division; callers are expected to configure the
    /// range before use.
    pub fn new(original: ChannelId) -> Self {
        Self {
            original,
            table_a: vec![0.0; 2],
            table_b: vec![0.0; 2],
            xmin: 0.0,
            xmax: 1.0,
            inv_dx: 1.0,
            use_interpolation: false,
            direct_table: false,
            active: Parameterization::AlphaBeta,
            alpha: None,
            beta: None,
            tau: None,
            inf: None,
        }
    }

    /// Id of the owning channel.
    pub fn original(&self) -> ChannelId {
        self.original
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    /// Look up the A (forward rate) table.
    pub fn lookup_a(&self, x: f64) -> f64 {
        lookup_clamped(
            &self.table_a,
            self.xmin,
            self.xmax,
            self.inv_dx,
            self.use_interpolation,
            x,
        )
    }

    /// Look up the B (alpha + beta) table.
    pub fn lookup_b(&self, x: f64) -> f64 {
        lookup_clamped(
            &self.table_b,
            self.xmin,
            self.xmax,
            self.inv_dx,
            self.use_interpolation,
            x,
        )
    }

    /// Look up both tables at once.
    pub fn lookup_both(&self, x: f64) -> (f64, f64) {
        (self.lookup_a(x), self.lookup_b(x))
    }

    // ------------------------------------------------------------------
    // Parametric setup
    // ------------------------------------------------------------------

    /// Assign the alpha coefficient 5-tuple and regenerate.
    pub fn set_alpha(&mut self, caller: ChannelId, val: &[f64]) -> Result<(), KineticsError> {
        check_original(self.original, caller, "alpha")?;
        let tuple = five("alpha", val)?;
        self.activate(Parameterization::AlphaBeta);
        self.alpha = Some(tuple);
        self.regenerate();
        Ok(())
    }

    /// Assign the beta coefficient 5-tuple and regenerate.
    pub fn set_beta(&mut self, caller: ChannelId, val: &[f64]) -> Result<(), KineticsError> {
        check_original(self.original, caller, "beta")?;
        let tuple = five("beta", val)?;
        self.activate(Parameterization::AlphaBeta);
        self.beta = Some(tuple);
        self.regenerate();
        Ok(())
    }

    /// Assign the tau coefficient 5-tuple and regenerate.
    pub fn set_tau(&mut self, caller: ChannelId, val: &[f64]) -> Result<(), KineticsError> {
        check_original(self.original, caller, "tau")?;
        let tuple = five("tau", val)?;
        self.activate(Parameterization::TauInf);
        self.tau = Some(tuple);
        self.regenerate();
        Ok(())
    }

    /// Assign the inf (steady-state) coefficient 5-tuple and regenerate.
    pub fn set_inf(&mut self, caller: ChannelId, val: &[f64]) -> Result<(), KineticsError> {
        check_original(self.original, caller, "inf")?;
        let tuple = five("inf", val)?;
        self.activate(Parameterization::TauInf);
        self.inf = Some(tuple);
        self.regenerate();
        Ok(())
    }

    /// Set up both tables from 13 parameters in alpha/beta form:
    /// AA AB AC AD AF BA BB BC BD BF divs xmin xmax.
    pub fn setup_alpha(&mut self, caller: ChannelId, parms: &[f64]) -> Result<(), KineticsError> {
        check_original(self.original, caller, "setup_alpha")?;
        let (first, second, divs, xmin, xmax) = split_setup("setup_alpha", parms)?;
        self.apply_setup(first, second, divs, xmin, xmax, Parameterization::AlphaBeta);
        Ok(())
    }

    /// Identical to [`setup_alpha`](Self::setup_alpha) but the two curves
    /// describe tau and inf rather than alpha and beta.
    pub fn setup_tau(&mut self, caller: ChannelId, parms: &[f64]) -> Result<(), KineticsError> {
        check_original(self.original, caller, "setup_tau")?;
        let (first, second, divs, xmin, xmax) = split_setup("setup_tau", parms)?;
        self.apply_setup(first, second, divs, xmin, xmax, Parameterization::TauInf);
        Ok(())
    }

    fn apply_setup(
        &mut self,
        first: [f64; 5],
        second: [f64; 5],
        divs: usize,
        xmin: f64,
        xmax: f64,
        repr: Parameterization,
    ) {
        self.table_a.resize(divs + 1, 0.0);
        self.table_b.resize(divs + 1, 0.0);
        self.xmin = xmin;
        self.xmax = xmax;
        self.inv_dx = divs as f64 / (xmax - xmin);
        self.activate(repr);
        match repr {
            Parameterization::AlphaBeta => {
                self.alpha = Some(first);
                self.beta = Some(second);
            }
            Parameterization::TauInf => {
                self.tau = Some(first);
                self.inf = Some(second);
            }
        }
        self.regenerate();
    }

    // ------------------------------------------------------------------
    // Expression fill
    // ------------------------------------------------------------------

    /// Fill both tables by sampling compiled alpha/beta expressions over
    /// the current domain, bridging the exact-but-slow formula form into
    /// fast lookups. A compile failure, or an expression that cannot
    /// evaluate with the standard bindings, leaves the existing tables
    /// untouched. The filled table behaves like a directly assigned one:
    /// range changes resample it rather than re-evaluating.
    pub fn fill_from_alpha_beta(
        &mut self,
        caller: ChannelId,
        alpha: &str,
        beta: &str,
    ) -> Result<(), KineticsError> {
        check_original(self.original, caller, "fill_from_alpha_beta")?;
        let (first, second) = compile_fill_pair(alpha, beta, self.xmin)?;
        self.fill_from_exprs(&first, &second, false);
        Ok(())
    }

    /// As [`fill_from_alpha_beta`](Self::fill_from_alpha_beta) but the two
    /// expressions describe tau and inf; samples are converted to (A, B)
    /// the same way the parametric tau/inf fill converts them.
    pub fn fill_from_tau_inf(
        &mut self,
        caller: ChannelId,
        tau: &str,
        inf: &str,
    ) -> Result<(), KineticsError> {
        check_original(self.original, caller, "fill_from_tau_inf")?;
        let (first, second) = compile_fill_pair(tau, inf, self.xmin)?;
        self.fill_from_exprs(&first, &second, true);
        Ok(())
    }

    fn fill_from_exprs(&mut self, first: &RateExpr, second: &RateExpr, do_tau: bool) {
        let divs = self.table_a.len() - 1;
        if divs == 0 {
            return;
        }
        self.inv_dx = divs as f64 / (self.xmax - self.xmin);
        let dx = (self.xmax - self.xmin) / divs as f64;
        for i in 0..=divs {
            let bindings = Bindings::one(self.xmin + i as f64 * dx);
            // The probe at compile time caught unevaluable expressions, so
            // a per-sample failure can only be a degenerate value; 0.0 is
            // picked up by the repair pass.
            self.table_a[i] = first.eval(&bindings).unwrap_or(0.0);
            self.table_b[i] = second.eval(&bindings).unwrap_or(0.0);
        }
        self.finish_fill(do_tau);
        self.direct_table = true;
    }

    /// Switch the active representation, lazily invalidating the tuples of
    /// the complementary pair. The two parameterizations describe the same
    /// underlying table and must never disagree; dropping the stale pair is
    /// what keeps them consistent.
    fn activate(&mut self, repr: Parameterization) {
        if self.active != repr {
            match repr {
                Parameterization::AlphaBeta => {
                    self.tau = None;
                    self.inf = None;
                }
                Parameterization::TauInf => {
                    self.alpha = None;
                    self.beta = None;
                }
            }
            self.active = repr;
        }
        self.direct_table = false;
    }

    /// Regenerate tables from the active tuple pair, if both are present.
    fn regenerate(&mut self) {
        match self.active {
            Parameterization::AlphaBeta => {
                if let (Some(a), Some(b)) = (self.alpha, self.beta) {
                    self.fill_tables(a, b, false);
                }
            }
            Parameterization::TauInf => {
                if let (Some(t), Some(i)) = (self.tau, self.inf) {
                    self.fill_tables(t, i, true);
                }
            }
        }
    }

    fn fill_tables(&mut self, first: [f64; 5], second: [f64; 5], do_tau: bool) {
        let divs = self.table_a.len() - 1;
        if divs == 0 {
            return;
        }
        self.inv_dx = divs as f64 / (self.xmax - self.xmin);
        let dx = (self.xmax - self.xmin) / divs as f64;

        for i in 0..=divs {
            let x = self.xmin + i as f64 * dx;
            self.table_a[i] = rational_exp(&first, x, dx);
            self.table_b[i] = rational_exp(&second, x, dx);
        }
        self.finish_fill(do_tau);
    }

    /// Convert freshly sampled (first, second) curves into (A, B) tables
    /// and repair singular entries. Shared by the parametric and
    /// expression fill paths.
    fn finish_fill(&mut self, do_tau: bool) {
        let divs = self.table_a.len() - 1;
        if do_tau {
            // Convert (tau, inf) samples into (A, B) = (inf/tau, 1/tau),
            // carrying the previous entry across singular tau values.
            let mut prev_a = 0.0;
            let mut prev_b = 0.0;
            for i in 0..=divs {
                let tau = self.table_a[i];
                let inf = self.table_b[i];
                if tau.abs() < SINGULARITY {
                    self.table_a[i] = prev_a;
                    self.table_b[i] = prev_b;
                } else {
                    self.table_a[i] = inf / tau;
                    self.table_b[i] = 1.0 / tau;
                }
                prev_a = self.table_a[i];
                prev_b = self.table_b[i];
            }
        } else {
            // B holds alpha + beta.
            for i in 0..=divs {
                self.table_b[i] += self.table_a[i];
            }
        }

        repair_singularities(&mut self.table_a);
        repair_singularities(&mut self.table_b);
    }

    // ------------------------------------------------------------------
    // Direct table assignment
    // ------------------------------------------------------------------

    /// Assign the A table directly. Switches to raw-table form.
    pub fn set_table_a(&mut self, caller: ChannelId, values: &[f64]) -> Result<(), KineticsError> {
        check_original(self.original, caller, "table_a")?;
        if values.len() < 2 {
            return Err(KineticsError::TableTooSmall {
                field: "table_a",
                got: values.len(),
            });
        }
        self.direct_table = true;
        self.table_a = values.to_vec();
        self.inv_dx = (self.table_a.len() - 1) as f64 / (self.xmax - self.xmin);
        Ok(())
    }

    /// Assign the B (alpha + beta) table directly. Must match the A table's
    /// size; assign A first.
    pub fn set_table_b(&mut self, caller: ChannelId, values: &[f64]) -> Result<(), KineticsError> {
        check_original(self.original, caller, "table_b")?;
        if values.len() != self.table_a.len() {
            return Err(KineticsError::TableSizeMismatch {
                expected: self.table_a.len(),
                got: values.len(),
            });
        }
        self.direct_table = true;
        self.table_b = values.to_vec();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Range and resolution
    // ------------------------------------------------------------------

    /// Change the lower domain bound. Directly assigned tables are
    /// resampled by interpolation; parametric tables are regenerated.
    pub fn set_min(&mut self, caller: ChannelId, val: f64) -> Result<(), KineticsError> {
        check_original(self.original, caller, "min")?;
        if val >= self.xmax {
            return Err(KineticsError::InvalidRange {
                min: val,
                max: self.xmax,
            });
        }
        if self.direct_table {
            self.resample(self.table_a.len() - 1, val, self.xmax)
        } else {
            self.xmin = val;
            self.inv_dx = (self.table_a.len() - 1) as f64 / (self.xmax - self.xmin);
            self.regenerate();
            Ok(())
        }
    }

    /// Change the upper domain bound. See [`set_min`](Self::set_min).
    pub fn set_max(&mut self, caller: ChannelId, val: f64) -> Result<(), KineticsError> {
        check_original(self.original, caller, "max")?;
        if val <= self.xmin {
            return Err(KineticsError::InvalidRange {
                min: self.xmin,
                max: val,
            });
        }
        if self.direct_table {
            self.resample(self.table_a.len() - 1, self.xmin, val)
        } else {
            self.xmax = val;
            self.inv_dx = (self.table_a.len() - 1) as f64 / (self.xmax - self.xmin);
            self.regenerate();
            Ok(())
        }
    }

    /// Change the number of subdivisions (table size - 1).
    pub fn set_divs(&mut self, caller: ChannelId, divs: usize) -> Result<(), KineticsError> {
        check_original(self.original, caller, "divs")?;
        if divs < 3 {
            return Err(KineticsError::TooFewDivisions { got: divs });
        }
        if self.direct_table {
            self.resample(divs, self.xmin, self.xmax)
        } else {
            self.table_a.resize(divs + 1, 0.0);
            self.table_b.resize(divs + 1, 0.0);
            self.inv_dx = divs as f64 / (self.xmax - self.xmin);
            self.regenerate();
            Ok(())
        }
    }

    /// Enable or disable linear interpolation at lookup time.
    pub fn set_use_interpolation(
        &mut self,
        caller: ChannelId,
        val: bool,
    ) -> Result<(), KineticsError> {
        check_original(self.original, caller, "use_interpolation")?;
        self.use_interpolation = val;
        Ok(())
    }

    /// Resample both tables over a new domain / resolution by interpolated
    /// lookup against the existing samples.
    fn resample(
        &mut self,
        new_divs: usize,
        new_min: f64,
        new_max: f64,
    ) -> Result<(), KineticsError> {
        if new_divs < 3 {
            log::warn!("table resample needs >= 3 divisions, got {new_divs}; not resampling");
            return Err(KineticsError::TooFewDivisions { got: new_divs });
        }
        let new_dx = (new_max - new_min) / new_divs as f64;
        let sample = |tab: &[f64]| -> Vec<f64> {
            (0..=new_divs)
                .map(|i| {
                    let x = new_min + i as f64 * new_dx;
                    // Interpolate against the old samples over the old
                    // domain, clamping beyond it.
                    lookup_clamped(tab, self.xmin, self.xmax, self.inv_dx, true, x)
                })
                .collect()
        };
        self.table_a = sample(&self.table_a);
        self.table_b = sample(&self.table_b);
        self.xmin = new_min;
        self.xmax = new_max;
        self.inv_dx = new_divs as f64 / (new_max - new_min);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// The A table samples.
    pub fn table_a(&self) -> &[f64] {
        &self.table_a
    }

    /// The B table samples.
    pub fn table_b(&self) -> &[f64] {
        &self.table_b
    }

    /// Lower domain bound.
    pub fn xmin(&self) -> f64 {
        self.xmin
    }

    /// Upper domain bound.
    pub fn xmax(&self) -> f64 {
        self.xmax
    }

    /// Number of subdivisions (table size - 1).
    pub fn divs(&self) -> usize {
        self.table_a.len() - 1
    }

    /// Whether lookup interpolates between samples.
    pub fn use_interpolation(&self) -> bool {
        self.use_interpolation
    }

    /// How the tables were last populated.
    pub fn form(&self) -> TableForm {
        if self.direct_table {
            TableForm::RawTable
        } else {
            match self.active {
                Parameterization::AlphaBeta => TableForm::AlphaBetaParametric,
                Parameterization::TauInf => TableForm::TauInfParametric,
            }
        }
    }

    /// The stored alpha tuple, if the alpha/beta representation is live.
    pub fn alpha(&self) -> Option<[f64; 5]> {
        self.alpha
    }

    /// The stored beta tuple, if the alpha/beta representation is live.
    pub fn beta(&self) -> Option<[f64; 5]> {
        self.beta
    }

    /// The stored tau tuple, if the tau/inf representation is live.
    pub fn tau(&self) -> Option<[f64; 5]> {
        self.tau
    }

    /// The stored inf tuple, if the tau/inf representation is live.
    pub fn inf(&self) -> Option<[f64; 5]> {
        self.inf
    }

    /// The combined 13-parameter description (alpha, beta, divs, min, max),
    /// zeros where no tuple is stored.
    pub fn alpha_parms(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(13);
        out.extend_from_slice(&self.alpha.unwrap_or_default());
        out.extend_from_slice(&self.beta.unwrap_or_default());
        out.push(self.divs() as f64);
        out.push(self.xmin);
        out.push(self.xmax);
        out
    }
}

/// Clamped table lookup shared by the member functions and resampling.
///
/// Outside [xmin, xmax] the boundary entry is returned; no extrapolation.
/// Inside, the index is `floor((x - xmin) * inv_dx)`, blended with the next
/// sample by the fractional remainder when `interpolate` is set.
fn lookup_clamped(
    tab: &[f64],
    xmin: f64,
    xmax: f64,
    inv_dx: f64,
    interpolate: bool,
    x: f64,
) -> f64 {
    if tab.is_empty() {
        return 0.0;
    }
    if x <= xmin {
        return tab[0];
    }
    if x >= xmax {
        return tab[tab.len() - 1];
    }
    let last = tab.len() - 1;
    if interpolate {
        // Clamp so index + 1 stays in range even when float rounding puts
        // x*inv_dx right on the upper boundary.
        let index = (((x - xmin) * inv_dx) as usize).min(last.saturating_sub(1));
        let frac = (x - xmin - index as f64 / inv_dx) * inv_dx;
        tab[index] * (1.0 - frac) + tab[index + 1] * frac
    } else {
        let index = (((x - xmin) * inv_dx) as usize).min(last);
        tab[index]
    }
}

/// Evaluate the rational-exponential curve
/// `y(x) = (P0 + P1*x) / (P2 + exp((x + P3) / P4))`.
///
/// A vanishing F coefficient makes the whole curve 0. A near-singular
/// denominator is sidestepped by averaging evaluations at `x ± dx/10`.
fn rational_exp(p: &[f64; 5], x: f64, dx: f64) -> f64 {
    if p[4].abs() < SINGULARITY {
        return 0.0;
    }
    let denom = p[2] + ((x + p[3]) / p[4]).exp();
    if denom.abs() < SINGULARITY {
        let eval_at = |xx: f64| {
            let d = p[2] + ((xx + p[3]) / p[4]).exp();
            (p[0] + p[1] * xx) / d
        };
        (eval_at(x + dx / 10.0) + eval_at(x - dx / 10.0)) / 2.0
    } else {
        (p[0] + p[1] * x) / denom
    }
}

/// Repair NaN, infinite, or vanishingly small entries by linear
/// interpolation between the nearest valid neighbors. A trailing invalid
/// run is extended by forward-differencing from the last two valid points;
/// a leading run is backfilled from the first valid entry.
fn repair_singularities(tab: &mut [f64]) {
    let invalid = |y: f64| !y.is_finite() || y.abs() < SINGULARITY;

    let mut i = 0;
    while i < tab.len() {
        if !invalid(tab[i]) {
            i += 1;
            continue;
        }
        // [start, next) is a run of invalid entries.
        let start = i;
        let mut next = i + 1;
        while next < tab.len() && invalid(tab[next]) {
            next += 1;
        }
        if start == 0 {
            if next < tab.len() {
                let fill = tab[next];
                for entry in tab[..next].iter_mut() {
                    *entry = fill;
                }
            } else {
                log::warn!("rate table contains no valid entries; leaving it unrepaired");
            }
        } else if next >= tab.len() {
            let dy = if start >= 2 {
                tab[start - 1] - tab[start - 2]
            } else {
                0.0
            };
            for j in start..tab.len() {
                tab[j] = tab[j - 1] + dy;
            }
        } else {
            let dy = (tab[next] - tab[start - 1]) / (next - start + 1) as f64;
            for j in start..next {
                tab[j] = tab[j - 1] + dy;
            }
        }
        i = next;
    }
}

/// Compile a pair of fill expressions and probe-evaluate them once at the
/// domain's lower bound, so an unbound name fails here rather than filling
/// the table with garbage.
fn compile_fill_pair(
    first_src: &str,
    second_src: &str,
    probe_x: f64,
) -> Result<(RateExpr, RateExpr), KineticsError> {
    let warn = |err: KineticsError| {
        log::warn!("{err}");
        err
    };
    let first = RateExpr::compile(first_src).map_err(warn)?;
    let second = RateExpr::compile(second_src).map_err(warn)?;
    let probe = Bindings::one(probe_x);
    first.eval(&probe).map_err(warn)?;
    second.eval(&probe).map_err(warn)?;
    Ok((first, second))
}

fn five(field: &'static str, val: &[f64]) -> Result<[f64; 5], KineticsError> {
    <[f64; 5]>::try_from(val).map_err(|_| KineticsError::BadParameterCount {
        field,
        expected: 5,
        got: val.len(),
    })
}

fn split_setup(
    field: &'static str,
    parms: &[f64],
) -> Result<([f64; 5], [f64; 5], usize, f64, f64), KineticsError> {
    if parms.len() != 13 {
        return Err(KineticsError::BadParameterCount {
            field,
            expected: 13,
            got: parms.len(),
        });
    }
    let divs = parms[10];
    if divs < 1.0 {
        return Err(KineticsError::TooFewDivisions { got: divs as usize });
    }
    let (xmin, xmax) = (parms[11], parms[12]);
    if xmax <= xmin {
        return Err(KineticsError::InvalidRange {
            min: xmin,
            max: xmax,
        });
    }
    let mut first = [0.0; 5];
    let mut second = [0.0; 5];
    first.copy_from_slice(&parms[0..5]);
    second.copy_from_slice(&parms[5..10]);
    Ok((first, second, divs as usize, xmin, xmax))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct_table(values_a: &[f64], values_b: &[f64], xmin: f64, xmax: f64) -> RateTable {
        let id = ChannelId::next();
        let mut t = RateTable::new(id);
        t.set_min(id, xmin).unwrap();
        t.set_max(id, xmax).unwrap();
        t.set_table_a(id, values_a).unwrap();
        t.set_table_b(id, values_b).unwrap();
        t
    }

    #[test]
    fn test_lookup_clamps_below_and_above() {
        let t = direct_table(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0], 0.0, 1.0);
        assert_eq!(t.lookup_a(-10.0), 1.0);
        assert_eq!(t.lookup_a(10.0), 3.0);
        assert_eq!(t.lookup_b(-10.0), 4.0);
        assert_eq!(t.lookup_b(10.0), 6.0);
    }

    #[test]
    fn test_direct_lookup_uses_nearest_below_sample() {
        let t = direct_table(&[1.0, 2.0, 3.0], &[0.0, 0.0, 0.0], 0.0, 1.0);
        // index = floor(x * 2): anything in [0, 0.5) maps to sample 0.
        assert_eq!(t.lookup_a(0.2), 1.0);
        assert_eq!(t.lookup_a(0.6), 2.0);
    }

    #[test]
    fn test_interpolated_lookup_blends() {
        let id = ChannelId::next();
        let mut t = RateTable::new(id);
        t.set_table_a(id, &[0.0, 1.0]).unwrap();
        t.set_table_b(id, &[0.0, 2.0]).unwrap();
        t.set_use_interpolation(id, true).unwrap();
        let mid = t.lookup_a(0.5);
        assert!((mid - 0.5).abs() < 1e-12, "midpoint should blend: {mid}");
    }

    #[test]
    fn test_interpolation_is_continuous_at_boundary() {
        let id = ChannelId::next();
        let mut t = RateTable::new(id);
        t.set_table_a(id, &[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        t.set_table_b(id, &[1.0, 1.0, 1.0, 1.0, 1.0]).unwrap();
        t.set_use_interpolation(id, true).unwrap();
        // Approaching xmax from inside must converge to the last entry.
        let near = t.lookup_a(1.0 - 1e-9);
        assert!((near - 5.0).abs() < 1e-6, "got {near}");
        // And approaching xmin converges to the first.
        let near = t.lookup_a(1e-9);
        assert!((near - 1.0).abs() < 1e-6, "got {near}");
    }

    #[test]
    fn test_direct_tables_round_trip() {
        let a = [0.25, 0.5, 0.75];
        let b = [1.5, 2.5, 3.5];
        let t = direct_table(&a, &b, -1.0, 1.0);
        assert_eq!(t.table_a(), &a);
        assert_eq!(t.table_b(), &b);
        assert_eq!(t.form(), TableForm::RawTable);
    }

    #[test]
    fn test_table_b_size_must_match() {
        let id = ChannelId::next();
        let mut t = RateTable::new(id);
        t.set_table_a(id, &[1.0, 2.0, 3.0]).unwrap();
        let err = t.set_table_b(id, &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, KineticsError::TableSizeMismatch { .. }));
    }

    #[test]
    fn test_table_too_small_rejected() {
        let id = ChannelId::next();
        let mut t = RateTable::new(id);
        assert!(t.set_table_a(id, &[1.0]).is_err());
    }

    #[test]
    fn test_setup_alpha_matches_formula() {
        let id = ChannelId::next();
        let mut t = RateTable::new(id);
        let alpha = [1.0, 0.0, 1.0, 0.05, -0.01];
        let beta = [1.0, 0.0, 1.0, -0.05, 0.01];
        let mut parms = Vec::new();
        parms.extend_from_slice(&alpha);
        parms.extend_from_slice(&beta);
        parms.extend_from_slice(&[100.0, -0.1, 0.05]);
        t.setup_alpha(id, &parms).unwrap();

        assert_eq!(t.divs(), 100);
        assert_eq!(t.form(), TableForm::AlphaBetaParametric);

        // Away from singularities the generated A table must agree with the
        // closed form (A + B*x) / (C + exp((x + D) / F)).
        let x = t.xmin();
        let expected = (alpha[0] + alpha[1] * x) / (alpha[2] + ((x + alpha[3]) / alpha[4]).exp());
        let got = t.table_a()[0];
        assert!(
            (got - expected).abs() < 1e-9,
            "table start {got} != formula {expected}"
        );
    }

    #[test]
    fn test_resting_potential_steady_state_in_range() {
        // End-to-end scenario from the channel literature: squid-like alpha
        // and beta curves over the physiological voltage range.
        let id = ChannelId::next();
        let mut t = RateTable::new(id);
        let mut parms = vec![1.0, 0.0, 1.0, 0.05, -0.01, 1.0, 0.0, 1.0, -0.05, 0.01];
        parms.extend_from_slice(&[100.0, -0.1, 0.05]);
        t.setup_alpha(id, &parms).unwrap();

        let (a, b) = t.lookup_both(-0.065);
        assert!(b.is_finite() && b >= 0.0, "B should be finite and non-negative: {b}");
        let steady = a / b;
        assert!(
            (0.0..=1.0).contains(&steady),
            "steady state A/B out of range: {steady}"
        );
    }

    #[test]
    fn test_singularity_repair_interpolates_interior() {
        let mut tab = vec![1.0, 2.0, f64::NAN, 4.0, 5.0];
        repair_singularities(&mut tab);
        assert!((tab[2] - 3.0).abs() < 1e-12, "repaired to {}", tab[2]);
    }

    #[test]
    fn test_singularity_repair_extends_tail() {
        let mut tab = vec![1.0, 2.0, 3.0, f64::INFINITY, f64::NAN];
        repair_singularities(&mut tab);
        // Forward difference from the last two valid points: slope 1.
        assert!((tab[3] - 4.0).abs() < 1e-12);
        assert!((tab[4] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_singularity_repair_backfills_head() {
        let mut tab = vec![f64::NAN, 1e-12, 3.0, 4.0];
        repair_singularities(&mut tab);
        assert_eq!(tab[0], 3.0);
        assert_eq!(tab[1], 3.0);
    }

    #[test]
    fn test_resample_on_divs_change() {
        let id = ChannelId::next();
        let mut t = RateTable::new(id);
        t.set_table_a(id, &[0.0, 1.0, 2.0, 3.0, 4.0]).unwrap();
        t.set_table_b(id, &[0.0, 2.0, 4.0, 6.0, 8.0]).unwrap();
        t.set_divs(id, 8).unwrap();
        assert_eq!(t.table_a().len(), 9);
        // Linear data survives linear resampling exactly.
        assert!((t.table_a()[4] - 2.0).abs() < 1e-9);
        assert!((t.table_b()[4] - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_divs_below_three_rejected() {
        let id = ChannelId::next();
        let mut t = RateTable::new(id);
        t.set_table_a(id, &[0.0, 1.0, 2.0, 3.0]).unwrap();
        let before = t.table_a().to_vec();
        assert!(t.set_divs(id, 2).is_err());
        assert_eq!(t.table_a(), &before[..], "failed resize must not mutate");
    }

    #[test]
    fn test_parameterization_switch_invalidates_other_pair() {
        let id = ChannelId::next();
        let mut t = RateTable::new(id);
        t.set_alpha(id, &[1.0, 0.0, 1.0, 0.05, -0.01]).unwrap();
        t.set_beta(id, &[1.0, 0.0, 1.0, -0.05, 0.01]).unwrap();
        assert!(t.alpha().is_some() && t.beta().is_some());

        t.set_tau(id, &[0.01, 0.0, 1.0, 0.0, 0.02]).unwrap();
        assert!(t.alpha().is_none(), "alpha tuple must be invalidated");
        assert!(t.beta().is_none(), "beta tuple must be invalidated");
        assert!(t.tau().is_some());
    }

    #[test]
    fn test_bad_tuple_length_rejected() {
        let id = ChannelId::next();
        let mut t = RateTable::new(id);
        let err = t.set_alpha(id, &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(
            err,
            KineticsError::BadParameterCount {
                expected: 5,
                got: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_copy_cannot_mutate() {
        let owner = ChannelId::next();
        let copy = ChannelId::next();
        let mut t = RateTable::new(owner);
        t.set_table_a(owner, &[1.0, 2.0]).unwrap();
        let err = t.set_table_a(copy, &[9.0, 9.0]).unwrap_err();
        assert!(matches!(err, KineticsError::NotOriginal { .. }));
        assert_eq!(t.table_a(), &[1.0, 2.0]);
    }

    fn expr_filled_table(id: ChannelId) -> RateTable {
        let mut t = RateTable::new(id);
        t.set_min(id, -0.1).unwrap();
        t.set_max(id, 0.05).unwrap();
        t.set_divs(id, 100).unwrap();
        t.fill_from_alpha_beta(
            id,
            "1 / (1 + exp(-(v + 0.05) / 0.01))",
            "1 / (1 + exp((v - 0.05) / 0.01))",
        )
        .unwrap();
        t
    }

    #[test]
    fn test_expression_fill_matches_evaluation() {
        let id = ChannelId::next();
        let mut t = expr_filled_table(id);
        t.set_use_interpolation(id, true).unwrap();

        let v = -0.065;
        let alpha = 1.0 / (1.0 + (-(v + 0.05) / 0.01f64).exp());
        let beta = 1.0 / (1.0 + ((v - 0.05) / 0.01f64).exp());
        assert!(
            (t.lookup_a(v) - alpha).abs() < 1e-3,
            "A at {v}: table {}, direct {alpha}",
            t.lookup_a(v)
        );
        assert!(
            (t.lookup_b(v) - (alpha + beta)).abs() < 1e-3,
            "B at {v}: table {}, direct {}",
            t.lookup_b(v),
            alpha + beta
        );
        assert_eq!(t.form(), TableForm::RawTable);
    }

    #[test]
    fn test_expression_fill_tau_inf_converts() {
        let id = ChannelId::next();
        let mut t = RateTable::new(id);
        t.set_divs(id, 10).unwrap();
        t.fill_from_tau_inf(id, "0.004", "0.5").unwrap();
        // A = inf/tau = 125, B = 1/tau = 250 everywhere.
        assert!((t.lookup_a(0.5) - 125.0).abs() < 1e-9);
        assert!((t.lookup_b(0.5) - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_expression_fill_failure_keeps_prior_tables() {
        let id = ChannelId::next();
        let mut t = expr_filled_table(id);
        let before = t.table_a().to_vec();

        let err = t.fill_from_alpha_beta(id, "exp(v", "1").unwrap_err();
        assert!(matches!(err, KineticsError::ExpressionCompile { .. }));
        assert_eq!(t.table_a(), &before[..], "parse failure must not fill");

        // An unbound name compiles but cannot evaluate; the probe catches
        // it before any sample is written.
        let err = t.fill_from_alpha_beta(id, "q + 1", "1").unwrap_err();
        assert!(matches!(err, KineticsError::ExpressionEval { .. }));
        assert_eq!(t.table_a(), &before[..], "probe failure must not fill");
    }

    #[test]
    fn test_expression_fill_repairs_singular_samples() {
        let id = ChannelId::next();
        let mut t = RateTable::new(id);
        t.set_min(id, -0.5).unwrap();
        t.set_max(id, 0.5).unwrap();
        t.set_divs(id, 10).unwrap();
        // 1/v blows up at the v = 0 grid point; the repair pass must leave
        // every entry finite.
        t.fill_from_alpha_beta(id, "1 / v", "1").unwrap();
        for (i, &a) in t.table_a().iter().enumerate() {
            assert!(a.is_finite(), "entry {i} not repaired: {a}");
        }
    }
}
