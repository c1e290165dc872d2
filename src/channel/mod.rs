//! Per-timestep gating driver for a Hodgkin-Huxley style channel.
//!
//! A channel owns up to three independent gates (X, Y, Z), each with a
//! power exponent and a mapping from the channel's three signals (voltage,
//! two concentrations) onto the gate's inputs. Every step the driver
//! fetches (A, B) rates from each active gate, advances the gate state, and
//! multiplies `state^power` factors into a conductance accumulator seeded
//! from the channel's base conductance. The result, scaled by an external
//! modulation factor, is the channel conductance `gk`.
//!
//! Gate state advances by the exponential update
//! `state' = state * exp(-B*dt) + (A/B) * (1 - exp(-B*dt))`,
//! which is exact for a linear first-order kinetic equation and stable for
//! stiff rates at any timestep. Gates flagged instantaneous skip the
//! integration and track the steady state `A/B` directly.
//!
//! Rate fetching must never take the simulation down: a gate with a
//! malformed or missing rate description warns, keeps its previous state,
//! and the remaining gates carry on.

pub mod selector;

use std::sync::{Arc, RwLock};

pub use selector::{InputSelector, Signal};

use crate::error::KineticsError;
use crate::gates::{ChannelId, GateKinetics, RateFormula, RateFormula2D, RateTable, SINGULARITY};

/// Threshold below which a combined rate B cannot seed a steady state.
const EPSILON: f64 = 1.0e-10;

/// A gate shared between a channel and its copies.
pub type SharedGate = Arc<RwLock<GateKinetics>>;

/// Which rate-computation strategy to create a gate with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KineticsForm {
    /// Tabulated lookup ([`RateTable`]).
    Table,
    /// One-variable compiled expressions ([`RateFormula`]).
    Formula,
    /// Two-variable compiled expressions ([`RateFormula2D`]).
    Formula2D,
}

/// Names the three gate slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateId {
    /// Activation gate (e.g. `m` on the squid Na channel).
    X,
    /// Inactivation gate (e.g. `h`).
    Y,
    /// Third gate, conventionally concentration-dependent.
    Z,
}

impl GateId {
    fn index(self) -> usize {
        match self {
            GateId::X => 0,
            GateId::Y => 1,
            GateId::Z => 2,
        }
    }

    /// The slot's conventional name.
    pub fn name(self) -> &'static str {
        match self {
            GateId::X => "X",
            GateId::Y => "Y",
            GateId::Z => "Z",
        }
    }
}

const GATE_NAMES: [&str; 3] = ["X", "Y", "Z"];

/// One gate slot: the shared kinetics object plus the per-channel state.
#[derive(Debug, Clone)]
struct GateSlot {
    gate: Option<SharedGate>,
    power: f64,
    selector: InputSelector,
    primary: Signal,
    secondary: Option<Signal>,
    state: f64,
    instant: bool,
    initialized: bool,
}

impl Default for GateSlot {
    fn default() -> Self {
        let selector = InputSelector::default();
        Self {
            gate: None,
            power: 0.0,
            selector,
            primary: selector.primary(),
            secondary: selector.secondary(),
            state: 0.0,
            instant: false,
            initialized: false,
        }
    }
}

/// Per-timestep driver combining up to three gates into a conductance.
#[derive(Debug)]
pub struct GatingSolver {
    channel_id: ChannelId,
    gbar: f64,
    ek: f64,
    modulation: f64,
    vm: f64,
    conc1: f64,
    conc2: f64,
    gk: f64,
    ik: f64,
    g_accum: f64,
    slots: [GateSlot; 3],
}

impl GatingSolver {
    /// Create a channel driver with no gates, unit modulation and zero
    /// conductance scale.
    pub fn new() -> Self {
        Self {
            channel_id: ChannelId::next(),
            gbar: 0.0,
            ek: 0.0,
            modulation: 1.0,
            vm: 0.0,
            conc1: 0.0,
            conc2: 0.0,
            gk: 0.0,
            ik: 0.0,
            g_accum: 0.0,
            slots: Default::default(),
        }
    }

    /// This channel's identity, used as the ownership tag on its gates.
    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    // ------------------------------------------------------------------
    // Channel-level configuration
    // ------------------------------------------------------------------

    /// Set the base conductance scale (S).
    pub fn set_gbar(&mut self, gbar: f64) {
        self.gbar = gbar;
    }

    /// Set the reversal potential (V) used for the current readout.
    pub fn set_ek(&mut self, ek: f64) {
        self.ek = ek;
    }

    /// Set the external modulation multiplier applied to the conductance.
    pub fn set_modulation(&mut self, modulation: f64) {
        self.modulation = modulation;
    }

    /// Membrane voltage input, most-recent-value semantics.
    pub fn set_vm(&mut self, vm: f64) {
        self.vm = vm;
    }

    /// First concentration input, most-recent-value semantics.
    pub fn set_conc1(&mut self, conc: f64) {
        self.conc1 = conc;
    }

    /// Second concentration input, most-recent-value semantics.
    pub fn set_conc2(&mut self, conc: f64) {
        self.conc2 = conc;
    }

    /// The channel conductance computed by the last step (S).
    pub fn gk(&self) -> f64 {
        self.gk
    }

    /// The channel current computed by the last step (A), as
    /// `(ek - vm) * gk`.
    pub fn ik(&self) -> f64 {
        self.ik
    }

    // ------------------------------------------------------------------
    // Gate-slot configuration
    // ------------------------------------------------------------------

    /// Set a gate's power exponent. Zero disables the gate's contribution
    /// entirely; negative powers are rejected.
    pub fn set_power(&mut self, which: GateId, power: f64) -> Result<(), KineticsError> {
        if power < 0.0 {
            log::warn!("gate {} power must be >= 0, got {power}", which.name());
            return Err(KineticsError::NegativePower(power));
        }
        self.slots[which.index()].power = power;
        Ok(())
    }

    /// A gate's power exponent.
    pub fn power(&self, which: GateId) -> f64 {
        self.slots[which.index()].power
    }

    /// Assign a gate's input selector. Resolution into signal indices
    /// happens here, once; re-assigning the current selector is a no-op.
    pub fn set_selector(&mut self, which: GateId, sel: InputSelector) {
        let slot = &mut self.slots[which.index()];
        if slot.selector == sel {
            return;
        }
        slot.selector = sel;
        slot.primary = sel.primary();
        slot.secondary = sel.secondary();
    }

    /// Assign a gate's input selector from its string name. An
    /// unrecognized name is a recoverable configuration error and leaves
    /// the current selector in force.
    pub fn set_selector_name(&mut self, which: GateId, name: &str) -> Result<(), KineticsError> {
        let slot = &self.slots[which.index()];
        if slot.selector.as_str() == name {
            return Ok(());
        }
        let sel: InputSelector = name.parse().map_err(|e| {
            log::warn!("gate {}: {e}", which.name());
            e
        })?;
        self.set_selector(which, sel);
        Ok(())
    }

    /// A gate's input selector.
    pub fn selector(&self, which: GateId) -> InputSelector {
        self.slots[which.index()].selector
    }

    /// Flag a gate as instantaneous: its state tracks `A/B` every step
    /// instead of being integrated.
    pub fn set_instant(&mut self, which: GateId, instant: bool) {
        self.slots[which.index()].instant = instant;
    }

    /// Supply a gate's initial state explicitly. Suppresses the
    /// steady-state seeding that `reinit` would otherwise perform.
    pub fn set_state(&mut self, which: GateId, state: f64) {
        let slot = &mut self.slots[which.index()];
        slot.state = state;
        slot.initialized = true;
    }

    /// A gate's current state variable.
    pub fn state(&self, which: GateId) -> f64 {
        self.slots[which.index()].state
    }

    // ------------------------------------------------------------------
    // Gate lifecycle
    // ------------------------------------------------------------------

    /// Create a gate in the given slot. Only the original channel may
    /// create gates; a slot that already has one is left unchanged (with a
    /// warning) and the existing gate is returned.
    pub fn create_gate(
        &mut self,
        which: GateId,
        form: KineticsForm,
    ) -> Result<SharedGate, KineticsError> {
        if !self.is_original() {
            log::warn!(
                "create_gate {}: not allowed from a copied channel",
                which.name()
            );
            return Err(KineticsError::NotOriginal {
                field: "create_gate",
            });
        }
        let slot = &mut self.slots[which.index()];
        if let Some(existing) = &slot.gate {
            log::warn!("gate {} already present; keeping it", which.name());
            return Ok(Arc::clone(existing));
        }
        let kinetics = match form {
            KineticsForm::Table => GateKinetics::Table(RateTable::new(self.channel_id)),
            KineticsForm::Formula => GateKinetics::Formula(RateFormula::new(self.channel_id)),
            KineticsForm::Formula2D => {
                GateKinetics::Formula2D(RateFormula2D::new(self.channel_id))
            }
        };
        let gate = Arc::new(RwLock::new(kinetics));
        slot.gate = Some(Arc::clone(&gate));
        Ok(gate)
    }

    /// Destroy the gate in the given slot. Only the original channel may
    /// do this.
    pub fn destroy_gate(&mut self, which: GateId) -> Result<(), KineticsError> {
        if !self.is_original() {
            log::warn!(
                "destroy_gate {}: not allowed from a copied channel",
                which.name()
            );
            return Err(KineticsError::NotOriginal {
                field: "destroy_gate",
            });
        }
        let slot = &mut self.slots[which.index()];
        if slot.gate.take().is_none() {
            log::warn!("gate {} not present; nothing to destroy", which.name());
            return Err(KineticsError::NoSuchGate(which.name()));
        }
        Ok(())
    }

    /// Shared handle to a slot's gate, if one exists.
    pub fn gate(&self, which: GateId) -> Option<SharedGate> {
        self.slots[which.index()].gate.as_ref().map(Arc::clone)
    }

    /// Run a closure against a slot's gate with this channel's id as the
    /// mutation caller. Ownership is enforced by the gate's own setters, so
    /// a copied channel gets `NotOriginal` back from inside the closure.
    pub fn with_gate_mut<R>(
        &self,
        which: GateId,
        f: impl FnOnce(&mut GateKinetics, ChannelId) -> Result<R, KineticsError>,
    ) -> Result<R, KineticsError> {
        let slot = &self.slots[which.index()];
        let gate = slot
            .gate
            .as_ref()
            .ok_or(KineticsError::NoSuchGate(which.name()))?;
        let mut guard = gate
            .write()
            .map_err(|_| KineticsError::GatePoisoned(which.name()))?;
        f(&mut guard, self.channel_id)
    }

    /// Make a copy of this channel sharing the original's gate objects
    /// read-only. The copy has its own powers, selectors and states, but
    /// every gate mutation it attempts is rejected.
    pub fn copy_ref(&self) -> Self {
        Self {
            channel_id: ChannelId::next(),
            gbar: self.gbar,
            ek: self.ek,
            modulation: self.modulation,
            vm: self.vm,
            conc1: self.conc1,
            conc2: self.conc2,
            gk: self.gk,
            ik: self.ik,
            g_accum: 0.0,
            slots: self.slots.clone(),
        }
    }

    /// Whether this instance is the original owner of its gates. A channel
    /// with no gates counts as original.
    fn is_original(&self) -> bool {
        for slot in &self.slots {
            if let Some(gate) = &slot.gate {
                if let Ok(guard) = gate.read() {
                    return guard.original() == self.channel_id;
                }
            }
        }
        true
    }

    // ------------------------------------------------------------------
    // Per-step entry points
    // ------------------------------------------------------------------

    /// Reinitialize gate states to their steady values and recompute the
    /// conductance. A gate whose combined rate B is effectively zero aborts
    /// the remaining reinit work for this step with a warning, leaving
    /// prior states and the previous `gk` in place.
    pub fn reinit(&mut self) {
        self.g_accum += self.gbar;
        for i in 0..self.slots.len() {
            let power = self.slots[i].power;
            if power <= 0.0 {
                continue;
            }
            let Some((a, b)) = self.fetch_rates(i) else {
                // Malformed gate: contribute its frozen state.
                self.g_accum *= take_power(self.slots[i].state, power);
                continue;
            };
            if b < EPSILON {
                log::warn!(
                    "B value for gate {} is ~0; check its rate tables",
                    GATE_NAMES[i]
                );
                self.g_accum = 0.0;
                return;
            }
            let slot = &mut self.slots[i];
            if !slot.initialized {
                slot.state = a / b;
            }
            self.g_accum *= take_power(slot.state, power);
        }
        self.finish_step();
    }

    /// Advance gate states by `dt` seconds and recompute the conductance.
    pub fn process(&mut self, dt: f64) {
        self.g_accum += self.gbar;
        for i in 0..self.slots.len() {
            let power = self.slots[i].power;
            if power <= 0.0 {
                continue;
            }
            let rates = self.fetch_rates(i);
            let slot = &mut self.slots[i];
            if let Some((a, b)) = rates {
                if slot.instant {
                    if b.abs() < EPSILON {
                        log::warn!(
                            "instantaneous gate {} has B ~0; keeping previous state",
                            GATE_NAMES[i]
                        );
                    } else {
                        slot.state = a / b;
                    }
                } else {
                    slot.state = integrate(slot.state, dt, a, b);
                }
            }
            // On a failed fetch the previous state contributes unchanged.
            self.g_accum *= take_power(slot.state, power);
        }
        self.finish_step();
    }

    fn finish_step(&mut self) {
        self.gk = self.g_accum * self.modulation;
        self.ik = (self.ek - self.vm) * self.gk;
        self.g_accum = 0.0;
    }

    /// Fetch (A, B) for slot `i` from its mapped inputs. `None` means the
    /// gate could not be evaluated this step; a warning has been emitted.
    fn fetch_rates(&self, i: usize) -> Option<(f64, f64)> {
        let slot = &self.slots[i];
        let Some(gate) = slot.gate.as_ref() else {
            log::warn!(
                "gate {} has power {} but no kinetics; skipping",
                GATE_NAMES[i],
                slot.power
            );
            return None;
        };
        let guard = match gate.read() {
            Ok(guard) => guard,
            Err(_) => {
                log::warn!("gate {} lock poisoned; skipping", GATE_NAMES[i]);
                return None;
            }
        };
        let x = self.signal(slot.primary);
        let x2 = slot.secondary.map(|s| self.signal(s));
        match guard.rates(x, x2) {
            Ok(rates) => Some(rates),
            Err(e) => {
                log::warn!("gate {}: {e}; keeping previous state", GATE_NAMES[i]);
                None
            }
        }
    }

    fn signal(&self, s: Signal) -> f64 {
        match s {
            Signal::Volt => self.vm,
            Signal::Conc1 => self.conc1,
            Signal::Conc2 => self.conc2,
        }
    }
}

impl Default for GatingSolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Exponential update for a first-order gate: exact for constant rates over
/// the step. Falls back to forward Euler when B is effectively zero (the
/// steady state A/B is then undefined but the drift A is not).
fn integrate(state: f64, dt: f64, a: f64, b: f64) -> f64 {
    if b > SINGULARITY {
        let decay = (-b * dt).exp();
        state * decay + (a / b) * (1.0 - decay)
    } else {
        state + a * dt
    }
}

/// Raise a gate state to its power. Integer powers up to 4 cover virtually
/// all channel models and avoid `powf`.
fn take_power(x: f64, power: f64) -> f64 {
    if power == 0.0 {
        1.0
    } else if power == 1.0 {
        x
    } else if power == 2.0 {
        x * x
    } else if power == 3.0 {
        x * x * x
    } else if power == 4.0 {
        let x2 = x * x;
        x2 * x2
    } else {
        x.powf(power)
    }
}
