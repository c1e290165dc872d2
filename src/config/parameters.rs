//! Channel parameter structures loadable from JSON.
//!
//! Literature-derived defaults carry their source citation.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::channel::{GateId, GatingSolver, InputSelector, KineticsForm};
use crate::error::KineticsError;
use crate::gates::GateKinetics;

/// Complete description of one gated channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelParameters {
    /// Base conductance scale (S)
    pub gbar: f64,

    /// Reversal potential (V)
    pub ek: f64,

    /// External modulation multiplier on the conductance
    #[serde(default = "default_modulation")]
    pub modulation: f64,

    /// Activation gate (X slot)
    pub x_gate: Option<GateParameters>,

    /// Inactivation gate (Y slot)
    pub y_gate: Option<GateParameters>,

    /// Third gate (Z slot), conventionally concentration-dependent
    pub z_gate: Option<GateParameters>,
}

fn default_modulation() -> f64 {
    1.0
}

impl ChannelParameters {
    /// Load from a JSON file, or use defaults if the file is missing or
    /// malformed.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(params) => {
                    log::info!("Loaded channel parameters from {:?}", path.as_ref());
                    params
                }
                Err(e) => {
                    log::warn!("Failed to parse channel parameters: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Channel parameters file not found, using defaults");
                Self::default()
            }
        }
    }

    /// Construct a ready-to-run channel driver from this description.
    pub fn build(&self) -> Result<GatingSolver, KineticsError> {
        let mut chan = GatingSolver::new();
        chan.set_gbar(self.gbar);
        chan.set_ek(self.ek);
        chan.set_modulation(self.modulation);
        for (which, gate) in [
            (GateId::X, &self.x_gate),
            (GateId::Y, &self.y_gate),
            (GateId::Z, &self.z_gate),
        ] {
            if let Some(params) = gate {
                params.apply(&mut chan, which)?;
            }
        }
        Ok(chan)
    }
}

impl Default for ChannelParameters {
    /// The squid giant axon sodium channel.
    ///
    /// Rates in SI units (V, s); the original equations are in mV and ms.
    /// Source: Hodgkin & Huxley, J Physiol 1952
    fn default() -> Self {
        Self {
            // 120 mS/cm^2 over the standard squid compartment surface
            gbar: 0.000942,
            ek: 0.050,
            modulation: 1.0,
            x_gate: Some(GateParameters {
                power: 3.0,
                selector: InputSelector::Volt,
                instant: false,
                initial_state: None,
                kinetics: KineticsSpec::Formula {
                    alpha: Some(
                        "100 * (1000 * v + 40) / (1 - exp(-(1000 * v + 40) / 10))".to_string(),
                    ),
                    beta: Some("4000 * exp(-(1000 * v + 65) / 18)".to_string()),
                    tau: None,
                    inf: None,
                    two_dimensional: false,
                },
            }),
            y_gate: Some(GateParameters {
                power: 1.0,
                selector: InputSelector::Volt,
                instant: false,
                initial_state: None,
                kinetics: KineticsSpec::Formula {
                    alpha: Some("70 * exp(-(1000 * v + 65) / 20)".to_string()),
                    beta: Some("1000 / (1 + exp(-(1000 * v + 35) / 10))".to_string()),
                    tau: None,
                    inf: None,
                    two_dimensional: false,
                },
            }),
            z_gate: None,
        }
    }
}

/// Description of one gate slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateParameters {
    /// Power exponent on the gate state; 0 disables the gate
    pub power: f64,

    /// Mapping from channel signals onto the gate's inputs
    #[serde(default)]
    pub selector: InputSelector,

    /// Instantaneous gates track A/B instead of integrating
    #[serde(default)]
    pub instant: bool,

    /// Explicit initial state, suppressing steady-state seeding at reinit
    #[serde(default)]
    pub initial_state: Option<f64>,

    /// The rate computation
    pub kinetics: KineticsSpec,
}

impl GateParameters {
    fn apply(&self, chan: &mut GatingSolver, which: GateId) -> Result<(), KineticsError> {
        chan.set_power(which, self.power)?;
        chan.set_selector(which, self.selector);
        chan.set_instant(which, self.instant);
        if let Some(state) = self.initial_state {
            chan.set_state(which, state);
        }
        chan.create_gate(which, self.kinetics.form())?;
        chan.with_gate_mut(which, |gate, id| self.kinetics.configure(gate, id))
    }
}

/// Rate-computation description, table or formula form.
///
/// Table rate curves come either as raw samples (`table_a`/`table_b`) or as
/// 5-coefficient parametric descriptions `y(x) = (A + B*x) / (C + exp((x + D) / F))`
/// of the alpha/beta or tau/inf pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum KineticsSpec {
    Table {
        xmin: f64,
        xmax: f64,
        divs: usize,
        #[serde(default = "default_true")]
        use_interpolation: bool,
        #[serde(default)]
        alpha: Option<[f64; 5]>,
        #[serde(default)]
        beta: Option<[f64; 5]>,
        #[serde(default)]
        tau: Option<[f64; 5]>,
        #[serde(default)]
        inf: Option<[f64; 5]>,
        #[serde(default)]
        table_a: Option<Vec<f64>>,
        #[serde(default)]
        table_b: Option<Vec<f64>>,
    },
    Formula {
        #[serde(default)]
        alpha: Option<String>,
        #[serde(default)]
        beta: Option<String>,
        #[serde(default)]
        tau: Option<String>,
        #[serde(default)]
        inf: Option<String>,
        #[serde(default)]
        two_dimensional: bool,
    },
}

fn default_true() -> bool {
    true
}

impl KineticsSpec {
    fn form(&self) -> KineticsForm {
        match self {
            KineticsSpec::Table { .. } => KineticsForm::Table,
            KineticsSpec::Formula {
                two_dimensional: true,
                ..
            } => KineticsForm::Formula2D,
            KineticsSpec::Formula { .. } => KineticsForm::Formula,
        }
    }

    fn configure(
        &self,
        gate: &mut GateKinetics,
        id: crate::gates::ChannelId,
    ) -> Result<(), KineticsError> {
        match (self, gate) {
            (
                KineticsSpec::Table {
                    xmin,
                    xmax,
                    divs,
                    use_interpolation,
                    alpha,
                    beta,
                    tau,
                    inf,
                    table_a,
                    table_b,
                },
                GateKinetics::Table(g),
            ) => {
                if xmax <= xmin {
                    return Err(KineticsError::InvalidRange {
                        min: *xmin,
                        max: *xmax,
                    });
                }
                // Either bound may conflict with the fresh gate's default
                // range, but not both at once.
                if *xmax > g.xmin() {
                    g.set_max(id, *xmax)?;
                    g.set_min(id, *xmin)?;
                } else {
                    g.set_min(id, *xmin)?;
                    g.set_max(id, *xmax)?;
                }
                g.set_divs(id, *divs)?;
                g.set_use_interpolation(id, *use_interpolation)?;
                if let Some(parms) = alpha {
                    g.set_alpha(id, parms)?;
                }
                if let Some(parms) = beta {
                    g.set_beta(id, parms)?;
                }
                if let Some(parms) = tau {
                    g.set_tau(id, parms)?;
                }
                if let Some(parms) = inf {
                    g.set_inf(id, parms)?;
                }
                if let Some(values) = table_a {
                    g.set_table_a(id, values)?;
                }
                if let Some(values) = table_b {
                    g.set_table_b(id, values)?;
                }
                Ok(())
            }
            (
                KineticsSpec::Formula {
                    alpha,
                    beta,
                    tau,
                    inf,
                    two_dimensional: false,
                },
                GateKinetics::Formula(g),
            ) => {
                if let Some(src) = alpha {
                    g.set_alpha(id, src)?;
                }
                if let Some(src) = beta {
                    g.set_beta(id, src)?;
                }
                if let Some(src) = tau {
                    g.set_tau(id, src)?;
                }
                if let Some(src) = inf {
                    g.set_inf(id, src)?;
                }
                Ok(())
            }
            (
                KineticsSpec::Formula {
                    alpha,
                    beta,
                    tau,
                    inf,
                    two_dimensional: true,
                },
                GateKinetics::Formula2D(g),
            ) => {
                if let Some(src) = alpha {
                    g.set_alpha(id, src)?;
                }
                if let Some(src) = beta {
                    g.set_beta(id, src)?;
                }
                if let Some(src) = tau {
                    g.set_tau(id, src)?;
                }
                if let Some(src) = inf {
                    g.set_inf(id, src)?;
                }
                Ok(())
            }
            // create_gate chose the gate variant from this same description.
            _ => unreachable!("gate variant matches its kinetics description"),
        }
    }
}
