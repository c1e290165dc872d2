//! Squid axon channel demo
//!
//! Builds the classic Hodgkin-Huxley sodium and potassium channels, holds
//! the membrane at rest, then applies a voltage step and prints the gating
//! states, conductances and currents over time.
//!
//! Usage:
//!   cargo run --example squid

use anyhow::Result;
use channel_kinetics::{ChannelParameters, GateId, GateParameters, InputSelector, KineticsSpec};

/// The delayed-rectifier potassium channel, n^4 kinetics.
///
/// Rates in SI units (V, s). Source: Hodgkin & Huxley, J Physiol 1952
fn potassium_channel() -> ChannelParameters {
    ChannelParameters {
        // 36 mS/cm^2 over the standard squid compartment surface
        gbar: 0.000283,
        ek: -0.077,
        modulation: 1.0,
        x_gate: Some(GateParameters {
            power: 4.0,
            selector: InputSelector::Volt,
            instant: false,
            initial_state: None,
            kinetics: KineticsSpec::Formula {
                alpha: Some(
                    "10 * (1000 * v + 55) / (1 - exp(-(1000 * v + 55) / 10))".to_string(),
                ),
                beta: Some("125 * exp(-(1000 * v + 65) / 80)".to_string()),
                tau: None,
                inf: None,
                two_dimensional: false,
            },
        }),
        y_gate: None,
        z_gate: None,
    }
}

fn main() -> Result<()> {
    env_logger::init();

    println!("=== Squid Axon Channel Demo ===\n");

    // The default channel description is the HH sodium channel; the
    // potassium channel is built alongside it.
    let mut na = ChannelParameters::load_or_default("data/parameters/na_channel.json").build()?;
    let mut k = potassium_channel().build()?;

    // Settle at rest.
    let rest = -0.065;
    na.set_vm(rest);
    k.set_vm(rest);
    na.reinit();
    k.reinit();
    log::info!(
        "at rest: m = {:.4}, h = {:.4}, n = {:.4}",
        na.state(GateId::X),
        na.state(GateId::Y),
        k.state(GateId::X)
    );

    // Step the command voltage to -20 mV and watch the conductances.
    let vstep = -0.020;
    let dt = 25e-6;
    na.set_vm(vstep);
    k.set_vm(vstep);

    println!("voltage step {:.0} mV -> {:.0} mV", rest * 1e3, vstep * 1e3);
    println!("{:>8} {:>10} {:>10} {:>12} {:>12}", "t (ms)", "gNa (uS)", "gK (uS)", "iNa (nA)", "iK (nA)");
    for step in 0..=200 {
        if step % 20 == 0 {
            println!(
                "{:8.2} {:10.4} {:10.4} {:12.4} {:12.4}",
                step as f64 * dt * 1e3,
                na.gk() * 1e6,
                k.gk() * 1e6,
                na.ik() * 1e9,
                k.ik() * 1e9
            );
        }
        na.process(dt);
        k.process(dt);
    }

    println!(
        "\nfinal gating states: m = {:.4}, h = {:.4}, n = {:.4}",
        na.state(GateId::X),
        na.state(GateId::Y),
        k.state(GateId::X)
    );

    Ok(())
}
