//! Integration tests for gate rate curves.
//!
//! Tests verify:
//! - Tabulated lookup: clamping, interpolation, parametric regeneration
//! - The 13-parameter setup path and its round trip
//! - Singularity repair on parametric curves with vanishing denominators
//! - Agreement between table-form and expression-form rate curves

use channel_kinetics::{ChannelId, RateFormula, RateTable, TableForm};

/// The rational-exponential curve y(x) = (A + B*x) / (C + exp((x + D) / F)).
fn rational(p: &[f64; 5], x: f64) -> f64 {
    (p[0] + p[1] * x) / (p[2] + ((x + p[3]) / p[4]).exp())
}

const ALPHA: [f64; 5] = [1.0, 0.0, 1.0, 0.05, -0.01];
const BETA: [f64; 5] = [1.0, 0.0, 1.0, -0.05, 0.01];

/// A squid-style activation gate tabulated over [-100 mV, +50 mV].
fn squid_table(id: ChannelId) -> RateTable {
    let mut gate = RateTable::new(id);
    let mut parms = Vec::new();
    parms.extend_from_slice(&ALPHA);
    parms.extend_from_slice(&BETA);
    parms.extend_from_slice(&[100.0, -0.1, 0.05]);
    gate.setup_alpha(id, &parms).unwrap();
    gate.set_use_interpolation(id, true).unwrap();
    gate
}

// ============================================================================
// Table lookup
// ============================================================================

#[test]
fn test_squid_table_matches_closed_form() {
    let id = ChannelId::next();
    let gate = squid_table(id);

    let v = -0.065;
    let a = gate.lookup_a(v);
    let b = gate.lookup_b(v);
    let a_exact = rational(&ALPHA, v);
    let b_exact = a_exact + rational(&BETA, v);

    assert!(
        (a - a_exact).abs() < 1e-3,
        "A at {v} V: table {a}, closed form {a_exact}"
    );
    assert!(
        (b - b_exact).abs() < 1e-3,
        "B at {v} V: table {b}, closed form {b_exact}"
    );
    // Steady state A/B must be a valid gate fraction.
    let inf = a / b;
    assert!((0.0..=1.0).contains(&inf), "steady state: {inf}");
}

#[test]
fn test_lookup_clamps_outside_range() {
    let id = ChannelId::next();
    let gate = squid_table(id);

    assert_eq!(gate.lookup_a(-5.0), gate.lookup_a(-0.1));
    assert_eq!(gate.lookup_a(5.0), gate.lookup_a(0.05));
    assert_eq!(gate.lookup_b(f64::NEG_INFINITY), gate.lookup_b(-0.1));
}

#[test]
fn test_interpolation_is_linear_between_grid_points() {
    let id = ChannelId::next();
    let gate = squid_table(id);

    let dx = (gate.xmax() - gate.xmin()) / gate.divs() as f64;
    let x0 = gate.xmin() + 10.0 * dx;
    let left = gate.lookup_a(x0);
    let right = gate.lookup_a(x0 + dx);
    let mid = gate.lookup_a(x0 + 0.5 * dx);
    assert!(
        (mid - 0.5 * (left + right)).abs() < 1e-12,
        "midpoint {mid} vs neighbor average {}",
        0.5 * (left + right)
    );
}

#[test]
fn test_direct_lookup_snaps_to_grid_entry() {
    let id = ChannelId::next();
    let mut gate = squid_table(id);
    gate.set_use_interpolation(id, false).unwrap();

    let dx = (gate.xmax() - gate.xmin()) / gate.divs() as f64;
    let inside = gate.xmin() + 10.3 * dx;
    assert_eq!(gate.lookup_a(inside), gate.table_a()[10]);
}

// ============================================================================
// Parametric setup and round trip
// ============================================================================

#[test]
fn test_setup_parameters_round_trip() {
    let id = ChannelId::next();
    let gate = squid_table(id);

    let parms = gate.alpha_parms();
    assert_eq!(parms.len(), 13);
    assert_eq!(&parms[0..5], &ALPHA);
    assert_eq!(&parms[5..10], &BETA);
    assert_eq!(parms[10], 100.0);
    assert_eq!(parms[11], -0.1);
    assert_eq!(parms[12], 0.05);
    assert_eq!(gate.form(), TableForm::AlphaBetaParametric);
}

#[test]
fn test_range_change_regenerates_parametric_tables() {
    let id = ChannelId::next();
    let mut gate = squid_table(id);

    gate.set_min(id, -0.12).unwrap();
    let a = gate.lookup_a(-0.11);
    let a_exact = rational(&ALPHA, -0.11);
    assert!(
        (a - a_exact).abs() < 1e-3,
        "regenerated table should cover the widened range: {a} vs {a_exact}"
    );
}

#[test]
fn test_tau_inf_tables_store_converted_rates() {
    let id = ChannelId::next();
    let mut gate = RateTable::new(id);
    let mut parms = Vec::new();
    // Constant tau = 4 ms, voltage-dependent inf.
    parms.extend_from_slice(&[0.004, 0.0, 1.0, 0.0, 1e9]);
    parms.extend_from_slice(&ALPHA);
    parms.extend_from_slice(&[100.0, -0.1, 0.05]);
    gate.setup_tau(id, &parms).unwrap();
    assert_eq!(gate.form(), TableForm::TauInfParametric);

    // tau ~ 0.004 / (1 + exp(tiny)) ~ 0.002, so B = 1/tau ~ 500.
    let b = gate.lookup_b(-0.065);
    assert!((b - 500.0).abs() / 500.0 < 0.01, "B = 1/tau: {b}");
}

#[test]
fn test_tuple_setter_switches_parameterization() {
    let id = ChannelId::next();
    let mut gate = squid_table(id);

    gate.set_tau(id, &[0.004, 0.0, 1.0, 0.0, 1e9]).unwrap();
    assert_eq!(gate.form(), TableForm::TauInfParametric);
    assert!(
        gate.alpha().is_none(),
        "stale alpha tuple must be invalidated on mode switch"
    );
}

// ============================================================================
// Singularity repair
// ============================================================================

#[test]
fn test_singular_denominator_yields_finite_tables() {
    let id = ChannelId::next();
    let mut gate = RateTable::new(id);
    let mut parms = Vec::new();
    // C = -1 makes the denominator cross zero at x = 0, inside the range.
    parms.extend_from_slice(&[1.0, 0.0, -1.0, 0.0, 0.01]);
    parms.extend_from_slice(&[1.0, 0.0, 1.0, 0.0, 0.01]);
    parms.extend_from_slice(&[100.0, -0.05, 0.05]);
    gate.setup_alpha(id, &parms).unwrap();

    for (i, &a) in gate.table_a().iter().enumerate() {
        assert!(a.is_finite(), "entry {i} not repaired: {a}");
    }
    for (i, &b) in gate.table_b().iter().enumerate() {
        assert!(b.is_finite(), "B entry {i} not repaired: {b}");
    }
}

// ============================================================================
// Raw tables
// ============================================================================

#[test]
fn test_raw_tables_resample_on_range_change() {
    let id = ChannelId::next();
    let mut gate = RateTable::new(id);
    gate.set_min(id, 0.0).unwrap();
    gate.set_max(id, 1.0).unwrap();
    gate.set_table_a(id, &[0.0, 1.0, 2.0, 3.0, 4.0]).unwrap();
    gate.set_table_b(id, &[4.0, 3.0, 2.0, 1.0, 0.0]).unwrap();
    assert_eq!(gate.form(), TableForm::RawTable);

    // Halving the range keeps the curve over [0, 0.5]: the value at 0.25
    // was 1.0 before and must still be 1.0 after resampling.
    gate.set_max(id, 0.5).unwrap();
    assert!(
        (gate.lookup_a(0.25) - 1.0).abs() < 1e-9,
        "resampled value at 0.25: {}",
        gate.lookup_a(0.25)
    );
}

#[test]
fn test_copied_channel_cannot_mutate_table() {
    let owner = ChannelId::next();
    let intruder = ChannelId::next();
    let mut gate = squid_table(owner);

    assert!(gate.set_min(intruder, -0.2).is_err());
    assert!(gate.set_table_a(intruder, &[0.0, 1.0]).is_err());
    assert_eq!(gate.xmin(), -0.1, "rejected mutation must not take effect");
}

// ============================================================================
// Table vs. formula agreement
// ============================================================================

#[test]
fn test_table_and_formula_forms_agree() {
    let id = ChannelId::next();
    let table = squid_table(id);

    let mut formula = RateFormula::new(id);
    formula
        .set_alpha(id, "1 / (1 + exp(-(v + 0.05) / 0.01))")
        .unwrap();
    formula
        .set_beta(id, "1 / (1 + exp((v - 0.05) / 0.01))")
        .unwrap();

    for v in [-0.09, -0.065, -0.03, 0.0, 0.04] {
        let (ta, tb) = table.lookup_both(v);
        let (fa, fb) = formula.lookup_both(v).unwrap();
        assert!(
            (ta - fa).abs() < 1e-3,
            "A disagrees at {v} V: table {ta}, formula {fa}"
        );
        assert!(
            (tb - fb).abs() < 1e-3,
            "B disagrees at {v} V: table {tb}, formula {fb}"
        );
    }
}
