//! Error taxonomy for gate and channel configuration.
//!
//! Configuration mistakes are reported synchronously from the mutating call
//! and leave prior state unchanged. Runtime degradations (a near-zero rate
//! denominator, a missing expression) are not errors at all: the per-step
//! code warns and keeps the previous gate state, so a malformed gate can
//! never panic or poison the simulation across the `process`/`reinit`
//! boundary.

use thiserror::Error;

/// Errors raised by gate and channel configuration calls.
#[derive(Debug, Error)]
pub enum KineticsError {
    /// A parametric rate description had the wrong number of coefficients.
    #[error("parameter vector for `{field}` must have {expected} entries, got {got}")]
    BadParameterCount {
        field: &'static str,
        expected: usize,
        got: usize,
    },

    /// A raw rate table was too short to look up.
    #[error("rate table `{field}` must have at least 2 entries, got {got}")]
    TableTooSmall { field: &'static str, got: usize },

    /// The B table must match the A table entry for entry.
    #[error("table B size {got} does not match table A size {expected}")]
    TableSizeMismatch { expected: usize, got: usize },

    /// Resampling a table needs at least 3 subdivisions.
    #[error("table division count must be >= 3, got {got}")]
    TooFewDivisions { got: usize },

    /// Lookup domain bounds must satisfy `xmax > xmin`.
    #[error("invalid lookup range: min {min} must be below max {max}")]
    InvalidRange { min: f64, max: f64 },

    /// Gate powers are exponents on a state in [0, 1]; negatives are
    /// rejected.
    #[error("gate power must be >= 0, got {0}")]
    NegativePower(f64),

    /// An input-selector string was not one of the recognized names.
    #[error("unrecognized input selector `{0}`")]
    UnknownSelector(String),

    /// A rate expression failed to compile; the prior expression is kept.
    #[error("cannot compile rate expression `{source_text}`: {message}")]
    ExpressionCompile {
        source_text: String,
        message: String,
    },

    /// A compiled expression failed to evaluate (e.g. an unbound name).
    #[error("cannot evaluate rate expression `{source_text}`: {message}")]
    ExpressionEval {
        source_text: String,
        message: String,
    },

    /// A gate has no usable rate description yet.
    #[error("gate `{0}` has no compiled rate expressions")]
    EmptyExpression(&'static str),

    /// A 2-variable gate was driven with fewer inputs than it needs.
    #[error("gate needs {expected} input values, got {got}")]
    MissingInput { expected: usize, got: usize },

    /// Mutation was attempted from a channel that does not own the gate.
    #[error("`{field}` may only be changed from the original channel, not a copy")]
    NotOriginal { field: &'static str },

    /// A shared gate lock was poisoned by a panicking writer.
    #[error("gate `{0}` is unusable: shared lock poisoned")]
    GatePoisoned(&'static str),

    /// The channel has no gate in the requested slot.
    #[error("no `{0}` gate has been created on this channel")]
    NoSuchGate(&'static str),
}
