//! Thin wrapper over the expression engine used for formula-form gates.
//!
//! The engine contract is deliberately narrow: compile a source string,
//! bind a fixed set of named variables, evaluate to a double, and report
//! compile errors with the offending source attached. Everything else about
//! the grammar (functions, constants, precedence) belongs to `meval`.
//!
//! Bound names:
//! - `v`: the gate's first input (voltage, or whatever signal is mapped in)
//! - `c`: the second input, for 2-variable gates (concentration by
//!   convention)
//! - `alpha`, `beta`, `tau`, `inf`: intermediate rate names available to
//!   formulas, per the Hodgkin-Huxley vocabulary

use std::str::FromStr;

use meval::{Context, Expr};

use crate::error::KineticsError;

/// Variable bindings handed to a rate expression for one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct Bindings {
    /// First independent variable, conventionally membrane voltage (V).
    pub v: f64,
    /// Second independent variable, conventionally a concentration (mM).
    pub c: f64,
    /// Intermediate forward-rate value visible to the expression.
    pub alpha: f64,
    /// Intermediate backward-rate value visible to the expression.
    pub beta: f64,
    /// Intermediate time-constant value visible to the expression.
    pub tau: f64,
    /// Intermediate steady-state value visible to the expression.
    pub inf: f64,
}

impl Bindings {
    /// Bindings for a single-input evaluation.
    pub fn one(v: f64) -> Self {
        Self {
            v,
            c: 0.0,
            alpha: 0.0,
            beta: 0.0,
            tau: 0.0,
            inf: 0.0,
        }
    }

    /// Bindings for a two-input evaluation.
    pub fn two(v: f64, c: f64) -> Self {
        Self { c, ..Self::one(v) }
    }

    fn context(&self) -> Context<'static> {
        let mut ctx = Context::new();
        ctx.var("v", self.v)
            .var("c", self.c)
            .var("alpha", self.alpha)
            .var("beta", self.beta)
            .var("tau", self.tau)
            .var("inf", self.inf);
        ctx
    }
}

/// A compiled rate expression together with its source text.
#[derive(Debug, Clone)]
pub struct RateExpr {
    source: String,
    compiled: Expr,
}

impl RateExpr {
    /// Compile `source`. On failure the error carries both the source text
    /// and the parser's diagnostic, and no expression is produced.
    pub fn compile(source: &str) -> Result<Self, KineticsError> {
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Err(KineticsError::ExpressionCompile {
                source_text: source.to_string(),
                message: "empty expression".to_string(),
            });
        }
        let compiled = Expr::from_str(trimmed).map_err(|e| KineticsError::ExpressionCompile {
            source_text: source.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            source: trimmed.to_string(),
            compiled,
        })
    }

    /// Evaluate with the given bindings. Side-effect-free apart from the
    /// bound variables.
    pub fn eval(&self, bindings: &Bindings) -> Result<f64, KineticsError> {
        let ctx = bindings.context();
        self.compiled
            .eval_with_context(&ctx)
            .map_err(|e| KineticsError::ExpressionEval {
                source_text: self.source.clone(),
                message: e.to_string(),
            })
    }

    /// The source text this expression was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_and_eval() {
        let expr = RateExpr::compile("2 * v + 1").expect("should compile");
        let y = expr.eval(&Bindings::one(3.0)).expect("should evaluate");
        assert!((y - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_two_variable_binding() {
        let expr = RateExpr::compile("v * c").expect("should compile");
        let y = expr.eval(&Bindings::two(2.0, 5.0)).expect("should evaluate");
        assert!((y - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_exponential_function() {
        let expr = RateExpr::compile("4 * exp(-(v + 0.065) / 0.018)").expect("should compile");
        let y = expr.eval(&Bindings::one(-0.065)).expect("should evaluate");
        assert!((y - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_compile_error_reports_source() {
        let err = RateExpr::compile("exp(v").unwrap_err();
        match err {
            KineticsError::ExpressionCompile { source_text, .. } => {
                assert!(source_text.contains("exp(v"));
            }
            other => panic!("expected compile error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_expression_rejected() {
        assert!(RateExpr::compile("   ").is_err());
    }

    #[test]
    fn test_intermediate_names_are_bound() {
        // `alpha` etc. must at least parse and evaluate without an
        // unknown-variable error.
        let expr = RateExpr::compile("alpha + beta + tau + inf").expect("should compile");
        let y = expr.eval(&Bindings::one(0.0)).expect("should evaluate");
        assert_eq!(y, 0.0);
    }
}
