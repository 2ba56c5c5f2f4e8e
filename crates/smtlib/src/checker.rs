//! Numeric assertion oracle.
//!
//! Evaluates `(assert (<rel> lhs rhs))` statements against a binding table
//! without involving a real decision procedure. Used to validate generated
//! constraints against known candidate solutions and as a stand-in solver in
//! tests.

use crate::error::ExprError;
use crate::eval::{Bindings, Relation, evaluate};
use crate::term::Expr;

/// Default absolute tolerance for `=`.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Outcome of checking a single statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Holds,
    Violated,
    /// Not assertion-shaped; only produced in lenient mode.
    Skipped,
}

/// Summary of checking a list of statements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckReport {
    pub holds: usize,
    pub skipped: usize,
    pub violated: Vec<Expr>,
}

impl CheckReport {
    pub fn all_hold(&self) -> bool {
        self.violated.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AssertionChecker {
    tolerance: f64,
    strict: bool,
}

impl Default for AssertionChecker {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            strict: false,
        }
    }
}

impl AssertionChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absolute tolerance used for `=`.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// In strict mode anything that is not `(assert (<rel> lhs rhs))` counts
    /// as a violation instead of being skipped.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Check one statement.
    pub fn check(&self, statement: &Expr, bindings: &Bindings) -> Result<Verdict, ExprError> {
        let Some((relation, lhs, rhs)) = assertion_parts(statement) else {
            return Ok(if self.strict {
                Verdict::Violated
            } else {
                Verdict::Skipped
            });
        };
        let lhs = evaluate(lhs, bindings)?;
        let rhs = evaluate(rhs, bindings)?;
        if relation.holds(lhs, rhs, self.tolerance) {
            Ok(Verdict::Holds)
        } else {
            Ok(Verdict::Violated)
        }
    }

    /// Check every statement, collecting violations.
    pub fn check_all(&self, statements: &[Expr], bindings: &Bindings) -> Result<CheckReport, ExprError> {
        let mut report = CheckReport::default();
        for statement in statements {
            match self.check(statement, bindings)? {
                Verdict::Holds => report.holds += 1,
                Verdict::Skipped => report.skipped += 1,
                Verdict::Violated => report.violated.push(statement.clone()),
            }
        }
        Ok(report)
    }
}

/// Split `(assert (<rel> lhs rhs))` into its parts.
fn assertion_parts(statement: &Expr) -> Option<(Relation, &Expr, &Expr)> {
    let [assert_kw, body] = statement.as_list()? else {
        return None;
    };
    if assert_kw.as_symbol()?.as_str() != "assert" {
        return None;
    }
    let [rel, lhs, rhs] = body.as_list()? else {
        return None;
    };
    let relation = Relation::from_operator(rel.as_symbol()?.as_str())?;
    Some((relation, lhs, rhs))
}
