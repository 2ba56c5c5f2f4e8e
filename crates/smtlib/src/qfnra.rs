//! Term builders for quantifier-free nonlinear real arithmetic.
//!
//! Every function returns a fresh tree and consumes its operands; callers
//! clone shared subterms. Output always serializes to syntax dReal accepts.

use crate::error::ExprError;
use crate::term::{Decimal, Expr, Symbol};

/// Logic selected by [`logic_header`].
pub const LOGIC: &str = "QF_NRA";

fn keyword(name: &'static str) -> Expr {
    Expr::Symbol(Symbol::keyword(name))
}

fn apply(op: &'static str, args: impl IntoIterator<Item = Expr>) -> Expr {
    let mut items = vec![keyword(op)];
    items.extend(args);
    Expr::List(items)
}

// ---------------------------------------------------------------------------
// Literals
// ---------------------------------------------------------------------------

/// Real literal. Negative values are written as `(- |v|)`.
pub fn real(value: f64) -> Result<Expr, ExprError> {
    let magnitude = Expr::Decimal(Decimal::from_f64(value.abs())?);
    if value.is_sign_negative() && value != 0.0 {
        Ok(neg(magnitude))
    } else {
        Ok(magnitude)
    }
}

pub fn int(value: i64) -> Expr {
    Expr::numeral(value)
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

pub fn add(lhs: Expr, rhs: Expr) -> Expr {
    apply("+", [lhs, rhs])
}

pub fn sub(lhs: Expr, rhs: Expr) -> Expr {
    apply("-", [lhs, rhs])
}

pub fn mul(lhs: Expr, rhs: Expr) -> Expr {
    apply("*", [lhs, rhs])
}

pub fn div(lhs: Expr, rhs: Expr) -> Expr {
    apply("/", [lhs, rhs])
}

pub fn pow(base: Expr, exponent: Expr) -> Expr {
    apply("^", [base, exponent])
}

/// Unary negation `(- x)`.
pub fn neg(operand: Expr) -> Expr {
    apply("-", [operand])
}

/// `(^ x 2)`
pub fn square(operand: Expr) -> Expr {
    pow(operand, int(2))
}

/// Square root as `(^ x 0.5)`.
pub fn sqrt(operand: Expr) -> Expr {
    pow(operand, Expr::Decimal(Decimal::literal("0.5")))
}

/// Inverse sine, used by geometric approximations.
pub fn arcsin(operand: Expr) -> Expr {
    apply("arcsin", [operand])
}

/// Natural exponential.
pub fn exp(operand: Expr) -> Expr {
    apply("exp", [operand])
}

/// Left-nested binary sum; `0.0` for no terms.
pub fn sum(terms: Vec<Expr>) -> Expr {
    let mut iter = terms.into_iter();
    match iter.next() {
        None => zero(),
        Some(first) => iter.fold(first, add),
    }
}

/// `0.0`
pub fn zero() -> Expr {
    Expr::Decimal(Decimal::literal("0.0"))
}

// ---------------------------------------------------------------------------
// Relations and control
// ---------------------------------------------------------------------------

pub fn eq(lhs: Expr, rhs: Expr) -> Expr {
    apply("=", [lhs, rhs])
}

pub fn lt(lhs: Expr, rhs: Expr) -> Expr {
    apply("<", [lhs, rhs])
}

pub fn le(lhs: Expr, rhs: Expr) -> Expr {
    apply("<=", [lhs, rhs])
}

pub fn gt(lhs: Expr, rhs: Expr) -> Expr {
    apply(">", [lhs, rhs])
}

pub fn ge(lhs: Expr, rhs: Expr) -> Expr {
    apply(">=", [lhs, rhs])
}

/// `(ite cond then else)`
pub fn ite(condition: Expr, then_branch: Expr, else_branch: Expr) -> Expr {
    apply("ite", [condition, then_branch, else_branch])
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

/// `(assert term)`
pub fn assert(term: Expr) -> Expr {
    apply("assert", [term])
}

pub fn assert_eq(lhs: Expr, rhs: Expr) -> Expr {
    assert(eq(lhs, rhs))
}

pub fn assert_lt(lhs: Expr, rhs: Expr) -> Expr {
    assert(lt(lhs, rhs))
}

pub fn assert_le(lhs: Expr, rhs: Expr) -> Expr {
    assert(le(lhs, rhs))
}

pub fn assert_gt(lhs: Expr, rhs: Expr) -> Expr {
    assert(gt(lhs, rhs))
}

pub fn assert_ge(lhs: Expr, rhs: Expr) -> Expr {
    assert(ge(lhs, rhs))
}

/// `(declare-fun <symbol> () Real)`
pub fn declare_real(symbol: &Symbol) -> Expr {
    apply(
        "declare-fun",
        [Expr::from(symbol), Expr::List(Vec::new()), keyword("Real")],
    )
}

/// `(set-logic QF_NRA)`
pub fn logic_header() -> Expr {
    apply("set-logic", [keyword("QF_NRA")])
}

/// `(check-sat)`
pub fn check_sat() -> Expr {
    apply("check-sat", [])
}

/// `(exit)`
pub fn exit() -> Expr {
    apply("exit", [])
}
