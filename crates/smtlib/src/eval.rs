//! Numeric evaluation of arithmetic expressions.
//!
//! Symbols resolve through a caller-supplied binding table. Supported
//! operators: binary `+ - * / ^`, unary `-`, unary `exp` and `arcsin`, and `ite` whose
//! condition is one of the relations `= < <= > >=` (compared exactly).

use rustc_hash::FxHashMap;

use crate::error::ExprError;
use crate::term::{Expr, Symbol};

/// Variable bindings: symbol name to value.
pub type Bindings = FxHashMap<String, f64>;

/// Relational operators understood by conditions and the assertion checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Relation {
    pub fn from_operator(op: &str) -> Option<Self> {
        match op {
            "=" => Some(Relation::Eq),
            "<" => Some(Relation::Lt),
            "<=" => Some(Relation::Le),
            ">" => Some(Relation::Gt),
            ">=" => Some(Relation::Ge),
            _ => None,
        }
    }

    pub fn operator(&self) -> &'static str {
        match self {
            Relation::Eq => "=",
            Relation::Lt => "<",
            Relation::Le => "<=",
            Relation::Gt => ">",
            Relation::Ge => ">=",
        }
    }

    /// Compare two values; `=` holds within `tolerance`, the others are exact.
    pub fn holds(&self, lhs: f64, rhs: f64, tolerance: f64) -> bool {
        match self {
            Relation::Eq => (lhs - rhs).abs() <= tolerance,
            Relation::Lt => lhs < rhs,
            Relation::Le => lhs <= rhs,
            Relation::Gt => lhs > rhs,
            Relation::Ge => lhs >= rhs,
        }
    }
}

fn expect_arity(op: &str, args: &[Expr], expected: usize) -> Result<(), ExprError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(ExprError::Arity {
            operator: op.to_string(),
            expected,
            found: args.len(),
        })
    }
}

/// Evaluate `expr` to a number.
pub fn evaluate(expr: &Expr, bindings: &Bindings) -> Result<f64, ExprError> {
    match expr {
        Expr::Symbol(s) => bindings
            .get(s.as_str())
            .copied()
            .ok_or_else(|| ExprError::UnboundVariable(s.to_string())),
        Expr::Numeral(n) => Ok(n.value() as f64),
        Expr::Decimal(d) => Ok(d.value()),
        Expr::List(items) => {
            let Some((head, args)) = items.split_first() else {
                return Err(ExprError::EmptyExpression);
            };
            let Some(op) = head.as_symbol() else {
                return Err(ExprError::UnsupportedOperator(head.to_string()));
            };
            evaluate_application(op.as_str(), args, bindings)
        }
    }
}

fn evaluate_application(op: &str, args: &[Expr], bindings: &Bindings) -> Result<f64, ExprError> {
    match op {
        "-" if args.len() == 1 => Ok(-evaluate(&args[0], bindings)?),
        "+" | "-" | "*" | "/" | "^" => {
            expect_arity(op, args, 2)?;
            let lhs = evaluate(&args[0], bindings)?;
            let rhs = evaluate(&args[1], bindings)?;
            Ok(match op {
                "+" => lhs + rhs,
                "-" => lhs - rhs,
                "*" => lhs * rhs,
                "/" => lhs / rhs,
                _ => lhs.powf(rhs),
            })
        }
        "arcsin" => {
            expect_arity(op, args, 1)?;
            Ok(evaluate(&args[0], bindings)?.asin())
        }
        "exp" => {
            expect_arity(op, args, 1)?;
            Ok(evaluate(&args[0], bindings)?.exp())
        }
        "ite" => {
            expect_arity(op, args, 3)?;
            if evaluate_condition(&args[0], bindings)? {
                evaluate(&args[1], bindings)
            } else {
                evaluate(&args[2], bindings)
            }
        }
        _ => Err(ExprError::UnsupportedOperator(op.to_string())),
    }
}

/// Evaluate a relational condition `(<rel> lhs rhs)` exactly.
pub fn evaluate_condition(expr: &Expr, bindings: &Bindings) -> Result<bool, ExprError> {
    let Some((head, args)) = expr.as_list().and_then(<[Expr]>::split_first) else {
        return Err(ExprError::UnsupportedOperator(expr.to_string()));
    };
    let op = head
        .as_symbol()
        .map(Symbol::as_str)
        .ok_or_else(|| ExprError::UnsupportedOperator(head.to_string()))?;
    let relation =
        Relation::from_operator(op).ok_or_else(|| ExprError::UnsupportedOperator(op.to_string()))?;
    expect_arity(op, args, 2)?;
    let lhs = evaluate(&args[0], bindings)?;
    let rhs = evaluate(&args[1], bindings)?;
    Ok(relation.holds(lhs, rhs, 0.0))
}
