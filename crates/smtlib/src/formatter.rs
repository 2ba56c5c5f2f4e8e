//! SMT-LIB2 text formatting for expressions.
//!
//! Implements `Display` for [`Symbol`], [`Numeral`], [`Decimal`] and [`Expr`],
//! producing the parenthesized prefix form with single-space separators that
//! dReal reads on its standard input.

use std::fmt;

use crate::term::{Decimal, Expr, Numeral, Symbol};

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for Numeral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.value();
        if n < 0 {
            // SMT-LIB represents negative integers as `(- N)`
            write!(f, "(- {})", n.unsigned_abs())
        } else {
            write!(f, "{n}")
        }
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Write a space-separated list of expressions.
fn fmt_expr_list(items: &[Expr], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Symbol(s) => write!(f, "{s}"),
            Expr::Numeral(n) => write!(f, "{n}"),
            Expr::Decimal(d) => write!(f, "{d}"),
            Expr::List(items) => {
                write!(f, "(")?;
                fmt_expr_list(items, f)?;
                write!(f, ")")
            }
        }
    }
}
