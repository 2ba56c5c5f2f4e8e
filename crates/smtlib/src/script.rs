use rustc_hash::FxHashSet;

use crate::term::{Expr, Symbol};

/// An SMT-LIB script: an ordered sequence of top-level statements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    exprs: Vec<Expr>,
}

impl Script {
    pub fn new() -> Self {
        Self { exprs: Vec::new() }
    }

    pub fn with_exprs(exprs: Vec<Expr>) -> Self {
        Self { exprs }
    }

    pub fn push(&mut self, expr: Expr) {
        self.exprs.push(expr);
    }

    pub fn extend(&mut self, exprs: impl IntoIterator<Item = Expr>) {
        self.exprs.extend(exprs);
    }

    pub fn exprs(&self) -> &[Expr] {
        &self.exprs
    }

    pub fn into_exprs(self) -> Vec<Expr> {
        self.exprs
    }

    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    /// Symbols declared by `(declare-fun <sym> ...)` statements, in order.
    pub fn declared_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.exprs.iter().filter_map(declared_symbol)
    }

    /// Drop repeated declarations of the same symbol, keeping the first.
    ///
    /// Returns the number of statements removed.
    pub fn dedup_declarations(&mut self) -> usize {
        let before = self.exprs.len();
        let mut seen = FxHashSet::default();
        self.exprs.retain(|expr| match declared_symbol(expr) {
            Some(symbol) => seen.insert(symbol.clone()),
            None => true,
        });
        before - self.exprs.len()
    }

    /// One serialized statement per line.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.exprs.iter().map(Expr::to_string)
    }
}

impl FromIterator<Expr> for Script {
    fn from_iter<I: IntoIterator<Item = Expr>>(iter: I) -> Self {
        Self::with_exprs(iter.into_iter().collect())
    }
}

fn declared_symbol(expr: &Expr) -> Option<&Symbol> {
    if !expr.is_declaration() {
        return None;
    }
    expr.as_list()?.get(1)?.as_symbol()
}
