use std::borrow::Borrow;

use crate::error::ExprError;

/// Characters allowed in a symbol besides ASCII letters and digits.
const SYMBOL_PUNCTUATION: &str = "~!@$%^&*_-+=<>.?/";

/// A validated SMT-LIB simple symbol.
///
/// Used both for declared variables (`ch0.width`) and operator tokens (`+`,
/// `<=`, `declare-fun`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(String);

impl Symbol {
    /// Validate and wrap an identifier.
    ///
    /// Rejects the empty string, a leading ASCII digit, and any character
    /// outside letters, digits and `~!@$%^&*_-+=<>.?/`.
    pub fn new(name: impl Into<String>) -> Result<Self, ExprError> {
        let name = name.into();
        if is_valid_symbol(&name) {
            Ok(Symbol(name))
        } else {
            Err(ExprError::InvalidSymbol(name))
        }
    }

    /// Wrap a known-valid operator or keyword token.
    pub(crate) fn keyword(name: &'static str) -> Self {
        debug_assert!(is_valid_symbol(name), "invalid keyword {name}");
        Symbol(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

fn is_valid_symbol(name: &str) -> bool {
    let Some(first) = name.chars().next() else {
        return false;
    };
    !first.is_ascii_digit()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || SYMBOL_PUNCTUATION.contains(c))
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An exact integer literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Numeral(pub i64);

impl Numeral {
    pub fn value(&self) -> i64 {
        self.0
    }
}

/// A non-negative real literal in normalized text form (`digits.digits`).
///
/// Negative reals are written as `(- d)`, see [`crate::qfnra::real`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal(String);

impl Decimal {
    /// Parse a decimal literal, appending `.0` when the point is missing.
    ///
    /// Accepts `[0-9]+(\.[0-9]+)?`; anything else, a sign included, is
    /// rejected.
    pub fn new(text: &str) -> Result<Self, ExprError> {
        let (int_part, frac_part) = match text.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (text, None),
        };
        let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || frac_part.is_some_and(|f| !all_digits(f)) {
            return Err(ExprError::InvalidDecimal(text.to_string()));
        }
        if frac_part.is_some() {
            Ok(Decimal(text.to_string()))
        } else {
            Ok(Decimal(format!("{text}.0")))
        }
    }

    /// Build a decimal from a finite, non-negative `f64`.
    pub fn from_f64(value: f64) -> Result<Self, ExprError> {
        if !value.is_finite() || (value.is_sign_negative() && value != 0.0) {
            return Err(ExprError::InvalidDecimal(value.to_string()));
        }
        let value = value.abs();
        // `Display` for f64 never uses exponent notation.
        Decimal::new(&value.to_string())
    }

    /// Wrap a known-valid literal.
    pub(crate) fn literal(text: &'static str) -> Self {
        debug_assert!(Decimal::new(text).is_ok_and(|d| d.0 == text), "invalid literal {text}");
        Decimal(text.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn value(&self) -> f64 {
        // Validated by construction.
        self.0.parse().unwrap_or(f64::NAN)
    }
}

/// A term of the QF_NRA assertion language.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Symbol(Symbol),
    Numeral(Numeral),
    Decimal(Decimal),
    /// Operator application `(op a b ...)` or grouping, including `()`.
    List(Vec<Expr>),
}

impl Expr {
    /// Symbol expression from an identifier.
    pub fn symbol(name: impl Into<String>) -> Result<Self, ExprError> {
        Symbol::new(name).map(Expr::Symbol)
    }

    pub fn numeral(value: i64) -> Self {
        Expr::Numeral(Numeral(value))
    }

    pub fn decimal(text: &str) -> Result<Self, ExprError> {
        Decimal::new(text).map(Expr::Decimal)
    }

    pub fn list(items: Vec<Expr>) -> Self {
        Expr::List(items)
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Expr::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Expr]> {
        match self {
            Expr::List(items) => Some(items),
            _ => None,
        }
    }

    /// Operator name when this is an application headed by a symbol.
    pub fn head(&self) -> Option<&str> {
        self.as_list()
            .and_then(|items| items.first())
            .and_then(Expr::as_symbol)
            .map(Symbol::as_str)
    }

    /// True for `(declare-fun ...)` statements.
    pub fn is_declaration(&self) -> bool {
        self.head() == Some("declare-fun")
    }

    /// True for `(assert ...)` statements.
    pub fn is_assertion(&self) -> bool {
        self.head() == Some("assert")
    }
}

impl From<Symbol> for Expr {
    fn from(symbol: Symbol) -> Self {
        Expr::Symbol(symbol)
    }
}

impl From<&Symbol> for Expr {
    fn from(symbol: &Symbol) -> Self {
        Expr::Symbol(symbol.clone())
    }
}

impl From<Decimal> for Expr {
    fn from(decimal: Decimal) -> Self {
        Expr::Decimal(decimal)
    }
}

impl From<Numeral> for Expr {
    fn from(numeral: Numeral) -> Self {
        Expr::Numeral(numeral)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_rejects_leading_digit() {
        assert_eq!(
            Symbol::new("1x"),
            Err(ExprError::InvalidSymbol("1x".to_string()))
        );
    }

    #[test]
    fn symbol_rejects_empty_and_whitespace() {
        assert!(Symbol::new("").is_err());
        assert!(Symbol::new("a b").is_err());
        assert!(Symbol::new("tab\there").is_err());
        assert!(Symbol::new("paren(").is_err());
    }

    #[test]
    fn symbol_accepts_identifiers_and_operators() {
        for name in ["x1", "ch0_pos_x", "ch0.width", "n1.in.pressure", "+", "<=", "declare-fun"] {
            assert!(Symbol::new(name).is_ok(), "{name} should be accepted");
        }
    }

    #[test]
    fn symbol_identity_is_by_name() {
        assert_eq!(Symbol::new("x").unwrap(), Symbol::new("x").unwrap());
        assert_ne!(Symbol::new("x").unwrap(), Symbol::new("y").unwrap());
    }

    #[test]
    fn decimal_appends_point_zero() {
        assert_eq!(Decimal::new("5").unwrap().as_str(), "5.0");
    }

    #[test]
    fn decimal_keeps_existing_point() {
        assert_eq!(Decimal::new("3.14").unwrap().as_str(), "3.14");
    }

    #[test]
    fn decimal_rejects_malformed() {
        for text in ["", "-", "abc", "1.2.3", ".5", "5.", "1e5", " 1.0", "+1.0", "-5", "-2.5"] {
            assert_eq!(
                Decimal::new(text),
                Err(ExprError::InvalidDecimal(text.to_string())),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn decimal_from_f64() {
        assert_eq!(Decimal::from_f64(2.0).unwrap().as_str(), "2.0");
        assert_eq!(Decimal::from_f64(0.0002).unwrap().as_str(), "0.0002");
        assert_eq!(Decimal::from_f64(1e-4).unwrap().value(), 1e-4);
        assert!(Decimal::from_f64(f64::NAN).is_err());
        assert!(Decimal::from_f64(f64::INFINITY).is_err());
        assert!(Decimal::from_f64(-1.5).is_err());
        assert_eq!(Decimal::from_f64(-0.0).unwrap().as_str(), "0.0");
    }

    #[test]
    fn numeral_equality_is_by_value() {
        assert_eq!(Numeral(3), Numeral(3));
        assert_ne!(Numeral(3), Numeral(4));
    }

    #[test]
    fn head_and_statement_kinds() {
        let decl = Expr::list(vec![
            Expr::symbol("declare-fun").unwrap(),
            Expr::symbol("x").unwrap(),
            Expr::list(vec![]),
            Expr::symbol("Real").unwrap(),
        ]);
        assert_eq!(decl.head(), Some("declare-fun"));
        assert!(decl.is_declaration());
        assert!(!decl.is_assertion());
        assert_eq!(Expr::numeral(1).head(), None);
        assert_eq!(Expr::list(vec![]).head(), None);
    }
}
