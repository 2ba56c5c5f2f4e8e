//! Reading SMT-LIB2 text back into [`Expr`] trees.
//!
//! Accepts the output of the formatter: parentheses, whitespace, `;` line
//! comments and atoms. An atom is a [`Numeral`](crate::term::Numeral) when it
//! is an optionally signed integer, a [`Decimal`](crate::term::Decimal) when it
//! matches the decimal grammar, and a [`Symbol`](crate::term::Symbol) otherwise.
//! `(- N)` with a positive integer `N` is the formatter's spelling of a
//! negative numeral and reads back as one.

use crate::error::ExprError;
use crate::term::{Decimal, Expr, Symbol};

#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    Open,
    Close,
    Atom(&'a str),
}

fn tokenize(input: &str) -> Vec<Token<'_>> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => {
                tokens.push(Token::Open);
                i += 1;
            }
            b')' => {
                tokens.push(Token::Close);
                i += 1;
            }
            b';' => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b if b.is_ascii_whitespace() => i += 1,
            _ => {
                let start = i;
                while i < bytes.len()
                    && !bytes[i].is_ascii_whitespace()
                    && !matches!(bytes[i], b'(' | b')' | b';')
                {
                    i += 1;
                }
                tokens.push(Token::Atom(&input[start..i]));
            }
        }
    }
    tokens
}

fn parse_atom(atom: &str) -> Result<Expr, ExprError> {
    let unsigned = atom.strip_prefix('-').unwrap_or(atom);
    if !unsigned.is_empty() && unsigned.bytes().all(|b| b.is_ascii_digit()) {
        return atom
            .parse::<i64>()
            .map(Expr::numeral)
            .map_err(|_| ExprError::Syntax(format!("integer literal out of range: {atom}")));
    }
    if let Ok(decimal) = Decimal::new(atom) {
        return Ok(Expr::Decimal(decimal));
    }
    Symbol::new(atom).map(Expr::Symbol)
}

/// `-N` for a positive digit string `N` that fits in an `i64`.
fn negative_numeral(digits: &str) -> Option<i64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let magnitude: u64 = digits.parse().ok()?;
    if magnitude == 0 {
        return None;
    }
    0i64.checked_sub_unsigned(magnitude)
}

/// Parse one expression starting at `pos`; returns it with the next position.
fn parse_at(tokens: &[Token<'_>], pos: usize) -> Result<(Expr, usize), ExprError> {
    if let Some([Token::Open, Token::Atom("-"), Token::Atom(digits), Token::Close]) =
        tokens.get(pos..pos + 4)
        && let Some(value) = negative_numeral(digits)
    {
        return Ok((Expr::numeral(value), pos + 4));
    }
    match tokens.get(pos) {
        None => Err(ExprError::Syntax("unexpected end of input".to_string())),
        Some(Token::Close) => Err(ExprError::Syntax("unexpected ')'".to_string())),
        Some(Token::Atom(atom)) => Ok((parse_atom(atom)?, pos + 1)),
        Some(Token::Open) => {
            let mut items = Vec::new();
            let mut pos = pos + 1;
            loop {
                match tokens.get(pos) {
                    None => return Err(ExprError::Syntax("unbalanced '('".to_string())),
                    Some(Token::Close) => return Ok((Expr::List(items), pos + 1)),
                    Some(_) => {
                        let (item, next) = parse_at(tokens, pos)?;
                        items.push(item);
                        pos = next;
                    }
                }
            }
        }
    }
}

/// Parse exactly one expression from `input`.
pub fn parse_expr(input: &str) -> Result<Expr, ExprError> {
    let tokens = tokenize(input);
    let (expr, next) = parse_at(&tokens, 0)?;
    if next != tokens.len() {
        return Err(ExprError::Syntax(format!(
            "trailing input after expression: {input}"
        )));
    }
    Ok(expr)
}

/// Parse every top-level expression in `input`.
pub fn parse_exprs(input: &str) -> Result<Vec<Expr>, ExprError> {
    let tokens = tokenize(input);
    let mut exprs = Vec::new();
    let mut pos = 0;
    while pos < tokens.len() {
        let (expr, next) = parse_at(&tokens, pos)?;
        exprs.push(expr);
        pos = next;
    }
    Ok(exprs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_atoms() {
        assert_eq!(parse_expr("42").unwrap(), Expr::numeral(42));
        assert_eq!(parse_expr("-7").unwrap(), Expr::numeral(-7));
        assert_eq!(parse_expr("2.5").unwrap(), Expr::decimal("2.5").unwrap());
        assert_eq!(parse_expr("ch0.width").unwrap(), Expr::symbol("ch0.width").unwrap());
        assert_eq!(parse_expr("-").unwrap(), Expr::symbol("-").unwrap());
    }

    #[test]
    fn parse_declaration() {
        let expr = parse_expr("(declare-fun x () Real)").unwrap();
        assert!(expr.is_declaration());
        assert_eq!(expr.to_string(), "(declare-fun x () Real)");
    }

    #[test]
    fn parse_preserves_serialized_text() {
        let text = "(assert (= ch0.resistance (/ (* (* 12.0 ch0.viscosity) ch0.length) ch0.width)))";
        assert_eq!(parse_expr(text).unwrap().to_string(), text);
    }

    #[test]
    fn parse_skips_comments_and_newlines() {
        let exprs = parse_exprs("; header\n(set-logic QF_NRA)\n(check-sat) ; done\n").unwrap();
        assert_eq!(exprs.len(), 2);
        assert_eq!(exprs[1].head(), Some("check-sat"));
    }

    #[test]
    fn parse_rejects_unbalanced() {
        assert!(matches!(parse_expr("(+ 1 2"), Err(ExprError::Syntax(_))));
        assert!(matches!(parse_expr(")"), Err(ExprError::Syntax(_))));
        assert!(matches!(parse_expr("(+ 1 2))"), Err(ExprError::Syntax(_))));
        assert!(matches!(parse_expr(""), Err(ExprError::Syntax(_))));
    }

    #[test]
    fn parse_rejects_invalid_symbol_atom() {
        assert!(matches!(
            parse_expr("(+ 1x 2)"),
            Err(ExprError::InvalidSymbol(_))
        ));
    }

    #[test]
    fn negative_numeral_reads_back() {
        for n in [-1, -42, i64::MIN] {
            let e = Expr::numeral(n);
            assert_eq!(parse_expr(&e.to_string()).unwrap(), e);
        }
        let nested = parse_expr("(* (- 3) x)").unwrap();
        assert_eq!(nested.as_list().unwrap()[1], Expr::numeral(-3));
    }

    #[test]
    fn negation_of_other_terms_stays_a_list() {
        for text in ["(- 0)", "(- 2.5)", "(- x)", "(- 1 2)"] {
            let expr = parse_expr(text).unwrap();
            assert!(expr.as_list().is_some(), "{text}");
            assert_eq!(expr.to_string(), text);
        }
        assert!(matches!(
            parse_expr("(- 9223372036854775809)"),
            Err(ExprError::Syntax(_))
        ));
    }

    #[test]
    fn parse_rejects_out_of_range_integer() {
        assert!(matches!(
            parse_expr("99999999999999999999"),
            Err(ExprError::Syntax(_))
        ));
    }
}
