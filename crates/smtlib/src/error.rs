use std::fmt;

/// Errors from building, reading or evaluating expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprError {
    /// Identifier rejected by symbol validation.
    InvalidSymbol(String),
    /// Text rejected by decimal validation.
    InvalidDecimal(String),
    /// Evaluation reached a symbol with no binding.
    UnboundVariable(String),
    /// Evaluation reached `()`.
    EmptyExpression,
    /// Evaluation reached an operator the evaluator does not know.
    UnsupportedOperator(String),
    /// Known operator applied to the wrong number of operands.
    Arity {
        operator: String,
        expected: usize,
        found: usize,
    },
    /// Malformed S-expression text.
    Syntax(String),
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprError::InvalidSymbol(s) => write!(f, "Invalid symbol: {s:?}"),
            ExprError::InvalidDecimal(s) => write!(f, "Invalid decimal: {s:?}"),
            ExprError::UnboundVariable(name) => write!(f, "Unbound variable: {name}"),
            ExprError::EmptyExpression => write!(f, "Cannot evaluate empty expression"),
            ExprError::UnsupportedOperator(op) => write!(f, "Unsupported operator: {op}"),
            ExprError::Arity {
                operator,
                expected,
                found,
            } => write!(
                f,
                "Operator {operator} expects {expected} operand(s), found {found}"
            ),
            ExprError::Syntax(msg) => write!(f, "Syntax error: {msg}"),
        }
    }
}

impl std::error::Error for ExprError {}
