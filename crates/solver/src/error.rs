use std::fmt;
use std::path::PathBuf;

use microflow_smtlib::ExprError;

/// Errors from solver interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverError {
    /// Solver executable not found; carries the path or binary name searched.
    NotFound(PathBuf),
    /// Process failed to start, or a pipe operation failed.
    ProcessError(String),
    /// A response line did not match the expected grammar.
    ParseError(String),
    /// The solver answered with something other than a result header.
    SolverReported(String),
    /// Operation not allowed in the session's current state.
    InvalidState(String),
    /// A written line could not be read back as an expression.
    Expression(ExprError),
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverError::NotFound(path) => {
                write!(f, "Solver executable not found: {}", path.display())
            }
            SolverError::ProcessError(msg) => write!(f, "Solver process error: {msg}"),
            SolverError::ParseError(line) => {
                write!(f, "Failed to parse solver output line: {line:?}")
            }
            SolverError::SolverReported(line) => write!(f, "Solver reported: {line}"),
            SolverError::InvalidState(msg) => write!(f, "Invalid session state: {msg}"),
            SolverError::Expression(err) => write!(f, "Expression error: {err}"),
        }
    }
}

impl std::error::Error for SolverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SolverError::Expression(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ExprError> for SolverError {
    fn from(err: ExprError) -> Self {
        SolverError::Expression(err)
    }
}
