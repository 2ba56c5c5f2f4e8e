use std::fmt;

use microflow_smtlib::ExprError;
use microflow_solver::SolverError;

/// Errors from constraint generation.
#[derive(Debug, Clone, PartialEq)]
pub enum CodegenError {
    /// An entity lacks a required port or attribute, or one has the wrong type.
    SchemaMismatch { entity: String, detail: String },
    /// A type name is not registered in the type table.
    UnknownType(String),
    /// A process or configuration parameter is out of range or malformed.
    InvalidParameter { name: String, detail: String },
    /// `cached()` was called before a successful translation.
    CacheNotReady(String),
    /// Building a term failed.
    Expression(ExprError),
}

impl CodegenError {
    pub(crate) fn schema(entity: impl Into<String>, detail: impl Into<String>) -> Self {
        CodegenError::SchemaMismatch {
            entity: entity.into(),
            detail: detail.into(),
        }
    }

    pub(crate) fn parameter(name: impl Into<String>, detail: impl Into<String>) -> Self {
        CodegenError::InvalidParameter {
            name: name.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodegenError::SchemaMismatch { entity, detail } => {
                write!(f, "Schema mismatch on {entity}: {detail}")
            }
            CodegenError::UnknownType(name) => write!(f, "Unknown type: {name}"),
            CodegenError::InvalidParameter { name, detail } => {
                write!(f, "Invalid parameter {name}: {detail}")
            }
            CodegenError::CacheNotReady(strategy) => {
                write!(f, "No cached translation for {strategy}")
            }
            CodegenError::Expression(err) => write!(f, "Expression error: {err}"),
        }
    }
}

impl std::error::Error for CodegenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CodegenError::Expression(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ExprError> for CodegenError {
    fn from(err: ExprError) -> Self {
        CodegenError::Expression(err)
    }
}

/// Errors from the end-to-end synthesis pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisError {
    Codegen(CodegenError),
    Solver(SolverError),
}

impl fmt::Display for SynthesisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthesisError::Codegen(err) => write!(f, "Constraint generation failed: {err}"),
            SynthesisError::Solver(err) => write!(f, "Solving failed: {err}"),
        }
    }
}

impl std::error::Error for SynthesisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SynthesisError::Codegen(err) => Some(err),
            SynthesisError::Solver(err) => Some(err),
        }
    }
}

impl From<CodegenError> for SynthesisError {
    fn from(err: CodegenError) -> Self {
        SynthesisError::Codegen(err)
    }
}

impl From<SolverError> for SynthesisError {
    fn from(err: SolverError) -> Self {
        SynthesisError::Solver(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_schema_mismatch() {
        let err = CodegenError::schema("j1", "missing port `output`");
        assert_eq!(err.to_string(), "Schema mismatch on j1: missing port `output`");
    }

    #[test]
    fn display_cache_not_ready() {
        let err = CodegenError::CacheNotReady("channelResistance".to_string());
        assert_eq!(err.to_string(), "No cached translation for channelResistance");
    }

    #[test]
    fn display_invalid_parameter() {
        let err = CodegenError::parameter("minNodeDistance", "must be positive, got -1");
        assert_eq!(
            err.to_string(),
            "Invalid parameter minNodeDistance: must be positive, got -1"
        );
    }

    #[test]
    fn conversions() {
        let err: CodegenError = ExprError::InvalidSymbol("1x".into()).into();
        assert!(matches!(err, CodegenError::Expression(_)));
        let err: SynthesisError = err.into();
        assert!(matches!(err, SynthesisError::Codegen(_)));
        let err: SynthesisError = SolverError::ParseError("?".into()).into();
        assert_eq!(
            err.to_string(),
            "Solving failed: Failed to parse solver output line: \"?\""
        );
    }
}
