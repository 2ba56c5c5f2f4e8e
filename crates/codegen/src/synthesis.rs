//! End-to-end synthesis: constraints out, solved schematic back.

use microflow_smtlib::Script;
use microflow_solver::{IntervalResult, SessionGuard, SolverSession};

use crate::annotate::annotate;
use crate::error::{CodegenError, SynthesisError};
use crate::params::ProcessParameters;
use crate::schematic::Schematic;
use crate::strategy::TranslationUnit;
use crate::types::TypeTable;

/// Outcome of one synthesis run.
#[derive(Debug, Clone, PartialEq)]
pub enum Synthesis {
    /// The constraints are satisfiable; `schematic` carries the solved values.
    Solved {
        schematic: Schematic,
        intervals: IntervalResult,
    },
    Unsatisfiable,
}

impl Synthesis {
    pub fn is_solved(&self) -> bool {
        matches!(self, Synthesis::Solved { .. })
    }

    /// The annotated schematic, if solved.
    pub fn schematic(&self) -> Option<&Schematic> {
        match self {
            Synthesis::Solved { schematic, .. } => Some(schematic),
            Synthesis::Unsatisfiable => None,
        }
    }
}

/// Translate and collect the output into a script without repeated
/// declarations.
pub fn build_script(
    unit: &mut TranslationUnit,
    schematic: &Schematic,
    params: &ProcessParameters,
    types: &TypeTable,
) -> Result<Script, CodegenError> {
    let mut script = Script::with_exprs(unit.translate(schematic, params, types)?.to_vec());
    let removed = script.dedup_declarations();
    tracing::debug!(
        strategy = unit.name(),
        statements = script.len(),
        removed,
        "built script"
    );
    Ok(script)
}

/// Generate constraints for `schematic`, solve them, and annotate the result.
///
/// The session is closed before this returns, on success or failure.
pub fn synthesize<S: SolverSession + ?Sized>(
    schematic: &Schematic,
    params: &ProcessParameters,
    types: &TypeTable,
    unit: &mut TranslationUnit,
    session: &mut S,
) -> Result<Synthesis, SynthesisError> {
    let script = build_script(unit, schematic, params, types)?;
    let result = {
        let mut guard = SessionGuard::new(session);
        guard.open()?;
        for line in script.lines() {
            guard.write(&line)?;
        }
        guard.solve()?
    };
    tracing::info!(
        schematic = %schematic.name,
        satisfiable = result.is_satisfiable(),
        symbols = result.len(),
        "synthesis finished"
    );
    if !result.is_satisfiable() {
        return Ok(Synthesis::Unsatisfiable);
    }
    Ok(Synthesis::Solved {
        schematic: annotate(schematic, &result)?,
        intervals: result,
    })
}
