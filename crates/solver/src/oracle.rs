//! A solver session answered by the numeric assertion checker.
//!
//! Instead of searching for a model, the oracle is given a candidate binding
//! table up front. Every written line is read back into an expression; on
//! `solve` the assertions are evaluated against the bindings. If all hold the
//! result is satisfiable with a point interval for each declared symbol that
//! has a binding, otherwise it is unsatisfiable.

use std::collections::BTreeMap;

use microflow_smtlib::{AssertionChecker, Bindings, Expr, Script, parse_expr, qfnra};

use crate::error::SolverError;
use crate::result::{Interval, IntervalResult};
use crate::session::{SessionState, SolverSession, require_state};

#[derive(Debug, Clone)]
pub struct OracleSession {
    checker: AssertionChecker,
    bindings: Bindings,
    script: Script,
    state: SessionState,
    violations: Vec<Expr>,
}

impl OracleSession {
    pub fn new(bindings: Bindings) -> Self {
        Self {
            checker: AssertionChecker::default(),
            bindings,
            script: Script::new(),
            state: SessionState::Created,
            violations: Vec::new(),
        }
    }

    pub fn with_checker(mut self, checker: AssertionChecker) -> Self {
        self.checker = checker;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Every statement received, header included.
    pub fn script(&self) -> &Script {
        &self.script
    }

    /// Assertions that failed during the last `solve`.
    pub fn violations(&self) -> &[Expr] {
        &self.violations
    }
}

impl SolverSession for OracleSession {
    fn open(&mut self) -> Result<(), SolverError> {
        require_state(self.state, SessionState::Created, "open")?;
        self.script.push(qfnra::logic_header());
        self.state = SessionState::Opened;
        Ok(())
    }

    fn write(&mut self, line: &str) -> Result<(), SolverError> {
        require_state(self.state, SessionState::Opened, "write to")?;
        self.script.push(parse_expr(line)?);
        Ok(())
    }

    fn solve(&mut self) -> Result<IntervalResult, SolverError> {
        require_state(self.state, SessionState::Opened, "solve")?;
        self.state = SessionState::Solved;

        let report = self.checker.check_all(self.script.exprs(), &self.bindings)?;
        tracing::debug!(
            holds = report.holds,
            skipped = report.skipped,
            violated = report.violated.len(),
            "oracle checked assertions"
        );
        if !report.all_hold() {
            self.violations = report.violated;
            return Ok(IntervalResult::unsatisfiable());
        }

        let mut intervals = BTreeMap::new();
        for symbol in self.script.declared_symbols() {
            if let Some(interval) = self
                .bindings
                .get(symbol.as_str())
                .and_then(|v| Interval::point(*v))
            {
                intervals.insert(symbol.clone(), interval);
            }
        }
        Ok(IntervalResult::satisfiable(intervals))
    }

    fn close(&mut self) {
        self.state = SessionState::Closed;
    }
}
