use std::fmt;
use std::io::{self, BufReader, PipeReader, Read, Write};
use std::ops::{Deref, DerefMut};
use std::process::{Child, ChildStdin, Command, Stdio};

use microflow_smtlib::qfnra;

use crate::config::SolverConfig;
use crate::error::SolverError;
use crate::parser::parse_response;
use crate::result::IntervalResult;

/// The open/write/solve/close contract of an arithmetic decision procedure.
///
/// Implemented by [`DRealSession`] for the real subprocess and by
/// [`OracleSession`](crate::oracle::OracleSession) for tests.
pub trait SolverSession {
    /// Start the solver and send the logic header.
    fn open(&mut self) -> Result<(), SolverError>;

    /// Send one raw statement line.
    fn write(&mut self, line: &str) -> Result<(), SolverError>;

    /// Request a result and read it back.
    fn solve(&mut self) -> Result<IntervalResult, SolverError>;

    /// Release all resources. Idempotent.
    fn close(&mut self);
}

/// Closes the wrapped session when dropped.
pub struct SessionGuard<'a, S: SolverSession + ?Sized> {
    session: &'a mut S,
}

impl<'a, S: SolverSession + ?Sized> SessionGuard<'a, S> {
    pub fn new(session: &'a mut S) -> Self {
        Self { session }
    }
}

impl<S: SolverSession + ?Sized> Deref for SessionGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.session
    }
}

impl<S: SolverSession + ?Sized> DerefMut for SessionGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.session
    }
}

impl<S: SolverSession + ?Sized> Drop for SessionGuard<'_, S> {
    fn drop(&mut self) {
        self.session.close();
    }
}

/// Lifecycle of a solver session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Opened,
    Solved,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Created => write!(f, "created"),
            SessionState::Opened => write!(f, "opened"),
            SessionState::Solved => write!(f, "solved"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}

/// Check that `state` is `expected` before running `operation`.
pub(crate) fn require_state(
    state: SessionState,
    expected: SessionState,
    operation: &str,
) -> Result<(), SolverError> {
    if state == expected {
        Ok(())
    } else {
        Err(SolverError::InvalidState(format!(
            "cannot {operation} session in state {state}"
        )))
    }
}

/// dReal running as a child process.
///
/// Statements go to the child's stdin one per line. Its stdout and stderr
/// share one pipe so diagnostics surface through the response parser.
///
/// A solver that stops reading early, typically after rejecting a statement,
/// has its output parsed at the point the pipe breaks. Its diagnostic comes
/// back as `SolverReported`; a complete answer is kept for `solve` and the
/// remaining input is discarded.
#[derive(Debug)]
pub struct DRealSession {
    config: SolverConfig,
    state: SessionState,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    output: Option<BufReader<PipeReader>>,
    answer: Option<IntervalResult>,
    lines_written: usize,
}

impl DRealSession {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            state: SessionState::Created,
            child: None,
            stdin: None,
            output: None,
            answer: None,
            lines_written: 0,
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Lines sent so far, including the header and trailer.
    pub fn lines_written(&self) -> usize {
        self.lines_written
    }

    fn send(&mut self, line: &str) -> Result<(), SolverError> {
        if self.answer.is_some() {
            tracing::trace!(line, "solver already answered, input dropped");
            return Ok(());
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| SolverError::ProcessError("solver stdin is closed".to_string()))?;
        if let Err(e) = writeln!(stdin, "{line}") {
            return self.input_failed(e, "write to");
        }
        self.lines_written += 1;
        tracing::trace!(line, "solver input");
        Ok(())
    }

    /// Handle a failed write or flush on the solver's stdin.
    ///
    /// On a broken pipe whatever the solver printed before exiting is parsed:
    /// its fault is returned, a complete answer is stored. Without output, or
    /// for any other I/O error, the failure is a `ProcessError`.
    fn input_failed(&mut self, error: io::Error, action: &str) -> Result<(), SolverError> {
        let failure =
            || SolverError::ProcessError(format!("Failed to {action} solver stdin: {error}"));
        if error.kind() != io::ErrorKind::BrokenPipe {
            return Err(failure());
        }
        self.stdin = None;
        let mut text = String::new();
        if let Some(output) = self.output.as_mut() {
            output.read_to_string(&mut text).map_err(|e| {
                SolverError::ProcessError(format!("Failed to read solver output: {e}"))
            })?;
        }
        if text.trim().is_empty() {
            return Err(failure());
        }
        tracing::debug!(lines = self.lines_written, "solver closed its input early");
        self.answer = Some(parse_response(text.as_bytes())?);
        Ok(())
    }
}

impl SolverSession for DRealSession {
    fn open(&mut self) -> Result<(), SolverError> {
        require_state(self.state, SessionState::Created, "open")?;
        if self.config.executable().is_none() {
            self.config = self.config.resolved()?;
        }
        let program = self.config.locate()?;

        let (reader, writer) = std::io::pipe()
            .map_err(|e| SolverError::ProcessError(format!("Failed to create pipe: {e}")))?;
        let writer_clone = writer
            .try_clone()
            .map_err(|e| SolverError::ProcessError(format!("Failed to clone pipe: {e}")))?;

        let mut command = Command::new(&program);
        command
            .args(self.config.args())
            .stdin(Stdio::piped())
            .stdout(writer_clone)
            .stderr(writer);
        let mut child = command.spawn().map_err(|e| {
            SolverError::ProcessError(format!("Failed to start {}: {e}", program.display()))
        })?;
        // The command holds the parent's write ends; release them so EOF arrives.
        drop(command);

        tracing::debug!(path = %program.display(), pid = child.id(), "spawned solver");
        self.stdin = child.stdin.take();
        self.child = Some(child);
        self.output = Some(BufReader::new(reader));
        self.state = SessionState::Opened;

        self.send(&qfnra::logic_header().to_string())
    }

    fn write(&mut self, line: &str) -> Result<(), SolverError> {
        require_state(self.state, SessionState::Opened, "write to")?;
        self.send(line)
    }

    fn solve(&mut self) -> Result<IntervalResult, SolverError> {
        require_state(self.state, SessionState::Opened, "solve")?;
        self.state = SessionState::Solved;

        self.send(&qfnra::check_sat().to_string())?;
        self.send(&qfnra::exit().to_string())?;
        if let Some(mut stdin) = self.stdin.take()
            && let Err(e) = stdin.flush()
        {
            self.input_failed(e, "flush")?;
        }
        tracing::debug!(lines = self.lines_written, "solver input complete");

        let result = match self.answer.take() {
            Some(result) => result,
            None => {
                let output = self.output.as_mut().ok_or_else(|| {
                    SolverError::ProcessError("solver output is closed".to_string())
                })?;
                parse_response(output)?
            }
        };
        tracing::info!(
            satisfiable = result.is_satisfiable(),
            intervals = result.len(),
            "solver finished"
        );
        Ok(result)
    }

    fn close(&mut self) {
        self.stdin = None;
        if let Some(mut child) = self.child.take() {
            match child.try_wait() {
                Ok(Some(status)) => tracing::debug!(%status, "solver exited"),
                Ok(None) => {
                    tracing::warn!(pid = child.id(), "killing running solver");
                    if let Err(e) = child.kill() {
                        tracing::warn!(error = %e, "failed to kill solver");
                    }
                    if let Err(e) = child.wait() {
                        tracing::warn!(error = %e, "failed to reap solver");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "failed to query solver status"),
            }
        }
        self.output = None;
        self.answer = None;
        self.state = SessionState::Closed;
    }
}

impl Drop for DRealSession {
    fn drop(&mut self) {
        self.close();
    }
}
