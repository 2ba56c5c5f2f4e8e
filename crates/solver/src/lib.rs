//! # microflow-solver
//!
//! Interface to the dReal nonlinear arithmetic solver.
//!
//! dReal runs as a child process. Statements are written to its stdin one per
//! line and the interval answer is read back from its merged stdout/stderr.
//!
//! ## Usage
//!
//! ```no_run
//! use microflow_solver::{DRealSession, SessionGuard, SolverConfig, SolverSession};
//!
//! let config = SolverConfig::default().resolved().unwrap();
//! let mut session = DRealSession::new(config);
//! let mut guard = SessionGuard::new(&mut session);
//! guard.open().unwrap();
//! guard.write("(declare-fun x () Real)").unwrap();
//! guard.write("(assert (> x 1.0))").unwrap();
//! let result = guard.solve().unwrap();
//!
//! if let Some(x) = result.get("x") {
//!     println!("x in {x}, representative {}", x.midpoint());
//! }
//! ```

pub mod config;
pub mod error;
pub mod oracle;
mod parser;
pub mod result;
pub mod session;

pub use config::SolverConfig;
pub use error::SolverError;
pub use oracle::OracleSession;
pub use parser::{parse_interval_line, parse_response};
pub use result::{Interval, IntervalResult};
pub use session::{DRealSession, SessionGuard, SessionState, SolverSession};
