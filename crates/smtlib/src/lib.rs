//! SMT-LIB2 expression model for QF_NRA constraint scripts.
//!
//! Provides:
//! - [`term`]: validated symbols, numerals, decimals and the [`Expr`] tree
//! - [`formatter`]: `Display` impls producing SMT-LIB2 text
//! - [`reader`]: parsing SMT-LIB2 text back into expressions
//! - [`qfnra`]: builders for arithmetic, relations and statements
//! - [`eval`]: numeric evaluation against variable bindings
//! - [`checker`]: an assertion oracle over evaluated statements
//! - [`script`]: ordered statement lists with declaration de-duplication

pub mod checker;
pub mod error;
pub mod eval;
pub mod formatter;
pub mod qfnra;
pub mod reader;
pub mod script;
pub mod term;

pub use checker::{AssertionChecker, CheckReport, Verdict};
pub use error::ExprError;
pub use eval::{Bindings, Relation, evaluate};
pub use reader::{parse_expr, parse_exprs};
pub use script::Script;
pub use term::{Decimal, Expr, Numeral, Symbol};
