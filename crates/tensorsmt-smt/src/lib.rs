//! Typed SMT-style expression algebra for the tensorsmt backend.
//!
//! This crate provides the symbolic values the encoder emits: an immutable
//! expression tree ([`SmtExpr`]) over a small set of sorts ([`Sort`]), a
//! canonical textual rendering (the serialized artifact payload), and a
//! [`Solver`] that decides semantic equivalence of expressions in the
//! fragment the operator encoders produce.
//!
//! Expressions are pure values: `PartialEq` is structural. The only semantic
//! comparison primitive is [`Solver::check_equivalent`], which holds exactly
//! when the negated equality of the two expressions is unsatisfiable.
//!
//! # Examples
//!
//! ```
//! use tensorsmt_smt::{SmtExpr, Solver};
//!
//! let x = SmtExpr::var("x");
//! let y = SmtExpr::var("y");
//! let a = SmtExpr::add(x.clone(), y.clone()).unwrap();
//! let b = SmtExpr::add(y, x).unwrap();
//!
//! // Structurally different, semantically equal.
//! assert_ne!(a, b);
//! let mut solver = Solver::new();
//! assert!(solver.check_equivalent(&a, &b).unwrap());
//! ```

mod display;
mod error;
mod expr;
pub mod solver;
mod sort;

#[cfg(test)]
mod tests;

pub use error::SmtError;
pub use expr::{BinOp, SmtExpr, UnOp};
pub use solver::{CheckResult, Solver};
pub use sort::{Sort, Value};
