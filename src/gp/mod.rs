//! Common items related to Genetic Programming.
//!
//! Expressions are nodes with some level of arity - aka the number of inputs.
//!
//! - `expr` holds the generic expression arena along with generation, evaluation, subtree
//!   cloning, grafting and trimming.
//! - `symbolic` provides the arithmetic node set over a single real input used for symbolic
//!   regression.

pub mod expr;
pub mod symbolic;

pub use self::symbolic::{Node, Operator, Terminal, Tree};
