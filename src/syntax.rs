//! Grammar-driven first stage: source text to a flat concrete syntax tree.

pub mod cst;
pub mod cst_builder;
pub mod grammar;
mod markup;
pub mod named_tags;

pub use cst::ConcreteNode;
pub use cst_builder::{build_cst, CstBuilder, Entry};
