//! Surface syntax of `.qcl` changelog scripts.

pub mod ast;
pub mod grammar;

pub use ast::{Arg, Item, Literal, Node, Script};
pub use grammar::{SyntaxError, parse_script};
