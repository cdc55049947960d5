//! The name grammar and its semantic lifter.

pub mod parser;

pub use parser::{parse_name, GrammarError, LiftedName, Rule};
