//! Parses biological scientific names into a structured, canonicalised
//! representation.
//!
//! The pipeline: the preprocessor normalises the verbatim string and filters
//! out unparseable shapes; the pest grammar recognises the name; the lifter
//! emits a typed [`ast::Name`] tree while collecting warnings; the
//! canonicaliser derives the matching forms and the stable verbatim id. One
//! call to [`parse`] does all of it and always returns a [`ParsedName`].
//!
//! ```
//! use sciname::{parse, ParseOptions};
//!
//! let result = parse("Homo sapiens Linnaeus 1753", &ParseOptions::default());
//! assert!(result.parsed);
//! assert_eq!(result.canonical_name.unwrap().full, "Homo sapiens");
//! ```

pub use crate::engine::{parse, parse_stream, ParseOptions};
pub use crate::output::{Annotation, Format, ParsedName};
pub use crate::warnings::{QualityWarning, Warning};

pub mod ast;
pub mod canonical;
pub mod cli;
pub mod engine;
pub mod output;
pub mod preprocess;
pub mod strutil;
pub mod syntax;
pub mod warnings;
