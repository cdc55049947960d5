//! Core parsing API: one total function per input string, plus a parallel
//! driver over many inputs.

use std::collections::BTreeSet;

use rayon::prelude::*;

use crate::canonical;
use crate::output::{Annotation, Format, ParsedName};
use crate::preprocess::{self, NoParseReason};
use crate::syntax;
use crate::warnings::{sorted_warnings, Warning};

/// Caller-supplied knobs. `format` is consumed by the presentation layer
/// only; `workers_hint` by the batch driver.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub format: Format,
    pub remove_html: bool,
    pub workers_hint: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            format: Format::Csv,
            remove_html: true,
            workers_hint: default_workers(),
        }
    }
}

/// Number of worker threads used when the caller does not ask for a specific
/// count.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Parses one verbatim name string. Total: every input yields a
/// [`ParsedName`], unparseable ones with `parsed = false` and quality 4.
pub fn parse(verbatim: &str, options: &ParseOptions) -> ParsedName {
    let pre = preprocess::preprocess(verbatim, options.remove_html);
    if let Some(reason) = pre.no_parse {
        return unparsed(verbatim, reason);
    }

    let lifted = match syntax::parse_name(&pre.text) {
        Ok(lifted) => lifted,
        Err(_) => return unparsed(verbatim, NoParseReason::GrammarFail),
    };
    let name = match lifted.name {
        Some(name) => name,
        None => return unparsed(verbatim, NoParseReason::GrammarFail),
    };

    let mut warnings: BTreeSet<Warning> = lifted.warnings;
    warnings.extend(pre.warnings);
    let quality = warnings
        .iter()
        .map(|w| w.quality())
        .max()
        .unwrap_or(1)
        .max(1);

    ParsedName {
        verbatim: verbatim.to_string(),
        verbatim_id: canonical::verbatim_id(verbatim).to_string(),
        parsed: true,
        quality,
        warnings: sorted_warnings(warnings),
        cardinality: canonical::cardinality(&name),
        annotation: lifted.annotation,
        canonical_name: Some(canonical::canonical(&name)),
        details: Some(name),
        tail: lifted.tail,
        no_parse_reason: None,
    }
}

fn unparsed(verbatim: &str, reason: NoParseReason) -> ParsedName {
    ParsedName {
        verbatim: verbatim.to_string(),
        verbatim_id: canonical::verbatim_id(verbatim).to_string(),
        parsed: false,
        quality: 4,
        warnings: Vec::new(),
        cardinality: 0,
        annotation: Annotation::None,
        canonical_name: None,
        details: None,
        tail: String::new(),
        no_parse_reason: Some(reason),
    }
}

/// Parses many inputs on `workers` threads. Each parse owns its grammar
/// state and warning set; results come back in input order.
pub fn parse_stream<I, S>(inputs: I, workers: usize, options: &ParseOptions) -> Vec<ParsedName>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str> + Send + Sync,
{
    let inputs: Vec<S> = inputs.into_iter().collect();
    match rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
    {
        Ok(pool) => pool.install(|| {
            inputs
                .par_iter()
                .map(|s| parse(s.as_ref(), options))
                .collect()
        }),
        // Pool creation fails only under resource exhaustion; fall back to
        // one thread.
        Err(_) => inputs.iter().map(|s| parse(s.as_ref(), options)).collect(),
    }
}
