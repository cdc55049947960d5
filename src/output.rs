//! The record surfaced to callers and its serialised forms.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::ast::{Authorship, AuthorsGroup, AuthorsTeam, Name};
use crate::canonical::Canonical;
use crate::preprocess::NoParseReason;
use crate::strutil;
use crate::warnings::QualityWarning;

/// Kind-of-name marker derived from the parse; serialises as its display
/// string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Annotation {
    #[serde(rename = "")]
    None,
    #[serde(rename = "Comparison")]
    Comparison,
    #[serde(rename = "Approx. surrogate")]
    ApproxSurrogate,
    #[serde(rename = "Surrogate")]
    Surrogate,
    #[serde(rename = "Named hybrid")]
    NamedHybrid,
    #[serde(rename = "Hybrid formula")]
    HybridFormula,
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Annotation::None => "",
            Annotation::Comparison => "Comparison",
            Annotation::ApproxSurrogate => "Approx. surrogate",
            Annotation::Surrogate => "Surrogate",
            Annotation::NamedHybrid => "Named hybrid",
            Annotation::HybridFormula => "Hybrid formula",
        };
        f.write_str(s)
    }
}

/// Output format selected by the caller; consumed by the presentation layer
/// only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Compact,
    Pretty,
    Simple,
}

impl Format {
    pub fn all() -> &'static [&'static str] {
        &["csv", "compact", "pretty", "simple"]
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(Format::Csv),
            "compact" => Ok(Format::Compact),
            "pretty" => Ok(Format::Pretty),
            "simple" => Ok(Format::Simple),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Format::Csv => "csv",
            Format::Compact => "compact",
            Format::Pretty => "pretty",
            Format::Simple => "simple",
        };
        f.write_str(s)
    }
}

/// Everything the parser knows about one input string.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedName {
    pub verbatim: String,
    pub verbatim_id: String,
    pub parsed: bool,
    pub quality: u8,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<QualityWarning>,
    pub cardinality: i64,
    pub annotation: Annotation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_name: Option<Canonical>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Name>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_parse_reason: Option<NoParseReason>,
}

impl ParsedName {
    /// Compact or pretty JSON rendering of the whole record.
    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }

    /// The stable CSV header, matching [`ParsedName::to_csv`] column order.
    pub fn csv_header() -> &'static str {
        "Id,Verbatim,Cardinality,CanonicalStem,CanonicalSimple,CanonicalFull,Authorship,Year,Quality"
    }

    /// One CSV row per parse.
    pub fn to_csv(&self) -> String {
        self.fields()
            .into_iter()
            .map(|f| csv_field(&f))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// The CSV columns joined by a pipe, no header, no quoting; pipes never
    /// occur in the fields.
    pub fn to_simple(&self) -> String {
        self.fields().join("|")
    }

    fn fields(&self) -> Vec<String> {
        let canonical = self.canonical_name.as_ref();
        let authorship = self
            .details
            .as_ref()
            .and_then(|name| name.terminal_authorship());
        vec![
            self.verbatim_id.clone(),
            self.verbatim.clone(),
            self.cardinality.to_string(),
            canonical.map_or(String::new(), |c| c.stemmed.clone()),
            canonical.map_or(String::new(), |c| c.simple.clone()),
            canonical.map_or(String::new(), |c| c.full.clone()),
            authorship.map_or(String::new(), authorship_string),
            authorship
                .and_then(|a| a.first_year())
                .map_or(String::new(), |y| y.word.value.clone()),
            self.quality.to_string(),
        ]
    }
}

fn csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Renders an authorship the way it appears in flat outputs, e.g.
/// `(Linnaeus 1758) Smith`.
pub fn authorship_string(authorship: &Authorship) -> String {
    let mut out = String::new();
    if let Some(original) = &authorship.original_authors {
        let inner = group_string(original);
        if original.parens {
            out = format!("({})", inner);
        } else {
            out = inner;
        }
    }
    if let Some(combination) = &authorship.combination_authors {
        out = strutil::join_strings(&out, &group_string(combination), " ");
    }
    out
}

fn group_string(group: &AuthorsGroup) -> String {
    let mut out = team_string(&group.team1);
    if let (Some(team2_type), Some(team2)) = (&group.team2_type, &group.team2) {
        out = strutil::join_strings(&out, &team2_type.norm_value, " ");
        out = strutil::join_strings(&out, &team_string(team2), " ");
    }
    out
}

fn team_string(team: &AuthorsTeam) -> String {
    let mut out = String::new();
    let count = team.authors.len();
    for (i, author) in team.authors.iter().enumerate() {
        if i == 0 {
            out.push_str(&author.value);
        } else if i + 1 == count {
            out.push_str(" & ");
            out.push_str(&author.value);
        } else {
            out.push_str(", ");
            out.push_str(&author.value);
        }
    }
    for year in &team.years {
        out = strutil::join_strings(&out, &year.word.value, " ");
    }
    out
}
