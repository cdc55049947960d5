//! Preparation of the verbatim string before it reaches the grammar.
//!
//! The preprocessor never fails. Shapes that must not be parsed (viruses,
//! BOLD identifiers, empty or too-short strings) are reported through
//! [`NoParseReason`]; everything else is normalised in place: HTML removal,
//! hybrid-sign canonicalisation, whitespace collapsing, and stripping of
//! stray gender or rank markers the grammar does not accept.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::warnings::Warning;

/// Why an input was withheld from the grammar (or failed inside it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NoParseReason {
    Empty,
    Virus,
    Bold,
    TooShort,
    GrammarFail,
}

/// Result of preprocessing: the buffer handed to the grammar, an optional
/// reason to skip parsing, and any warnings raised while normalising.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    pub text: String,
    pub no_parse: Option<NoParseReason>,
    pub warnings: Vec<Warning>,
}

static VIRUS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:virus(?:es)?|viroids?|phages?|ictv|prions?|rna|dna)\b").unwrap()
});

static BOLD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bbold:\S+").unwrap());

static HTML_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</?[a-zA-Z][a-zA-Z0-9]*(?:\s[^<>]*)?/?>").unwrap());

static HTML_ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(?:#[0-9]{1,6}|[a-zA-Z]{2,6});").unwrap());

static HYBRID_X_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(^|\s)[xX](\s|$)").unwrap());

static HYBRID_X_GLUED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|\s)[xX×](\p{Lu})").unwrap());

static MULTI_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S\s{2,}\S").unwrap());

static WHITESPACE_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static GENDER_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[♂♀⚥]\s*|\s*[♂♀⚥]\s*$").unwrap());

static LEADING_RANK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:subsp|ssp|var|subvar|fm|forma)\.?\s+(\p{Lu})").unwrap());

/// Runs the whole preprocessing pipeline over one verbatim string.
pub fn preprocess(verbatim: &str, remove_html: bool) -> Preprocessed {
    let mut warnings = Vec::new();
    let trimmed = verbatim.trim();

    if trimmed.is_empty() {
        return no_parse(NoParseReason::Empty);
    }
    if VIRUS_RE.is_match(trimmed) {
        return no_parse(NoParseReason::Virus);
    }
    if BOLD_RE.is_match(trimmed) {
        return no_parse(NoParseReason::Bold);
    }

    let mut text = trimmed.to_string();

    if remove_html {
        let stripped = strip_html(&text);
        if stripped != text {
            warnings.push(Warning::HtmlTagsEntities);
            text = stripped;
        }
    }

    if MULTI_SPACE_RE.is_match(&text) {
        warnings.push(Warning::SpaceMultiple);
    }
    text = WHITESPACE_RUN_RE.replace_all(&text, " ").trim().to_string();

    text = GENDER_MARKER_RE.replace_all(&text, "").trim().to_string();
    text = LEADING_RANK_RE.replace(&text, "$1").to_string();
    text = normalize_hybrid_char(&text);

    if text.is_empty() {
        return no_parse(NoParseReason::Empty);
    }
    if text.chars().filter(|c| c.is_alphabetic()).count() < 2 {
        return no_parse(NoParseReason::TooShort);
    }

    Preprocessed {
        text,
        no_parse: None,
        warnings,
    }
}

fn no_parse(reason: NoParseReason) -> Preprocessed {
    Preprocessed {
        text: String::new(),
        no_parse: Some(reason),
        warnings: Vec::new(),
    }
}

/// Maps the hybrid sign lookalikes and the spelled `x` to the canonical
/// U+00D7 `×`. Every replacement swaps a single rune for a single rune, so
/// rune offsets stay aligned with the surrounding words.
pub fn normalize_hybrid_char(s: &str) -> String {
    let mut text: String = s
        .chars()
        .map(|c| match c {
            '\u{2715}' | '\u{2717}' | '\u{2A2F}' => '×',
            other => other,
        })
        .collect();
    // Two passes: " x x " leaves the second marker untouched in one pass
    // because the separating space is consumed by the first match.
    for _ in 0..2 {
        let replaced = HYBRID_X_RE.replace_all(&text, "$1×$2");
        if replaced == text {
            break;
        }
        text = replaced.into_owned();
    }
    HYBRID_X_GLUED_RE.replace_all(&text, "$1×$2").into_owned()
}

fn strip_html(s: &str) -> String {
    let without_tags = HTML_TAG_RE.replace_all(s, "");
    HTML_ENTITY_RE
        .replace_all(&without_tags, |caps: &regex::Captures| {
            decode_entity(caps.get(0).unwrap().as_str())
        })
        .into_owned()
}

fn decode_entity(entity: &str) -> String {
    let body = &entity[1..entity.len() - 1];
    if let Some(num) = body.strip_prefix('#') {
        if let Ok(code) = num.parse::<u32>() {
            if let Some(ch) = char::from_u32(code) {
                return ch.to_string();
            }
        }
        return String::new();
    }
    match body {
        "amp" => "&".to_string(),
        "lt" => "<".to_string(),
        "gt" => ">".to_string(),
        "quot" => "\"".to_string(),
        "apos" => "'".to_string(),
        "nbsp" => " ".to_string(),
        "times" => "×".to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_whitespace_do_not_parse() {
        assert_eq!(preprocess("", true).no_parse, Some(NoParseReason::Empty));
        assert_eq!(preprocess("   ", true).no_parse, Some(NoParseReason::Empty));
    }

    #[test]
    fn test_virus_designations_do_not_parse() {
        for s in [
            "Tobacco mosaic virus",
            "Abutilon mosaic viruses",
            "Bemisia viroid",
            "Escherichia phage T4",
            "ICTV classified",
            "satellite RNA",
        ] {
            assert_eq!(preprocess(s, true).no_parse, Some(NoParseReason::Virus), "{}", s);
        }
    }

    #[test]
    fn test_bold_identifiers_do_not_parse() {
        assert_eq!(
            preprocess("BOLD:AAB1234", true).no_parse,
            Some(NoParseReason::Bold)
        );
    }

    #[test]
    fn test_too_short_input_does_not_parse() {
        assert_eq!(preprocess("A", true).no_parse, Some(NoParseReason::TooShort));
    }

    #[test]
    fn test_html_is_stripped_with_warning() {
        let p = preprocess("<i>Homo sapiens</i> L. &amp; Smith", true);
        assert_eq!(p.text, "Homo sapiens L. & Smith");
        assert!(p.warnings.contains(&Warning::HtmlTagsEntities));
    }

    #[test]
    fn test_html_is_kept_without_cleanup() {
        let p = preprocess("<i>Homo sapiens</i>", false);
        assert!(p.text.contains("<i>"));
        assert!(p.warnings.is_empty());
    }

    #[test]
    fn test_multiple_spaces_collapse_with_warning() {
        let p = preprocess("Homo  sapiens", true);
        assert_eq!(p.text, "Homo sapiens");
        assert!(p.warnings.contains(&Warning::SpaceMultiple));
    }

    #[test]
    fn test_spelled_x_becomes_hybrid_sign() {
        assert_eq!(normalize_hybrid_char("Aus bus x Aus cus"), "Aus bus × Aus cus");
        assert_eq!(normalize_hybrid_char("x Abies"), "× Abies");
        assert_eq!(normalize_hybrid_char("Salix ✕alba"), "Salix ×alba");
    }

    #[test]
    fn test_ordinary_words_keep_their_x() {
        assert_eq!(normalize_hybrid_char("Xanthium spinosum"), "Xanthium spinosum");
        assert_eq!(normalize_hybrid_char("Aus maximus"), "Aus maximus");
    }

    #[test]
    fn test_gender_markers_are_stripped() {
        let p = preprocess("Homo sapiens ♂", true);
        assert_eq!(p.text, "Homo sapiens");
    }
}
