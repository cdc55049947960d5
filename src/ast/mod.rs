//! Typed name tree for parsed scientific names.
//!
//! The parser lifts the raw grammar output into these types; callers pattern
//! match on [`Name`] to inspect the structure of a parsed name. The tree is
//! strictly downward, every node is owned by its parent, and all of it lives
//! only for the duration of one parse call.

use serde::Serialize;

use crate::strutil;

// ============================================================================
// WORDS AND POSITIONS
// ============================================================================

/// Semantic role of a lexical fragment within the name string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WordType {
    Genus,
    SubGenus,
    SpEpithet,
    InfraSpEpithet,
    Uninomial,
    Rank,
    RankUni,
    HybridChar,
    Comparison,
    Approximation,
    AuthorWord,
    AuthorWordFilius,
    Year,
    YearApproximate,
}

/// Location of a word: rune offsets into the parsed buffer, start inclusive,
/// end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pos {
    #[serde(rename = "type")]
    pub word_type: WordType,
    pub start: usize,
    pub end: usize,
}

/// A lexical fragment: the exact substring, its canonicalised form, and where
/// it was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub value: String,
    pub norm_value: String,
    pub pos: Pos,
}

impl Word {
    pub fn new(value: &str, word_type: WordType, start: usize, end: usize) -> Self {
        Word {
            value: value.to_string(),
            norm_value: value.to_string(),
            pos: Pos {
                word_type,
                start,
                end,
            },
        }
    }
}

// ============================================================================
// THE NAME SUM
// ============================================================================

/// A parsed scientific name. Exactly one variant per name; consumers match on
/// the tag rather than downcast.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Name {
    Uninomial(UninomialNode),
    UninomialCombo(UninomialComboNode),
    Species(SpeciesNode),
    NamedGenusHybrid(NamedGenusHybridNode),
    NamedSpeciesHybrid(NamedSpeciesHybridNode),
    HybridFormula(HybridFormulaNode),
}

/// A single-word name, genus level or higher.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UninomialNode {
    pub word: Word,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorship: Option<Authorship>,
}

/// Two uninomials joined by an infrageneric rank, e.g. `Carex sect. Vignea`.
/// The rank word is absent for the parenthesised form `Aus (Bus)`, where the
/// marker defaults to `subgen.`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UninomialComboNode {
    pub uninomial1: UninomialNode,
    pub uninomial2: UninomialNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<Word>,
}

impl UninomialComboNode {
    /// Normalised rank marker, defaulting to `subgen.` when the rank token
    /// was absent from the input.
    pub fn rank_marker(&self) -> &str {
        self.rank.as_ref().map_or("subgen.", |r| &r.norm_value)
    }
}

/// A binomial or trinomial species name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesNode {
    pub genus: Word,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_genus: Option<Word>,
    pub sp_epithet: SpEpithet,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub infra_species: Vec<InfraspEpithet>,
}

/// The species epithet with its optional authorship.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpEpithet {
    pub word: Word,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorship: Option<Authorship>,
}

/// An infraspecific epithet, optionally preceded by a rank marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfraspEpithet {
    pub word: Word,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<Word>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorship: Option<Authorship>,
}

/// A hybrid taxon named at genus level: `× Agropogon littoralis`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedGenusHybridNode {
    pub hybrid_char: Word,
    pub name: Box<Name>,
}

/// A hybrid taxon named at species level: `Quercus × robur`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedSpeciesHybridNode {
    pub genus: Word,
    pub hybrid_char: Word,
    pub sp_epithet: SpEpithet,
}

/// Two or more taxa joined by hybrid signs: `Aus bus × Aus cus`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HybridFormulaNode {
    pub first_name: Box<Name>,
    pub hybrid_elements: Vec<HybridElement>,
}

/// One `× <name>` part of a hybrid formula. `species` is `None` when the
/// formula trails off after the hybrid sign.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HybridElement {
    pub hybrid_char: Word,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub species: Option<Box<Name>>,
}

// ============================================================================
// AUTHORSHIP
// ============================================================================

/// The naming authority of an epithet: the original (possibly parenthesised
/// basionym) group and an optional combination group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Authorship {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_authors: Option<AuthorsGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combination_authors: Option<AuthorsGroup>,
}

/// One or two author teams; the second team is introduced by `ex` or
/// `emend.`. `parens` is set when the group was parenthesised (basionym).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorsGroup {
    pub team1: AuthorsTeam,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team2_type: Option<Word>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team2: Option<AuthorsTeam>,
    pub parens: bool,
}

/// An ordered list of authors with any years attached to the team.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorsTeam {
    pub authors: Vec<Author>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub years: Vec<Year>,
}

/// A single author: the words as matched plus the space-joined normalised
/// value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub value: String,
    pub words: Vec<Word>,
}

impl Author {
    /// Builds an author from its words, joining normalised values with a
    /// single space.
    pub fn from_words(words: Vec<Word>) -> Self {
        let mut value = String::new();
        for w in &words {
            value = strutil::join_strings(&value, &w.norm_value, " ");
        }
        Author { value, words }
    }
}

/// A publication year. `approximate` is set for parenthesised years, years
/// with a question mark, and years in square brackets.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Year {
    pub word: Word,
    pub approximate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_end: Option<String>,
}

// ============================================================================
// TRAVERSAL HELPERS
// ============================================================================

impl Name {
    /// Every positioned word in the tree, in document order.
    pub fn words(&self) -> Vec<&Word> {
        let mut out = Vec::new();
        self.collect_words(&mut out);
        out
    }

    fn collect_words<'a>(&'a self, out: &mut Vec<&'a Word>) {
        match self {
            Name::Uninomial(u) => {
                out.push(&u.word);
                collect_authorship_words(&u.authorship, out);
            }
            Name::UninomialCombo(c) => {
                out.push(&c.uninomial1.word);
                collect_authorship_words(&c.uninomial1.authorship, out);
                if let Some(rank) = &c.rank {
                    out.push(rank);
                }
                out.push(&c.uninomial2.word);
                collect_authorship_words(&c.uninomial2.authorship, out);
            }
            Name::Species(sp) => {
                out.push(&sp.genus);
                if let Some(sub) = &sp.sub_genus {
                    out.push(sub);
                }
                out.push(&sp.sp_epithet.word);
                collect_authorship_words(&sp.sp_epithet.authorship, out);
                for infra in &sp.infra_species {
                    if let Some(rank) = &infra.rank {
                        out.push(rank);
                    }
                    out.push(&infra.word);
                    collect_authorship_words(&infra.authorship, out);
                }
            }
            Name::NamedGenusHybrid(h) => {
                out.push(&h.hybrid_char);
                h.name.collect_words(out);
            }
            Name::NamedSpeciesHybrid(h) => {
                out.push(&h.genus);
                out.push(&h.hybrid_char);
                out.push(&h.sp_epithet.word);
                collect_authorship_words(&h.sp_epithet.authorship, out);
            }
            Name::HybridFormula(f) => {
                f.first_name.collect_words(out);
                for element in &f.hybrid_elements {
                    out.push(&element.hybrid_char);
                    if let Some(species) = &element.species {
                        species.collect_words(out);
                    }
                }
            }
        }
    }

    /// Authorship of the terminal epithet: the last infraspecific epithet
    /// carrying one, else the species epithet's, else the uninomial's.
    pub fn terminal_authorship(&self) -> Option<&Authorship> {
        match self {
            Name::Uninomial(u) => u.authorship.as_ref(),
            Name::UninomialCombo(c) => c.uninomial2.authorship.as_ref(),
            Name::Species(sp) => sp
                .infra_species
                .iter()
                .rev()
                .find_map(|inf| inf.authorship.as_ref())
                .or(sp.sp_epithet.authorship.as_ref()),
            Name::NamedGenusHybrid(h) => h.name.terminal_authorship(),
            Name::NamedSpeciesHybrid(h) => h.sp_epithet.authorship.as_ref(),
            Name::HybridFormula(f) => f.first_name.terminal_authorship(),
        }
    }
}

fn collect_authorship_words<'a>(authorship: &'a Option<Authorship>, out: &mut Vec<&'a Word>) {
    let Some(authorship) = authorship else {
        return;
    };
    let mut groups = Vec::new();
    groups.extend(authorship.original_authors.as_ref());
    groups.extend(authorship.combination_authors.as_ref());
    fn team_words<'a>(team: &'a AuthorsTeam, out: &mut Vec<&'a Word>) {
        for author in &team.authors {
            out.extend(author.words.iter());
        }
        for year in &team.years {
            out.push(&year.word);
        }
    }
    for group in groups {
        team_words(&group.team1, out);
        if let Some(team2_type) = &group.team2_type {
            out.push(team2_type);
        }
        if let Some(team2) = &group.team2 {
            team_words(team2, out);
        }
    }
}

impl Authorship {
    /// First year anywhere in the authorship, original authors preferred.
    pub fn first_year(&self) -> Option<&Year> {
        fn from_group(g: &AuthorsGroup) -> Option<&Year> {
            g.team1
                .years
                .first()
                .or_else(|| g.team2.as_ref().and_then(|t| t.years.first()))
        }
        self.original_authors
            .as_ref()
            .and_then(from_group)
            .or_else(|| self.combination_authors.as_ref().and_then(from_group))
    }
}
