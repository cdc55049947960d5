//! Grammar recogniser and semantic lifter.
//!
//! The pest-generated parser recognises the name against `grammar.pest`; the
//! lifter walks the resulting pair tree and emits the typed [`Name`] nodes,
//! collecting warnings and normalising values as it goes. Rather than
//! reassembling a flat token stream, the lifter consumes the tree the
//! recogniser already built; the observable output is the same.

use std::collections::BTreeSet;

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::ast::{
    Author, Authorship, AuthorsGroup, AuthorsTeam, HybridElement, HybridFormulaNode,
    InfraspEpithet, Name, NamedGenusHybridNode, NamedSpeciesHybridNode, SpEpithet, SpeciesNode,
    UninomialComboNode, UninomialNode, Word, WordType, Year,
};
use crate::output::Annotation;
use crate::strutil;
use crate::warnings::Warning;

#[derive(Parser)]
#[grammar = "syntax/grammar.pest"]
struct SciNameParser;

/// Grammar failure, opaque to callers; the engine converts it into an
/// unparsed result.
pub type GrammarError = Box<pest::error::Error<Rule>>;

/// The lifted result of one successful grammar run.
#[derive(Debug, Clone)]
pub struct LiftedName {
    pub name: Option<Name>,
    pub annotation: Annotation,
    pub tail: String,
    pub warnings: BTreeSet<Warning>,
}

/// Recognises and lifts one preprocessed buffer.
pub fn parse_name(buffer: &str) -> Result<LiftedName, GrammarError> {
    let mut pairs = SciNameParser::parse(Rule::SciName, buffer).map_err(Box::new)?;
    let sci_name = pairs.next().unwrap(); // the grammar guarantees one SciName pair

    let mut lifter = Lifter::new(buffer);
    let mut name = None;
    let mut tail = String::new();
    for child in sci_name.into_inner() {
        match child.as_rule() {
            Rule::Name => name = Some(lifter.new_name(child)),
            Rule::Tail => tail = lifter.tail_value(child),
            _ => {}
        }
    }

    Ok(LiftedName {
        name,
        annotation: lifter.annotation,
        tail,
        warnings: lifter.warnings,
    })
}

// ============================================================================
// LIFTER
// ============================================================================

struct Lifter {
    char_starts: Vec<usize>,
    warnings: BTreeSet<Warning>,
    annotation: Annotation,
}

impl Lifter {
    fn new(buffer: &str) -> Self {
        let mut char_starts: Vec<usize> = buffer.char_indices().map(|(b, _)| b).collect();
        char_starts.push(buffer.len());
        Lifter {
            char_starts,
            warnings: BTreeSet::new(),
            annotation: Annotation::None,
        }
    }

    fn add_warn(&mut self, w: Warning) {
        self.warnings.insert(w);
    }

    /// Byte offset to rune offset. Pair spans always sit on char boundaries.
    fn char_offset(&self, byte: usize) -> usize {
        match self.char_starts.binary_search(&byte) {
            Ok(i) => i,
            Err(i) => i,
        }
    }

    fn new_word(&mut self, pair: &Pair<Rule>, word_type: WordType) -> Word {
        let span = pair.as_span();
        let mut word = Word::new(
            pair.as_str(),
            word_type,
            self.char_offset(span.start()),
            self.char_offset(span.end()),
        );
        if descendant_matches(pair, &[Rule::UpperCharExtended, Rule::LowerCharExtended]) {
            self.add_warn(Warning::CharBad);
            // A fold miss keeps the verbatim value as the normalised one.
            if let Ok(folded) = strutil::to_ascii(&word.value) {
                word.norm_value = folded;
            }
        }
        word
    }

    fn tail_value(&mut self, pair: Pair<Rule>) -> String {
        let value = pair.as_str();
        if !value.is_empty() {
            self.add_warn(Warning::Tail);
        }
        value.to_string()
    }

    // ------------------------------------------------------------------------
    // name variants
    // ------------------------------------------------------------------------

    fn new_name(&mut self, pair: Pair<Rule>) -> Name {
        let child = pair.into_inner().next().unwrap(); // Name has exactly one child
        match child.as_rule() {
            Rule::HybridFormula => self.new_hybrid_formula(child),
            Rule::NamedGenusHybrid => self.new_named_genus_hybrid(child),
            Rule::NamedSpeciesHybrid => self.new_named_species_hybrid(child),
            _ => self.new_single_name(child),
        }
    }

    fn new_single_name(&mut self, pair: Pair<Rule>) -> Name {
        let child = pair.into_inner().next().unwrap(); // SingleName has exactly one child
        match child.as_rule() {
            Rule::NameSpecies => Name::Species(self.new_species(child)),
            Rule::Uninomial => Name::Uninomial(self.new_uninomial(child)),
            Rule::UninomialCombo => {
                self.add_warn(Warning::UninomialCombo);
                Name::UninomialCombo(self.new_uninomial_combo(child))
            }
            Rule::NameApprox => self.new_name_approx(child),
            Rule::NameComp => self.new_name_comp(child),
            rule => unreachable!("unexpected rule under SingleName: {:?}", rule),
        }
    }

    fn new_name_approx(&mut self, pair: Pair<Rule>) -> Name {
        let mut genus = None;
        let mut epithet = None;
        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::GenusWord => genus = Some(self.genus_word(&child)),
                Rule::SpeciesEpithet => epithet = Some(self.new_sp_epithet(child)),
                _ => {}
            }
        }
        let genus = genus.unwrap(); // the grammar guarantees a genus word
        match epithet {
            Some(sp_epithet) => {
                self.annotation = if sp_epithet.authorship.is_some() {
                    Annotation::ApproxSurrogate
                } else {
                    Annotation::Surrogate
                };
                Name::Species(SpeciesNode {
                    genus,
                    sub_genus: None,
                    sp_epithet,
                    infra_species: Vec::new(),
                })
            }
            None => {
                self.annotation = Annotation::Surrogate;
                let mut word = genus;
                word.pos.word_type = WordType::Uninomial;
                Name::Uninomial(UninomialNode {
                    word,
                    authorship: None,
                })
            }
        }
    }

    fn new_name_comp(&mut self, pair: Pair<Rule>) -> Name {
        self.annotation = Annotation::Comparison;
        let mut genus = None;
        let mut epithet = None;
        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::GenusWord => genus = Some(self.genus_word(&child)),
                Rule::SpeciesEpithet => epithet = Some(self.new_sp_epithet(child)),
                _ => {}
            }
        }
        let genus = genus.unwrap(); // the grammar guarantees a genus word
        match epithet {
            Some(sp_epithet) => Name::Species(SpeciesNode {
                genus,
                sub_genus: None,
                sp_epithet,
                infra_species: Vec::new(),
            }),
            None => {
                let mut word = genus;
                word.pos.word_type = WordType::Uninomial;
                Name::Uninomial(UninomialNode {
                    word,
                    authorship: None,
                })
            }
        }
    }

    // ------------------------------------------------------------------------
    // hybrids
    // ------------------------------------------------------------------------

    fn new_hybrid_formula(&mut self, pair: Pair<Rule>) -> Name {
        self.add_warn(Warning::HybridFormula);
        let mut children = pair.into_inner();
        let first = self.new_single_name(children.next().unwrap());

        let first_genus = match &first {
            Name::Species(sp) => Some(sp.genus.clone()),
            Name::Uninomial(u) => Some(u.word.clone()),
            _ => None,
        };

        let mut elements: Vec<HybridElement> = Vec::new();
        let mut pending: Option<HybridElement> = None;
        for child in children {
            match child.as_rule() {
                Rule::HybridChar => {
                    if let Some(open) = pending.take() {
                        self.add_warn(Warning::HybridFormulaProbIncomplete);
                        elements.push(open);
                    }
                    pending = Some(HybridElement {
                        hybrid_char: self.new_word(&child, WordType::HybridChar),
                        species: None,
                    });
                }
                Rule::SingleName => {
                    let species = self.new_single_name(child);
                    if let Some(mut open) = pending.take() {
                        open.species = Some(Box::new(species));
                        elements.push(open);
                    }
                }
                Rule::SpeciesEpithet => {
                    self.add_warn(Warning::HybridFormulaIncomplete);
                    let sp_epithet = self.new_sp_epithet(child);
                    if let Some(mut open) = pending.take() {
                        open.species = first_genus.clone().map(|mut genus| {
                            genus.pos.word_type = WordType::Genus;
                            Box::new(Name::Species(SpeciesNode {
                                genus,
                                sub_genus: None,
                                sp_epithet,
                                infra_species: Vec::new(),
                            }))
                        });
                        if open.species.is_none() {
                            self.add_warn(Warning::HybridFormulaProbIncomplete);
                        }
                        elements.push(open);
                    }
                }
                _ => {}
            }
        }
        if let Some(open) = pending.take() {
            self.add_warn(Warning::HybridFormulaProbIncomplete);
            elements.push(open);
        }

        let mut formula = HybridFormulaNode {
            first_name: Box::new(first),
            hybrid_elements: elements,
        };
        normalize_abbreviated(&mut formula);
        self.annotation = Annotation::HybridFormula;
        Name::HybridFormula(formula)
    }

    fn new_named_genus_hybrid(&mut self, pair: Pair<Rule>) -> Name {
        self.add_warn(Warning::HybridNamed);
        let mut children = pair.into_inner();
        let hybrid_pair = children.next().unwrap(); // grammar: HybridChar comes first
        let hybrid_char = self.new_word(&hybrid_pair, WordType::HybridChar);

        let name_pair = children.next().unwrap();
        let name_start = self.char_offset(name_pair.as_span().start());
        if name_start == hybrid_char.pos.end {
            self.add_warn(Warning::HybridCharNoSpace);
        }
        let name = match name_pair.as_rule() {
            Rule::NameSpecies => Name::Species(self.new_species(name_pair)),
            _ => Name::Uninomial(self.new_uninomial(name_pair)),
        };
        self.annotation = Annotation::NamedHybrid;
        Name::NamedGenusHybrid(NamedGenusHybridNode {
            hybrid_char,
            name: Box::new(name),
        })
    }

    fn new_named_species_hybrid(&mut self, pair: Pair<Rule>) -> Name {
        let mut genus = None;
        let mut hybrid_char = None;
        let mut sp_epithet = None;
        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::GenusWord => genus = Some(self.new_word(&child, WordType::Genus)),
                Rule::HybridChar => {
                    hybrid_char = Some(self.new_word(&child, WordType::HybridChar))
                }
                Rule::SpeciesEpithet => sp_epithet = Some(self.new_sp_epithet(child)),
                _ => {}
            }
        }
        // The grammar guarantees all three parts.
        let (genus, hybrid_char, sp_epithet) =
            (genus.unwrap(), hybrid_char.unwrap(), sp_epithet.unwrap());

        self.add_warn(Warning::HybridNamed);
        // `Quercus ×robur` is the canonical spelling; only a sign glued to
        // the genus is flagged.
        if genus.pos.end == hybrid_char.pos.start {
            self.add_warn(Warning::HybridCharNoSpace);
        }
        self.annotation = Annotation::NamedHybrid;
        Name::NamedSpeciesHybrid(NamedSpeciesHybridNode {
            genus,
            hybrid_char,
            sp_epithet,
        })
    }

    // ------------------------------------------------------------------------
    // species and uninomials
    // ------------------------------------------------------------------------

    fn genus_word(&mut self, pair: &Pair<Rule>) -> Word {
        let word = self.new_word(pair, WordType::Genus);
        if descendant_matches(pair, &[Rule::AbbrGenus]) {
            self.add_warn(Warning::GenusAbbr);
        }
        word
    }

    fn new_species(&mut self, pair: Pair<Rule>) -> SpeciesNode {
        let mut genus = None;
        let mut sub_genus = None;
        let mut sp_epithet = None;
        let mut infra_species = Vec::new();
        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::GenusWord => genus = Some(self.genus_word(&child)),
                Rule::SubGenus => {
                    let inner = child.into_inner().next().unwrap(); // the word inside parens
                    sub_genus = Some(self.new_word(&inner, WordType::SubGenus));
                }
                Rule::SpeciesEpithet => sp_epithet = Some(self.new_sp_epithet(child)),
                Rule::InfraspGroup => infra_species = self.new_infrasp_group(child),
                _ => {}
            }
        }
        SpeciesNode {
            genus: genus.unwrap(), // the grammar guarantees a genus
            sub_genus,
            sp_epithet: sp_epithet.unwrap(), // and a species epithet
            infra_species,
        }
    }

    fn new_sp_epithet(&mut self, pair: Pair<Rule>) -> SpEpithet {
        let mut word = None;
        let mut authorship = None;
        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::Word => word = Some(self.new_word(&child, WordType::SpEpithet)),
                Rule::Authorship => authorship = Some(self.new_authorship(child)),
                _ => {}
            }
        }
        SpEpithet {
            word: word.unwrap(), // the grammar guarantees the epithet word
            authorship,
        }
    }

    fn new_infrasp_group(&mut self, pair: Pair<Rule>) -> Vec<InfraspEpithet> {
        let epithets: Vec<Pair<Rule>> = pair
            .into_inner()
            .filter(|p| p.as_rule() == Rule::InfraspEpithet)
            .collect();
        epithets
            .into_iter()
            .map(|p| self.new_infrasp_epithet(p))
            .collect()
    }

    fn new_infrasp_epithet(&mut self, pair: Pair<Rule>) -> InfraspEpithet {
        let mut word = None;
        let mut rank = None;
        let mut authorship = None;
        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::Word => word = Some(self.new_word(&child, WordType::InfraSpEpithet)),
                Rule::Rank => rank = Some(self.new_rank(child)),
                Rule::Authorship => authorship = Some(self.new_authorship(child)),
                _ => {}
            }
        }
        InfraspEpithet {
            word: word.unwrap(), // the grammar guarantees the epithet word
            rank,
            authorship,
        }
    }

    fn new_rank(&mut self, pair: Pair<Rule>) -> Word {
        let child = pair.into_inner().next().unwrap(); // Rank has exactly one child
        let rule = child.as_rule();
        let mut word = self.new_word(&child, WordType::Rank);
        match rule {
            Rule::RankForma => word.norm_value = "fm.".to_string(),
            Rule::RankVar => {
                word.norm_value = if word.value.starts_with('n') {
                    "nvar.".to_string()
                } else {
                    "var.".to_string()
                };
            }
            Rule::RankSsp => word.norm_value = "ssp.".to_string(),
            Rule::RankOtherUncommon => self.add_warn(Warning::RankUncommon),
            _ => {}
        }
        word
    }

    fn new_uninomial(&mut self, pair: Pair<Rule>) -> UninomialNode {
        let mut word = None;
        let mut authorship = None;
        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::UninomialWord => word = Some(self.new_word(&child, WordType::Uninomial)),
                Rule::Authorship => authorship = Some(self.new_authorship(child)),
                _ => {}
            }
        }
        UninomialNode {
            word: word.unwrap(), // the grammar guarantees the uninomial word
            authorship,
        }
    }

    fn new_uninomial_combo(&mut self, pair: Pair<Rule>) -> UninomialComboNode {
        let children: Vec<Pair<Rule>> = pair.into_inner().collect();
        match children[0].as_rule() {
            Rule::Uninomial => {
                // Explicit rank form: `Carex sect. Vignea`.
                let uninomial1 = self.new_uninomial(children[0].clone());
                let rank = self.new_word(&children[1], WordType::RankUni);
                let uninomial2 = self.new_uninomial(children[2].clone());
                UninomialComboNode {
                    uninomial1,
                    uninomial2,
                    rank: Some(rank),
                }
            }
            _ => {
                // Parenthesised form: `Aus (Bus)`; the rank marker defaults
                // to `subgen.`.
                let word1 = self.new_word(&children[0], WordType::Uninomial);
                let word2 = self.new_word(&children[1], WordType::Uninomial);
                let authorship = children
                    .get(2)
                    .filter(|p| p.as_rule() == Rule::Authorship)
                    .cloned()
                    .map(|p| self.new_authorship(p));
                UninomialComboNode {
                    uninomial1: UninomialNode {
                        word: word1,
                        authorship: None,
                    },
                    uninomial2: UninomialNode {
                        word: word2,
                        authorship,
                    },
                    rank: None,
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // authorship
    // ------------------------------------------------------------------------

    fn new_authorship(&mut self, pair: Pair<Rule>) -> Authorship {
        let mut original_authors = None;
        let mut combination_authors = None;
        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::OriginalAuthorship => {
                    original_authors = Some(self.new_original_authorship(child))
                }
                Rule::CombinationAuthorship => {
                    let inner = child.into_inner().next().unwrap(); // always an AuthorsGroup
                    combination_authors = Some(self.new_authors_group(inner));
                }
                _ => {}
            }
        }
        Authorship {
            original_authors,
            combination_authors,
        }
    }

    fn new_original_authorship(&mut self, pair: Pair<Rule>) -> AuthorsGroup {
        let child = pair.into_inner().next().unwrap(); // one alternative matched
        match child.as_rule() {
            Rule::BasionymAuthorshipYearMisformed => {
                self.add_warn(Warning::AuthMisformedYear);
                let mut group = None;
                let mut year = None;
                for inner in child.into_inner() {
                    match inner.as_rule() {
                        Rule::AuthorsGroup => group = Some(self.new_authors_group(inner)),
                        Rule::Year => year = Some(self.new_year(inner)),
                        _ => {}
                    }
                }
                let mut group = group.unwrap(); // the grammar guarantees the group
                group.parens = true;
                if let Some(year) = year {
                    group.team1.years.push(year);
                }
                group
            }
            Rule::BasionymAuthorship => {
                let inner = child.into_inner().next().unwrap(); // the AuthorsGroup inside
                let mut group = self.new_authors_group(inner);
                group.parens = true;
                group
            }
            _ => self.new_authors_group(child),
        }
    }

    fn new_authors_group(&mut self, pair: Pair<Rule>) -> AuthorsGroup {
        let mut team1 = None;
        let mut team2_type = None;
        let mut team2 = None;
        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::AuthorsTeam => {
                    if team1.is_none() {
                        team1 = Some(self.new_author_team(child));
                    } else {
                        team2 = Some(self.new_author_team(child));
                    }
                }
                Rule::AuthorEx => {
                    self.add_warn(Warning::AuthEx);
                    let mut word = self.new_word(&child, WordType::AuthorWord);
                    word.norm_value = "ex".to_string();
                    team2_type = Some(word);
                }
                Rule::AuthorEmend => {
                    let mut word = self.new_word(&child, WordType::AuthorWord);
                    word.norm_value = "emend.".to_string();
                    team2_type = Some(word);
                }
                _ => {}
            }
        }
        // A separator word without its team is dropped, and vice versa.
        if team2_type.is_none() {
            team2 = None;
        }
        if team2.is_none() {
            team2_type = None;
        }
        AuthorsGroup {
            team1: team1.unwrap(), // the grammar guarantees the first team
            team2_type,
            team2,
            parens: false,
        }
    }

    fn new_author_team(&mut self, pair: Pair<Rule>) -> AuthorsTeam {
        let mut authors = Vec::new();
        let mut years = Vec::new();
        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::Author => authors.push(self.new_author(child)),
                Rule::Year => years.push(self.new_year(child)),
                _ => {}
            }
        }
        AuthorsTeam { authors, years }
    }

    fn new_author(&mut self, pair: Pair<Rule>) -> Author {
        let mut words = Vec::new();
        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::Filius => {
                    let mut word = self.new_word(&child, WordType::AuthorWordFilius);
                    word.norm_value = "fil.".to_string();
                    words.push(word);
                }
                Rule::AuthorWord => words.push(self.author_word(child)),
                Rule::UnknownAuthor => words.push(self.new_word(&child, WordType::AuthorWord)),
                _ => {}
            }
        }
        let author = Author::from_words(words);
        if author.value.chars().count() < 2 {
            self.add_warn(Warning::AuthShort);
        }
        author
    }

    fn author_word(&mut self, pair: Pair<Rule>) -> Word {
        let mut word = self.new_word(&pair, WordType::AuthorWord);
        if descendant_matches(&pair, &[Rule::AllCapsAuthorWord]) {
            let upper_count = word.value.chars().filter(|c| c.is_uppercase()).count();
            if upper_count > 2 {
                let mut chars = word.norm_value.chars();
                if let Some(first) = chars.next() {
                    let mut folded = first.to_string();
                    folded.extend(chars.flat_map(|c| c.to_lowercase()));
                    word.norm_value = folded;
                }
                self.add_warn(Warning::AuthUpperCase);
            }
        }
        word
    }

    fn new_year(&mut self, pair: Pair<Rule>) -> Year {
        let mut word: Option<Word> = None;
        let mut approximate = false;
        let mut range_end = None;
        for node in flatten(&pair) {
            match node.as_rule() {
                Rule::YearWithParens => {
                    self.add_warn(Warning::YearParens);
                    approximate = true;
                }
                Rule::YearApprox => {
                    self.add_warn(Warning::YearApprox);
                    approximate = true;
                }
                Rule::YearWithChar => {
                    if word.is_none() {
                        let mut w = self.new_word(&node, WordType::Year);
                        // Drop the trailing letter; it is always ASCII.
                        w.value.pop();
                        w.norm_value = w.value.clone();
                        w.pos.end -= 1;
                        word = Some(w);
                    }
                }
                Rule::YearRange => {
                    let text = node.as_str();
                    if let Some((_, end)) = text.split_once('-') {
                        range_end = Some(end.to_string());
                    }
                }
                Rule::YearNum => {
                    if word.is_none() {
                        word = Some(self.new_word(&node, WordType::Year));
                    }
                }
                _ => {}
            }
        }
        let mut word = match word {
            Some(w) => w,
            // Fallback: the whole year span is the value.
            None => self.new_word(&pair, WordType::Year),
        };
        if word.value.ends_with('?') {
            self.add_warn(Warning::YearQuestion);
            approximate = true;
        }
        if approximate {
            word.pos.word_type = WordType::YearApproximate;
        }
        Year {
            word,
            approximate,
            range_end,
        }
    }
}

// ============================================================================
// TREE UTILITIES
// ============================================================================

/// The pair itself plus all of its descendants, document order.
fn flatten<'i>(pair: &Pair<'i, Rule>) -> Vec<Pair<'i, Rule>> {
    let mut out = vec![pair.clone()];
    let mut i = 0;
    while i < out.len() {
        let children: Vec<Pair<Rule>> = out[i].clone().into_inner().collect();
        out.extend(children);
        i += 1;
    }
    out
}

fn descendant_matches(pair: &Pair<Rule>, rules: &[Rule]) -> bool {
    flatten(pair).iter().any(|p| rules.contains(&p.as_rule()))
}

/// Rewrites abbreviated genera inside a hybrid formula: when the first name
/// carries a full genus and a later element abbreviates the same genus, the
/// abbreviation's normalised value expands to the full one. The verbatim
/// value stays untouched.
fn normalize_abbreviated(formula: &mut HybridFormulaNode) {
    let full = match formula.first_name.as_ref() {
        Name::Species(sp) => sp.genus.norm_value.clone(),
        _ => return,
    };
    for element in &mut formula.hybrid_elements {
        let species = match element.species.as_deref_mut() {
            Some(s) => s,
            None => continue,
        };
        let sp = match species {
            Name::Species(sp) => sp,
            _ => continue,
        };
        if let Some(stem) = sp.genus.norm_value.strip_suffix('.') {
            if !stem.is_empty() && full.starts_with(stem) {
                sp.genus.norm_value = full.clone();
            }
        }
    }
}
