//! Canonical forms and stable identifiers.
//!
//! From the typed name tree this module derives the three canonical
//! spellings used for matching across sources, the cardinality of the name,
//! and the deterministic UUID of the verbatim input.

use once_cell::sync::Lazy;
use serde::Serialize;
use uuid::Uuid;

use crate::ast::Name;

/// Namespace for verbatim identifiers; stable across releases.
static GLOBAL_NAMESPACE: Lazy<Uuid> =
    Lazy::new(|| Uuid::new_v5(&Uuid::NAMESPACE_DNS, b"globalnames.org"));

/// Deterministic identifier of a verbatim input string. Depends on nothing
/// but the input itself.
pub fn verbatim_id(verbatim: &str) -> Uuid {
    Uuid::new_v5(&GLOBAL_NAMESPACE, verbatim.as_bytes())
}

/// The three canonical spellings of a parsed name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Canonical {
    pub stemmed: String,
    pub simple: String,
    pub full: String,
}

/// Builds the canonical forms for a lifted name.
///
/// `full` keeps rank markers; `simple` is `full` with rank tokens removed;
/// `stemmed` is `simple` with epithets lowercased and their Latin endings
/// normalised. Hybrid markers survive in all three.
pub fn canonical(name: &Name) -> Canonical {
    let mut b = Builder::default();
    b.walk(name);
    Canonical {
        stemmed: b.stemmed.join(" "),
        simple: b.simple.join(" "),
        full: b.full.join(" "),
    }
}

/// Number of name parts: 1 for uninomial forms, 2 for binomials, 3 for
/// anything with an infraspecific epithet. Hybrid formulae take the maximum
/// over their parts.
pub fn cardinality(name: &Name) -> i64 {
    match name {
        Name::Uninomial(_) | Name::UninomialCombo(_) => 1,
        Name::Species(sp) => {
            if sp.infra_species.is_empty() {
                2
            } else {
                3
            }
        }
        Name::NamedSpeciesHybrid(_) => 2,
        Name::NamedGenusHybrid(h) => cardinality(&h.name),
        Name::HybridFormula(f) => {
            let mut card = cardinality(&f.first_name);
            for element in &f.hybrid_elements {
                if let Some(species) = &element.species {
                    card = card.max(cardinality(species));
                }
            }
            card
        }
    }
}

#[derive(Default)]
struct Builder {
    full: Vec<String>,
    simple: Vec<String>,
    stemmed: Vec<String>,
}

impl Builder {
    fn walk(&mut self, name: &Name) {
        match name {
            Name::Uninomial(u) => self.uninomial(&u.word.norm_value),
            Name::UninomialCombo(c) => {
                self.uninomial(&c.uninomial1.word.norm_value);
                self.rank(c.rank_marker());
                self.uninomial(&c.uninomial2.word.norm_value);
            }
            Name::Species(sp) => {
                self.uninomial(&sp.genus.norm_value);
                if let Some(sub) = &sp.sub_genus {
                    self.rank("subgen.");
                    self.uninomial(&sub.norm_value);
                }
                self.epithet(&sp.sp_epithet.word.norm_value);
                for infra in &sp.infra_species {
                    if let Some(rank) = &infra.rank {
                        self.rank(&rank.norm_value);
                    }
                    self.epithet(&infra.word.norm_value);
                }
            }
            Name::NamedGenusHybrid(h) => {
                self.hybrid_char();
                self.walk(&h.name);
            }
            Name::NamedSpeciesHybrid(h) => {
                self.uninomial(&h.genus.norm_value);
                self.hybrid_char();
                self.epithet(&h.sp_epithet.word.norm_value);
            }
            Name::HybridFormula(f) => {
                self.walk(&f.first_name);
                for element in &f.hybrid_elements {
                    self.hybrid_char();
                    if let Some(species) = &element.species {
                        self.walk(species);
                    }
                }
            }
        }
    }

    fn uninomial(&mut self, word: &str) {
        self.full.push(word.to_string());
        self.simple.push(word.to_string());
        self.stemmed.push(word.to_string());
    }

    fn rank(&mut self, marker: &str) {
        self.full.push(marker.to_string());
    }

    fn epithet(&mut self, word: &str) {
        self.full.push(word.to_string());
        self.simple.push(word.to_string());
        self.stemmed.push(stem(&word.to_lowercase()));
    }

    fn hybrid_char(&mut self) {
        self.full.push("×".to_string());
        self.simple.push("×".to_string());
        self.stemmed.push("×".to_string());
    }
}

// Closed table of Latin gender and ending normalisations, longest suffix
// first. Callers must not extend it.
const STEM_TABLE: &[(&str, &str)] = &[
    ("ensis", "ens"),
    ("ii", "i"),
    ("ae", ""),
    ("um", ""),
    ("us", ""),
    ("is", ""),
    ("a", ""),
    ("e", ""),
    ("i", ""),
];

/// Normalises the ending of a lowercased epithet. A suffix is only stripped
/// when at least three runes survive; unknown endings are left as they are.
pub fn stem(word: &str) -> String {
    for (suffix, replacement) in STEM_TABLE {
        if let Some(base) = word.strip_suffix(suffix) {
            let stemmed = format!("{}{}", base, replacement);
            if stemmed.chars().count() >= 3 {
                return stemmed;
            }
            return word.to_string();
        }
    }
    word.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stem_table_endings() {
        assert_eq!(stem("chinensis"), "chinens");
        assert_eq!(stem("vulgaris"), "vulgar");
        assert_eq!(stem("moesta"), "moest");
        assert_eq!(stem("novae"), "nov");
        assert_eq!(stem("tectorum"), "tector");
        assert_eq!(stem("robustus"), "robust");
        assert_eq!(stem("vulgare"), "vulgar");
        assert_eq!(stem("belangeri"), "belanger");
    }

    #[test]
    fn test_stem_keeps_unknown_and_short_words() {
        assert_eq!(stem("sapiens"), "sapiens");
        assert_eq!(stem("robur"), "robur");
        assert_eq!(stem("bus"), "bus");
        assert_eq!(stem("cus"), "cus");
    }

    #[test]
    fn test_stem_is_idempotent_over_corpus() {
        for word in [
            "sapiens",
            "moesta",
            "robur",
            "alba",
            "vulgaris",
            "chinensis",
            "officinalis",
            "tectorum",
            "sylvestris",
            "bubo",
            "belangeri",
        ] {
            let once = stem(word);
            assert_eq!(stem(&once), once, "stem not stable for {}", word);
        }
    }

    #[test]
    fn test_verbatim_id_is_stable() {
        let a = verbatim_id("Homo sapiens Linnaeus 1753");
        let b = verbatim_id("Homo sapiens Linnaeus 1753");
        assert_eq!(a, b);
        assert_ne!(a, verbatim_id("Homo sapiens"));
    }
}
