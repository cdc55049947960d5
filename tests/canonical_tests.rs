// tests/canonical_tests.rs

use pretty_assertions::assert_eq;

use sciname::canonical::{stem, verbatim_id};
use sciname::{parse, ParseOptions, ParsedName};

fn run(input: &str) -> ParsedName {
    parse(input, &ParseOptions::default())
}

fn forms(input: &str) -> (String, String, String) {
    let result = run(input);
    let c = result.canonical_name.expect("canonical name");
    (c.stemmed, c.simple, c.full)
}

// ---
// Canonical forms
// ---

#[test]
fn test_binomial_forms() {
    let (stemmed, simple, full) = forms("Betula alba L.");
    assert_eq!(full, "Betula alba");
    assert_eq!(simple, "Betula alba");
    assert_eq!(stemmed, "Betula alb");
}

#[test]
fn test_trinomial_forms_drop_rank_in_simple() {
    let (stemmed, simple, full) = forms("Aus vulgaris var. chinensis");
    assert_eq!(full, "Aus vulgaris var. chinensis");
    assert_eq!(simple, "Aus vulgaris chinensis");
    assert_eq!(stemmed, "Aus vulgar chinens");
}

#[test]
fn test_uninomial_combo_forms() {
    let (stemmed, simple, full) = forms("Carex sect. Vignea");
    assert_eq!(full, "Carex sect. Vignea");
    assert_eq!(simple, "Carex Vignea");
    assert_eq!(stemmed, "Carex Vignea");
}

#[test]
fn test_subgenus_forms() {
    let (_, simple, full) = forms("Pardosa (Lycosa) moesta");
    assert_eq!(full, "Pardosa subgen. Lycosa moesta");
    assert_eq!(simple, "Pardosa Lycosa moesta");
}

#[test]
fn test_hybrid_marker_survives_all_forms() {
    let (stemmed, simple, full) = forms("Quercus ×robur L.");
    assert_eq!(full, "Quercus × robur");
    assert_eq!(simple, "Quercus × robur");
    assert_eq!(stemmed, "Quercus × robur");
}

#[test]
fn test_hybrid_formula_uses_expanded_genus() {
    let (_, _, full) = forms("Aus bus × A. cus");
    assert_eq!(full, "Aus bus × Aus cus");
}

#[test]
fn test_canonical_uses_normalised_values() {
    let (_, simple, full) = forms("Anthurium coërulescens");
    assert_eq!(full, "Anthurium coerulescens");
    assert_eq!(simple, "Anthurium coerulescens");
}

// ---
// Properties
// ---

#[test]
fn test_simple_is_full_without_rank_tokens() {
    use sciname::ast::Name;

    fn rank_tokens(name: &Name, out: &mut Vec<String>) {
        match name {
            Name::UninomialCombo(c) => out.push(c.rank_marker().to_string()),
            Name::Species(sp) => {
                if sp.sub_genus.is_some() {
                    out.push("subgen.".to_string());
                }
                for infra in &sp.infra_species {
                    if let Some(rank) = &infra.rank {
                        out.push(rank.norm_value.clone());
                    }
                }
            }
            Name::NamedGenusHybrid(h) => rank_tokens(&h.name, out),
            Name::HybridFormula(f) => {
                rank_tokens(&f.first_name, out);
                for element in &f.hybrid_elements {
                    if let Some(species) = &element.species {
                        rank_tokens(species, out);
                    }
                }
            }
            _ => {}
        }
    }

    for input in [
        "Homo sapiens",
        "Aus bus var. cus",
        "Aus bus subsp. cus fm. dus",
        "Carex sect. Vignea",
        "Pardosa (Lycosa) moesta",
        "Quercus ×robur L.",
        "Aus bus × Aus cus",
    ] {
        let result = run(input);
        let c = result.canonical_name.as_ref().expect("canonical name");
        let mut ranks = Vec::new();
        rank_tokens(result.details.as_ref().unwrap(), &mut ranks);

        let mut remaining = ranks;
        let filtered: Vec<&str> = c
            .full
            .split(' ')
            .filter(|token| {
                if let Some(i) = remaining.iter().position(|r| r == token) {
                    remaining.remove(i);
                    false
                } else {
                    true
                }
            })
            .collect();
        assert_eq!(filtered.join(" "), c.simple, "input: {}", input);
    }
}

#[test]
fn test_stemmed_is_idempotent_at_name_level() {
    for input in [
        "Homo sapiens",
        "Betula alba",
        "Aus vulgaris var. chinensis",
        "Pardosa moesta Banks, 1892",
        "Quercus ×robur L.",
    ] {
        let result = run(input);
        let stemmed = result.canonical_name.unwrap().stemmed;
        for token in stemmed.split(' ') {
            if token.chars().next().is_some_and(|c| c.is_lowercase()) {
                assert_eq!(stem(token), token, "input: {}", input);
            }
        }
    }
}

// ---
// Verbatim identifiers
// ---

#[test]
fn test_verbatim_id_matches_helper() {
    let input = "Homo sapiens Linnaeus 1753";
    let result = run(input);
    assert_eq!(result.verbatim_id, verbatim_id(input).to_string());
}

#[test]
fn test_verbatim_id_ignores_options() {
    let input = "Homo sapiens Linnaeus 1753";
    let with_html = parse(input, &ParseOptions::default());
    let without_html = parse(
        input,
        &ParseOptions {
            remove_html: false,
            ..ParseOptions::default()
        },
    );
    assert_eq!(with_html.verbatim_id, without_html.verbatim_id);
}

#[test]
fn test_verbatim_id_is_set_for_unparsed_input() {
    let result = run("Tobacco mosaic virus");
    assert!(!result.parsed);
    assert_eq!(result.verbatim_id, verbatim_id("Tobacco mosaic virus").to_string());
}

#[test]
fn test_verbatim_id_is_a_uuid() {
    let result = run("Homo sapiens");
    assert_eq!(result.verbatim_id.len(), 36);
    assert_eq!(result.verbatim_id.matches('-').count(), 4);
}
