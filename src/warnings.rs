//! The closed vocabulary of parsing warnings.
//!
//! Every quality issue the parser can flag is one of these variants. Each
//! warning carries a fixed message and a fixed quality integer; the overall
//! quality of a parse is the worst quality among its warnings.

use serde::Serialize;

/// A recoverable issue found while parsing a name.
///
/// Warnings never block parsing; they accumulate in a per-parse set and are
/// emitted sorted by descending quality, then by message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Warning {
    Tail,
    SpaceMultiple,
    CharBad,
    YearApprox,
    YearQuestion,
    YearParens,
    AuthMisformedYear,
    AuthUpperCase,
    RankUncommon,
    GenusAbbr,
    HybridFormula,
    HybridFormulaProbIncomplete,
    HybridFormulaIncomplete,
    HybridNamed,
    HybridCharNoSpace,
    HtmlTagsEntities,
    UninomialCombo,
    AuthEx,
    AuthShort,
}

impl Warning {
    /// Quality of a parse that raised this warning. 1 is clean, 4 is barely
    /// usable; the parse quality is the maximum over all warnings.
    pub fn quality(&self) -> u8 {
        match self {
            Warning::Tail => 2,
            Warning::SpaceMultiple => 2,
            Warning::CharBad => 3,
            Warning::YearApprox => 2,
            Warning::YearQuestion => 3,
            Warning::YearParens => 2,
            Warning::AuthMisformedYear => 3,
            Warning::AuthUpperCase => 2,
            Warning::RankUncommon => 3,
            Warning::GenusAbbr => 2,
            Warning::HybridFormula => 2,
            Warning::HybridFormulaProbIncomplete => 3,
            Warning::HybridFormulaIncomplete => 4,
            Warning::HybridNamed => 2,
            Warning::HybridCharNoSpace => 3,
            Warning::HtmlTagsEntities => 2,
            Warning::UninomialCombo => 2,
            Warning::AuthEx => 2,
            Warning::AuthShort => 3,
        }
    }

    /// The fixed message emitted for this warning.
    pub fn message(&self) -> &'static str {
        match self {
            Warning::Tail => "Tail data remains after parsing",
            Warning::SpaceMultiple => "Multiple adjacent space characters",
            Warning::CharBad => "Non-standard character in name",
            Warning::YearApprox => "Year is approximate",
            Warning::YearQuestion => "Year contains question mark",
            Warning::YearParens => "Year with parentheses",
            Warning::AuthMisformedYear => "Misplaced year inside basionym authorship",
            Warning::AuthUpperCase => "Author is given in all capitals",
            Warning::RankUncommon => "Uncommon rank",
            Warning::GenusAbbr => "Genus abbreviation",
            Warning::HybridFormula => "Hybrid formula",
            Warning::HybridFormulaProbIncomplete => "Hybrid formula without its second part",
            Warning::HybridFormulaIncomplete => "Hybrid formula with incomplete second name",
            Warning::HybridNamed => "Named hybrid",
            Warning::HybridCharNoSpace => "Named hybrid with no space",
            Warning::HtmlTagsEntities => "HTML tags or entities removed",
            Warning::UninomialCombo => "Uninomial combination",
            Warning::AuthEx => "ex-author",
            Warning::AuthShort => "Short author name",
        }
    }
}

/// The serialised form of a warning: its quality paired with its message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityWarning {
    pub quality: u8,
    pub message: &'static str,
}

impl From<Warning> for QualityWarning {
    fn from(w: Warning) -> Self {
        QualityWarning {
            quality: w.quality(),
            message: w.message(),
        }
    }
}

/// Orders a warning set for output: worst quality first, ties broken by
/// message so the result is deterministic.
pub fn sorted_warnings<I>(warnings: I) -> Vec<QualityWarning>
where
    I: IntoIterator<Item = Warning>,
{
    let mut out: Vec<QualityWarning> = warnings.into_iter().map(QualityWarning::from).collect();
    out.sort_by(|a, b| b.quality.cmp(&a.quality).then(a.message.cmp(b.message)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_sort_is_quality_then_message() {
        let ws = vec![Warning::Tail, Warning::RankUncommon, Warning::GenusAbbr];
        let sorted = sorted_warnings(ws);
        assert_eq!(sorted[0].message, "Uncommon rank");
        assert_eq!(sorted[1].message, "Genus abbreviation");
        assert_eq!(sorted[2].message, "Tail data remains after parsing");
    }

    #[test]
    fn test_qualities_stay_in_range() {
        let all = [
            Warning::Tail,
            Warning::SpaceMultiple,
            Warning::CharBad,
            Warning::YearApprox,
            Warning::YearQuestion,
            Warning::YearParens,
            Warning::AuthMisformedYear,
            Warning::AuthUpperCase,
            Warning::RankUncommon,
            Warning::GenusAbbr,
            Warning::HybridFormula,
            Warning::HybridFormulaProbIncomplete,
            Warning::HybridFormulaIncomplete,
            Warning::HybridNamed,
            Warning::HybridCharNoSpace,
            Warning::HtmlTagsEntities,
            Warning::UninomialCombo,
            Warning::AuthEx,
            Warning::AuthShort,
        ];
        for w in all {
            assert!((2..=4).contains(&w.quality()), "{:?}", w);
        }
    }
}
