use indexmap::IndexMap;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chemistry::constants::{EMPTY_PLACEHOLDER, MULTI_COMPOUND_SEPARATORS};
use crate::chemistry::table::{AtomTable, ELEMENT_TABLE};

lazy_static! {
    // element symbol followed by an optional count
    static ref ELEMENT_TOKEN_RE: Regex = Regex::new(r"([A-Z][a-z]?)(\d*)").expect("valid element token pattern");
}

/// Why a formula could not be turned into an element composition.
///
/// These are per-row data errors: a batch keeps going and reports them
/// through the row status.
#[derive(Clone, PartialEq, Eq, Debug, Error, Serialize, Deserialize)]
pub enum ParseErrorKind {
    /// Blank input or a missing-value placeholder.
    #[error("empty formula")]
    Empty,

    /// Characters no element token could consume (parentheses, isotope
    /// prefixes, dots, bare digits, non-ASCII text...).
    #[error("unsupported characters in formula")]
    UnsupportedCharacters,

    /// A well-formed element symbol absent from the element table.
    #[error("unknown element '{0}'")]
    UnknownElement(String),

    /// A count too large to be represented.
    #[error("invalid element count in '{0}'")]
    InvalidCount(String),
}

impl ParseErrorKind {
    /// Short status tag used in result tables.
    pub fn status_tag(&self) -> &'static str {
        match self {
            ParseErrorKind::Empty => "empty",
            ParseErrorKind::UnsupportedCharacters => "unsupported_characters",
            ParseErrorKind::UnknownElement(_) => "unknown_element",
            ParseErrorKind::InvalidCount(_) => "invalid_count",
        }
    }
}

/// Element symbol to count, in order of first appearance in the formula.
#[derive(Clone, Default, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ParsedFormula {
    counts: IndexMap<String, u32>,
}

impl ParsedFormula {
    /// Builds a composition from (symbol, count) pairs; repeated symbols are summed.
    /// Builds a formula from (symbol, count) pairs, summing repeated symbols.
    pub fn from_counts<S: Into<String>, I: IntoIterator<Item = (S, u32)>>(pairs: I) -> Result<ParsedFormula, ParseErrorKind> {
        let mut formula = ParsedFormula::default();
        for (symbol, count) in pairs {
            formula.add(symbol.into(), count)?;
        }
        Ok(formula)
    }

    fn add(&mut self, symbol: String, count: u32) -> Result<(), ParseErrorKind> {
        let current = self.counts.get(&symbol).copied().unwrap_or(0);
        let total = current
            .checked_add(count)
            .ok_or_else(|| ParseErrorKind::InvalidCount(format!("{}{}", symbol, count)))?;
        self.counts.insert(symbol, total);
        Ok(())
    }

    pub fn count(&self, symbol: &str) -> Option<u32> {
        self.counts.get(symbol).copied()
    }

    pub fn elements(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(symbol, count)| (symbol.as_str(), *count))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Formula text with merged counts; a count of one is left implicit.
    pub fn to_formula_string(&self) -> String {
        let mut formula = String::new();
        for (symbol, count) in self.elements() {
            formula.push_str(symbol);
            if count != 1 {
                formula.push_str(&count.to_string());
            }
        }
        formula
    }
}

impl std::fmt::Display for ParsedFormula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_formula_string())
    }
}

/// A successfully parsed formula plus whether the input named several compounds.
#[derive(Clone, PartialEq, Debug)]
pub struct ParseOutcome {
    pub formula: ParsedFormula,
    pub multi_compound: bool,
}

/// Parses a raw formula against the built-in element table.
pub fn parse_formula(raw: &str) -> Result<ParseOutcome, ParseErrorKind> {
    parse_formula_with_table(raw, &ELEMENT_TABLE)
}

pub fn parse_formula_with_table(raw: &str, atom_table: &AtomTable) -> Result<ParseOutcome, ParseErrorKind> {

    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(EMPTY_PLACEHOLDER) {
        return Err(ParseErrorKind::Empty);
    }

    let (first_compound, multi_compound) = split_first_compound(trimmed);

    let cleaned: String = first_compound.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(ParseErrorKind::Empty);
    }

    let tokens: Vec<(&str, &str)> = ELEMENT_TOKEN_RE
        .captures_iter(&cleaned)
        .filter_map(|cap| {
            let symbol = cap.get(1)?.as_str();
            let digits = cap.get(2).map_or("", |m| m.as_str());
            Some((symbol, digits))
        })
        .collect();

    // every character has to belong to some token
    let consumed_len: usize = tokens.iter().map(|(symbol, digits)| symbol.len() + digits.len()).sum();
    if consumed_len != cleaned.len() {
        debug!("formula '{}' contains characters outside element tokens", cleaned);
        return Err(ParseErrorKind::UnsupportedCharacters);
    }

    let mut formula = ParsedFormula::default();
    for (symbol, digits) in tokens {
        if !atom_table.contains(symbol) {
            return Err(ParseErrorKind::UnknownElement(symbol.to_string()));
        }

        let count = if digits.is_empty() {
            1
        } else {
            digits
                .parse::<u32>()
                .map_err(|_| ParseErrorKind::InvalidCount(format!("{}{}", symbol, digits)))?
        };

        formula.add(symbol.to_string(), count)?;
    }

    Ok(ParseOutcome { formula, multi_compound })
}

fn split_first_compound(formula: &str) -> (&str, bool) {
    let first_sep_idx = MULTI_COMPOUND_SEPARATORS
        .iter()
        .filter_map(|sep| formula.find(sep))
        .min();

    match first_sep_idx {
        Some(idx) => (&formula[..idx], true),
        None => (formula, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(raw: &str) -> Vec<(String, u32)> {
        parse_formula(raw)
            .unwrap()
            .formula
            .elements()
            .map(|(s, c)| (s.to_string(), c))
            .collect()
    }

    #[test]
    fn parses_simple_formulas() {
        assert_eq!(counts("H2O"), vec![("H".to_string(), 2), ("O".to_string(), 1)]);
        assert_eq!(
            counts("C6H12O6"),
            vec![("C".to_string(), 6), ("H".to_string(), 12), ("O".to_string(), 6)]
        );
        assert_eq!(counts("NaCl"), vec![("Na".to_string(), 1), ("Cl".to_string(), 1)]);
    }

    #[test]
    fn strips_surrounding_and_inner_whitespace() {
        let outcome = parse_formula("  C6 H12\tO6 ").unwrap();
        assert_eq!(outcome.formula.to_formula_string(), "C6H12O6");
        assert!(!outcome.multi_compound);
    }

    #[test]
    fn repeated_symbols_are_summed() {
        let outcome = parse_formula("CH3CH2OH").unwrap();
        assert_eq!(outcome.formula.count("C"), Some(2));
        assert_eq!(outcome.formula.count("H"), Some(6));
        assert_eq!(outcome.formula.count("O"), Some(1));
        assert_eq!(outcome.formula.to_formula_string(), "C2H6O");

        let synthetic = ParsedFormula::from_counts(vec![("C", 2), ("H", 4), ("C", 3)]).unwrap();
        assert_eq!(synthetic.count("C"), Some(5));
        assert_eq!(synthetic.len(), 2);
    }

    #[test]
    fn zero_counts_are_kept() {
        let outcome = parse_formula("C0H2").unwrap();
        assert_eq!(outcome.formula.count("C"), Some(0));
        assert_eq!(outcome.formula.to_formula_string(), "C0H2");
    }

    #[test]
    fn empty_inputs() {
        for raw in ["", "   ", "\t\n", "nan", "NaN", " NAN "] {
            assert_eq!(parse_formula(raw), Err(ParseErrorKind::Empty), "input {:?}", raw);
        }
        assert_eq!(parse_formula("和NaCl"), Err(ParseErrorKind::Empty));
    }

    #[test]
    fn unsupported_syntax() {
        for raw in ["C6H(12)O6", "Ca(OH)2", "[13C]6H12O6", "2H2O", "CuSO4.5H2O", "C6H12O6+", "葡萄糖"] {
            assert_eq!(parse_formula(raw), Err(ParseErrorKind::UnsupportedCharacters), "input {:?}", raw);
        }
    }

    #[test]
    fn unknown_elements() {
        assert_eq!(parse_formula("C6Np6"), Err(ParseErrorKind::UnknownElement("Np".to_string())));
        assert_eq!(parse_formula("Qa2"), Err(ParseErrorKind::UnknownElement("Qa".to_string())));
    }

    #[test]
    fn oversized_count() {
        assert_eq!(
            parse_formula("C99999999999"),
            Err(ParseErrorKind::InvalidCount("C99999999999".to_string()))
        );
    }

    #[test]
    fn summed_count_overflow() {
        // each run fits in a u32 but their sum does not
        assert_eq!(
            parse_formula("C4294967295C"),
            Err(ParseErrorKind::InvalidCount("C1".to_string()))
        );
        assert_eq!(
            ParsedFormula::from_counts(vec![("H", u32::MAX), ("O", 1), ("H", 2)]),
            Err(ParseErrorKind::InvalidCount("H2".to_string()))
        );
        assert_eq!(parse_formula("C4294967294C").unwrap().formula.count("C"), Some(u32::MAX));
    }

    #[test]
    fn multi_compound_keeps_first() {
        let outcome = parse_formula("NaCl和KBr").unwrap();
        assert!(outcome.multi_compound);
        assert_eq!(outcome.formula.to_formula_string(), "NaCl");

        let outcome = parse_formula("H2O and C2H6O").unwrap();
        assert!(outcome.multi_compound);
        assert_eq!(outcome.formula.to_formula_string(), "H2O");

        // the earliest separator wins
        let outcome = parse_formula("KBr;NaCl和H2O").unwrap();
        assert_eq!(outcome.formula.to_formula_string(), "KBr");
    }

    #[test]
    fn round_trip_through_formula_string() {
        for raw in ["C6H12O6", "CH3COOH", "C0H2", "H", "C17H19NO3", "NaCl", "C2H5OC2H5"] {
            let first = parse_formula(raw).unwrap().formula;
            let second = parse_formula(&first.to_formula_string()).unwrap().formula;
            assert_eq!(first, second, "input {:?}", raw);
        }
    }

    #[test]
    fn status_tags() {
        assert_eq!(ParseErrorKind::Empty.status_tag(), "empty");
        assert_eq!(ParseErrorKind::UnknownElement("Np".into()).to_string(), "unknown element 'Np'");
    }
}
