use anyhow::Result;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::chemistry::composition::{parse_formula, ParseErrorKind, ParsedFormula};
use crate::chemistry::mass_calc::{calc_average_mass, calc_mono_mass};
use crate::chemistry::table::ELEMENT_TABLE;
use crate::ms::adducts::{AdductCatalog, AdductRule, Polarity};

/// Outcome of one row.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum CalculationStatus {
    Success,
    /// Several compounds were listed; masses refer to the first one.
    MultiCompound,
    Empty,
    ParseError(ParseErrorKind),
}

impl CalculationStatus {
    pub fn is_success_like(&self) -> bool {
        matches!(self, CalculationStatus::Success | CalculationStatus::MultiCompound)
    }

    /// Short machine-readable tag.
    pub fn tag(&self) -> &'static str {
        match self {
            CalculationStatus::Success => "success",
            CalculationStatus::MultiCompound => "multi_compound",
            CalculationStatus::Empty => "empty",
            CalculationStatus::ParseError(kind) => kind.status_tag(),
        }
    }
}

impl From<ParseErrorKind> for CalculationStatus {
    fn from(kind: ParseErrorKind) -> Self {
        match kind {
            ParseErrorKind::Empty => CalculationStatus::Empty,
            other => CalculationStatus::ParseError(other),
        }
    }
}

impl std::fmt::Display for CalculationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalculationStatus::Success => write!(f, "success"),
            CalculationStatus::MultiCompound => write!(f, "multiple compounds, first one used"),
            CalculationStatus::Empty => write!(f, "empty"),
            CalculationStatus::ParseError(kind) => write!(f, "{}", kind),
        }
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct AdductMz {
    pub label: String,
    pub polarity: Polarity,
    pub mz: f64,
}

/// Masses computed for one input, kept at full precision.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct MassReport {
    pub input: String,
    pub formula: Option<String>,
    pub status: CalculationStatus,
    pub neutral_mass: Option<f64>,
    pub average_mass: Option<f64>,
    pub adducts: Vec<AdductMz>,
}

impl MassReport {
    fn failed(input: &str, status: CalculationStatus) -> MassReport {
        MassReport {
            input: input.to_string(),
            formula: None,
            status,
            neutral_mass: None,
            average_mass: None,
            adducts: Vec::new(),
        }
    }

    pub fn adduct_mz(&self, label: &str) -> Option<f64> {
        self.adducts.iter().find(|a| a.label == label).map(|a| a.mz)
    }

    pub fn positive_adducts(&self) -> impl Iterator<Item = &AdductMz> {
        self.adducts.iter().filter(|a| a.polarity == Polarity::Positive)
    }

    pub fn negative_adducts(&self) -> impl Iterator<Item = &AdductMz> {
        self.adducts.iter().filter(|a| a.polarity == Polarity::Negative)
    }
}

/// Computes neutral, average and adduct masses for a fixed adduct selection.
///
/// The selection is resolved once against a catalog, so an unknown adduct
/// label fails here and never per row.
#[derive(Clone, Debug)]
pub struct MassCalculator {
    selection: Vec<AdductRule>,
    with_average: bool,
}

impl MassCalculator {
    pub fn new(selection: Vec<AdductRule>) -> MassCalculator {
        MassCalculator { selection, with_average: false }
    }

    pub fn from_labels<S: AsRef<str>>(catalog: &AdductCatalog, labels: &[S]) -> Result<MassCalculator> {
        Ok(MassCalculator::new(catalog.select(labels)?))
    }

    pub fn with_average(mut self, with_average: bool) -> MassCalculator {
        self.with_average = with_average;
        self
    }

    pub fn selection(&self) -> &[AdductRule] {
        &self.selection
    }

    pub fn compute(&self, formula: &ParsedFormula) -> MassReport {
        let input = formula.to_formula_string();
        self.compute_parsed(&input, formula, false)
    }

    pub fn compute_str(&self, raw: &str) -> MassReport {
        match parse_formula(raw) {
            Ok(outcome) => self.compute_parsed(raw, &outcome.formula, outcome.multi_compound),
            Err(kind) => {
                debug!("can't parse formula '{}': {}", raw, kind);
                MassReport::failed(raw, kind.into())
            }
        }
    }

    fn compute_parsed(&self, input: &str, formula: &ParsedFormula, multi_compound: bool) -> MassReport {

        if formula.is_empty() {
            return MassReport::failed(input, CalculationStatus::Empty);
        }

        let neutral_mass = match calc_mono_mass(formula) {
            Ok(mass) => mass,
            Err(_) => {
                let unknown = formula
                    .elements()
                    .map(|(symbol, _)| symbol)
                    .find(|symbol| !ELEMENT_TABLE.contains(symbol))
                    .unwrap_or_default();
                let kind = ParseErrorKind::UnknownElement(unknown.to_string());
                return MassReport::failed(input, kind.into());
            }
        };

        let average_mass = if self.with_average { calc_average_mass(formula) } else { None };

        let adducts = self.selection.iter().map(|rule| AdductMz {
            label: rule.label.to_owned(),
            polarity: rule.polarity,
            mz: rule.calc_mz(neutral_mass),
        }).collect();

        let status = if multi_compound { CalculationStatus::MultiCompound } else { CalculationStatus::Success };

        MassReport {
            input: input.to_string(),
            formula: Some(formula.to_formula_string()),
            status,
            neutral_mass: Some(neutral_mass),
            average_mass,
            adducts,
        }
    }

    /// Processes rows in parallel; the output keeps the input row order.
    pub fn compute_batch<S: AsRef<str> + Sync>(&self, rows: &[S]) -> Vec<MassReport> {
        let reports: Vec<MassReport> = rows
            .par_iter()
            .enumerate()
            .map(|(row_idx, raw)| {
                let report = self.compute_str(raw.as_ref());
                if !report.status.is_success_like() && report.status != CalculationStatus::Empty {
                    warn!("row {}: '{}' -> {}", row_idx + 1, report.input, report.status);
                }
                report
            })
            .collect();

        let summary = BatchSummary::from_reports(&reports);
        info!(
            "processed {} rows: {} succeeded, {} multi-compound, {} empty, {} failed",
            summary.total, summary.succeeded, summary.multi_compound, summary.empty, summary.failed
        );

        reports
    }
}

/// Masses for an already parsed formula and a resolved adduct selection.
pub fn compute_masses(formula: &ParsedFormula, selection: &[AdductRule]) -> MassReport {
    MassCalculator::new(selection.to_vec()).compute(formula)
}

/// Parses `raw` then computes its masses; parse failures become the report status.
pub fn compute_masses_from_str(raw: &str, selection: &[AdductRule]) -> MassReport {
    MassCalculator::new(selection.to_vec()).compute_str(raw)
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub multi_compound: usize,
    pub empty: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_reports(reports: &[MassReport]) -> BatchSummary {
        let mut summary = BatchSummary { total: reports.len(), ..Default::default() };
        for report in reports {
            match report.status {
                CalculationStatus::Success => summary.succeeded += 1,
                CalculationStatus::MultiCompound => summary.multi_compound += 1,
                CalculationStatus::Empty => summary.empty += 1,
                CalculationStatus::ParseError(_) => summary.failed += 1,
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calculator(labels: &[&str]) -> MassCalculator {
        MassCalculator::from_labels(AdductCatalog::standard(), labels).unwrap()
    }

    #[test]
    fn glucose_with_protonated_ion() {
        let report = calculator(&["[M+H]+"]).compute_str("C6H12O6");
        assert_eq!(report.status, CalculationStatus::Success);
        assert_eq!(report.formula.as_deref(), Some("C6H12O6"));
        assert!((report.neutral_mass.unwrap() - 180.06339).abs() < 1e-4);
        assert!((report.adduct_mz("[M+H]+").unwrap() - 181.07067).abs() < 1e-4);
        assert_eq!(report.average_mass, None);
    }

    #[test]
    fn no_adducts_still_gives_neutral_mass() {
        let report = MassCalculator::new(vec![]).compute_str("H2O");
        assert!((report.neutral_mass.unwrap() - 18.01056).abs() < 1e-4);
        assert!(report.adducts.is_empty());
    }

    #[test]
    fn average_mass_on_request() {
        let report = calculator(&[]).with_average(true).compute_str("C6H12O6");
        assert!((report.average_mass.unwrap() - 180.156).abs() < 0.01);
    }

    #[test]
    fn failures_carry_no_masses() {
        let calc = calculator(&["[M+H]+", "[M-H]-"]);
        let cases = [
            ("", CalculationStatus::Empty),
            ("nan", CalculationStatus::Empty),
            ("C6H(12)O6", CalculationStatus::ParseError(ParseErrorKind::UnsupportedCharacters)),
            ("C6Np6", CalculationStatus::ParseError(ParseErrorKind::UnknownElement("Np".to_string()))),
        ];
        for (raw, status) in cases {
            let report = calc.compute_str(raw);
            assert_eq!(report.status, status, "input {:?}", raw);
            assert_eq!(report.neutral_mass, None);
            assert_eq!(report.average_mass, None);
            assert!(report.adducts.is_empty());
            assert_eq!(report.input, raw);
        }
    }

    #[test]
    fn multi_compound_uses_first() {
        let report = calculator(&["[M+Na]+"]).compute_str("NaCl和KBr");
        assert_eq!(report.status, CalculationStatus::MultiCompound);
        assert_eq!(report.formula.as_deref(), Some("NaCl"));
        assert!((report.neutral_mass.unwrap() - 57.958622).abs() < 1e-5);
        assert!(report.status.is_success_like());
    }

    #[test]
    fn synthetic_formula_with_unknown_element() {
        let formula = ParsedFormula::from_counts(vec![("C", 6), ("Np", 1)]).unwrap();
        let report = compute_masses(&formula, &[]);
        assert_eq!(report.status, CalculationStatus::ParseError(ParseErrorKind::UnknownElement("Np".to_string())));
    }

    #[test]
    fn polarity_split() {
        let report = compute_masses_from_str("C18H36O2", &AdductCatalog::standard().select_all());
        assert_eq!(report.positive_adducts().count(), 7);
        assert_eq!(report.negative_adducts().count(), 4);
        assert!(report.negative_adducts().all(|a| a.label.ends_with('-')));
    }

    #[test]
    fn batch_keeps_row_order() {
        let rows = vec!["H2O", "", "C6H12O6", "C6H(12)O6", "NaCl和KBr"];
        let reports = calculator(&["[M+H]+"]).compute_batch(&rows);
        let tags: Vec<&str> = reports.iter().map(|r| r.status.tag()).collect();
        assert_eq!(tags, vec!["success", "empty", "success", "unsupported_characters", "multi_compound"]);
        assert_eq!(reports[2].input, "C6H12O6");

        let summary = BatchSummary::from_reports(&reports);
        assert_eq!(summary, BatchSummary { total: 5, succeeded: 2, multi_compound: 1, empty: 1, failed: 1 });
    }
}
