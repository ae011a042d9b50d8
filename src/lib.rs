//! Monoisotopic / average masses and adduct m/z values from chemical formulas.
//!
//! ```
//! use hrms_adducts::{AdductCatalog, MassCalculator};
//!
//! let calc = MassCalculator::from_labels(AdductCatalog::standard(), &["[M+H]+"]).unwrap();
//! let report = calc.compute_str("C6H12O6");
//! let mz = report.adduct_mz("[M+H]+").unwrap();
//! assert!((mz - 181.07066).abs() < 1e-4);
//! ```

pub mod chemistry;
pub mod io;
pub mod ms;

pub use chemistry::composition::{parse_formula, ParseErrorKind, ParseOutcome, ParsedFormula};
pub use chemistry::mass_calc::{calc_average_mass, calc_mono_mass};
pub use chemistry::table::{AtomTable, ELEMENT_TABLE};
pub use ms::adducts::{AdductCatalog, AdductKind, AdductRule, Polarity};
pub use ms::report::{
    compute_masses, compute_masses_from_str, BatchSummary, CalculationStatus, MassCalculator, MassReport,
};
