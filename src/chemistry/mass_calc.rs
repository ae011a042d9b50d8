use anyhow::{anyhow, Result};

use crate::chemistry::composition::ParsedFormula;
use crate::chemistry::table::{AtomTable, ELEMENT_TABLE};

/// Neutral monoisotopic mass of a parsed formula.
pub fn calc_mono_mass(formula: &ParsedFormula) -> Result<f64> {
    calc_mono_mass_with_table(formula, &ELEMENT_TABLE)
}

pub fn calc_mono_mass_with_table(formula: &ParsedFormula, atom_table: &AtomTable) -> Result<f64> {
    let get_atom_mass = |symbol: &str| -> Result<f64> {
        atom_table.mono_mass(symbol).ok_or_else(
            || anyhow!("can't find element '{}' in the provided table", symbol)
        )
    };

    _calc_mass(formula, get_atom_mass)
}

/// Average (abundance-weighted) mass, or `None` when an element has no natural abundance data.
pub fn calc_average_mass(formula: &ParsedFormula) -> Option<f64> {
    calc_average_mass_with_table(formula, &ELEMENT_TABLE)
}

pub fn calc_average_mass_with_table(formula: &ParsedFormula, atom_table: &AtomTable) -> Option<f64> {
    let get_atom_mass = |symbol: &str| -> Result<f64> {
        atom_table.average_mass(symbol).ok_or_else(
            || anyhow!("no average mass for element '{}'", symbol)
        )
    };

    _calc_mass(formula, get_atom_mass).ok()
}

fn _calc_mass<F>(formula: &ParsedFormula, get_atom_mass: F) -> Result<f64> where F: Fn(&str) -> Result<f64> {

    let mut mass: f64 = 0.0;
    for (symbol, count) in formula.elements() {
        let atom_mass = get_atom_mass(symbol)?;
        mass += count as f64 * atom_mass;
    }

    Ok(mass)
}
