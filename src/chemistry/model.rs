use anyhow::{bail, Result};

// Published compositions are rounded, so natural abundances only sum to 1 approximately
const ABUNDANCE_SUM_TOLERANCE: f64 = 1e-3;

// The atomic_number uniquely identifies an element
#[derive(Clone, Default, PartialEq, Debug)]
pub struct Atom {
    pub atomic_number: u16,
    pub symbol: String,
    pub name: String,
    isotopes: Vec<Isotope>,
    // index of the most abundant isotope
    mono_idx: usize,
}

impl Atom {
    pub fn new(
        atomic_number: u16,
        symbol: &str,
        name: &str,
        isotopes: Vec<Isotope>,
    ) -> Result<Atom> {
        if atomic_number == 0 { bail!("atomic_number must be a strictly positive number") }
        if !is_element_symbol(symbol) { bail!("invalid element symbol '{}'", symbol) }
        if name.is_empty() { bail!("name is empty") }
        if isotopes.is_empty() { bail!("isotopes is empty") }

        for iso in isotopes.iter() {
            if iso.mass_number < atomic_number {
                bail!("isotope {} of {} has fewer nucleons than protons", iso.mass_number, symbol)
            }
        }

        let abundance_sum: f64 = isotopes.iter().map(|iso| iso.abundance).sum();
        if abundance_sum > 0.0 && (abundance_sum - 1.0).abs() > ABUNDANCE_SUM_TOLERANCE {
            bail!("isotope abundances of {} sum to {} instead of 1", symbol, abundance_sum)
        }

        let mut mono_idx = 0;
        for (idx, iso) in isotopes.iter().enumerate() {
            if iso.abundance > isotopes[mono_idx].abundance {
                mono_idx = idx;
            }
        }

        Ok(Atom {
            atomic_number,
            symbol: symbol.to_string(),
            name: name.to_string(),
            isotopes,
            mono_idx,
        })
    }

    /// Mass of the most abundant naturally occurring isotope.
    pub fn mono_mass(&self) -> f64 { self.isotopes[self.mono_idx].mass }

    /// Abundance-weighted mass over the natural isotopes.
    ///
    /// Returns `None` when no isotope carries a natural abundance
    /// (purely synthetic elements have no standard atomic weight).
    pub fn calc_average_mass(&self) -> Option<f64> {
        let mut weighted_mass_sum: f64 = 0.0;
        let mut weight_sum: f64 = 0.0;

        for iso in self.isotopes.iter() {
            weighted_mass_sum += iso.mass * iso.abundance;
            weight_sum += iso.abundance;
        }

        if weight_sum <= 0.0 {
            return None;
        }

        Some(weighted_mass_sum / weight_sum)
    }
}

/// One uppercase letter, optionally followed by one lowercase letter.
pub fn is_element_symbol(symbol: &str) -> bool {
    let mut chars = symbol.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(first), None, None) => first.is_ascii_uppercase(),
        (Some(first), Some(second), None) => first.is_ascii_uppercase() && second.is_ascii_lowercase(),
        _ => false,
    }
}

#[derive(Clone, Copy, Default, PartialEq, Debug)]
pub struct Isotope { mass_number: u16, mass: f64, abundance: f64 }

impl Isotope {
    pub fn new(mass_number: u16, mass: f64, abundance: f64) -> Result<Isotope> {
        if mass_number == 0 { bail!("mass_number must be a strictly positive number") }
        if !(mass > 0.0) { bail!("mass must be a strictly positive number") }
        if !(0.0..=1.0).contains(&abundance) { bail!("abundance must be a number between 0 and 1") }

        Ok(Isotope {
            mass_number,
            mass,
            abundance,
        })
    }
}
