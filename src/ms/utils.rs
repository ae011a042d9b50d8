use crate::chemistry::constants::PROTON_MASS;

pub fn mz_to_mass( mz: f64, charge: i32 ) -> f64 {
    let z = charge as f64;
    mz * z.abs() - z * PROTON_MASS
}

/// m/z of a molecule carrying `charge` protons (negative charges remove protons).
pub fn mass_to_mz( mass: f64, charge: i32 ) -> f64 {
    let z = charge as f64;
    (mass + z * PROTON_MASS) / z.abs()
}

// f64 carries about 15 significant decimal digits
pub const MAX_DECIMALS: u32 = 15;

/// Rounds half away from zero to a fixed number of decimals, for display.
/// `decimals` is capped at `MAX_DECIMALS`.
pub fn round_to_decimals(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals.min(MAX_DECIMALS) as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mz_conversions_are_inverse() {
        let mass = 180.0633881;
        for charge in [1, 2, 3, -1, -2] {
            let mz = mass_to_mz(mass, charge);
            assert!((mz_to_mass(mz, charge) - mass).abs() < 1e-9, "charge {}", charge);
        }
    }

    #[test]
    fn doubly_protonated() {
        let mz = mass_to_mz(180.0633881, 2);
        assert!((mz - 91.0389705).abs() < 1e-6);
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to_decimals(181.0706646, 5), 181.07066);
        assert_eq!(round_to_decimals(-1.0072765, 4), -1.0073);
    }

    #[test]
    fn rounding_with_huge_decimals_stays_finite() {
        for decimals in [MAX_DECIMALS, 16, 320, u32::MAX] {
            let rounded = round_to_decimals(180.06, decimals);
            assert!(rounded.is_finite(), "decimals {}", decimals);
            assert!((rounded - 180.06).abs() < 1e-12);
        }
    }
}
