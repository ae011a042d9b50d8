use anyhow::{anyhow, bail, Context, Result};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::ms::utils::{mass_to_mz, mz_to_mass};

#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    pub fn new(polarity: &str) -> Option<Polarity> {
        match polarity.trim().to_ascii_lowercase().as_str() {
            "positive" | "pos" | "+" => Some(Polarity::Positive),
            "negative" | "neg" | "-" => Some(Polarity::Negative),
            _ => None
        }
    }

    /// Reads the polarity from the trailing sign of an ion label such as `[M+2H]2+`.
    pub fn from_label(label: &str) -> Option<Polarity> {
        match label.trim_end().chars().last() {
            Some('+') => Some(Polarity::Positive),
            Some('-') => Some(Polarity::Negative),
            _ => None
        }
    }
}

impl std::fmt::Display for Polarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Polarity::Positive => write!(f, "positive"),
            Polarity::Negative => write!(f, "negative"),
        }
    }
}

/// How an ion m/z is derived from the neutral mass M.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub enum AdductKind {
    /// M + delta
    Simple { delta: f64 },
    /// 2M + delta
    Dimer { delta: f64 },
    /// (M + n * proton) / n
    MultiCharge { charge: u8 },
}

impl AdductKind {
    pub fn name(&self) -> &'static str {
        match self {
            AdductKind::Simple { .. } => "simple",
            AdductKind::Dimer { .. } => "dimer",
            AdductKind::MultiCharge { .. } => "multi_charge",
        }
    }

    /// The number stored alongside the kind (a mass delta or a charge).
    pub fn value(&self) -> f64 {
        match *self {
            AdductKind::Simple { delta } | AdductKind::Dimer { delta } => delta,
            AdductKind::MultiCharge { charge } => charge as f64,
        }
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct AdductRule {
    pub label: String,
    pub kind: AdductKind,
    pub polarity: Polarity,
}

impl AdductRule {
    pub fn new(label: &str, kind: AdductKind, polarity: Polarity) -> Result<AdductRule> {
        if label.trim().is_empty() { bail!("adduct label is empty") }

        match kind {
            AdductKind::Simple { delta } | AdductKind::Dimer { delta } => {
                if !delta.is_finite() { bail!("mass delta of adduct {} must be a finite number", label) }
            }
            AdductKind::MultiCharge { charge } => {
                if charge == 0 { bail!("charge of adduct {} must be a strictly positive number", label) }
            }
        }

        if let Some(label_polarity) = Polarity::from_label(label) {
            if label_polarity != polarity {
                bail!("adduct {} is tagged {} but its label says {}", label, polarity, label_polarity)
            }
        }

        Ok(AdductRule {
            label: label.to_string(),
            kind,
            polarity,
        })
    }

    /// m/z of this ion for a molecule of neutral mass `neutral_mass`.
    pub fn calc_mz(&self, neutral_mass: f64) -> f64 {
        match self.kind {
            AdductKind::Simple { delta } => neutral_mass + delta,
            AdductKind::Dimer { delta } => 2.0 * neutral_mass + delta,
            AdductKind::MultiCharge { charge } => mass_to_mz(neutral_mass, charge as i32),
        }
    }

    /// Neutral mass of the molecule observed as this ion at `mz`.
    pub fn calc_neutral_mass(&self, mz: f64) -> f64 {
        match self.kind {
            AdductKind::Simple { delta } => mz - delta,
            AdductKind::Dimer { delta } => (mz - delta) / 2.0,
            AdductKind::MultiCharge { charge } => mz_to_mass(mz, charge as i32),
        }
    }
}

impl std::fmt::Display for AdductRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// A closed, validated set of adduct rules.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct AdductCatalog {
    rules: Vec<AdductRule>,
    rule_idx_by_label: HashMap<String, usize>,
}

impl AdductCatalog {
    pub fn new(rules: Vec<AdductRule>) -> Result<AdductCatalog> {

        if rules.is_empty() { bail!("rules is empty") }

        let n_rules = rules.len();
        let mut rule_idx_by_label = HashMap::with_capacity(n_rules);
        for (idx, rule) in rules.iter().enumerate() {
            if rule_idx_by_label.insert(rule.label.to_owned(), idx).is_some() {
                bail!("adduct catalog contains duplicated label {}", rule.label)
            }
        }

        Ok(AdductCatalog {
            rules,
            rule_idx_by_label,
        })
    }

    /// Electron-corrected ion masses (default).
    pub fn standard() -> &'static AdductCatalog {
        &STANDARD_ADDUCT_CATALOG
    }

    /// Neutral-atom mass deltas, as used by earlier versions of the HRMS calculator.
    pub fn atomic() -> &'static AdductCatalog {
        &ATOMIC_ADDUCT_CATALOG
    }

    /// Reads a catalog from CSV with the columns `label,kind,value[,polarity]`.
    ///
    /// `kind` is one of `simple`, `dimer` or `multi_charge`; `value` is the
    /// mass delta, or the charge for `multi_charge`. A missing polarity is
    /// taken from the sign ending the label.
    pub fn from_csv_reader<R: std::io::Read>(reader: R) -> Result<AdductCatalog> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);

        let mut rules = Vec::new();
        for (record_idx, record_res) in csv_reader.deserialize::<AdductRecord>().enumerate() {
            let record = record_res.with_context(|| format!("invalid adduct record #{}", record_idx + 1))?;
            rules.push(record.into_rule()?);
        }

        AdductCatalog::new(rules)
    }

    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<AdductCatalog> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("can't open adduct catalog {}", path.display()))?;
        AdductCatalog::from_csv_reader(file)
            .with_context(|| format!("can't load adduct catalog {}", path.display()))
    }

    pub fn rules(&self) -> &[AdductRule] { &self.rules }

    pub fn len(&self) -> usize { self.rules.len() }

    pub fn is_empty(&self) -> bool { self.rules.is_empty() }

    pub fn get(&self, label: &str) -> Option<&AdductRule> {
        self.rule_idx_by_label.get(label).map(|idx| &self.rules[*idx])
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.label.as_str())
    }

    pub fn rules_with_polarity(&self, polarity: Polarity) -> impl Iterator<Item = &AdductRule> {
        self.rules.iter().filter(move |rule| rule.polarity == polarity)
    }

    /// Resolves adduct labels against the catalog; any unknown label is an error.
    pub fn select<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<AdductRule>> {
        let mut selection: Vec<AdductRule> = Vec::with_capacity(labels.len());
        for label in labels {
            let label = label.as_ref().trim();
            let rule = self.get(label).ok_or_else(|| anyhow!(
                "unknown adduct '{}', expected one of: {}", label, self.labels().collect::<Vec<_>>().join(", ")
            ))?;
            if !selection.iter().any(|r| r.label == rule.label) {
                selection.push(rule.clone());
            }
        }

        Ok(selection)
    }

    pub fn select_all(&self) -> Vec<AdductRule> {
        self.rules.clone()
    }

    /// The ions most commonly requested: `[M+H]+`, `[M+Na]+` and `[M-H]-`.
    pub fn default_selection(&self) -> Result<Vec<AdductRule>> {
        self.select(&DEFAULT_ADDUCT_LABELS)
    }
}

pub const DEFAULT_ADDUCT_LABELS: [&str; 3] = ["[M+H]+", "[M+Na]+", "[M-H]-"];

#[derive(Deserialize)]
struct AdductRecord {
    label: String,
    kind: String,
    value: f64,
    #[serde(default)]
    polarity: Option<String>,
}

impl AdductRecord {
    fn into_rule(self) -> Result<AdductRule> {
        let kind = match self.kind.to_ascii_lowercase().as_str() {
            "simple" => AdductKind::Simple { delta: self.value },
            "dimer" => AdductKind::Dimer { delta: self.value },
            "multi_charge" | "multicharge" => {
                if self.value.fract() != 0.0 || !(1.0..=u8::MAX as f64).contains(&self.value) {
                    bail!("charge of adduct {} must be a positive integer, got {}", self.label, self.value)
                }
                AdductKind::MultiCharge { charge: self.value as u8 }
            }
            other => bail!("unknown adduct kind '{}' for {}", other, self.label),
        };

        let polarity = match self.polarity.as_deref().filter(|p| !p.trim().is_empty()) {
            Some(p) => Polarity::new(p).ok_or_else(|| anyhow!("invalid polarity '{}' for {}", p, self.label))?,
            None => Polarity::from_label(&self.label)
                .ok_or_else(|| anyhow!("can't infer the polarity of {}, add a polarity column", self.label))?,
        };

        AdductRule::new(&self.label, kind, polarity)
    }
}

fn build_catalog(entries: &[(&str, AdductKind)]) -> Result<AdductCatalog> {
    let mut rules = Vec::with_capacity(entries.len());
    for (label, kind) in entries {
        let polarity = Polarity::from_label(label).ok_or_else(|| anyhow!("unsigned label {}", label))?;
        rules.push(AdductRule::new(label, *kind, polarity)?);
    }
    AdductCatalog::new(rules)
}

use AdductKind::*;

// Ion masses: neutral adduct atoms minus one electron per positive charge,
// plus one electron per negative charge.
const STANDARD_ADDUCTS: [(&str, AdductKind); 11] = [
    ("[M+H]+", Simple { delta: 1.007276 }),
    ("[M+Na]+", Simple { delta: 22.989221 }),
    ("[M+NH4]+", Simple { delta: 18.033826 }),
    ("[M+K]+", Simple { delta: 38.963158 }),
    ("[M+2H]2+", MultiCharge { charge: 2 }),
    ("[2M+H]+", Dimer { delta: 1.007276 }),
    ("[2M+Na]+", Dimer { delta: 22.989221 }),
    ("[M-H]-", Simple { delta: -1.007276 }),
    ("[M+Cl]-", Simple { delta: 34.969401 }),
    ("[M+HCOO]-", Simple { delta: 44.998203 }),
    ("[M+CH3COO]-", Simple { delta: 59.013853 }),
];

// Same ions with the neutral-atom masses of the adducted species (no electron correction).
const ATOMIC_ADDUCTS: [(&str, AdductKind); 11] = [
    ("[M+H]+", Simple { delta: 1.007276 }),
    ("[M+Na]+", Simple { delta: 22.989769 }),
    ("[M+NH4]+", Simple { delta: 18.034374 }),
    ("[M+K]+", Simple { delta: 38.963706 }),
    ("[M+2H]2+", MultiCharge { charge: 2 }),
    ("[2M+H]+", Dimer { delta: 1.007276 }),
    ("[2M+Na]+", Dimer { delta: 22.989769 }),
    ("[M-H]-", Simple { delta: -1.007276 }),
    ("[M+Cl]-", Simple { delta: 34.968853 }),
    ("[M+HCOO]-", Simple { delta: 44.997655 }),
    ("[M+CH3COO]-", Simple { delta: 59.013305 }),
];

lazy_static! {
    pub static ref STANDARD_ADDUCT_CATALOG: AdductCatalog = build_catalog(&STANDARD_ADDUCTS)
        .expect("the standard adduct catalog is valid");
    pub static ref ATOMIC_ADDUCT_CATALOG: AdductCatalog = build_catalog(&ATOMIC_ADDUCTS)
        .expect("the atomic adduct catalog is valid");
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::AdductKind::*;
    use crate::chemistry::constants::{ELECTRON_MASS, PROTON_MASS};
    use crate::chemistry::table::ELEMENT_TABLE;

    fn mono(symbol: &str) -> f64 {
        ELEMENT_TABLE.mono_mass(symbol).unwrap()
    }

    fn delta(catalog: &AdductCatalog, label: &str) -> f64 {
        catalog.get(label).unwrap().kind.value()
    }

    #[test]
    fn builtin_catalogs_share_labels() {
        let standard: Vec<&str> = AdductCatalog::standard().labels().collect();
        let atomic: Vec<&str> = AdductCatalog::atomic().labels().collect();
        assert_eq!(standard.len(), 11);
        assert_eq!(standard, atomic);
        assert_eq!(AdductCatalog::standard().rules_with_polarity(Polarity::Positive).count(), 7);
        assert_eq!(AdductCatalog::standard().rules_with_polarity(Polarity::Negative).count(), 4);
    }

    #[test]
    fn standard_deltas_are_electron_corrected() {
        let catalog = AdductCatalog::standard();
        let nh4 = mono("N") + 4.0 * mono("H");
        let formate = mono("H") + mono("C") + 2.0 * mono("O");
        let acetate = 2.0 * mono("C") + 3.0 * mono("H") + 2.0 * mono("O");

        let expected = [
            ("[M+H]+", PROTON_MASS),
            ("[M+Na]+", mono("Na") - ELECTRON_MASS),
            ("[M+NH4]+", nh4 - ELECTRON_MASS),
            ("[M+K]+", mono("K") - ELECTRON_MASS),
            ("[M-H]-", -PROTON_MASS),
            ("[M+Cl]-", mono("Cl") + ELECTRON_MASS),
            ("[M+HCOO]-", formate + ELECTRON_MASS),
            ("[M+CH3COO]-", acetate + ELECTRON_MASS),
        ];
        for (label, mass) in expected {
            assert!((delta(catalog, label) - mass).abs() < 1e-6, "{}: {}", label, mass);
        }
    }

    #[test]
    fn atomic_deltas_ignore_the_electron() {
        let catalog = AdductCatalog::atomic();
        assert!((delta(catalog, "[M+Na]+") - mono("Na")).abs() < 1e-6);
        assert!((delta(catalog, "[M+Cl]-") - mono("Cl")).abs() < 1e-6);
    }

    #[test]
    fn rule_mz_formulas() {
        let catalog = AdductCatalog::standard();
        let m = 180.0633881;
        assert!((catalog.get("[M+H]+").unwrap().calc_mz(m) - 181.0706641).abs() < 1e-6);
        assert!((catalog.get("[2M+H]+").unwrap().calc_mz(m) - 361.1340522).abs() < 1e-6);
        assert!((catalog.get("[M+2H]2+").unwrap().calc_mz(m) - 91.0389705).abs() < 1e-6);
        assert!((catalog.get("[M-H]-").unwrap().calc_mz(m) - 179.0561121).abs() < 1e-6);
    }

    #[test]
    fn neutral_mass_inverts_mz() {
        let m = 342.116212;
        for rule in AdductCatalog::standard().rules().iter() {
            let mz = rule.calc_mz(m);
            assert!((rule.calc_neutral_mass(mz) - m).abs() < 1e-9, "{}", rule);
        }
    }

    #[test]
    fn label_index_matches_rules() {
        let catalog = AdductCatalog::standard().clone();
        for (idx, rule) in catalog.rules().iter().enumerate() {
            assert_eq!(catalog.get(&rule.label), Some(&catalog.rules()[idx]));
        }
        assert_eq!(catalog.rules().len(), catalog.len());
        assert_eq!(catalog.get("[M+Li]+"), None);
    }

    #[test]
    fn selection() {
        let catalog = AdductCatalog::standard();
        let selection = catalog.default_selection().unwrap();
        let labels: Vec<&str> = selection.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, DEFAULT_ADDUCT_LABELS.to_vec());

        let dedup = catalog.select(&["[M+K]+", " [M+K]+ "]).unwrap();
        assert_eq!(dedup.len(), 1);

        let err = catalog.select(&["[M+Li]+"]).unwrap_err();
        assert!(err.to_string().contains("unknown adduct '[M+Li]+'"));

        assert_eq!(catalog.select_all().len(), catalog.len());
    }

    #[test]
    fn polarity_parsing() {
        assert_eq!(Polarity::from_label("[M+2H]2+"), Some(Polarity::Positive));
        assert_eq!(Polarity::from_label("[M-H]-"), Some(Polarity::Negative));
        assert_eq!(Polarity::from_label("M+H"), None);
        assert_eq!(Polarity::new("NEG"), Some(Polarity::Negative));
        assert_eq!(Polarity::new("sideways"), None);
    }

    #[test]
    fn catalog_validation() {
        let h = AdductRule::new("[M+H]+", Simple { delta: 1.007276 }, Polarity::Positive).unwrap();
        assert!(AdductCatalog::new(vec![h.clone(), h]).is_err());
        assert!(AdductCatalog::new(vec![]).is_err());
        assert!(AdductRule::new("[M+H]+", Simple { delta: 1.007276 }, Polarity::Negative).is_err());
        assert!(AdductRule::new("[M+H]+", Simple { delta: f64::NAN }, Polarity::Positive).is_err());
        assert!(AdductRule::new("[M+0H]+", MultiCharge { charge: 0 }, Polarity::Positive).is_err());
        assert!(AdductRule::new(" ", Simple { delta: 1.0 }, Polarity::Positive).is_err());
    }

    #[test]
    fn catalog_from_csv() {
        let data = "\
label,kind,value,polarity
# lithium adducts
[M+Li]+,simple,7.015456,
[2M+Li]+,dimer,7.015456,positive
[M+3H]3+,multi_charge,3,
[M-H2O-H]-,simple,-19.01784,neg
";
        let catalog = AdductCatalog::from_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.get("[M+3H]3+").unwrap().kind, MultiCharge { charge: 3 });
        assert_eq!(catalog.get("[M-H2O-H]-").unwrap().polarity, Polarity::Negative);
        assert_eq!(catalog.get("[2M+Li]+").unwrap().kind, Dimer { delta: 7.015456 });
    }

    #[test]
    fn invalid_catalog_csv() {
        let bad_kind = "label,kind,value,polarity\n[M+H]+,trimer,1.0,\n";
        assert!(AdductCatalog::from_csv_reader(bad_kind.as_bytes()).is_err());

        let bad_charge = "label,kind,value,polarity\n[M+2H]2+,multi_charge,1.5,\n";
        assert!(AdductCatalog::from_csv_reader(bad_charge.as_bytes()).is_err());

        let unsigned = "label,kind,value,polarity\nM+H,simple,1.007276,\n";
        assert!(AdductCatalog::from_csv_reader(unsigned.as_bytes()).is_err());

        let duplicated = "label,kind,value,polarity\n[M+H]+,simple,1.007276,\n[M+H]+,simple,1.007276,\n";
        assert!(AdductCatalog::from_csv_reader(duplicated.as_bytes()).is_err());
    }
}
