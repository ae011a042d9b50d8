use crate::chemistry::model::*;

use anyhow::{bail, Result};
use lazy_static::lazy_static;
use std::collections::HashMap;

#[derive(Clone, Default, PartialEq, Debug)]
pub struct AtomTable {
    pub atoms: Vec<Atom>,
    pub atom_by_symbol: HashMap<String, Atom>
}

impl AtomTable {
    pub fn new(
        atoms: Vec<Atom>,
    ) -> Result<AtomTable> {

        if atoms.is_empty() { bail!("atoms is empty") }

        let n_atoms = atoms.len();
        let mut atom_by_symbol = HashMap::with_capacity(n_atoms);
        for atom in atoms.iter() {
            atom_by_symbol.insert(atom.symbol.to_owned(), atom.clone());
        }

        if atom_by_symbol.len() != n_atoms {
            bail!("atoms contains duplicated entries")
        }

        Ok(AtomTable {
            atoms,
            atom_by_symbol,
        })
    }

    pub fn get(&self, symbol: &str) -> Option<&Atom> {
        self.atom_by_symbol.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.atom_by_symbol.contains_key(symbol)
    }

    pub fn mono_mass(&self, symbol: &str) -> Option<f64> {
        self.get(symbol).map(|atom| atom.mono_mass())
    }

    pub fn average_mass(&self, symbol: &str) -> Option<f64> {
        self.get(symbol).and_then(|atom| atom.calc_average_mass())
    }
}

macro_rules! atom {
    ($z:expr, $symbol:expr, $name:expr, [ $( ($a:expr, $mass:expr, $ab:expr) ),* $(,)? ]) => {
        Atom::new($z, $symbol, $name, vec![ $( Isotope::new($a, $mass, $ab)? ),* ])?
    }
}

// Sources:
// - https://physics.nist.gov/cgi-bin/Compositions/stand_alone.pl
// - IUPAC Technical Report: Isotopic compositions of the elements 2009
// Elements without a natural composition (Tc, Pm) carry their longest-lived
// isotope with zero abundance, so they have a mono mass but no average mass.
pub fn build_element_table() -> Result<AtomTable> {
    AtomTable::new(vec![
        atom!(1, "H", "Hydrogen", [
            (1, 1.00782503207, 0.999885),
            (2, 2.0141017778, 0.000115),
        ]),
        atom!(2, "He", "Helium", [
            (3, 3.0160293191, 0.00000134),
            (4, 4.00260325415, 0.99999866),
        ]),
        atom!(3, "Li", "Lithium", [
            (6, 6.015122795, 0.0759),
            (7, 7.01600455, 0.9241),
        ]),
        atom!(4, "Be", "Beryllium", [
            (9, 9.0121822, 1.0),
        ]),
        atom!(5, "B", "Boron", [
            (10, 10.012937, 0.199),
            (11, 11.0093054, 0.801),
        ]),
        atom!(6, "C", "Carbon", [
            (12, 12.0000000, 0.9893),
            (13, 13.0033548378, 0.0107),
        ]),
        atom!(7, "N", "Nitrogen", [
            (14, 14.0030740048, 0.99636),
            (15, 15.0001088982, 0.00364),
        ]),
        atom!(8, "O", "Oxygen", [
            (16, 15.99491461956, 0.99757),
            (17, 16.9991317, 0.00038),
            (18, 17.999161, 0.00205),
        ]),
        atom!(9, "F", "Fluorine", [
            (19, 18.99840322, 1.0),
        ]),
        atom!(10, "Ne", "Neon", [
            (20, 19.9924401754, 0.9048),
            (21, 20.99384668, 0.0027),
            (22, 21.991385114, 0.0925),
        ]),
        atom!(11, "Na", "Sodium", [
            (23, 22.9897692809, 1.0),
        ]),
        atom!(12, "Mg", "Magnesium", [
            (24, 23.9850417, 0.7899),
            (25, 24.98583692, 0.1),
            (26, 25.982592929, 0.1101),
        ]),
        atom!(13, "Al", "Aluminium", [
            (27, 26.98153863, 1.0),
        ]),
        atom!(14, "Si", "Silicon", [
            (28, 27.9769265325, 0.92223),
            (29, 28.9764947, 0.04685),
            (30, 29.97377017, 0.03092),
        ]),
        atom!(15, "P", "Phosphorus", [
            (31, 30.97376163, 1.0),
        ]),
        atom!(16, "S", "Sulfur", [
            (32, 31.972071, 0.9499),
            (33, 32.97145876, 0.0075),
            (34, 33.9678669, 0.0425),
            (36, 35.96708076, 0.0001),
        ]),
        atom!(17, "Cl", "Chlorine", [
            (35, 34.96885268, 0.7576),
            (37, 36.96590259, 0.2424),
        ]),
        atom!(18, "Ar", "Argon", [
            (36, 35.967545106, 0.003365),
            (38, 37.9627324, 0.000632),
            (40, 39.9623831225, 0.996003),
        ]),
        atom!(19, "K", "Potassium", [
            (39, 38.96370668, 0.932581),
            (40, 39.96399848, 0.000117),
            (41, 40.96182576, 0.067302),
        ]),
        atom!(20, "Ca", "Calcium", [
            (40, 39.96259098, 0.96941),
            (42, 41.95861801, 0.00647),
            (43, 42.9587666, 0.00135),
            (44, 43.9554818, 0.02086),
            (46, 45.9536926, 0.00004),
            (48, 47.952534, 0.00187),
        ]),
        atom!(21, "Sc", "Scandium", [
            (45, 44.9559119, 1.0),
        ]),
        atom!(22, "Ti", "Titanium", [
            (46, 45.9526316, 0.0825),
            (47, 46.9517631, 0.0744),
            (48, 47.9479463, 0.7372),
            (49, 48.94787, 0.0541),
            (50, 49.9447912, 0.0518),
        ]),
        atom!(23, "V", "Vanadium", [
            (50, 49.9471585, 0.0025),
            (51, 50.9439595, 0.9975),
        ]),
        atom!(24, "Cr", "Chromium", [
            (50, 49.9460442, 0.04345),
            (52, 51.9405075, 0.83789),
            (53, 52.9406494, 0.09501),
            (54, 53.9388804, 0.02365),
        ]),
        atom!(25, "Mn", "Manganese", [
            (55, 54.9380451, 1.0),
        ]),
        atom!(26, "Fe", "Iron", [
            (54, 53.9396105, 0.05845),
            (56, 55.9349375, 0.91754),
            (57, 56.935394, 0.02119),
            (58, 57.9332756, 0.00282),
        ]),
        atom!(27, "Co", "Cobalt", [
            (59, 58.933195, 1.0),
        ]),
        atom!(28, "Ni", "Nickel", [
            (58, 57.9353429, 0.680769),
            (60, 59.9307864, 0.262231),
            (61, 60.931056, 0.011399),
            (62, 61.9283451, 0.036345),
            (64, 63.927966, 0.009256),
        ]),
        atom!(29, "Cu", "Copper", [
            (63, 62.9295975, 0.6915),
            (65, 64.9277895, 0.3085),
        ]),
        atom!(30, "Zn", "Zinc", [
            (64, 63.9291422, 0.48268),
            (66, 65.9260334, 0.27975),
            (67, 66.9271273, 0.04102),
            (68, 67.9248442, 0.19024),
            (70, 69.9253193, 0.00631),
        ]),
        atom!(31, "Ga", "Gallium", [
            (69, 68.9255736, 0.60108),
            (71, 70.9247013, 0.39892),
        ]),
        atom!(32, "Ge", "Germanium", [
            (70, 69.9242474, 0.2038),
            (72, 71.9220758, 0.2731),
            (73, 72.9234589, 0.0776),
            (74, 73.9211778, 0.3672),
            (76, 75.9214026, 0.0783),
        ]),
        atom!(33, "As", "Arsenic", [
            (75, 74.9215965, 1.0),
        ]),
        atom!(34, "Se", "Selenium", [
            (74, 73.922475934, 0.0089),
            (76, 75.919213704, 0.0937),
            (77, 76.919914154, 0.0763),
            (78, 77.91730928, 0.2377),
            (80, 79.9165218, 0.4961),
            (82, 81.9166995, 0.0873),
        ]),
        atom!(35, "Br", "Bromine", [
            (79, 78.9183371, 0.5069),
            (81, 80.9162906, 0.4931),
        ]),
        atom!(36, "Kr", "Krypton", [
            (78, 77.9203648, 0.00355),
            (80, 79.916379, 0.02286),
            (82, 81.9134836, 0.11593),
            (83, 82.914136, 0.115),
            (84, 83.911507, 0.56987),
            (86, 85.91061073, 0.17279),
        ]),
        atom!(37, "Rb", "Rubidium", [
            (85, 84.911789738, 0.7217),
            (87, 86.909180527, 0.2783),
        ]),
        atom!(38, "Sr", "Strontium", [
            (84, 83.913425, 0.0056),
            (86, 85.9092602, 0.0986),
            (87, 86.9088771, 0.07),
            (88, 87.9056121, 0.8258),
        ]),
        atom!(39, "Y", "Yttrium", [
            (89, 88.9058483, 1.0),
        ]),
        atom!(40, "Zr", "Zirconium", [
            (90, 89.9047044, 0.5145),
            (91, 90.9056458, 0.1122),
            (92, 91.9050408, 0.1715),
            (94, 93.9063152, 0.1738),
            (96, 95.9082734, 0.028),
        ]),
        atom!(41, "Nb", "Niobium", [
            (93, 92.9063781, 1.0),
        ]),
        atom!(42, "Mo", "Molybdenum", [
            (92, 91.906811, 0.1477),
            (94, 93.9050883, 0.0923),
            (95, 94.9058421, 0.159),
            (96, 95.9046795, 0.1668),
            (97, 96.9060215, 0.0956),
            (98, 97.9054082, 0.2419),
            (100, 99.907477, 0.0967),
        ]),
        atom!(43, "Tc", "Technetium", [
            (98, 97.907216, 0.0),
        ]),
        atom!(44, "Ru", "Ruthenium", [
            (96, 95.907598, 0.0554),
            (98, 97.905287, 0.0187),
            (99, 98.9059393, 0.1276),
            (100, 99.9042195, 0.126),
            (101, 100.9055821, 0.1706),
            (102, 101.9043493, 0.3155),
            (104, 103.905433, 0.1862),
        ]),
        atom!(45, "Rh", "Rhodium", [
            (103, 102.905504, 1.0),
        ]),
        atom!(46, "Pd", "Palladium", [
            (102, 101.905609, 0.0102),
            (104, 103.904036, 0.1114),
            (105, 104.905085, 0.2233),
            (106, 105.903486, 0.2733),
            (108, 107.903892, 0.2646),
            (110, 109.905153, 0.1172),
        ]),
        atom!(47, "Ag", "Silver", [
            (107, 106.905097, 0.51839),
            (109, 108.904752, 0.48161),
        ]),
        atom!(48, "Cd", "Cadmium", [
            (106, 105.906459, 0.0125),
            (108, 107.904184, 0.0089),
            (110, 109.9030021, 0.1249),
            (111, 110.9041781, 0.128),
            (112, 111.9027578, 0.2413),
            (113, 112.9044017, 0.1222),
            (114, 113.9033585, 0.2873),
            (116, 115.904756, 0.0749),
        ]),
        atom!(49, "In", "Indium", [
            (113, 112.904058, 0.0429),
            (115, 114.903878, 0.9571),
        ]),
        atom!(50, "Sn", "Tin", [
            (112, 111.904818, 0.0097),
            (114, 113.902779, 0.0066),
            (115, 114.903342, 0.0034),
            (116, 115.901741, 0.1454),
            (117, 116.902952, 0.0768),
            (118, 117.901603, 0.2422),
            (119, 118.903308, 0.0859),
            (120, 119.9021947, 0.3258),
            (122, 121.903439, 0.0463),
            (124, 123.9052739, 0.0579),
        ]),
        atom!(51, "Sb", "Antimony", [
            (121, 120.9038157, 0.5721),
            (123, 122.904214, 0.4279),
        ]),
        atom!(52, "Te", "Tellurium", [
            (120, 119.90402, 0.0009),
            (122, 121.9030439, 0.0255),
            (123, 122.90427, 0.0089),
            (124, 123.9028179, 0.0474),
            (125, 124.9044307, 0.0707),
            (126, 125.9033117, 0.1884),
            (128, 127.9044631, 0.3174),
            (130, 129.9062244, 0.3408),
        ]),
        atom!(53, "I", "Iodine", [
            (127, 126.904473, 1.0),
        ]),
        atom!(54, "Xe", "Xenon", [
            (124, 123.905893, 0.000952),
            (126, 125.904274, 0.00089),
            (128, 127.9035313, 0.019102),
            (129, 128.9047794, 0.264006),
            (130, 129.903508, 0.04071),
            (131, 130.9050824, 0.212324),
            (132, 131.9041535, 0.269086),
            (134, 133.9053945, 0.104357),
            (136, 135.907219, 0.088573),
        ]),
        atom!(55, "Cs", "Caesium", [
            (133, 132.905451933, 1.0),
        ]),
        atom!(56, "Ba", "Barium", [
            (130, 129.9063208, 0.00106),
            (132, 131.9050613, 0.00101),
            (134, 133.9045084, 0.02417),
            (135, 134.9056886, 0.06592),
            (136, 135.9045759, 0.07854),
            (137, 136.9058274, 0.11232),
            (138, 137.9052472, 0.71698),
        ]),
        atom!(57, "La", "Lanthanum", [
            (138, 137.907112, 0.0009),
            (139, 138.9063533, 0.9991),
        ]),
        atom!(58, "Ce", "Cerium", [
            (136, 135.907172, 0.00185),
            (138, 137.905991, 0.00251),
            (140, 139.9054387, 0.8845),
            (142, 141.909244, 0.11114),
        ]),
        atom!(59, "Pr", "Praseodymium", [
            (141, 140.9076528, 1.0),
        ]),
        atom!(60, "Nd", "Neodymium", [
            (142, 141.9077233, 0.272),
            (143, 142.9098143, 0.122),
            (144, 143.9100873, 0.238),
            (145, 144.9125736, 0.083),
            (146, 145.9131169, 0.172),
            (148, 147.916893, 0.057),
            (150, 149.920891, 0.056),
        ]),
        atom!(61, "Pm", "Promethium", [
            (145, 144.912749, 0.0),
        ]),
        atom!(62, "Sm", "Samarium", [
            (144, 143.911999, 0.0307),
            (147, 146.9148979, 0.1499),
            (148, 147.9148227, 0.1124),
            (149, 148.9171847, 0.1382),
            (150, 149.9172755, 0.0738),
            (152, 151.9197324, 0.2675),
            (154, 153.9222093, 0.2275),
        ]),
        atom!(63, "Eu", "Europium", [
            (151, 150.9198502, 0.4781),
            (153, 152.9212303, 0.5219),
        ]),
        atom!(64, "Gd", "Gadolinium", [
            (152, 151.919791, 0.002),
            (154, 153.9208656, 0.0218),
            (155, 154.922622, 0.148),
            (156, 155.9221227, 0.2047),
            (157, 156.9239601, 0.1565),
            (158, 157.9241039, 0.2484),
            (160, 159.9270541, 0.2186),
        ]),
        atom!(65, "Tb", "Terbium", [
            (159, 158.9253468, 1.0),
        ]),
        atom!(66, "Dy", "Dysprosium", [
            (156, 155.924283, 0.00056),
            (158, 157.924409, 0.00095),
            (160, 159.9251975, 0.02329),
            (161, 160.9269334, 0.18889),
            (162, 161.9267984, 0.25475),
            (163, 162.9287312, 0.24896),
            (164, 163.9291748, 0.2826),
        ]),
        atom!(67, "Ho", "Holmium", [
            (165, 164.9303221, 1.0),
        ]),
        atom!(68, "Er", "Erbium", [
            (162, 161.928778, 0.00139),
            (164, 163.9292, 0.01601),
            (166, 165.9302931, 0.33503),
            (167, 166.9320482, 0.22869),
            (168, 167.9323702, 0.26978),
            (170, 169.9354643, 0.1491),
        ]),
        atom!(69, "Tm", "Thulium", [
            (169, 168.9342133, 1.0),
        ]),
        atom!(70, "Yb", "Ytterbium", [
            (168, 167.933897, 0.0013),
            (170, 169.9347618, 0.0304),
            (171, 170.9363258, 0.1428),
            (172, 171.9363815, 0.2183),
            (173, 172.9382108, 0.1613),
            (174, 173.9388621, 0.3183),
            (176, 175.9425717, 0.1276),
        ]),
        atom!(71, "Lu", "Lutetium", [
            (175, 174.9407718, 0.9741),
            (176, 175.9426863, 0.0259),
        ]),
        atom!(72, "Hf", "Hafnium", [
            (174, 173.940046, 0.0016),
            (176, 175.9414086, 0.0526),
            (177, 176.9432207, 0.186),
            (178, 177.9436988, 0.2728),
            (179, 178.9458161, 0.1362),
            (180, 179.94655, 0.3508),
        ]),
        atom!(73, "Ta", "Tantalum", [
            (180, 179.9474648, 0.00012),
            (181, 180.9479958, 0.99988),
        ]),
        atom!(74, "W", "Tungsten", [
            (180, 179.946704, 0.0012),
            (182, 181.9482042, 0.265),
            (183, 182.950223, 0.1431),
            (184, 183.9509312, 0.3064),
            (186, 185.9543641, 0.2843),
        ]),
        atom!(75, "Re", "Rhenium", [
            (185, 184.952955, 0.374),
            (187, 186.9557531, 0.626),
        ]),
        atom!(76, "Os", "Osmium", [
            (184, 183.9524891, 0.0002),
            (186, 185.9538382, 0.0159),
            (187, 186.9557505, 0.0196),
            (188, 187.9558382, 0.1324),
            (189, 188.9581475, 0.1615),
            (190, 189.958447, 0.2626),
            (192, 191.9614807, 0.4078),
        ]),
        atom!(77, "Ir", "Iridium", [
            (191, 190.960594, 0.373),
            (193, 192.9629264, 0.627),
        ]),
        atom!(78, "Pt", "Platinum", [
            (190, 189.959932, 0.00014),
            (192, 191.961038, 0.00782),
            (194, 193.9626803, 0.32967),
            (195, 194.9647911, 0.33832),
            (196, 195.9649515, 0.25242),
            (198, 197.967893, 0.07163),
        ]),
        atom!(79, "Au", "Gold", [
            (197, 196.9665687, 1.0),
        ]),
        atom!(80, "Hg", "Mercury", [
            (196, 195.965833, 0.0015),
            (198, 197.966769, 0.0997),
            (199, 198.9682799, 0.1687),
            (200, 199.968326, 0.231),
            (201, 200.9703023, 0.1318),
            (202, 201.970643, 0.2986),
            (204, 203.9734939, 0.0687),
        ]),
        atom!(81, "Tl", "Thallium", [
            (203, 202.9723442, 0.2952),
            (205, 204.9744275, 0.7048),
        ]),
        atom!(82, "Pb", "Lead", [
            (204, 203.9730436, 0.014),
            (206, 205.9744653, 0.241),
            (207, 206.9758969, 0.221),
            (208, 207.9766521, 0.524),
        ]),
        atom!(83, "Bi", "Bismuth", [
            (209, 208.9803987, 1.0),
        ]),
        atom!(90, "Th", "Thorium", [
            (232, 232.0380553, 1.0),
        ]),
        atom!(91, "Pa", "Protactinium", [
            (231, 231.035884, 1.0),
        ]),
        atom!(92, "U", "Uranium", [
            (234, 234.0409521, 0.000054),
            (235, 235.0439299, 0.007204),
            (238, 238.0507882, 0.992742),
        ]),
    ])
}

lazy_static! {
    /// Elements accepted in formulas, with their natural isotopes.
    pub static ref ELEMENT_TABLE: AtomTable = build_element_table()
        .expect("the built-in element table is valid");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_is_valid() {
        let table = build_element_table().unwrap();
        assert_eq!(table.atoms.len(), table.atom_by_symbol.len());
        assert!(table.contains("C"));
        assert!(table.contains("Na"));
        assert!(table.contains("Pt"));
        assert!(table.contains("U"));
        assert!(!table.contains("Np"));
        assert!(!table.contains("c"));
    }

    #[test]
    fn monoisotopic_masses() {
        assert_eq!(ELEMENT_TABLE.mono_mass("C"), Some(12.0));
        assert_eq!(ELEMENT_TABLE.mono_mass("H"), Some(1.00782503207));
        // 80Se, not the lightest isotope
        assert_eq!(ELEMENT_TABLE.mono_mass("Se"), Some(79.9165218));
        assert_eq!(ELEMENT_TABLE.mono_mass("Fe"), Some(55.9349375));
        assert_eq!(ELEMENT_TABLE.mono_mass("Pt"), Some(194.9647911));
        assert_eq!(ELEMENT_TABLE.mono_mass("Hg"), Some(201.9706430));
        assert_eq!(ELEMENT_TABLE.mono_mass("Np"), None);
    }

    #[test]
    fn average_masses_match_standard_weights() {
        let expected = [
            ("H", 1.00794), ("C", 12.0107), ("O", 15.9994), ("Cl", 35.453), ("Br", 79.904),
            ("Ni", 58.6934), ("Cu", 63.546), ("Ag", 107.8682), ("Xe", 131.293), ("Ba", 137.327),
        ];
        for (symbol, weight) in expected {
            let avg = ELEMENT_TABLE.average_mass(symbol).unwrap();
            assert!((avg - weight).abs() < 2e-3, "{}: {} vs {}", symbol, avg, weight);
        }
    }

    #[test]
    fn synthetic_elements_have_no_average_mass() {
        assert_eq!(ELEMENT_TABLE.mono_mass("Tc"), Some(97.907216));
        assert_eq!(ELEMENT_TABLE.average_mass("Tc"), None);
        assert_eq!(ELEMENT_TABLE.average_mass("Pm"), None);
    }

    #[test]
    fn rejects_duplicated_atoms() {
        let h = Atom::new(1, "H", "Hydrogen", vec![Isotope::new(1, 1.00782503207, 1.0).unwrap()]).unwrap();
        assert!(AtomTable::new(vec![h.clone(), h]).is_err());
        assert!(AtomTable::new(vec![]).is_err());
    }
}
