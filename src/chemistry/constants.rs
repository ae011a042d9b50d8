// Source: CODATA 2018 recommended values
pub const ELECTRON_MASS: f64 = 0.000548579909065;
pub const PROTON_MASS: f64 = 1.007276466621;

// Spreadsheet readers turn missing cells into this placeholder (compared case-insensitively)
pub const EMPTY_PLACEHOLDER: &str = "nan";

// Separators used when a cell lists several compounds; only the first compound is kept
pub const MULTI_COMPOUND_SEPARATORS: [&str; 5] = ["和", "及", "&", ";", " and "];
