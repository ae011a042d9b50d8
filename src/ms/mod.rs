pub mod adducts;
pub mod report;
pub mod utils;
