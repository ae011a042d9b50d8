pub mod reader;
pub mod table;
