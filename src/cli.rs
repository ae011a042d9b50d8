use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use hrms_adducts::ms::utils::MAX_DECIMALS;

#[derive(Parser)]
#[command(
    name = "hrms-adducts",
    about = "Monoisotopic masses and adduct m/z values from chemical formulas",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub catalog: CatalogOptions,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Masses of a single formula
    #[command(visible_alias = "s")]
    Single(SingleArgs),

    /// Masses for every row of a CSV file or plain formula list
    #[command(visible_alias = "b")]
    Batch(BatchArgs),

    /// List the adducts of the active catalog
    Adducts,
}

#[derive(Args)]
#[command(next_help_heading = "Adduct Catalog")]
pub struct CatalogOptions {
    /// Built-in catalog flavour
    #[arg(long, global = true, value_name = "NAME", default_value = "standard")]
    pub catalog: CatalogFlavor,

    /// Load the catalog from a CSV file (label,kind,value[,polarity])
    #[arg(long, global = true, value_name = "FILE", conflicts_with = "catalog")]
    pub catalog_file: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CatalogFlavor {
    /// Electron-corrected ion masses
    Standard,
    /// Neutral-atom adduct masses
    Atomic,
}

/// Options shared by single and batch calculations.
#[derive(Args)]
pub struct MassOptions {
    /// Adducts to compute, comma separated; `all` selects the whole catalog
    #[arg(short, long, value_name = "LABELS", value_delimiter = ',')]
    pub adducts: Vec<String>,

    /// Also compute the average (abundance-weighted) mass
    #[arg(long)]
    pub average: bool,

    /// Decimals in the printed masses
    #[arg(
        long,
        value_name = "N",
        default_value_t = 5,
        value_parser = clap::value_parser!(u32).range(0..=MAX_DECIMALS as i64)
    )]
    pub decimals: u32,
}

#[derive(Args)]
pub struct SingleArgs {
    /// Chemical formula, e.g. C18H36O2
    pub formula: String,

    #[command(flatten)]
    pub mass: MassOptions,

    /// Print the report as JSON (full precision)
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct BatchArgs {
    /// Input CSV file, or a text file with one formula per line when --column is omitted
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Name of the CSV column holding the formulas
    #[arg(short, long, value_name = "NAME")]
    pub column: Option<String>,

    /// Output CSV file (stdout if omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub mass: MassOptions,
}

pub fn parse() -> Cli {
    Cli::parse()
}
