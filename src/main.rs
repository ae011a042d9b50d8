mod cli;

use std::io::Write;
use std::process::ExitCode;

use anyhow::{Context, Result};
use log::{error, info};

use hrms_adducts::io::reader::read_formula_file;
use hrms_adducts::io::table::{FormulaTable, ReportLayout};
use hrms_adducts::ms::adducts::{AdductCatalog, AdductRule, Polarity};
use hrms_adducts::ms::report::{MassCalculator, MassReport};

use cli::{BatchArgs, CatalogFlavor, CatalogOptions, Command, MassOptions, SingleArgs};

fn main() -> ExitCode {
    let cli = cli::parse();
    init_logger(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logger(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn run(cli: cli::Cli) -> Result<()> {
    // the catalog is resolved before any row is processed
    let catalog = load_catalog(&cli.catalog)?;

    match cli.command {
        Command::Single(args) => run_single(&catalog, args),
        Command::Batch(args) => run_batch(&catalog, args),
        Command::Adducts => list_adducts(&catalog),
    }
}

fn load_catalog(options: &CatalogOptions) -> Result<AdductCatalog> {
    if let Some(path) = &options.catalog_file {
        let catalog = AdductCatalog::from_csv_path(path)?;
        info!("loaded {} adducts from {}", catalog.len(), path.display());
        return Ok(catalog);
    }

    let catalog = match options.catalog {
        CatalogFlavor::Standard => AdductCatalog::standard(),
        CatalogFlavor::Atomic => AdductCatalog::atomic(),
    };
    Ok(catalog.clone())
}

fn resolve_selection(catalog: &AdductCatalog, options: &MassOptions, default_all: bool) -> Result<Vec<AdductRule>> {
    let labels: Vec<&str> = options.adducts.iter().map(|l| l.trim()).filter(|l| !l.is_empty()).collect();

    if labels.iter().any(|l| l.eq_ignore_ascii_case("all")) {
        return Ok(catalog.select_all());
    }
    if !labels.is_empty() {
        return catalog.select(&labels);
    }
    if default_all {
        return Ok(catalog.select_all());
    }

    // a custom catalog may not define the usual ions
    catalog.default_selection().or_else(|_| Ok(catalog.select_all()))
}

fn run_single(catalog: &AdductCatalog, args: SingleArgs) -> Result<()> {
    let selection = resolve_selection(catalog, &args.mass, true)?;
    let calc = MassCalculator::new(selection).with_average(args.mass.average);
    let report = calc.compute_str(&args.formula);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if args.json {
        serde_json::to_writer_pretty(&mut out, &report)?;
        writeln!(out)?;
        return Ok(());
    }

    print_report(&mut out, &report, args.mass.decimals)?;
    Ok(())
}

fn print_report<W: Write>(out: &mut W, report: &MassReport, decimals: u32) -> Result<()> {
    let d = decimals as usize;

    if !report.status.is_success_like() {
        writeln!(out, "{}: {}", report.input.trim(), report.status)?;
        return Ok(());
    }

    writeln!(out, "Formula: {}", report.formula.as_deref().unwrap_or_default())?;
    if let Some(m) = report.neutral_mass {
        writeln!(out, "Neutral monoisotopic mass: {:.*}", d, m)?;
    }
    if let Some(m) = report.average_mass {
        writeln!(out, "Average mass: {:.*}", d, m)?;
    }
    if report.status != hrms_adducts::CalculationStatus::Success {
        writeln!(out, "Note: {}", report.status)?;
    }

    for polarity in [Polarity::Positive, Polarity::Negative] {
        let ions: Vec<_> = match polarity {
            Polarity::Positive => report.positive_adducts().collect(),
            Polarity::Negative => report.negative_adducts().collect(),
        };
        if ions.is_empty() {
            continue;
        }

        writeln!(out)?;
        writeln!(out, "{} mode", polarity)?;
        writeln!(out, "{:<16}{:>16}", "Ion Type", "m/z")?;
        for ion in ions {
            writeln!(out, "{:<16}{:>16.*}", ion.label, d, ion.mz)?;
        }
    }

    Ok(())
}

fn run_batch(catalog: &AdductCatalog, args: BatchArgs) -> Result<()> {
    let selection = resolve_selection(catalog, &args.mass, false)?;

    let table = match &args.column {
        Some(column) => FormulaTable::from_csv_path(&args.input, column)?,
        None => FormulaTable::from_formulas("Input", read_formula_file(&args.input)?),
    };
    info!("loaded {} rows from {}", table.len(), args.input.display());

    let layout = ReportLayout {
        adduct_labels: selection.iter().map(|r| r.label.to_owned()).collect(),
        with_average: args.mass.average,
        decimals: args.mass.decimals,
    };

    let calc = MassCalculator::new(selection).with_average(args.mass.average);
    let reports = calc.compute_batch(&table.formulas());

    match &args.output {
        Some(path) => {
            let file = std::fs::File::create(path).with_context(|| format!("can't create {}", path.display()))?;
            table.write_with_reports(std::io::BufWriter::new(file), &reports, &layout)?;
            info!("results written to {}", path.display());
        }
        None => table.write_with_reports(std::io::stdout().lock(), &reports, &layout)?,
    }

    Ok(())
}

fn list_adducts(catalog: &AdductCatalog) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    writeln!(out, "{:<16}{:<10}{:<14}{:>14}", "Ion Type", "Polarity", "Kind", "Value")?;
    for rule in catalog.rules().iter() {
        writeln!(out, "{:<16}{:<10}{:<14}{:>14.6}", rule.label, rule.polarity.to_string(), rule.kind.name(), rule.kind.value())?;
    }

    Ok(())
}
