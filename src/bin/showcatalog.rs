use clap::Parser;
use log::{info, LevelFilter};
use recfill::{Catalog, RecFillResult, RunConfig};
use simple_logger::SimpleLogger;
use std::path::PathBuf;

/*-------------------------------------------------------------------------------------------------
 *                               Parse Command Line Arguments
 *-----------------------------------------------------------------------------------------------*/
///
/// List the catalog records found under the configured storage roots.
///
/// This program scans the same storage roots as fillrecipe and prints one line per coverage
/// record. Useful for checking that rootpath and drs entries in the run configuration actually
/// point at data before filling a recipe.
///
#[derive(Debug, Parser)]
#[clap(bin_name = "showcatalog")]
#[clap(author, version, about)]
struct ShowCatalogOptions {
    /// The path to the run configuration file.
    ///
    /// If this is not specified, then the program will check for it in the "RECFILL_CONFIG"
    /// environment variable, then in ./recfill.yml and ~/.recfill.yml.
    #[clap(short, long)]
    #[clap(env = "RECFILL_CONFIG")]
    config: Option<PathBuf>,

    /// Only show records for this variable short name.
    #[clap(long)]
    variable: Option<String>,

    /// Only show records for this MIP table.
    #[clap(long)]
    mip: Option<String>,

    /// Only show records for this dataset.
    #[clap(long)]
    dataset: Option<String>,

    /// Only show records for this project.
    #[clap(long)]
    project: Option<String>,

    /// Show the configured roots and their layout hints before listing.
    #[clap(short, long)]
    roots: bool,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

fn wanted(filter: &Option<String>, value: &str) -> bool {
    match filter {
        Some(wanted) => wanted == value,
        None => true,
    }
}

/*-------------------------------------------------------------------------------------------------
 *                                             MAIN
 *-----------------------------------------------------------------------------------------------*/
fn main() -> RecFillResult<()> {
    SimpleLogger::new().with_level(LevelFilter::Trace).init()?;
    log::set_max_level(LevelFilter::Info);

    let opts = ShowCatalogOptions::parse();

    if opts.verbose {
        log::set_max_level(LevelFilter::Debug);
    }

    let config = RunConfig::load_or_default_locations(opts.config.as_deref())?;
    let scan_roots = config.scan_roots()?;

    if opts.roots {
        for root in &scan_roots {
            println!(
                "{:<8} {:<8} {}",
                root.project,
                root.scheme.name(),
                root.path.display()
            );
            println!("         layout: {}", root.scheme.layout_hint());
        }
        println!();
    }

    let catalog = Catalog::scan(&scan_roots)?;

    let mut shown = 0;
    for rec in catalog.records() {
        if !wanted(&opts.project, &rec.project)
            || !wanted(&opts.dataset, &rec.dataset)
            || !wanted(&opts.variable, &rec.variable)
            || !wanted(&opts.mip, &rec.mip_table)
        {
            continue;
        }

        println!(
            "{:<8} {:<20} {:<16} {:<12} {:<10} {:<8} {}-{}",
            rec.project,
            rec.dataset,
            rec.experiment,
            rec.ensemble,
            rec.variable,
            rec.mip_table,
            rec.start_year,
            rec.end_year
        );
        shown += 1;
    }

    info!("{} of {} coverage records shown", shown, catalog.len());

    Ok(())
}
