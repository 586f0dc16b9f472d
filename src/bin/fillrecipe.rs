use clap::Parser;
use log::{info, LevelFilter};
use recfill::{Catalog, RecFillResult, Recipe, RunConfig};
use simple_logger::SimpleLogger;
use std::{
    fmt::{self, Display},
    path::PathBuf,
};

/*-------------------------------------------------------------------------------------------------
 *                               Parse Command Line Arguments
 *-----------------------------------------------------------------------------------------------*/
///
/// Fill a recipe with the datasets available on disk.
///
/// This program scans the storage roots named in the run configuration, selects every
/// dataset/ensemble combination whose temporal coverage satisfies each variable in the recipe,
/// and writes the recipe back out with additional_datasets filled in. Variables with no
/// qualifying data are left empty; that is reported, not an error.
///
#[derive(Debug, Parser)]
#[clap(bin_name = "fillrecipe")]
#[clap(author, version, about)]
struct FillRecipeOptionsInit {
    /// The path to the recipe file to fill.
    recipe: PathBuf,

    /// The path to the run configuration file.
    ///
    /// If this is not specified, then the program will check for it in the "RECFILL_CONFIG"
    /// environment variable, then in ./recfill.yml and ~/.recfill.yml.
    #[clap(short, long)]
    #[clap(env = "RECFILL_CONFIG")]
    config: Option<PathBuf>,

    /// The path to write the filled recipe to.
    ///
    /// If this is not specified, then the program will create one automatically by appending
    /// "_filled" to the recipe file stem.
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Scan and select, but do not write the output recipe.
    #[clap(short, long)]
    dry_run: bool,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

#[derive(Debug)]
struct FillRecipeOptionsChecked {
    /// The path to the recipe file to fill.
    recipe: PathBuf,

    /// The path to the run configuration file, if one was given explicitly.
    config: Option<PathBuf>,

    /// The path to write the filled recipe to.
    output: PathBuf,

    /// Skip writing the output recipe.
    dry_run: bool,

    /// Verbose output
    verbose: bool,
}

impl Display for FillRecipeOptionsChecked {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        writeln!(f)?;
        writeln!(f, "     Recipe: {}", self.recipe.display())?;
        match &self.config {
            Some(config) => writeln!(f, "     Config: {}", config.display())?,
            None => writeln!(f, "     Config: (default locations)")?,
        }
        writeln!(f, "     Output: {}", self.output.display())?;
        writeln!(f, "    Dry run: {}", self.dry_run)?;

        Ok(())
    }
}

/// Get the command line arguments and check them.
fn parse_args() -> RecFillResult<FillRecipeOptionsChecked> {
    let FillRecipeOptionsInit {
        recipe,
        config,
        output,
        dry_run,
        verbose,
    } = FillRecipeOptionsInit::parse();

    let output = match output {
        Some(v) => v,
        None => {
            let mut stem = recipe
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "recipe".to_owned());
            stem.push_str("_filled");

            let ext = recipe
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_else(|| "yml".to_owned());

            let mut clone = recipe.clone();
            clone.set_file_name(format!("{}.{}", stem, ext));
            clone
        }
    };

    let checked = FillRecipeOptionsChecked {
        recipe,
        config,
        output,
        dry_run,
        verbose,
    };

    if verbose {
        info!("{}", checked);
    }

    Ok(checked)
}

/*-------------------------------------------------------------------------------------------------
 *                                             MAIN
 *-----------------------------------------------------------------------------------------------*/
fn main() -> RecFillResult<()> {
    SimpleLogger::new().with_level(LevelFilter::Trace).init()?;
    log::set_max_level(LevelFilter::Info);

    let opts = parse_args()?;

    if opts.verbose {
        log::set_max_level(LevelFilter::Debug);
    }

    let config = RunConfig::load_or_default_locations(opts.config.as_deref())?;

    if !opts.verbose {
        if let Some(level) = config.log_level()? {
            log::set_max_level(level);
        }
    }

    let mut recipe = Recipe::load(&opts.recipe)?;

    let roots = config.scan_roots()?;
    let catalog = Catalog::scan(&roots)?;
    info!("catalog holds {} coverage records", catalog.len());

    let report = recipe.fill(&catalog);

    info!("");
    info!("Variables processed - {:>6}", report.variables);
    info!("  Entries added     - {:>6}", report.entries_added);
    info!("  Without a match   - {:>6}", report.no_match);
    info!("  Skipped (invalid) - {:>6}", report.skipped);
    info!("");

    if opts.dry_run {
        info!("dry run, not writing {}", opts.output.display());
    } else {
        recipe.save(&opts.output)?;
        info!("filled recipe written to {}", opts.output.display());
    }

    Ok(())
}
