use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Command, FromArgMatches as _};
use log::info;

use crate::clock::{ContextClockExt, SimulationOptions};
use crate::context::Context;
use crate::error::OutbreakError;
use crate::incidence_report::ContextIncidenceReportExt;
use crate::log::{set_log_level, set_module_filters, LevelFilter};
use crate::parameters::Parameters;
use crate::population::DEFAULT_POPULATION_SIZE;
use crate::report::ContextReportExt;
use crate::schedule::DEFAULT_HORIZON;

/// Default cli arguments for the outbreak runner
#[derive(Args, Debug, Clone)]
pub struct BaseArgs {
    /// Random seed
    #[arg(short, long, default_value = "0")]
    pub random_seed: u64,

    /// Optional path to a JSON parameters file; the COVID-19 preset is used otherwise
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of individuals
    #[arg(short, long, default_value_t = DEFAULT_POPULATION_SIZE)]
    pub population: usize,

    /// Last day to simulate
    #[arg(long, default_value_t = DEFAULT_HORIZON)]
    pub horizon: u32,

    /// Optional path for report output
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Optional prefix for report file names
    #[arg(long)]
    pub file_prefix: Option<String>,

    /// Overwrite existing report files
    #[arg(short, long)]
    pub force_overwrite: bool,

    /// Enable logging at LEVEL, or per module with `module=LEVEL,...`
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Do not write any reports
    #[arg(long)]
    pub no_reports: bool,
}

impl Default for BaseArgs {
    fn default() -> Self {
        BaseArgs {
            random_seed: 0,
            config: None,
            population: DEFAULT_POPULATION_SIZE,
            horizon: DEFAULT_HORIZON,
            output_dir: None,
            file_prefix: None,
            force_overwrite: false,
            log_level: None,
            no_reports: false,
        }
    }
}

fn create_outbreak_cli() -> Command {
    let cli = Command::new("outbreak");
    BaseArgs::augment_args(cli)
}

fn parse_level(level: &str) -> Result<LevelFilter, OutbreakError> {
    LevelFilter::from_str(level.trim())
        .map_err(|_| OutbreakError::InvalidConfiguration(format!("unknown log level: {level}")))
}

/// Applies a `--log-level` value: either a single level for everything, or a comma separated
/// list of `module=LEVEL` pairs.
fn apply_log_level(spec: &str) -> Result<(), OutbreakError> {
    if !spec.contains('=') {
        set_log_level(parse_level(spec)?);
        return Ok(());
    }

    let mut filters = Vec::new();
    for part in spec.split(',').filter(|part| !part.trim().is_empty()) {
        let (module, level) = part.split_once('=').ok_or_else(|| {
            OutbreakError::InvalidConfiguration(format!("expected module=LEVEL, got {part}"))
        })?;
        filters.push((module.trim(), parse_level(level)?));
    }
    set_module_filters(&filters);
    Ok(())
}

/// Runs a simulation with the command line arguments of this process.
///
/// # Parameters
/// - `setup_fn`: A function that takes a mutable reference to the `Context` and the parsed
///   `BaseArgs`. It runs after the reports are added and before the run is initialized.
///
/// # Errors
/// Returns an error if argument parsing, the setup function or the run fails
pub fn run_with_args<F>(setup_fn: F) -> Result<Context, Box<dyn std::error::Error>>
where
    F: FnOnce(&mut Context, &BaseArgs) -> Result<(), OutbreakError>,
{
    let cli = create_outbreak_cli();
    let matches = cli.get_matches();

    let base_args_matches = BaseArgs::from_arg_matches(&matches)?;
    run_with_args_internal(base_args_matches, setup_fn)
}

/// Runs a simulation with already parsed arguments and returns the finished `Context`.
///
/// # Errors
/// Returns an error if the parameters cannot be loaded, a report cannot be created, the setup
/// function fails, or the run fails
pub fn run_with_args_internal<F>(
    args: BaseArgs,
    setup_fn: F,
) -> Result<Context, Box<dyn std::error::Error>>
where
    F: FnOnce(&mut Context, &BaseArgs) -> Result<(), OutbreakError>,
{
    if let Some(level) = &args.log_level {
        apply_log_level(level)?;
    }

    // Instantiate a context
    let mut context = Context::new();

    let parameters = match &args.config {
        Some(path) => {
            info!("Loading parameters from: {}", path.display());
            Parameters::from_json_file(path)?
        }
        None => Parameters::covid19(),
    };

    if !args.no_reports {
        let report_options = context.report_options();
        if let Some(output_dir) = &args.output_dir {
            report_options.directory(output_dir.clone());
        }
        if let Some(prefix) = &args.file_prefix {
            report_options.file_prefix(prefix);
        }
        report_options.overwrite(args.force_overwrite);
        context.add_standard_reports()?;
    }

    // Run the provided Fn
    setup_fn(&mut context, &args)?;

    context.init_simulation(
        parameters,
        SimulationOptions {
            population_size: args.population,
            horizon: args.horizon,
            random_seed: args.random_seed,
        },
    )?;
    context.run_to_horizon()?;
    Ok(context)
}
