//! Fits the BRDF models to directional reflectance tables and reports the
//! goodness of fit of every (file, band, model).
#![warn(clippy::all, rust_2021_compatibility)]

mod config;
mod report;

use base::{
    cli::{self, CommonArgs},
    error::BrdfitError,
    io::read_dataset,
    Band,
};
use bxdf::{fitting::fit_dataset, model::BrdfModel};
use config::Config;
use report::{report_rows, write_console_report, write_rows, OutputFormat};
use std::{path::PathBuf, process::ExitCode};

/// brdfit command line interface arguments.
#[derive(clap::Parser, Debug, Clone)]
#[clap(
    author,
    version,
    about = "Fits BRDF models to directional surface reflectance."
)]
pub struct CliArgs {
    /// Logging and verbosity options.
    #[command(flatten)]
    pub common: CommonArgs,

    /// Observation tables to fit.
    #[clap(required = true, help = "CSV files with the observation geometry and reflectance")]
    pub files: Vec<PathBuf>,

    /// Models to fit.
    #[clap(
        short,
        long,
        value_enum,
        value_delimiter = ',',
        help = "Models to fit [default: all]"
    )]
    pub models: Vec<BrdfModel>,

    /// Bands to fit.
    #[clap(
        short,
        long,
        value_enum,
        value_delimiter = ',',
        help = "Bands to fit [default: all]"
    )]
    pub bands: Vec<Band>,

    /// Evaluation budget of the nonlinear solver.
    #[clap(long, help = "Maximum number of model evaluations per nonlinear fit")]
    pub max_evaluations: Option<usize>,

    /// Fit the (band, model) pairs in parallel.
    #[clap(long, help = "Fit the band/model pairs in parallel")]
    pub parallel: bool,

    /// Path to the configuration file.
    #[clap(short, long, help = "Path to the configuration file")]
    pub config: Option<PathBuf>,

    /// Path of the structured output.
    #[clap(short, long, help = "Write the results to this file")]
    pub output: Option<PathBuf>,

    /// Format of the structured output.
    #[clap(long, value_enum, default_value_t = OutputFormat::Csv, help = "Format of the output file")]
    pub format: OutputFormat,
}

fn main() -> ExitCode {
    let (args, launch_time) = cli::parse_args::<CliArgs>("brdfit");
    cli::setup_logging(
        args.common.log_timestamp.then_some(launch_time),
        args.common.effective_log_level(),
        &[],
    );

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        },
    }
}

fn run(args: &CliArgs) -> Result<(), BrdfitError> {
    let mut config = Config::load_config(args.config.as_deref())?;
    if let Some(max_evaluations) = args.max_evaluations {
        config.fitting.max_evaluations = max_evaluations;
    }
    config.fitting.parallel |= args.parallel;

    let models = if args.models.is_empty() {
        BrdfModel::ALL.to_vec()
    } else {
        args.models.clone()
    };
    let bands = if args.bands.is_empty() {
        Band::ALL.to_vec()
    } else {
        args.bands.clone()
    };

    let mut rows = Vec::new();
    for file in &args.files {
        let dataset = read_dataset(file, &config.columns).map_err(|err| {
            BrdfitError::from_read_dataset_error(
                err,
                format!("Failed to read observations from {}", file.display()),
            )
        })?;
        log::info!("Fitting {} observations from {}", dataset.len(), file.display());
        let report = fit_dataset(&dataset, &bands, &models, &config.fitting);
        if !args.common.quiet {
            let stdout = std::io::stdout();
            write_console_report(&mut stdout.lock(), file, &report).map_err(|err| {
                BrdfitError::from_io_error(err, "Failed to print the report")
            })?;
        }
        rows.extend(report_rows(file, &report));
    }

    if let Some(path) = &args.output {
        write_rows(path, args.format, &rows)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_model_and_band_lists() {
        let args = CliArgs::parse_from([
            "brdfit",
            "--models",
            "RTLSR,Original_RPV",
            "--bands",
            "nir",
            "--max-evaluations",
            "1000",
            "a.csv",
            "b.csv",
        ]);
        assert_eq!(args.models, vec![BrdfModel::Rtlsr, BrdfModel::OriginalRpv]);
        assert_eq!(args.bands, vec![Band::Nir]);
        assert_eq!(args.max_evaluations, Some(1000));
        assert_eq!(args.files.len(), 2);
        assert_eq!(args.format, OutputFormat::Csv);
    }

    #[test]
    fn files_are_required() {
        assert!(CliArgs::try_parse_from(["brdfit"]).is_err());
    }
}
