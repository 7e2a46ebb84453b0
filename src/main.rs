use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use feadataset::{
    render_summary, BatchDriver, BatchError, ExportedResultProvider, HarvestConfig, OutputError,
    QuantityKind, RunSummary,
};
use tracing_subscriber::EnvFilter;

/// Extract per-step displacement, stress and reaction force aggregates from
/// every result file beneath a project tree into one CSV dataset.
#[derive(Parser, Debug)]
#[command(name = "feadataset", version, about)]
struct Cli {
    /// Directory containing the project folders.
    root: PathBuf,

    /// Destination of the dataset.
    #[arg(short, long, default_value = "fea_dataset.csv")]
    output: PathBuf,

    /// JSON configuration file; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory name beneath which result files are searched.
    #[arg(long)]
    marker: Option<String>,

    /// Extension of result files.
    #[arg(long)]
    extension: Option<String>,

    /// Accept result files outside marker directories.
    #[arg(long)]
    anywhere: bool,

    /// Quantities to extract.
    #[arg(long, value_enum, value_delimiter = ',')]
    quantities: Vec<QuantityArg>,

    /// Number of artifacts processed concurrently.
    #[arg(long)]
    workers: Option<usize>,

    /// Time limit for one artifact, in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Use steps 1..=N instead of the step axis reported by the provider.
    #[arg(long)]
    steps: Option<usize>,

    /// Also write one row per node and step to this file.
    #[arg(long)]
    nodal: Option<PathBuf>,

    /// Column delimiter.
    #[arg(long)]
    delimiter: Option<char>,

    /// Decimal separator.
    #[arg(long)]
    decimal: Option<char>,

    /// Do not write a header-only file when no rows were produced.
    #[arg(long)]
    skip_empty: bool,

    /// Log every step.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum QuantityArg {
    Displacement,
    Stress,
    ReactionForce,
}

impl From<QuantityArg> for QuantityKind {
    fn from(value: QuantityArg) -> Self {
        match value {
            QuantityArg::Displacement => QuantityKind::Displacement,
            QuantityArg::Stress => QuantityKind::Stress,
            QuantityArg::ReactionForce => QuantityKind::ReactionForce,
        }
    }
}

impl Cli {
    /// Load the configuration file, if any, and apply the flags on top.
    fn harvest_config(&self) -> Result<HarvestConfig> {
        let mut config = match &self.config {
            Some(path) => HarvestConfig::from_json_file(path)?,
            None => HarvestConfig::default(),
        };
        if let Some(marker) = &self.marker {
            config.marker.clone_from(marker);
        }
        if let Some(extension) = &self.extension {
            config.extension.clone_from(extension);
        }
        if self.anywhere {
            config.require_marker = false;
        }
        if !self.quantities.is_empty() {
            config.quantities = self.quantities.iter().copied().map(Into::into).collect();
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(timeout) = self.timeout_secs {
            config.artifact_timeout_secs = timeout;
        }
        if self.steps.is_some() {
            config.forced_step_count = self.steps;
        }
        if let Some(delimiter) = self.delimiter {
            config.csv.delimiter = delimiter;
        }
        if let Some(decimal) = self.decimal {
            config.csv.decimal_separator = decimal;
        }
        if self.skip_empty {
            config.write_empty = false;
        }
        Ok(config)
    }
}

/// Exit status of a failed run that could not write its output.
const OUTPUT_FAILURE: u8 = 1;
/// Exit status of a run rejected before any work started.
const CONFIG_FAILURE: u8 = 2;

/// Exit status for an error that ended the run.
///
/// Output failures map to 1 and everything else, which can only be a
/// configuration problem, to 2.
fn exit_status(error: &anyhow::Error) -> u8 {
    let output_failure = matches!(error.downcast_ref::<BatchError>(), Some(BatchError::Output(_)))
        || error.downcast_ref::<OutputError>().is_some();
    if output_failure {
        OUTPUT_FAILURE
    } else {
        CONFIG_FAILURE
    }
}

fn run(cli: &Cli) -> Result<RunSummary> {
    let config = cli.harvest_config()?;
    tracing::info!(root = %cli.root.display(), marker = %config.marker, "Starting extraction");
    let driver = BatchDriver::new(ExportedResultProvider::new(), config)
        .with_nodal_export(cli.nodal.is_some());
    let summary = driver
        .run_to_file(&cli.root, &cli.output, cli.nodal.as_deref())
        .context("extraction run failed")?;
    Ok(summary)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "feadataset=debug"
    } else {
        "feadataset=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(summary) => {
            println!("{}", render_summary(&summary));
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(exit_status(&error))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use feadataset::ConfigError;
    use std::path::Path;

    fn write_failure() -> OutputError {
        OutputError::WriteFailure {
            path: PathBuf::from("/read-only/dataset.csv"),
            source: csv::Error::from(std::io::Error::from(std::io::ErrorKind::PermissionDenied)),
        }
    }

    #[test]
    fn unreadable_root_exits_with_configuration_status() {
        let error = anyhow::Error::from(BatchError::Config(ConfigError::UnreadableRoot {
            path: PathBuf::from("/missing"),
            source: None,
        }))
        .context("extraction run failed");
        assert_eq!(exit_status(&error), CONFIG_FAILURE);
    }

    #[test]
    fn write_failure_exits_with_output_status() {
        let error = anyhow::Error::from(BatchError::Output(write_failure()))
            .context("extraction run failed");
        assert_eq!(exit_status(&error), OUTPUT_FAILURE);

        let bare = anyhow::Error::from(write_failure());
        assert_eq!(exit_status(&bare), OUTPUT_FAILURE);
    }

    #[test]
    fn bad_configuration_file_exits_with_configuration_status() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let cli = Cli::parse_from([
            "feadataset",
            dir.path().to_str().expect("utf-8 temp path"),
            "--config",
            dir.path()
                .join("absent.json")
                .to_str()
                .expect("utf-8 temp path"),
        ]);
        let error = run(&cli).expect_err("missing configuration file rejected");
        assert_eq!(exit_status(&error), CONFIG_FAILURE);
        assert_eq!(exit_status(&anyhow!("invalid setting")), CONFIG_FAILURE);
    }

    #[test]
    fn empty_tree_is_a_successful_run() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let output = dir.path().join("dataset.csv");
        let cli = Cli::parse_from([
            Path::new("feadataset"),
            dir.path(),
            Path::new("--output"),
            output.as_path(),
        ]);
        let summary = run(&cli).expect("empty run succeeds");
        assert_eq!(summary.rows, 0);
        assert!(output.exists());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "feadataset",
            "projects",
            "--anywhere",
            "--quantities",
            "displacement,stress",
            "--workers",
            "3",
            "--delimiter",
            ",",
        ]);
        let config = cli.harvest_config().expect("configuration builds");
        assert!(!config.require_marker);
        assert_eq!(
            config.quantities,
            vec![QuantityKind::Displacement, QuantityKind::Stress]
        );
        assert_eq!(config.workers, 3);
        assert_eq!(config.csv.delimiter, ',');
    }
}
