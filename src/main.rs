use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use fbms_oracle::{DataSplit, OracleConfig, SequenceProcessor};

/// Relabel detector masks with FBMS ground-truth identities and write FBMS track files.
#[derive(Parser)]
#[command(name = "fbms-oracle", version)]
struct Cli {
    /// FBMS root containing TrainingSet/ and TestSet/
    fbms_root: PathBuf,

    /// Detection root, laid out like
    /// TrainingSet/<sequence>/<sequence>_<frame>.json, e.g.
    /// TrainingSet/bear01/bear01_0000.json
    detections_root: PathBuf,

    /// Output directory; one sub-directory per split is created
    output_dir: PathBuf,

    /// Splits to process
    #[arg(long = "set", value_enum, default_value_t = SetArg::All)]
    set: SetArg,

    /// Optional YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Extension of the detection files (overrides the config file)
    #[arg(long)]
    detection_extension: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum SetArg {
    Train,
    Test,
    All,
}

impl From<SetArg> for DataSplit {
    fn from(set: SetArg) -> Self {
        match set {
            SetArg::Train => DataSplit::Train,
            SetArg::Test => DataSplit::Test,
            SetArg::All => DataSplit::All,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fbms_oracle=info,warn")),
        )
        .compact()
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => OracleConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config {:?}", path))?,
        None => OracleConfig::default(),
    };
    if let Some(ext) = cli.detection_extension {
        config.detection_extension = ext;
    }

    let processor = SequenceProcessor::new(config)?;
    tracing::debug!(config = ?processor.config(), "loaded configuration");
    let reports = processor
        .process_dataset(&cli.fbms_root, &cli.detections_root, &cli.output_dir, cli.set.into())
        .context("Relabelling failed")?;

    for report in &reports {
        let tracks: usize = report.sequences.iter().map(|s| s.num_tracks).sum();
        tracing::info!(
            output = %report.output_dir.display(),
            sequences = report.sequences.len(),
            tracks,
            "split done"
        );
    }

    Ok(())
}
