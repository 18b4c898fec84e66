//! Certwatch CLI
//!
//! - `certwatch validate <path>`: schema-check an artifact, print `OK` or
//!   `INVALID: ...` (exit 0 / 1; usage errors exit 2)
//! - `certwatch samples`: write the sample artifact set
//! - `certwatch replay <csv>`: run a run log through the pipeline and
//!   publish the anomaly log and dashboard snapshot

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};

use certwatch_core::constants::ENV_SCHEMA_DIR;
use certwatch_core::{
    codec, samples, ArtifactKind, ArtifactSink, Pipeline, PipelineConfig, PipelineError,
    SchemaValidator,
};

#[derive(Parser)]
#[command(name = "certwatch", version, about = "Verification run telemetry tools")]
struct Cli {
    /// Directory holding schema documents (defaults to the bundled schemas)
    #[arg(long, global = true, env = ENV_SCHEMA_DIR)]
    schema_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate an artifact against its schema
    Validate {
        path: PathBuf,

        #[arg(long, value_enum, default_value_t = KindArg::Auto)]
        kind: KindArg,
    },

    /// Write sample artifacts (honors SOURCE_DATE_EPOCH)
    Samples {
        #[arg(long, default_value = "out")]
        out: PathBuf,
    },

    /// Replay a run log and publish anomalies + dashboard snapshot
    Replay {
        csv: PathBuf,

        #[arg(long, default_value = "out")]
        out: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Auto,
    Csv,
    Run,
    Anomalies,
    Snapshot,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let validator = match load_validator(cli.schema_dir.as_deref()) {
        Ok(v) => Arc::new(v),
        Err(e) => {
            eprintln!("init validator: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::Validate { path, kind } => return validate(&path, kind, &validator),
        Command::Samples { out } => run_samples(out, validator),
        Command::Replay { csv, out } => replay(&csv, out, validator),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_validator(dir: Option<&Path>) -> Result<SchemaValidator, PipelineError> {
    match dir {
        Some(dir) => SchemaValidator::from_dir(dir),
        None => SchemaValidator::bundled(),
    }
}

fn validate(path: &Path, kind: KindArg, validator: &SchemaValidator) -> ExitCode {
    let kind = match kind {
        KindArg::Auto => match ArtifactKind::infer(path) {
            Some(kind) => kind,
            None => {
                eprintln!(
                    "cannot infer artifact kind of {:?}; pass --kind",
                    path.file_name().unwrap_or_default()
                );
                return ExitCode::from(2);
            }
        },
        KindArg::Csv => ArtifactKind::RunRow,
        KindArg::Run => ArtifactKind::RunDocument,
        KindArg::Anomalies => ArtifactKind::AnomalyLine,
        KindArg::Snapshot => ArtifactKind::Snapshot,
    };

    let payload = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("read {}: {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    match validator.validate(&payload, kind) {
        Ok(()) => {
            println!("OK");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("INVALID: {} ({})", path.display(), e.kind);
            for violation in &e.violations {
                eprintln!("  {}", violation);
            }
            ExitCode::FAILURE
        }
    }
}

fn run_samples(out: PathBuf, validator: Arc<SchemaValidator>) -> Result<(), PipelineError> {
    let config = PipelineConfig::from_env()?;
    let clock = config.clock();
    for path in samples::write_samples(out, clock.as_ref(), validator)? {
        println!("{}", path.display());
    }
    println!("OK: wrote sample artifacts");
    Ok(())
}

fn replay(csv: &Path, out: PathBuf, validator: Arc<SchemaValidator>) -> Result<(), PipelineError> {
    let text = std::fs::read_to_string(csv)?;
    let rows = codec::parse_csv_rows(&text)?;

    let sink = ArtifactSink::new(out, validator.clone())?;
    let pipeline = Pipeline::new(PipelineConfig::from_env()?)?.with_validator(validator);

    let summary = pipeline.replay_rows(rows)?;
    let history = pipeline.history();
    sink.write_run_log(history.runs())?;
    sink.write_anomaly_log(history.anomalies())?;
    let snapshot = pipeline.publish_snapshot()?;
    sink.write_snapshot(&snapshot)?;

    println!(
        "replayed {} run(s), {} rejected, {} anomalies -> {}",
        summary.accepted,
        summary.rejected,
        summary.anomalies,
        sink.dir().display()
    );
    Ok(())
}
