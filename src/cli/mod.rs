// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// All business logic is delegated to Layer 2 (application).
//
//   heart-mlops [--config pipeline.toml] [--workdir DIR] <command>
//
//   ingest    [--url URL | --input FILE]
//   profile
//   transform
//   train     [--model NAME]...
//   evaluate  [--metric METRIC] [--stage STAGE]
//   pipeline  [--url URL | --input FILE] [--model NAME]... [--metric ..] [--stage ..]
//   serve     [--host HOST] [--port PORT]

pub mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::application::config::PipelineConfig;
use crate::infra::tracking::FileTracker;
use commands::{Commands, PipelineArgs, SourceArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "heart-mlops",
    version,
    about = "Train, track, promote and serve a heart-disease classifier."
)]
pub struct Cli {
    /// TOML file overriding the default pipeline configuration
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Resolve every relative configured path against this directory
    #[arg(long, global = true)]
    pub workdir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Build the effective configuration from `--config` and `--workdir`.
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let config = match &self.config {
            Some(path) => PipelineConfig::load(path)?,
            None       => PipelineConfig::default(),
        };
        Ok(match &self.workdir {
            Some(dir) => config.relative_to(dir),
            None      => config,
        })
    }

    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self, mut config: PipelineConfig) -> Result<()> {
        match self.command {
            Commands::Ingest(args)   => run_ingest(&config, args),
            Commands::Profile        => run_profile(&config),
            Commands::Transform      => run_transform(&config),
            Commands::Train(args)    => run_train(&config, &args),
            Commands::Evaluate(args) => {
                args.apply(&mut config)?;
                run_evaluate(&config)
            }
            Commands::Pipeline(args) => {
                args.evaluate.apply(&mut config)?;
                run_pipeline(&config, args)
            }
            Commands::Serve(args)    => {
                args.apply(&mut config);
                run_serve(&config)
            }
        }
    }
}

fn tracker(config: &PipelineConfig) -> Result<FileTracker> {
    FileTracker::new(&config.tracking_dir).with_context(|| {
        format!("Cannot open tracking store '{}'", config.tracking_dir.display())
    })
}

fn run_ingest(config: &PipelineConfig, args: SourceArgs) -> Result<()> {
    use crate::application::ingest_use_case::IngestUseCase;

    let path = IngestUseCase::new(config, args.into_source(config)).execute()?;
    println!("Cleaned data written to {}", path.display());
    Ok(())
}

fn run_profile(config: &PipelineConfig) -> Result<()> {
    use crate::application::profile_use_case::ProfileUseCase;

    for path in ProfileUseCase::new(config).execute()? {
        println!("Report written to {}", path.display());
    }
    Ok(())
}

fn run_transform(config: &PipelineConfig) -> Result<()> {
    use crate::application::transform_use_case::TransformUseCase;

    let preprocessor = TransformUseCase::new(config).execute()?;
    println!(
        "Transformed data ({} features) written to {}",
        preprocessor.output_width(),
        config.transformed_data_path.display()
    );
    Ok(())
}

fn run_train(config: &PipelineConfig, args: &TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    let tracker = tracker(config)?;
    let mut train = TrainUseCase::new(config, &tracker);
    if let Some(candidates) = args.candidates()? {
        train = train.with_candidates(candidates);
    }
    for s in train.execute()? {
        println!(
            "{:<20} run {}  accuracy {:.4}  precision {:.4}  recall {:.4}  roc_auc {:.4}",
            s.kind.run_name(), s.run_id, s.report.accuracy, s.report.precision, s.report.recall, s.report.roc_auc,
        );
    }
    Ok(())
}

fn run_evaluate(config: &PipelineConfig) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let tracker = tracker(config)?;
    let p = EvaluateUseCase::new(config, &tracker).execute()?;
    print_promotion(config, &p);
    Ok(())
}

fn run_pipeline(config: &PipelineConfig, args: PipelineArgs) -> Result<()> {
    use crate::application::pipeline_use_case::PipelineUseCase;

    let tracker = tracker(config)?;
    let mut pipeline = PipelineUseCase::new(config, &tracker);
    if let Some(candidates) = args.train.candidates()? {
        pipeline = pipeline.with_candidates(candidates);
    }
    let p = pipeline.execute(args.source.into_source(config))?;
    print_promotion(config, &p);
    Ok(())
}

fn run_serve(config: &PipelineConfig) -> Result<()> {
    use crate::infra::artifact_store::ArtifactStore;
    use crate::ml::inferencer::Inferencer;

    // Both artifacts are loaded before any socket is bound.
    let store = ArtifactStore::new(&config.models_dir);
    let inferencer = Inferencer::from_artifacts(&store.best_model_path(), &store.preprocessor_path())
        .context("Refusing to start the server; run the pipeline first")?;

    let runtime = tokio::runtime::Runtime::new().context("Cannot start the async runtime")?;
    runtime.block_on(crate::serve::run(&config.host, config.port, inferencer))
}

fn print_promotion(config: &PipelineConfig, p: &crate::application::evaluate_use_case::Promotion) {
    println!(
        "Best run: {} ({}) with {} {:.4}",
        p.run_name, p.run_id, config.selection_metric, p.metric_value
    );
    println!("Exported to {}", p.exported_to.display());
    println!(
        "Registered {} version {} in stage {}",
        p.version.name, p.version.version, p.version.current_stage
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_flags() {
        let cli = Cli::try_parse_from(["heart-mlops", "serve", "--port", "9000"]).unwrap();
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.port, Some(9000));
                assert_eq!(args.host, None);
            }
            other => panic!("expected serve, got {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["heart-mlops", "train", "--workdir", "/srv/heart"]).unwrap();
        let config = cli.pipeline_config().unwrap();
        assert_eq!(config.models_dir, PathBuf::from("/srv/heart/models"));
    }

    #[test]
    fn test_pipeline_accepts_stage_flags_together() {
        let cli = Cli::try_parse_from([
            "heart-mlops", "pipeline", "--input", "heart.data", "--model", "Random_Forest", "--metric", "accuracy",
        ])
        .unwrap();
        match cli.command {
            Commands::Pipeline(args) => {
                assert_eq!(args.source.input, Some(PathBuf::from("heart.data")));
                assert_eq!(args.train.models, vec!["Random_Forest".to_string()]);
                assert_eq!(args.evaluate.metric.as_deref(), Some("accuracy"));
            }
            other => panic!("expected pipeline, got {other:?}"),
        }
    }

    #[test]
    fn test_url_and_input_conflict() {
        let res = Cli::try_parse_from(["heart-mlops", "ingest", "--url", "http://x", "--input", "a.data"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_serve_refuses_without_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::default().relative_to(dir.path());
        let err = run_serve(&config).unwrap_err();
        assert!(format!("{err:#}").contains("artifact not found"));
    }
}
