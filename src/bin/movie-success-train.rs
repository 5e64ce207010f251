//! Trains the pre-release success model and publishes the artifact bundle.

use std::path::PathBuf;

use movie_success::config::TrainingConfig;
use movie_success::logging;
use movie_success::training::{self, TRAINING_LOG_FILE_NAME};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let mut config = match &options.config {
        Some(path) => TrainingConfig::load_from_path(path).map_err(|err| err.to_string())?,
        None => TrainingConfig::default(),
    };
    options.apply(&mut config);
    let config = config.normalized();

    std::fs::create_dir_all(&config.output_dir).map_err(|err| {
        format!(
            "Failed to create output directory {}: {err}",
            config.output_dir.display()
        )
    })?;
    logging::init_with_file(&config.output_dir.join(TRAINING_LOG_FILE_NAME))
        .map_err(|err| err.to_string())?;

    let summary = training::run(&config).map_err(|err| {
        tracing::error!("Training failed: {err}");
        err.to_string()
    })?;
    println!(
        "Model bundle: {} (blake3 {})",
        summary.serving_bundle.path.display(),
        summary.serving_bundle.digest
    );
    Ok(())
}

#[derive(Debug, Default)]
struct CliOptions {
    config: Option<PathBuf>,
    dataset: Option<PathBuf>,
    out: Option<PathBuf>,
    serving_dir: Option<PathBuf>,
    seed: Option<u64>,
    trees: Option<usize>,
}

impl CliOptions {
    /// Flags win over the config file.
    fn apply(&self, config: &mut TrainingConfig) {
        if let Some(dataset) = &self.dataset {
            config.dataset = dataset.clone();
        }
        if let Some(out) = &self.out {
            config.output_dir = out.clone();
        }
        if let Some(dir) = &self.serving_dir {
            config.serving_dir = Some(dir.clone());
        }
        if let Some(seed) = self.seed {
            config.forest.seed = seed;
            config.evaluation.split_seed = seed;
            config.evaluation.cv_seed = seed;
        }
        if let Some(trees) = self.trees {
            config.forest.n_trees = trees;
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--config" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--config requires a value".to_string())?;
                options.config = Some(PathBuf::from(value));
            }
            "--dataset" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--dataset requires a value".to_string())?;
                options.dataset = Some(PathBuf::from(value));
            }
            "--out" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--out requires a value".to_string())?;
                options.out = Some(PathBuf::from(value));
            }
            "--serving-dir" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--serving-dir requires a value".to_string())?;
                options.serving_dir = Some(PathBuf::from(value));
            }
            "--seed" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--seed requires a value".to_string())?;
                options.seed = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("Invalid --seed value: {value}"))?,
                );
            }
            "--trees" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--trees requires a value".to_string())?;
                let trees = value
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid --trees value: {value}"))?;
                if trees == 0 {
                    return Err("--trees must be at least 1".to_string());
                }
                options.trees = Some(trees);
            }
            unknown => {
                return Err(format!("Unknown argument: {unknown}\n\n{}", help_text()));
            }
        }
        idx += 1;
    }
    Ok(options)
}

fn help_text() -> String {
    [
        "movie-success-train",
        "",
        "Trains the pre-release movie success random forest and publishes the model bundle.",
        "",
        "Usage:",
        "  movie-success-train [--config train.toml] [options]",
        "",
        "Options:",
        "  --config <file>       TOML training config; flags below override it.",
        "  --dataset <csv>       Labeled dataset (default: data/clean_movies_features.csv).",
        "  --out <dir>           Output directory for the log, importances and bundle (default: output).",
        "  --serving-dir <dir>   Directory the prediction service reads (default: app models dir).",
        "  --seed <u64>          Seed for the forest, split and folds (default: 42).",
        "  --trees <n>           Number of trees (default: 100).",
    ]
    .join("\n")
}
