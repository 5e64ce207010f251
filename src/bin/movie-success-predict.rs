//! Predicts pre-release success for a JSON request using the published model bundle.

use std::io::Read;
use std::path::PathBuf;

use movie_success::app_dirs;
use movie_success::inference::{PredictionRequest, PredictionService, sample_requests};
use movie_success::logging;
use movie_success::training::BUNDLE_FILE_NAME;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    if options.samples {
        return print_json(&sample_requests());
    }
    logging::init_stderr().map_err(|err| err.to_string())?;

    let model_path = match options.model {
        Some(path) => path,
        None => app_dirs::models_dir()
            .map_err(|err| err.to_string())?
            .join(BUNDLE_FILE_NAME),
    };
    let service = PredictionService::load(&model_path).map_err(|err| err.to_string())?;
    if options.status {
        return print_json(&service.status());
    }

    let text = match &options.request {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|err| format!("Failed to read request {}: {err}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|err| format!("Failed to read request from stdin: {err}"))?;
            buf
        }
    };
    let request = PredictionRequest::from_json(&text).map_err(|err| err.to_string())?;
    request.validate_required().map_err(|err| err.to_string())?;
    let result = service.predict(&request).map_err(|err| err.to_string())?;
    print_json(&result)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| format!("Failed to encode output: {err}"))?;
    println!("{text}");
    Ok(())
}

#[derive(Debug, Default)]
struct CliOptions {
    model: Option<PathBuf>,
    request: Option<PathBuf>,
    status: bool,
    samples: bool,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--model" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--model requires a value".to_string())?;
                options.model = Some(PathBuf::from(value));
            }
            "--request" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--request requires a value".to_string())?;
                options.request = Some(PathBuf::from(value));
            }
            "--status" => options.status = true,
            "--samples" => options.samples = true,
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
        "movie-success-predict",
        "",
        "Predicts whether a movie will succeed from attributes known before release.",
        "Reads one JSON request (title and budget required) and prints the result as JSON.",
        "",
        "Usage:",
        "  movie-success-predict [--model <file>] [--request <file.json>]",
        "  movie-success-predict --status",
        "  movie-success-predict --samples",
        "",
        "Options:",
        "  --model <file>        Model bundle (default: pre_release_rf_model.json in the app models dir).",
        "  --request <file>      Request JSON (default: stdin).",
        "  --status              Print the loaded model's status block.",
        "  --samples             Print example requests.",
    ]
    .join("\n")
}
