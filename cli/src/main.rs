//! deeptype: identify content types from the command line.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use deeptype_core::{ScanResult, Scanner, Status};

/// Determines the content type of files with deep learning.
#[derive(Parser)]
#[command(name = "deeptype", version, arg_required_else_help = true)]
struct Flags {
    /// Paths to the files to identify.
    ///
    /// Use a dash (-) to read from standard input (can only be used once).
    path: Vec<PathBuf>,

    /// Identify files within directories instead of the directories
    /// themselves.
    #[arg(short, long)]
    recursive: bool,

    /// Identify symbolic links as is instead of following them.
    #[arg(long)]
    no_dereference: bool,

    /// Print results as a JSON array.
    #[arg(long, conflicts_with = "jsonl")]
    json: bool,

    /// Print one JSON object per line.
    #[arg(long)]
    jsonl: bool,

    /// Print the prediction score in addition to the content type.
    #[arg(short = 's', long)]
    output_score: bool,

    /// Print the MIME type instead of the content type description.
    #[arg(short = 'i', long, conflicts_with = "label")]
    mime_type: bool,

    /// Print the bare label instead of the content type description.
    #[arg(short, long)]
    label: bool,

    /// Model directory containing config.json and model.onnx.
    #[arg(long, env = "DEEPTYPE_MODEL_DIR", default_value = "models/standard-v1")]
    model_dir: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let flags = Flags::parse();
    if flags
        .path
        .iter()
        .filter(|path| path.as_os_str() == "-")
        .count()
        > 1
    {
        bail!("only one path can be the standard input");
    }

    let scanner = Scanner::shared(&flags.model_dir)
        .with_context(|| format!("cannot load model from {}", flags.model_dir.display()))?;
    tracing::debug!(
        "using model `{}` ({})",
        scanner.model_name(),
        deeptype_core::module_version()
    );

    // Depth-first over the requested paths, directories expanded in
    // sorted order when --recursive is set.
    let mut queue: Vec<PathBuf> = flags.path.clone();
    queue.reverse();
    let mut results = Vec::new();
    while let Some(path) = queue.pop() {
        if path.as_os_str() == "-" {
            let mut stdin = Vec::new();
            std::io::stdin()
                .read_to_end(&mut stdin)
                .context("cannot read standard input")?;
            results.push(scanner.identify_bytes(&stdin));
            continue;
        }
        if flags.recursive && path.is_dir() {
            match read_dir_sorted(&path) {
                Ok(mut entries) => {
                    entries.reverse();
                    queue.extend(entries);
                }
                Err(status) => results.push(ScanResult::error(path.display().to_string(), status)),
            }
            continue;
        }
        results.push(if flags.no_dereference {
            scanner.identify_path_no_dereference(&path)
        } else {
            scanner.identify_path(&path)
        });
    }

    if !flags.output_score {
        for result in &mut results {
            if let Some(prediction) = result.result.value.as_mut() {
                prediction.scores_map = None;
            }
        }
    }

    if flags.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if flags.jsonl {
        for result in &results {
            println!("{}", serde_json::to_string(result)?);
        }
    } else {
        for result in &results {
            println!("{}", human_line(result, &flags));
        }
    }

    if results.iter().any(|result| !result.is_ok()) {
        std::process::exit(1);
    }
    Ok(())
}

/// List a directory's entries in path order.
fn read_dir_sorted(path: &std::path::Path) -> std::result::Result<Vec<PathBuf>, Status> {
    let entries = std::fs::read_dir(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Status::FileNotFoundError,
        std::io::ErrorKind::PermissionDenied => Status::PermissionError,
        _ => Status::Unknown,
    })?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .collect();
    paths.sort();
    Ok(paths)
}

fn human_line(result: &ScanResult, flags: &Flags) -> String {
    let mut line = format!("{}: ", result.path);
    match result.prediction() {
        None => line.push_str(&format!("error ({})", result.status().as_str())),
        Some(prediction) => {
            if flags.mime_type {
                line.push_str(&prediction.output.mime_type);
            } else if flags.label {
                line.push_str(prediction.output.label.as_str());
            } else {
                line.push_str(&format!(
                    "{} ({})",
                    prediction.output.description, prediction.output.group
                ));
            }
            if flags.output_score {
                line.push_str(&format!(" {}%", (100.0 * prediction.score).trunc()));
            }
        }
    }
    line
}
