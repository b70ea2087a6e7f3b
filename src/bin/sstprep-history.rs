//! Convert a training-history JSON file into a chart description.

use std::path::PathBuf;

use sstprep::history::{TrainingHistory, render_history};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let bytes = std::fs::read(&options.history)
        .map_err(|err| format!("Read {}: {err}", options.history.display()))?;
    let history: TrainingHistory = serde_json::from_slice(&bytes)
        .map_err(|err| format!("Parse {}: {err}", options.history.display()))?;
    let spec = render_history(&history, &options.loss, &options.metric)
        .map_err(|err| err.to_string())?;
    let json = serde_json::to_string_pretty(&spec).map_err(|err| err.to_string())?;
    println!("{json}");
    Ok(())
}

#[derive(Debug, Clone)]
struct CliOptions {
    history: PathBuf,
    loss: String,
    metric: String,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut history: Option<PathBuf> = None;
    let mut loss = "loss".to_string();
    let mut metric = "accuracy".to_string();

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--history" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--history requires a value".to_string())?;
                history = Some(PathBuf::from(value));
            }
            "--loss" => {
                idx += 1;
                loss = args
                    .get(idx)
                    .ok_or_else(|| "--loss requires a value".to_string())?
                    .clone();
            }
            "--metric" => {
                idx += 1;
                metric = args
                    .get(idx)
                    .ok_or_else(|| "--metric requires a value".to_string())?
                    .clone();
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    let history = history.ok_or_else(help_text)?;
    Ok(CliOptions {
        history,
        loss,
        metric,
    })
}

fn help_text() -> String {
    [
        "sstprep-history",
        "",
        "Describes loss/metric training curves (and their val_ counterparts) as JSON.",
        "",
        "Usage:",
        "  sstprep-history --history <file.json> [--loss loss] [--metric accuracy]",
    ]
    .join("\n")
}
