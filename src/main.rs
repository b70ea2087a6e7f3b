//! Load the sentiment corpus, derive labels and batch it for training.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use sstprep::config::{self, PipelineConfig, SubsetSetting};
use sstprep::dataset::{
    Batch, BatchedDataset, CachedProvider, CorpusProvider, HfDatasetsServer, JsonlDirProvider,
    SplitCorpus, load_splits,
};
use sstprep::logging::{self, LogOptions};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let Some(options) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };
    let log_options = LogOptions {
        file: !options.no_log_file,
        ..LogOptions::default()
    };
    if let Err(err) = logging::init(&log_options) {
        eprintln!("Logging disabled: {err}");
    }

    let mut pipeline =
        config::load_or_default(options.config.as_deref()).map_err(|err| err.to_string())?;
    options.apply_overrides(&mut pipeline);

    if let Some(path) = &options.write_config {
        config::save_to_path(&pipeline, path).map_err(|err| err.to_string())?;
        println!("Wrote config to {}", path.display());
        return Ok(());
    }

    let provider = build_provider(&pipeline, options.from_dir.clone())?;
    let corpus_id = pipeline.corpus_id();
    let corpus = load_splits(&provider, &corpus_id).map_err(|err| err.to_string())?;
    println!(
        "{corpus_id}: train={} validation={} test={}",
        corpus.train.len(),
        corpus.validation.len(),
        corpus.test.len()
    );

    match options.mode {
        Mode::Flat => print_flat_summary(&corpus),
        Mode::Batched => {
            let load_options = pipeline.batched_load_options().map_err(|err| err.to_string())?;
            let (train, eval) = corpus.batched(&load_options).map_err(|err| err.to_string())?;
            print_batched_summary("train", &train);
            print_batched_summary("eval", &eval);
            if let Some(path) = &options.dump {
                dump_batches(path, &train, &eval)?;
                println!("Wrote batches to {}", path.display());
            }
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Flat,
    Batched,
}

#[derive(Debug, Clone, PartialEq)]
struct CliOptions {
    config: Option<PathBuf>,
    mode: Mode,
    from_dir: Option<PathBuf>,
    dataset_id: Option<String>,
    config_name: Option<String>,
    batch_size: Option<usize>,
    seed: Option<u64>,
    no_shuffle: bool,
    eval_subset: Option<SubsetSetting>,
    no_cache: bool,
    no_log_file: bool,
    dump: Option<PathBuf>,
    write_config: Option<PathBuf>,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            config: None,
            mode: Mode::Batched,
            from_dir: None,
            dataset_id: None,
            config_name: None,
            batch_size: None,
            seed: None,
            no_shuffle: false,
            eval_subset: None,
            no_cache: false,
            no_log_file: false,
            dump: None,
            write_config: None,
        }
    }
}

impl CliOptions {
    fn apply_overrides(&self, pipeline: &mut PipelineConfig) {
        if let Some(dataset_id) = &self.dataset_id {
            pipeline.corpus.dataset_id = dataset_id.clone();
        }
        if let Some(config_name) = &self.config_name {
            pipeline.corpus.config_name = config_name.clone();
        }
        for pool in [&mut pipeline.batching.train, &mut pipeline.batching.eval] {
            if let Some(batch_size) = self.batch_size {
                pool.batch_size = batch_size;
            }
            if let Some(seed) = self.seed {
                pool.seed = seed;
            }
            if self.no_shuffle {
                pool.shuffle = false;
            }
        }
        if let Some(subset) = self.eval_subset {
            pipeline.batching.eval.subset = subset;
        }
        if self.no_cache {
            pipeline.fetch.cache = false;
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<Option<CliOptions>, String> {
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        let arg = args[idx].as_str();
        let mut value = || -> Result<String, String> {
            idx += 1;
            args.get(idx)
                .cloned()
                .ok_or_else(|| format!("{arg} requires a value"))
        };
        match arg {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "--config" => options.config = Some(PathBuf::from(value()?)),
            "--mode" => {
                let raw = value()?;
                options.mode = match raw.as_str() {
                    "flat" => Mode::Flat,
                    "batched" => Mode::Batched,
                    _ => return Err(format!("Invalid --mode value: {raw}")),
                };
            }
            "--from" => options.from_dir = Some(PathBuf::from(value()?)),
            "--dataset" => options.dataset_id = Some(value()?),
            "--dataset-config" => options.config_name = Some(value()?),
            "--batch-size" => {
                let raw = value()?;
                let parsed = raw
                    .parse::<usize>()
                    .ok()
                    .filter(|size| *size > 0)
                    .ok_or_else(|| format!("Invalid --batch-size value: {raw}"))?;
                options.batch_size = Some(parsed);
            }
            "--seed" => {
                let raw = value()?;
                options.seed = Some(
                    raw.parse::<u64>()
                        .map_err(|_| format!("Invalid --seed value: {raw}"))?,
                );
            }
            "--no-shuffle" => options.no_shuffle = true,
            "--eval-subset" => {
                let raw = value()?;
                options.eval_subset = Some(match raw.as_str() {
                    "all" => SubsetSetting::All,
                    "training" => SubsetSetting::Training,
                    "validation" => SubsetSetting::Validation,
                    _ => return Err(format!("Invalid --eval-subset value: {raw}")),
                });
            }
            "--no-cache" => options.no_cache = true,
            "--no-log-file" => options.no_log_file = true,
            "--dump" => options.dump = Some(PathBuf::from(value()?)),
            "--write-config" => options.write_config = Some(PathBuf::from(value()?)),
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(Some(options))
}

fn help_text() -> String {
    [
        "sstprep",
        "",
        "Loads the SST sentiment corpus, binarizes scores at 0.5 and batches it for training.",
        "",
        "Usage:",
        "  sstprep [--mode flat|batched] [options]",
        "",
        "Options:",
        "  --config <file>          TOML config (default: <config dir>/.sstprep/config.toml).",
        "  --mode <flat|batched>    Output shape (default: batched).",
        "  --from <dir>             Read <dir>/<split>.jsonl instead of the network.",
        "  --dataset <id>           Dataset id on the provider (default: sst).",
        "  --dataset-config <name>  Dataset config name (default: default).",
        "  --batch-size <n>         Batch size for both pools (default: 32).",
        "  --seed <n>               Shuffle seed for both pools (default: 42).",
        "  --no-shuffle             Keep provider order.",
        "  --eval-subset <tag>      Eval pool subset: all | training | validation.",
        "  --no-cache               Do not read or write the dataset cache.",
        "  --no-log-file            Log to stderr only.",
        "  --dump <file>            Write batches as JSON lines (batched mode).",
        "  --write-config <file>    Write the effective config and exit.",
    ]
    .join("\n")
}

fn build_provider(
    pipeline: &PipelineConfig,
    from_dir: Option<PathBuf>,
) -> Result<Box<dyn CorpusProvider>, String> {
    if let Some(dir) = from_dir {
        return Ok(Box::new(JsonlDirProvider::new(dir).with_schema(pipeline.row_schema())));
    }
    let remote = HfDatasetsServer::new(&pipeline.fetch.endpoint)
        .with_page_size(pipeline.fetch.page_size)
        .with_retry(pipeline.retry())
        .with_schema(pipeline.row_schema());
    if !pipeline.fetch.cache {
        return Ok(Box::new(remote));
    }
    let cached = CachedProvider::in_app_cache(remote).map_err(|err| err.to_string())?;
    Ok(Box::new(cached))
}

fn print_flat_summary(corpus: &SplitCorpus) -> Result<(), String> {
    let flat = corpus.flatten().map_err(|err| err.to_string())?;
    let positives = |labels: &[u8]| labels.iter().filter(|&&label| label == 1).count();
    println!(
        "flat train: {} texts, {} positive",
        flat.text_train.len(),
        positives(&flat.y2_train)
    );
    println!(
        "flat test (validation+test): {} texts, {} positive",
        flat.text_test.len(),
        positives(&flat.y2_test)
    );
    Ok(())
}

fn print_batched_summary(pool: &str, dataset: &BatchedDataset) {
    println!(
        "{pool}: {} examples in {} batches of up to {}",
        dataset.len(),
        dataset.num_batches(),
        dataset.batch_size()
    );
}

#[derive(Serialize)]
struct DumpLine<'a> {
    pool: &'a str,
    batch: usize,
    #[serde(flatten)]
    data: &'a Batch,
}

fn dump_batches(path: &Path, train: &BatchedDataset, eval: &BatchedDataset) -> Result<(), String> {
    let file = File::create(path).map_err(|err| format!("Create {}: {err}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for (pool, dataset) in [("train", train), ("eval", eval)] {
        for (batch_idx, batch) in dataset.iter().enumerate() {
            let line = DumpLine {
                pool,
                batch: batch_idx,
                data: &batch,
            };
            serde_json::to_writer(&mut writer, &line).map_err(|err| err.to_string())?;
            writer.write_all(b"\n").map_err(|err| err.to_string())?;
        }
    }
    writer.flush().map_err(|err| err.to_string())
}
