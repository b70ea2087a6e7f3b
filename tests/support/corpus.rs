use std::path::Path;

use serde_json::json;

/// Write `<dir>/<split>.jsonl` with datasets-server style rows.
pub fn write_split(dir: &Path, split: &str, rows: &[(&str, f64)]) {
    let body: String = rows
        .iter()
        .map(|(sentence, label)| {
            let row = json!({
                "sentence": sentence,
                "label": label,
                "tokens": sentence.replace(' ', "|")
            });
            format!("{row}\n")
        })
        .collect();
    std::fs::write(dir.join(format!("{split}.jsonl")), body).unwrap();
}

/// A tiny three-split corpus: 4 train, 2 validation, 1 test.
pub fn write_small_corpus(dir: &Path) {
    write_split(
        dir,
        "train",
        &[("a", 0.1), ("b", 0.6), ("c", 0.5), ("d", 0.9)],
    );
    write_split(dir, "validation", &[("v1", 0.7), ("v2", 0.2)]);
    write_split(dir, "test", &[("t1", 0.51)]);
}

/// `n` training rows named `train-<i>` and `n` validation rows named `val-<i>`.
pub fn write_sized_corpus(dir: &Path, n: usize) {
    let train: Vec<(String, f64)> = (0..n)
        .map(|i| (format!("train-{i}"), (i % 11) as f64 / 10.0))
        .collect();
    let validation: Vec<(String, f64)> = (0..n)
        .map(|i| (format!("val-{i}"), (i % 7) as f64 / 6.0))
        .collect();
    write_split(dir, "train", &as_refs(&train));
    write_split(dir, "validation", &as_refs(&validation));
    write_split(dir, "test", &[]);
}

fn as_refs(rows: &[(String, f64)]) -> Vec<(&str, f64)> {
    rows.iter().map(|(text, label)| (text.as_str(), *label)).collect()
}
