//! Training-history chart descriptions.
//!
//! Nothing is drawn here: [`render_history`] returns a [`RenderSpec`] with
//! two stacked line charts (loss on top, metric below), each pairing the
//! training series with its `val_` counterpart.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Per-epoch values keyed by metric name (`loss`, `val_loss`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrainingHistory {
    pub series: BTreeMap<String, Vec<f64>>,
}

impl TrainingHistory {
    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(Vec::as_slice)
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marker {
    Circle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSpec {
    pub label: String,
    /// Epoch index paired with its value.
    pub points: Vec<(usize, f64)>,
    pub marker: Marker,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    /// Zero-based row in the vertical stack.
    pub row: usize,
    pub series: Vec<SeriesSpec>,
    pub legend: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSpec {
    pub rows: usize,
    pub charts: Vec<ChartSpec>,
}

/// Describe the loss and metric charts for `history`.
pub fn render_history(
    history: &TrainingHistory,
    loss_name: &str,
    metric_name: &str,
) -> Result<RenderSpec, PipelineError> {
    let charts = [loss_name, metric_name]
        .into_iter()
        .enumerate()
        .map(|(row, name)| chart(history, row, name))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(RenderSpec {
        rows: charts.len(),
        charts,
    })
}

fn chart(history: &TrainingHistory, row: usize, name: &str) -> Result<ChartSpec, PipelineError> {
    let series = [name.to_string(), format!("val_{name}")]
        .into_iter()
        .map(|label| {
            let values = history.get(&label).ok_or_else(|| {
                PipelineError::InvalidInput(format!("history has no `{label}` series"))
            })?;
            Ok(SeriesSpec {
                points: values.iter().copied().enumerate().collect(),
                label,
                marker: Marker::Circle,
            })
        })
        .collect::<Result<Vec<_>, PipelineError>>()?;
    Ok(ChartSpec {
        title: name.to_string(),
        row,
        series,
        legend: true,
    })
}
