//! Reading and writing the files around the classifier: CSV tables in,
//! JSON model and statistics out, CSV predictions out.

use anyhow::{bail, Context, Result};
use std::{fs, path::Path};

use crate::classify::Prediction;
use crate::evaluate::{GroundTruth, Stats};
use crate::model::BayesModel;
use crate::row::Row;

/// A CSV file read into memory: header columns in file order, one row per record.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let columns: Vec<String> = reader
        .headers()
        .with_context(|| format!("failed to read header of {}", path.display()))?
        .iter()
        .map(|column| column.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("{}: bad record {}", path.display(), i + 1))?;

        let row: Row = columns
            .iter()
            .cloned()
            .zip(record.iter().map(|value| value.trim().to_string()))
            .collect();
        rows.push(row);
    }

    Ok(Table { columns, rows })
}

/// Reads a keys file mapping each row identity to its true label. An identity
/// listed twice is rejected.
pub fn read_ground_truth<P: AsRef<Path>>(
    path: P,
    id_column: &str,
    label_column: &str,
) -> Result<GroundTruth> {
    let path = path.as_ref();
    let table = read_table(path)?;

    for column in [id_column, label_column] {
        if !table.columns.iter().any(|c| c == column) {
            bail!("{} has no `{}` column", path.display(), column);
        }
    }

    let mut truth = GroundTruth::with_capacity(table.rows.len());
    for row in table.rows {
        // both columns are in the header, so every row has them
        let (Some(id), Some(label)) = (row.get(id_column), row.get(label_column)) else {
            continue;
        };
        if let Some(previous) = truth.insert(id.clone(), label.clone()) {
            bail!(
                "{}: row `{}` appears more than once (`{}` and `{}`)",
                path.display(),
                id,
                previous,
                label
            );
        }
    }

    Ok(truth)
}

pub fn write_model<P: AsRef<Path>>(path: P, model: &BayesModel) -> Result<()> {
    write_json(path.as_ref(), model)
}

/// Loads a model saved by [`write_model`] and checks it is well formed.
pub fn read_model<P: AsRef<Path>>(path: P) -> Result<BayesModel> {
    let path = path.as_ref();
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let model: BayesModel = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a model file", path.display()))?;

    if let Err(err) = model.validate() {
        bail!("{}: {}", path.display(), err);
    }

    Ok(model)
}

pub fn write_predictions<P: AsRef<Path>>(
    path: P,
    id_column: &str,
    predictions: &[Prediction],
) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    writer.write_record([id_column, "prediction", "likelihood"])?;
    for prediction in predictions {
        let score = prediction.prediction.score.to_string();
        writer.write_record([prediction.row.as_str(), prediction.label(), score.as_str()])?;
    }
    writer.flush()?;

    Ok(())
}

pub fn write_stats<P: AsRef<Path>>(path: P, stats: &Stats) -> Result<()> {
    write_json(path.as_ref(), stats)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}
