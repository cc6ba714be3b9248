use std::collections::HashSet;

use crate::error::{BayesError, Result};
use crate::row::{field, MissingValues, Row};

/// Distinct non-missing values observed per attribute, in order of first occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttributeCatalog {
    entries: Vec<(String, Vec<String>)>,
}

impl AttributeCatalog {
    /// Scans every row once per attribute and records each new value the first
    /// time it is seen. Values in `missing` are never recorded.
    pub fn collect(rows: &[Row], attributes: &[String], missing: &MissingValues) -> Result<Self> {
        let mut entries = Vec::with_capacity(attributes.len());
        for attribute in attributes {
            let mut seen = HashSet::new();
            let mut values = Vec::new();
            for (i, row) in rows.iter().enumerate() {
                let value = field(row, attribute).map_err(|e| e.at_row(training_row(i)))?;
                if missing.contains(value) {
                    continue;
                }
                if seen.insert(value) {
                    values.push(value.to_string());
                }
            }
            entries.push((attribute.clone(), values));
        }

        Ok(AttributeCatalog { entries })
    }

    /// Values for `attribute`, or an empty slice for an attribute that was not catalogued.
    pub fn values(&self, attribute: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(name, _)| name == attribute)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Picks the attribute columns out of a header: everything except the label and
/// the ignored columns, in header order.
pub fn select_attributes(columns: &[String], label: &str, ignored: &[String]) -> Result<Vec<String>> {
    if !columns.iter().any(|c| c == label) {
        return Err(BayesError::UnknownColumn {
            column: label.to_string(),
            role: "label",
        });
    }
    if ignored.iter().any(|c| c == label) {
        return Err(BayesError::ConflictingColumn {
            column: label.to_string(),
            first: "label",
            second: "ignored",
        });
    }
    if let Some(column) = ignored.iter().find(|c| !columns.contains(c)) {
        return Err(BayesError::UnknownColumn {
            column: column.clone(),
            role: "ignored",
        });
    }

    Ok(columns
        .iter()
        .filter(|c| c.as_str() != label && !ignored.contains(c))
        .cloned()
        .collect())
}

pub(crate) fn training_row(index: usize) -> String {
    format!("training row {}", index + 1)
}
