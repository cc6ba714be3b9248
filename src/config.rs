//! Run configuration.
//!
//! Values come from an optional TOML file and are then overridden by whatever
//! was given on the command line:
//!
//! ```toml
//! label_column = "Localization"
//! id_column = "GeneID"
//! ignored_columns = ["Function", "Chromosome"]
//! missing_values = ["?"]
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::catalog::select_attributes;
use crate::error::BayesError;
use crate::row::MissingValues;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Column holding the class label.
    pub label_column: Option<String>,
    /// Column identifying a test row; joins predictions with ground truth.
    pub id_column: Option<String>,
    /// Columns never used as attributes, e.g. identifiers or free text.
    pub ignored_columns: Vec<String>,
    pub missing_values: MissingValues,
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub label_column: Option<String>,
    pub id_column: Option<String>,
    pub ignored_columns: Option<Vec<String>>,
    pub missing_values: Option<Vec<String>>,
}

impl RunConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Loads the file if one is given, then applies the overrides.
    pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => RunConfig::default(),
        };
        Ok(config.with_overrides(overrides))
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(label) = overrides.label_column {
            self.label_column = Some(label);
        }
        if let Some(id) = overrides.id_column {
            self.id_column = Some(id);
        }
        if let Some(ignored) = overrides.ignored_columns {
            self.ignored_columns = ignored;
        }
        if let Some(missing) = overrides.missing_values {
            self.missing_values = MissingValues::new(missing);
        }
        self
    }

    pub fn label(&self) -> Result<&str> {
        self.label_column
            .as_deref()
            .context("no label column configured (use --label or `label_column`)")
    }

    pub fn id(&self) -> Result<&str> {
        self.id_column
            .as_deref()
            .context("no id column configured (use --id or `id_column`)")
    }

    /// Attribute columns for a training header. The id column is never used
    /// as an attribute, but training data need not carry it; test and keys
    /// files are checked for it when they are read.
    pub fn attributes(&self, columns: &[String]) -> Result<Vec<String>> {
        let label = self.label()?;
        let mut ignored = self.ignored_columns.clone();
        if let Some(id) = &self.id_column {
            if id == label {
                return Err(BayesError::ConflictingColumn {
                    column: id.clone(),
                    first: "label",
                    second: "id",
                }
                .into());
            }
            if columns.contains(id) && !ignored.contains(id) {
                ignored.push(id.clone());
            }
        }

        Ok(select_attributes(columns, label, &ignored)?)
    }
}
