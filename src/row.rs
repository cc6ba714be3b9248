use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::error::{BayesError, Result};

/// A single record: column name to its (string) value.
pub type Row = HashMap<String, String>;

/// Looks up `attribute` in `row`, failing when the column is absent altogether.
pub fn field<'a>(row: &'a Row, attribute: &str) -> Result<&'a str> {
    row.get(attribute)
        .map(String::as_str)
        .ok_or_else(|| BayesError::missing_attribute(attribute))
}

/// Tokens that mark a value as unobserved, e.g. `?`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MissingValues(BTreeSet<String>);

impl MissingValues {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MissingValues(tokens.into_iter().map(Into::into).collect())
    }

    /// No value is ever treated as missing.
    pub fn none() -> Self {
        MissingValues(BTreeSet::new())
    }

    pub fn contains(&self, value: &str) -> bool {
        self.0.contains(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for MissingValues {
    fn default() -> Self {
        MissingValues::new(["?"])
    }
}
