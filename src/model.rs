//! Categorical Naive Bayes model.
//!
//! A model holds one entry per class label: the prior probability of the class
//! and, for every attribute, the conditional likelihood of each attribute value
//! given the class. Value counts start at one (Laplace correction) so a value
//! never seen for a class still has a small non-zero likelihood.
//!
//! Likelihoods are plain ratios and scores are products of them. With many
//! attributes the product can underflow to zero; the classifier warns when it
//! does.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::{training_row, AttributeCatalog};
use crate::error::{BayesError, Result};
use crate::row::{field, MissingValues, Row};

const SUM_TOLERANCE: f64 = 1e-9;

/// Fitted model: class entries sorted by label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BayesModel {
    classes: Vec<ClassModel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassModel {
    title: String,
    #[serde(rename = "likelihood")]
    prior: f64,
    attributes: Vec<AttributeLikelihood>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeLikelihood {
    title: String,
    likelihoods: BTreeMap<String, f64>,
    value_counts: BTreeMap<String, u64>,
    items_counted: u64,
}

impl BayesModel {
    /// Builds the model from labeled training rows.
    ///
    /// `attributes` are the columns used as evidence; they must not include
    /// `label`. Every row must carry the label column and every attribute
    /// column, although a value may be one of the `missing` tokens.
    ///
    /// # Example
    ///
    /// ```
    /// # use categorical_bayes::{BayesModel, MissingValues, Row};
    /// let rows: Vec<Row> = vec![
    ///     [("color", "blue"), ("tier", "Platinum")].iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
    ///     [("color", "red"), ("tier", "Bronze")].iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
    /// ];
    /// let model = BayesModel::build(&rows, "tier", &["color".to_string()], &MissingValues::default()).unwrap();
    ///
    /// assert_eq!(model.labels().collect::<Vec<_>>(), vec!["Bronze", "Platinum"]);
    /// ```
    pub fn build(
        rows: &[Row],
        label: &str,
        attributes: &[String],
        missing: &MissingValues,
    ) -> Result<Self> {
        if rows.is_empty() {
            return Err(BayesError::EmptyTrainingSet);
        }
        if attributes.iter().any(|a| a == label) {
            return Err(BayesError::LabelIsAttribute(label.to_string()));
        }

        let catalog = AttributeCatalog::collect(rows, attributes, missing)?;

        // Sort into classes:
        let mut partitions: BTreeMap<&str, Vec<&Row>> = BTreeMap::new();
        for (i, row) in rows.iter().enumerate() {
            let value = field(row, label).map_err(|e| e.at_row(training_row(i)))?;
            partitions.entry(value).or_default().push(row);
        }

        let total = rows.len() as f64;
        let classes = partitions
            .into_iter()
            .map(|(title, members)| ClassModel {
                title: title.to_string(),
                prior: members.len() as f64 / total,
                attributes: catalog
                    .attributes()
                    .map(|attribute| {
                        AttributeLikelihood::count(attribute, catalog.values(attribute), &members, missing)
                    })
                    .collect(),
            })
            .collect();

        Ok(BayesModel { classes })
    }

    pub fn classes(&self) -> &[ClassModel] {
        &self.classes
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(|c| c.title.as_str())
    }

    pub fn class(&self, label: &str) -> Option<&ClassModel> {
        self.classes.iter().find(|c| c.title == label)
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Checks a model that did not come from [`BayesModel::build`], e.g. one
    /// read back from disk: priors in (0, 1], counts at least one and adding
    /// up to `items_counted`, likelihoods over the same values, in (0, 1] and
    /// summing to one.
    pub fn validate(&self) -> Result<()> {
        for class in &self.classes {
            let invalid = |reason: String| BayesError::InvalidModel {
                class: class.title.clone(),
                reason,
            };
            if !(class.prior > 0.0 && class.prior <= 1.0) {
                return Err(invalid(format!("prior {} outside (0, 1]", class.prior)));
            }
            for attribute in &class.attributes {
                attribute.validate().map_err(invalid)?;
            }
        }
        Ok(())
    }
}

impl ClassModel {
    /// The class label.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Fraction of training rows carrying this label.
    pub fn prior(&self) -> f64 {
        self.prior
    }

    pub fn attributes(&self) -> &[AttributeLikelihood] {
        &self.attributes
    }

    pub fn attribute(&self, title: &str) -> Option<&AttributeLikelihood> {
        self.attributes.iter().find(|a| a.title == title)
    }
}

impl AttributeLikelihood {
    fn count(title: &str, values: &[String], members: &[&Row], missing: &MissingValues) -> Self {
        // start every catalogued value at one
        let mut value_counts: BTreeMap<String, u64> =
            values.iter().map(|value| (value.clone(), 1)).collect();

        for row in members {
            let Some(value) = row.get(title) else {
                continue;
            };
            if missing.contains(value) {
                continue;
            }
            if let Some(count) = value_counts.get_mut(value) {
                *count += 1;
            }
        }

        let items_counted: u64 = value_counts.values().sum();
        let likelihoods = value_counts
            .iter()
            .map(|(value, &count)| (value.clone(), count as f64 / items_counted as f64))
            .collect();

        AttributeLikelihood {
            title: title.to_string(),
            likelihoods,
            value_counts,
            items_counted,
        }
    }

    /// The attribute (column) name.
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn likelihood(&self, value: &str) -> Option<f64> {
        self.likelihoods.get(value).copied()
    }

    pub fn likelihoods(&self) -> &BTreeMap<String, f64> {
        &self.likelihoods
    }

    pub fn value_counts(&self) -> &BTreeMap<String, u64> {
        &self.value_counts
    }

    /// Sum of all smoothed counts.
    pub fn items_counted(&self) -> u64 {
        self.items_counted
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if !self.likelihoods.keys().eq(self.value_counts.keys()) {
            return Err(format!(
                "attribute `{}` has likelihoods and value counts over different values",
                self.title
            ));
        }
        let counted: u64 = self.value_counts.values().sum();
        if counted != self.items_counted {
            return Err(format!(
                "attribute `{}` counts add up to {}, but items_counted is {}",
                self.title, counted, self.items_counted
            ));
        }
        if self.likelihoods.is_empty() {
            return Ok(());
        }
        if let Some((value, p)) = self
            .likelihoods
            .iter()
            .find(|(_, p)| !(**p > 0.0 && **p <= 1.0))
        {
            return Err(format!(
                "attribute `{}` value `{}` has likelihood {} outside (0, 1]",
                self.title, value, p
            ));
        }
        let sum: f64 = self.likelihoods.values().sum();
        if (sum - 1.0).abs() > SUM_TOLERANCE {
            return Err(format!(
                "attribute `{}` likelihoods sum to {}, not 1",
                self.title, sum
            ));
        }
        if let Some((value, _)) = self.value_counts.iter().find(|(_, c)| **c == 0) {
            return Err(format!(
                "attribute `{}` value `{}` has a zero count",
                self.title, value
            ));
        }
        Ok(())
    }
}
