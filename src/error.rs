use thiserror::Error;

pub type Result<T> = std::result::Result<T, BayesError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BayesError {
    /// No training rows were supplied to the model builder
    #[error("cannot build a model from an empty training set")]
    EmptyTrainingSet,

    /// Classification was attempted against a model with no classes
    #[error("model has no classes to choose from")]
    NoClasses,

    /// A row does not carry a column the model or the builder needs.
    /// This is a schema mismatch, not a missing value.
    #[error("{} has no `{attribute}` column", describe_row(.row))]
    MissingAttribute {
        attribute: String,
        row: Option<String>,
    },

    /// A prediction refers to a row the ground truth knows nothing about
    #[error("no ground truth recorded for row `{row}`")]
    UnknownGroundTruth { row: String },

    #[error("cannot evaluate an empty set of predictions")]
    NoPredictions,

    #[error("label column `{0}` cannot also be used as an attribute")]
    LabelIsAttribute(String),

    #[error("{role} column `{column}` is not present in the table header")]
    UnknownColumn { column: String, role: &'static str },

    /// One column was configured for two roles that exclude each other
    #[error("column `{column}` cannot be both the {first} and the {second} column")]
    ConflictingColumn {
        column: String,
        first: &'static str,
        second: &'static str,
    },

    /// A model that did not come out of the builder is inconsistent
    #[error("class `{class}`: {reason}")]
    InvalidModel { class: String, reason: String },

    /// A label outside the fixed label set of an evaluation tally
    #[error("label `{0}` is not one of the labels being evaluated")]
    UnknownLabel(String),

    #[error("cannot merge tallies kept over different label sets")]
    LabelSetMismatch,
}

impl BayesError {
    pub(crate) fn missing_attribute(attribute: &str) -> Self {
        BayesError::MissingAttribute {
            attribute: attribute.to_string(),
            row: None,
        }
    }

    /// Attaches row context to a `MissingAttribute` error that has none yet.
    pub(crate) fn at_row(self, row: impl Into<String>) -> Self {
        match self {
            BayesError::MissingAttribute {
                attribute,
                row: None,
            } => BayesError::MissingAttribute {
                attribute,
                row: Some(row.into()),
            },
            other => other,
        }
    }
}

fn describe_row(row: &Option<String>) -> String {
    match row {
        Some(row) => format!("row `{}`", row),
        None => "row".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_attribute_mentions_row_when_known() {
        let err = BayesError::missing_attribute("color").at_row("G239017");
        assert_eq!(err.to_string(), "row `G239017` has no `color` column");

        let err = BayesError::missing_attribute("color");
        assert_eq!(err.to_string(), "row has no `color` column");
    }

    #[test]
    fn at_row_keeps_existing_context() {
        let err = BayesError::missing_attribute("color")
            .at_row("first")
            .at_row("second");
        assert_eq!(
            err,
            BayesError::MissingAttribute {
                attribute: "color".to_string(),
                row: Some("first".to_string()),
            }
        );
        assert_eq!(BayesError::NoClasses.at_row("x"), BayesError::NoClasses);
    }
}
