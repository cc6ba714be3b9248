use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{BayesError, Result};
use crate::model::BayesModel;
use crate::row::{field, MissingValues, Row};

/// Winning class for one row and its (unnormalised) posterior score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scored {
    #[serde(rename = "class")]
    pub label: String,
    #[serde(rename = "likelihood")]
    pub score: f64,
}

/// Classification of one identified test row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub row: String,
    pub prediction: Scored,
}

impl Prediction {
    pub fn label(&self) -> &str {
        &self.prediction.label
    }
}

/// Scores `row` against every class and returns the best one.
///
/// A value that is a missing token, or that never appeared anywhere in
/// training, contributes no factor. Ties go to the class that comes first in
/// the model. A column the model expects but the row lacks is an error.
pub fn classify(model: &BayesModel, row: &Row, missing: &MissingValues) -> Result<Scored> {
    let mut best: Option<(&str, f64)> = None;

    for class in model.classes() {
        let mut score = class.prior();
        for attribute in class.attributes() {
            let value = field(row, attribute.title())?;
            if missing.contains(value) {
                continue;
            }
            // ignore values never seen in training
            if let Some(p) = attribute.likelihood(value) {
                score *= p;
            }
        }

        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((class.title(), score)),
        }
    }

    let (label, score) = best.ok_or(BayesError::NoClasses)?;
    Ok(Scored {
        label: label.to_string(),
        score,
    })
}

/// Classifies each test row, identified by its `id_column` value.
pub fn predict(
    model: &BayesModel,
    rows: &[Row],
    id_column: &str,
    missing: &MissingValues,
) -> Result<Vec<Prediction>> {
    if model.is_empty() {
        return Err(BayesError::NoClasses);
    }

    let mut predictions = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let id = field(row, id_column).map_err(|e| e.at_row(format!("test row {}", i + 1)))?;
        let scored = classify(model, row, missing).map_err(|e| e.at_row(id))?;

        if scored.score == 0.0 {
            warn!(
                row = id,
                label = %scored.label,
                "posterior score underflowed to zero; ranking for this row is unreliable"
            );
        }
        debug!(row = id, label = %scored.label, score = scored.score, "classified");

        predictions.push(Prediction {
            row: id.to_string(),
            prediction: scored,
        });
    }

    Ok(predictions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn tier_model() -> BayesModel {
        let rows = vec![
            row(&[("color", "blue"), ("tier", "Platinum")]),
            row(&[("color", "red"), ("tier", "Bronze")]),
        ];
        BayesModel::build(&rows, "tier", &["color".to_string()], &MissingValues::default()).unwrap()
    }

    #[test]
    fn picks_highest_posterior() {
        let scored = classify(&tier_model(), &row(&[("color", "blue")]), &MissingValues::default())
            .unwrap();
        assert_eq!(scored.label, "Platinum");
        assert_abs_diff_eq!(scored.score, 0.5 * 2.0 / 3.0, epsilon = 1e-12);

        let scored = classify(&tier_model(), &row(&[("color", "red")]), &MissingValues::default())
            .unwrap();
        assert_eq!(scored.label, "Bronze");
    }

    #[test]
    fn missing_value_falls_back_to_priors() {
        // equal priors: first class in label order wins
        let scored = classify(&tier_model(), &row(&[("color", "?")]), &MissingValues::default())
            .unwrap();
        assert_eq!(scored.label, "Bronze");
        assert_abs_diff_eq!(scored.score, 0.5);

        let rows = vec![
            row(&[("color", "blue"), ("tier", "Platinum")]),
            row(&[("color", "red"), ("tier", "Bronze")]),
            row(&[("color", "red"), ("tier", "Platinum")]),
        ];
        let model =
            BayesModel::build(&rows, "tier", &["color".to_string()], &MissingValues::default())
                .unwrap();
        let scored = classify(&model, &row(&[("color", "?")]), &MissingValues::default()).unwrap();
        assert_eq!(scored.label, "Platinum");
        assert_abs_diff_eq!(scored.score, 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn unseen_value_is_not_informative() {
        let scored = classify(&tier_model(), &row(&[("color", "green")]), &MissingValues::default())
            .unwrap();
        assert_eq!(scored.label, "Bronze");
        assert_abs_diff_eq!(scored.score, 0.5);
    }

    #[test]
    fn absent_column_is_an_error() {
        let err = classify(&tier_model(), &row(&[("shade", "blue")]), &MissingValues::default())
            .unwrap_err();
        assert_eq!(
            err,
            BayesError::MissingAttribute {
                attribute: "color".to_string(),
                row: None,
            }
        );
    }

    #[test]
    fn empty_model_has_no_classes() {
        let model: BayesModel = serde_json::from_str("[]").unwrap();
        let err = classify(&model, &row(&[("color", "blue")]), &MissingValues::default()).unwrap_err();
        assert_eq!(err, BayesError::NoClasses);
    }

    #[test]
    fn zero_scores_still_select_a_class() {
        // priors and likelihoods small enough that every product underflows
        let mut attributes = Vec::new();
        let mut training = Vec::new();
        for label in ["a", "b"] {
            for i in 0..400 {
                let mut r = row(&[("label", label)]);
                for j in 0..200 {
                    r.insert(format!("x{}", j), format!("{}{}", label, i));
                }
                training.push(r);
            }
        }
        for j in 0..200 {
            attributes.push(format!("x{}", j));
        }
        let model =
            BayesModel::build(&training, "label", &attributes, &MissingValues::default()).unwrap();

        let mut test = row(&[("id", "t1")]);
        for j in 0..200 {
            test.insert(format!("x{}", j), "a0".to_string());
        }
        let predictions = predict(&model, &[test], "id", &MissingValues::default()).unwrap();
        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0].label(), "a");
    }

    #[test]
    fn predict_attaches_row_identity() {
        let tests = vec![
            row(&[("id", "r1"), ("color", "blue")]),
            row(&[("id", "r2"), ("shade", "red")]),
        ];
        let err = predict(&tier_model(), &tests, "id", &MissingValues::default()).unwrap_err();
        assert_eq!(
            err,
            BayesError::MissingAttribute {
                attribute: "color".to_string(),
                row: Some("r2".to_string()),
            }
        );

        let tests = vec![row(&[("color", "blue")])];
        let err = predict(&tier_model(), &tests, "id", &MissingValues::default()).unwrap_err();
        assert_eq!(
            err,
            BayesError::MissingAttribute {
                attribute: "id".to_string(),
                row: Some("test row 1".to_string()),
            }
        );
    }

    #[test]
    fn prediction_serializes_with_class_and_likelihood() {
        let predictions = predict(
            &tier_model(),
            &[row(&[("id", "r1"), ("color", "blue")])],
            "id",
            &MissingValues::default(),
        )
        .unwrap();
        let json = serde_json::to_value(&predictions[0]).unwrap();
        assert_eq!(json["row"], "r1");
        assert_eq!(json["prediction"]["class"], "Platinum");
        assert!(json["prediction"]["likelihood"].is_number());
    }
}
