//! Property-based tests for model building and evaluation.

use proptest::prelude::*;
use categorical_bayes::{
    classify, evaluate, BayesModel, GroundTruth, MissingValues, Prediction, Row, Scored,
};

/// Tolerance for floating point comparisons.
const TOL: f64 = 1e-9;

fn attributes() -> Vec<String> {
    vec!["color".to_string(), "size".to_string()]
}

fn training_rows() -> impl Strategy<Value = Vec<Row>> {
    let label = prop::sample::select(vec!["Gold", "Silver", "Bronze"]);
    let color = prop::sample::select(vec!["red", "blue", "green", "?"]);
    let size = prop::sample::select(vec!["small", "large", "?"]);
    prop::collection::vec((label, color, size), 1..40).prop_map(|records| {
        records
            .into_iter()
            .map(|(label, color, size)| {
                [("tier", label), ("color", color), ("size", size)]
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect()
            })
            .collect()
    })
}

fn labeled_pairs() -> impl Strategy<Value = Vec<(&'static str, &'static str)>> {
    let label = || prop::sample::select(vec!["A", "B", "C", "D"]);
    prop::collection::vec((label(), label()), 1..60)
}

fn split(pairs: &[(&str, &str)]) -> (Vec<Prediction>, GroundTruth) {
    let mut predictions = Vec::new();
    let mut truth = GroundTruth::new();
    for (i, (predicted, actual)) in pairs.iter().enumerate() {
        let row = format!("row-{}", i);
        truth.insert(row.clone(), actual.to_string());
        predictions.push(Prediction {
            row,
            prediction: Scored {
                label: predicted.to_string(),
                score: 1.0,
            },
        });
    }
    (predictions, truth)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Each likelihood table is a probability distribution over its catalog.
    #[test]
    fn likelihoods_sum_to_one(rows in training_rows()) {
        let model = BayesModel::build(&rows, "tier", &attributes(), &MissingValues::default()).unwrap();
        for class in model.classes() {
            for attribute in class.attributes() {
                if attribute.likelihoods().is_empty() {
                    continue;
                }
                let sum: f64 = attribute.likelihoods().values().sum();
                prop_assert!((sum - 1.0).abs() <= TOL, "{} / {} sums to {}", class.title(), attribute.title(), sum);
            }
        }
        prop_assert!(model.validate().is_ok());
    }

    /// Smoothing keeps every count at one or more, and every class sees the whole catalog.
    #[test]
    fn counts_never_drop_below_one(rows in training_rows()) {
        let model = BayesModel::build(&rows, "tier", &attributes(), &MissingValues::default()).unwrap();
        for class in model.classes() {
            for attribute in class.attributes() {
                prop_assert!(attribute.value_counts().values().all(|&c| c >= 1));
                prop_assert!(!attribute.value_counts().contains_key("?"));
                let total: u64 = attribute.value_counts().values().sum();
                prop_assert_eq!(total, attribute.items_counted());
            }
            let first = model.classes()[0].attributes();
            for (a, b) in class.attributes().iter().zip(first) {
                prop_assert!(a.value_counts().keys().eq(b.value_counts().keys()));
            }
        }
    }

    /// Priors are class frequencies and add up to one.
    #[test]
    fn priors_sum_to_one(rows in training_rows()) {
        let model = BayesModel::build(&rows, "tier", &attributes(), &MissingValues::default()).unwrap();
        let sum: f64 = model.classes().iter().map(|c| c.prior()).sum();
        prop_assert!((sum - 1.0).abs() <= TOL);
        let labels: Vec<&str> = model.labels().collect();
        let mut sorted = labels.clone();
        sorted.sort();
        prop_assert_eq!(labels, sorted);
    }

    /// Building twice from the same rows gives the same model.
    #[test]
    fn build_is_deterministic(rows in training_rows()) {
        let first = BayesModel::build(&rows, "tier", &attributes(), &MissingValues::default()).unwrap();
        let second = BayesModel::build(&rows, "tier", &attributes(), &MissingValues::default()).unwrap();
        prop_assert_eq!(first, second);
    }

    /// A row of missing values is classified by prior alone.
    #[test]
    fn missing_row_follows_priors(rows in training_rows()) {
        let model = BayesModel::build(&rows, "tier", &attributes(), &MissingValues::default()).unwrap();
        let row: Row = [("color", "?"), ("size", "?")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let scored = classify(&model, &row, &MissingValues::default()).unwrap();

        let best = model
            .classes()
            .iter()
            .fold(None::<(&str, f64)>, |best, class| match best {
                Some((_, p)) if class.prior() <= p => best,
                _ => Some((class.title(), class.prior())),
            })
            .unwrap();
        prop_assert_eq!(scored.label.as_str(), best.0);
        prop_assert!((scored.score - best.1).abs() <= TOL);
    }

    /// Every prediction lands in exactly one cell of every label's confusion counts.
    #[test]
    fn confusion_counts_cover_every_prediction(pairs in labeled_pairs()) {
        let (predictions, truth) = split(&pairs);
        let stats = evaluate(&predictions, &truth).unwrap();
        let total = pairs.len() as u64;

        prop_assert_eq!(stats.total_tested, total);
        for label_stats in stats.labels.values() {
            let c = &label_stats.counts;
            prop_assert_eq!(c.true_positive + c.true_negative + c.false_positive + c.false_negative, total);
            prop_assert_eq!(label_stats.sum, total);
        }
        let correct = pairs.iter().filter(|(p, a)| p == a).count() as f64;
        prop_assert!((stats.accuracy - correct / total as f64).abs() <= TOL);
    }

    /// Precision and recall are null exactly when their denominators are zero.
    #[test]
    fn null_metrics_iff_zero_denominator(pairs in labeled_pairs()) {
        let (predictions, truth) = split(&pairs);
        let stats = evaluate(&predictions, &truth).unwrap();

        for label_stats in stats.labels.values() {
            let c = &label_stats.counts;
            prop_assert_eq!(label_stats.precision.is_none(), c.true_positive + c.false_positive == 0);
            prop_assert_eq!(label_stats.recall.is_none(), c.true_positive + c.false_negative == 0);
            if label_stats.f_measure.is_some() {
                prop_assert!(label_stats.precision.is_some() && label_stats.recall.is_some());
            }
        }
    }
}
