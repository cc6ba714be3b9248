//! Categorical Naive Bayes over string-valued tabular records.
//!
//! Training rows go through an [`AttributeCatalog`] into a [`BayesModel`];
//! [`classify`] scores new rows against it and [`evaluate`] compares the
//! resulting predictions with ground truth.

pub mod catalog;
pub mod classify;
pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluate;
pub mod logging;
pub mod model;
pub mod row;

pub use catalog::{select_attributes, AttributeCatalog};
pub use classify::{classify, predict, Prediction, Scored};
pub use error::{BayesError, Result};
pub use evaluate::{evaluate, ConfusionCounts, GroundTruth, LabelStats, Stats, Tally};
pub use model::{AttributeLikelihood, BayesModel, ClassModel};
pub use row::{MissingValues, Row};
