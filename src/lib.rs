//! Classifier evaluation: confusion matrix and accuracy summary.
//!
//! [`ResultAnalyzer`] consumes `(actual label, predicted result)` instances and
//! keeps a [`ConfusionMatrix`] over a fixed label vocabulary. Labels outside the
//! vocabulary are counted under a configurable default label.
//!
//! The remaining modules read persisted classifier output and drive an analyzer.

pub mod analyzer;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod labels;
pub mod logging;
pub mod metrics;
pub mod records;

pub use analyzer::{ClassifierResult, ResultAnalyzer, Summary};
pub use error::{EvalError, Result};
pub use metrics::ConfusionMatrix;
