use std::fmt;

use indexmap::IndexSet;
use serde::Serialize;

use crate::error::{EvalError, Result};

/// Counts of (actual, predicted) label pairs.
///
/// Rows are actual labels and columns are predicted labels. Both axes share
/// the same index set: the vocabulary in insertion order followed by the
/// default label, which collects every label outside the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    /// Vocabulary followed by the default label.
    labels: IndexSet<Box<str>>,
    /// Dense table indexed by `[actual][predicted]`.
    counts: Box<[Box<[usize]>]>,
}

impl ConfusionMatrix {
    /// Creates an all-zero matrix over `vocabulary` plus `default_label`.
    pub fn new<I, S>(vocabulary: I, default_label: &str) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut labels: IndexSet<Box<str>> = IndexSet::new();
        for label in vocabulary {
            let label = label.as_ref();
            if label == default_label {
                return Err(EvalError::DefaultLabelCollision(default_label.to_string()));
            }
            if !labels.insert(label.into()) {
                return Err(EvalError::DuplicateLabel(label.to_string()));
            }
        }
        if labels.is_empty() {
            return Err(EvalError::EmptyVocabulary);
        }
        labels.insert(default_label.into());

        let n = labels.len();
        Ok(Self {
            labels,
            counts: vec![vec![0usize; n].into_boxed_slice(); n].into_boxed_slice(),
        })
    }

    /// Increments the `(actual, predicted)` cell, folding unknown labels into the default label.
    pub fn increment(&mut self, actual: &str, predicted: &str) {
        let row = self.index_or_default(actual);
        let col = self.index_or_default(predicted);
        self.counts[row][col] += 1;
    }

    /// Returns the count stored for `(actual, predicted)`.
    ///
    /// Both labels must be vocabulary entries or the default label.
    pub fn get_count(&self, actual: &str, predicted: &str) -> Result<usize> {
        let row = self.index_of(actual)?;
        let col = self.index_of(predicted)?;
        Ok(self.counts[row][col])
    }

    /// Row and column labels, vocabulary first and the default label last.
    pub fn labels(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.labels.iter().map(|l| &**l)
    }

    /// The catch-all label for anything outside the vocabulary.
    pub fn default_label(&self) -> &str {
        &self.labels[self.default_index()]
    }

    /// Whether `label` is part of the vocabulary (the default label is not).
    pub fn is_known(&self, label: &str) -> bool {
        matches!(self.labels.get_index_of(label), Some(idx) if idx != self.default_index())
    }

    /// Iterates over `(actual label, counts by predicted label)` rows.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &[usize])> + '_ {
        self.labels
            .iter()
            .zip(self.counts.iter())
            .map(|(label, row)| (&**label, &**row))
    }

    /// Total number of counted instances.
    pub fn total(&self) -> usize {
        self.counts.iter().flat_map(|row| row.iter()).sum()
    }

    /// Sum of the diagonal.
    pub fn correct(&self) -> usize {
        self.counts.iter().enumerate().map(|(i, row)| row[i]).sum()
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.correct(), self.total())
    }

    /// Number of instances whose actual label is `label`.
    pub fn row_total(&self, label: &str) -> Result<usize> {
        let row = self.index_of(label)?;
        Ok(self.counts[row].iter().sum())
    }

    /// Number of instances predicted as `label`.
    pub fn column_total(&self, label: &str) -> Result<usize> {
        let col = self.index_of(label)?;
        Ok(self.counts.iter().map(|row| row[col]).sum())
    }

    pub fn recall(&self, label: &str) -> Result<f64> {
        let class = self.index_of(label)?;
        let true_positive = self.counts[class][class];
        let total_actual_positive: usize = self.counts[class].iter().sum();
        Ok(ratio(true_positive, total_actual_positive))
    }

    pub fn precision(&self, label: &str) -> Result<f64> {
        let class = self.index_of(label)?;
        let true_positive = self.counts[class][class];
        let total_predicted_positive: usize = self.counts.iter().map(|row| row[class]).sum();
        Ok(ratio(true_positive, total_predicted_positive))
    }

    #[inline]
    fn default_index(&self) -> usize {
        self.labels.len() - 1
    }

    #[inline]
    fn index_or_default(&self, label: &str) -> usize {
        self.labels
            .get_index_of(label)
            .unwrap_or_else(|| self.default_index())
    }

    fn index_of(&self, label: &str) -> Result<usize> {
        self.labels
            .get_index_of(label)
            .ok_or_else(|| EvalError::UnknownLabel(label.to_string()))
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

impl fmt::Display for ConfusionMatrix {
    /// Renders the matrix as an aligned table with a row total column.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label_width = self.labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let widest_count = self
            .counts
            .iter()
            .flat_map(|row| row.iter())
            .max()
            .map_or(1, |c| c.to_string().len());
        let cell_width = label_width.max(widest_count);

        write!(f, "{:label_width$}", "")?;
        for label in &self.labels {
            write!(f, "  {:>cell_width$}", label)?;
        }
        writeln!(f, "  <-- classified as")?;

        for (label, row) in self.rows() {
            write!(f, "{:label_width$}", label)?;
            for count in row {
                write!(f, "  {:>cell_width$}", count)?;
            }
            writeln!(f, "  |  {}", row.iter().sum::<usize>())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> ConfusionMatrix {
        ConfusionMatrix::new(["label1", "label2"], "DEFAULT").unwrap()
    }

    #[test]
    fn starts_at_zero() {
        let cm = matrix();
        for actual in ["label1", "label2", "DEFAULT"] {
            for predicted in ["label1", "label2", "DEFAULT"] {
                assert_eq!(cm.get_count(actual, predicted).unwrap(), 0);
            }
        }
        assert_eq!(cm.total(), 0);
        assert_eq!(cm.accuracy(), 0.0);
    }

    #[test]
    fn labels_keep_insertion_order_with_default_last() {
        let cm = ConfusionMatrix::new(["zeta", "alpha", "mid"], "Unknown").unwrap();
        assert_eq!(
            cm.labels().collect::<Vec<_>>(),
            vec!["zeta", "alpha", "mid", "Unknown"]
        );
        assert_eq!(cm.default_label(), "Unknown");
        assert!(cm.is_known("alpha"));
        assert!(!cm.is_known("Unknown"));
        assert!(!cm.is_known("other"));
    }

    #[test]
    fn increment_counts_rows_as_actual() {
        let mut cm = matrix();
        cm.increment("label2", "label1");
        cm.increment("label2", "label1");
        cm.increment("label1", "label1");

        assert_eq!(cm.get_count("label2", "label1").unwrap(), 2);
        assert_eq!(cm.get_count("label1", "label2").unwrap(), 0);
        assert_eq!(cm.get_count("label1", "label1").unwrap(), 1);
        assert_eq!(cm.row_total("label2").unwrap(), 2);
        assert_eq!(cm.column_total("label1").unwrap(), 3);
    }

    #[test]
    fn unknown_labels_fold_into_default() {
        let mut cm = matrix();
        cm.increment("label1", "label9");
        cm.increment("other", "label2");
        cm.increment("other", "another");

        assert_eq!(cm.get_count("label1", "DEFAULT").unwrap(), 1);
        assert_eq!(cm.get_count("DEFAULT", "label2").unwrap(), 1);
        assert_eq!(cm.get_count("DEFAULT", "DEFAULT").unwrap(), 1);
        assert_eq!(cm.total(), 3);
    }

    #[test]
    fn get_count_rejects_labels_outside_index_set() {
        let cm = matrix();
        assert!(matches!(
            cm.get_count("label9", "label1"),
            Err(EvalError::UnknownLabel(l)) if l == "label9"
        ));
        assert!(matches!(
            cm.get_count("label1", ""),
            Err(EvalError::UnknownLabel(l)) if l.is_empty()
        ));
        assert!(cm.recall("nope").is_err());
    }

    #[test]
    fn construction_errors() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            ConfusionMatrix::new(empty, "DEFAULT"),
            Err(EvalError::EmptyVocabulary)
        ));
        assert!(matches!(
            ConfusionMatrix::new(["a", "DEFAULT"], "DEFAULT"),
            Err(EvalError::DefaultLabelCollision(_))
        ));
        assert!(matches!(
            ConfusionMatrix::new(["a", "b", "a"], "DEFAULT"),
            Err(EvalError::DuplicateLabel(l)) if l == "a"
        ));
    }

    #[test]
    fn accuracy_recall_precision() {
        let mut cm = matrix();
        cm.increment("label1", "label1");
        cm.increment("label1", "label2");
        cm.increment("label2", "label2");
        cm.increment("label2", "label2");

        assert!((cm.accuracy() - 0.75).abs() < 1e-12);
        assert!((cm.recall("label1").unwrap() - 0.5).abs() < 1e-12);
        assert!((cm.precision("label2").unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(cm.recall("DEFAULT").unwrap(), 0.0);
    }

    #[test]
    fn renders_aligned_table() {
        let mut cm = matrix();
        cm.increment("label1", "label1");
        cm.increment("label2", "label1");

        let expected = concat!(
            "          label1   label2  DEFAULT  <-- classified as\n",
            "label1         1        0        0  |  1\n",
            "label2         1        0        0  |  1\n",
            "DEFAULT        0        0        0  |  0\n",
        );
        assert_eq!(cm.to_string(), expected);
    }

    #[test]
    fn serializes_labels_and_counts() {
        let mut cm = matrix();
        cm.increment("label1", "label2");
        let json = serde_json::to_value(&cm).unwrap();
        assert_eq!(json["labels"], serde_json::json!(["label1", "label2", "DEFAULT"]));
        assert_eq!(json["counts"][0], serde_json::json!([0, 1, 0]));
    }
}
