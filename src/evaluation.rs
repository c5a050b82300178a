//! Runs a trained classifier's output through a [`ResultAnalyzer`].
//!
//! Each persisted record carries an instance key and one score per label
//! position. The best scoring position selects the predicted label and the key
//! yields the actual label.

use std::{borrow::Cow, path::Path};

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    analyzer::{ClassifierResult, ResultAnalyzer, Summary},
    error::Result,
    labels::LabelIndex,
    metrics::ConfusionMatrix,
    records::{best_index, part_files, RecordReader, ScoredRecord},
};

/// How the actual label is read from a record key.
#[derive(Debug, Clone, Default)]
pub enum KeyLabel {
    /// The key is the label.
    #[default]
    Verbatim,
    /// The first capture group of the pattern (or the whole match) is the label.
    Pattern(Regex),
}

impl KeyLabel {
    pub fn pattern(pattern: &str) -> Result<Self> {
        Ok(KeyLabel::Pattern(Regex::new(pattern)?))
    }

    /// Extracts the actual label, falling back to the whole key when the pattern does not match.
    pub fn resolve<'k>(&self, key: &'k str) -> Cow<'k, str> {
        match self {
            KeyLabel::Verbatim => Cow::Borrowed(key),
            KeyLabel::Pattern(re) => match re.captures(key) {
                Some(caps) => caps
                    .get(1)
                    .or_else(|| caps.get(0))
                    .map_or(Cow::Borrowed(key), |m| Cow::Borrowed(m.as_str())),
                None => Cow::Borrowed(key),
            },
        }
    }
}

/// What happened to a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Counted,
    /// The record had no usable score.
    Skipped,
}

/// Record tallies for one evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub files: usize,
    pub records: usize,
    pub skipped: usize,
}

/// Final output of an evaluation, serializable for machine consumers.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub summary: Summary,
    pub confusion_matrix: ConfusionMatrix,
    pub stats: RunStats,
}

pub struct Evaluator {
    label_index: LabelIndex,
    key_label: KeyLabel,
    analyzer: ResultAnalyzer,
    stats: RunStats,
}

impl Evaluator {
    /// Creates an evaluator whose vocabulary is the label index.
    pub fn new(label_index: LabelIndex, default_label: &str, key_label: KeyLabel) -> Result<Self> {
        let analyzer = ResultAnalyzer::new(label_index.labels(), default_label)?;
        Ok(Self {
            label_index,
            key_label,
            analyzer,
            stats: RunStats::default(),
        })
    }

    /// Accounts for one record.
    pub fn add_record(&mut self, record: &ScoredRecord) -> Outcome {
        self.stats.records += 1;

        let Some((best, score)) = best_index(&record.scores) else {
            debug!(key = %record.key, "skipping record without scores");
            self.stats.skipped += 1;
            return Outcome::Skipped;
        };

        let predicted = match self.label_index.get(best) {
            Some(label) => label,
            None => {
                warn!(key = %record.key, position = best, "no label for best score position");
                self.analyzer.confusion_matrix().default_label()
            }
        };
        let result = ClassifierResult::new(predicted, score);
        let actual = self.key_label.resolve(&record.key);
        self.analyzer.add_instance(&actual, &result);
        Outcome::Counted
    }

    /// Feeds every record of one file.
    pub fn run_file(&mut self, path: &Path) -> Result<()> {
        let rows = RecordReader::declared_rows(path)?;
        debug!(file = %path.display(), rows, "reading classifier output");
        for record in RecordReader::open(path)? {
            self.add_record(&record?);
        }
        self.stats.files += 1;
        Ok(())
    }

    /// Feeds every part file under `path`, or `path` itself when it is a file.
    pub fn run_path(&mut self, path: &Path) -> Result<RunStats> {
        let files = part_files(path)?;
        info!(input = %path.display(), files = files.len(), "evaluating classifier output");
        for file in &files {
            self.run_file(file)?;
        }
        info!(
            records = self.stats.records,
            skipped = self.stats.skipped,
            "evaluation finished"
        );
        Ok(self.stats)
    }

    pub fn analyzer(&self) -> &ResultAnalyzer {
        &self.analyzer
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn finish(self) -> EvaluationReport {
        EvaluationReport {
            summary: self.analyzer.summary(),
            confusion_matrix: self.analyzer.confusion_matrix().clone(),
            stats: self.stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluator(key_label: KeyLabel) -> Evaluator {
        let index = LabelIndex::from_pairs([("label1", 0), ("label2", 1)]).unwrap();
        Evaluator::new(index, "DEFAULT", key_label).unwrap()
    }

    fn record(key: &str, scores: &[f64]) -> ScoredRecord {
        ScoredRecord {
            key: key.to_string(),
            scores: scores.to_vec(),
        }
    }

    #[test]
    fn counts_best_scoring_label() {
        let mut eval = evaluator(KeyLabel::Verbatim);
        assert_eq!(eval.add_record(&record("label1", &[0.7, 0.3])), Outcome::Counted);
        assert_eq!(eval.add_record(&record("label2", &[0.8, 0.2])), Outcome::Counted);

        let cm = eval.analyzer().confusion_matrix();
        assert_eq!(cm.get_count("label1", "label1").unwrap(), 1);
        assert_eq!(cm.get_count("label2", "label1").unwrap(), 1);
        assert_eq!(eval.analyzer().correctly_classified(), 1);
    }

    #[test]
    fn empty_score_vector_is_skipped() {
        let mut eval = evaluator(KeyLabel::Verbatim);
        assert_eq!(eval.add_record(&record("label1", &[])), Outcome::Skipped);

        assert_eq!(eval.analyzer().total_instances(), 0);
        assert_eq!(
            eval.stats(),
            RunStats {
                files: 0,
                records: 1,
                skipped: 1
            }
        );
    }

    #[test]
    fn position_without_label_goes_to_default() {
        let mut eval = evaluator(KeyLabel::Verbatim);
        eval.add_record(&record("label2", &[0.1, 0.2, 0.9]));

        let cm = eval.analyzer().confusion_matrix();
        assert_eq!(cm.get_count("label2", "DEFAULT").unwrap(), 1);
        assert_eq!(eval.analyzer().incorrectly_classified(), 1);
    }

    #[test]
    fn key_pattern_extracts_actual_label() {
        let mut eval = evaluator(KeyLabel::pattern(r"^/([^/]+)/").unwrap());
        eval.add_record(&record("/label2/doc-17", &[0.0, 1.0]));

        assert_eq!(eval.analyzer().correctly_classified(), 1);
        assert_eq!(
            eval.analyzer().confusion_matrix().get_count("label2", "label2").unwrap(),
            1
        );
    }

    #[test]
    fn key_label_resolution() {
        assert_eq!(KeyLabel::Verbatim.resolve("a/b"), "a/b");
        let whole = KeyLabel::pattern(r"[a-z]+").unwrap();
        assert_eq!(whole.resolve("42abc9"), "abc");
        let group = KeyLabel::pattern(r"^(\w+)-\d+$").unwrap();
        assert_eq!(group.resolve("spam-3"), "spam");
        assert_eq!(group.resolve("no match"), "no match");
        assert!(KeyLabel::pattern("(").is_err());
    }

    #[test]
    fn empty_label_index_is_a_configuration_error() {
        let err = Evaluator::new(LabelIndex::default(), "DEFAULT", KeyLabel::Verbatim)
            .err()
            .unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn finish_serializes_report() {
        let mut eval = evaluator(KeyLabel::Verbatim);
        eval.add_record(&record("label1", &[0.9, 0.1]));
        let report = eval.finish();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["summary"]["correctly_classified"], 1);
        assert_eq!(json["summary"]["correct_percentage"], 100.0);
        assert_eq!(json["stats"]["records"], 1);
        assert_eq!(json["confusion_matrix"]["counts"][0][0], 1);
    }
}
