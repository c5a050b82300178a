use std::fmt;

use serde::Serialize;

use crate::error::Result;
use crate::metrics::ConfusionMatrix;

const RULE: &str = "=======================================================";
const SUB_RULE: &str = "-------------------------------------------------------";
const CAPTION_WIDTH: usize = 40;
const VALUE_WIDTH: usize = 10;

/// A predicted label together with the score the classifier gave it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifierResult {
    label: String,
    score: f64,
}

impl ClassifierResult {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn score(&self) -> f64 {
        self.score
    }
}

/// Aggregates classified instances into counts and a confusion matrix.
#[derive(Debug, Clone)]
pub struct ResultAnalyzer {
    confusion_matrix: ConfusionMatrix,
    correctly_classified: usize,
    incorrectly_classified: usize,
}

/// Snapshot of the analyzer counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_instances: usize,
    pub correctly_classified: usize,
    pub incorrectly_classified: usize,
    pub correct_percentage: f64,
    pub incorrect_percentage: f64,
}

impl ResultAnalyzer {
    /// Creates an analyzer over `vocabulary`, folding any other label into `default_label`.
    ///
    /// Fails if the vocabulary is empty, has duplicates, or contains `default_label`.
    pub fn new<I, S>(vocabulary: I, default_label: &str) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            confusion_matrix: ConfusionMatrix::new(vocabulary, default_label)?,
            correctly_classified: 0,
            incorrectly_classified: 0,
        })
    }

    /// Accounts for one instance whose true label is `actual`.
    pub fn add_instance(&mut self, actual: &str, result: &ClassifierResult) {
        if actual == result.label() {
            self.correctly_classified += 1;
        } else {
            self.incorrectly_classified += 1;
        }
        self.confusion_matrix.increment(actual, result.label());
    }

    pub fn confusion_matrix(&self) -> &ConfusionMatrix {
        &self.confusion_matrix
    }

    #[inline]
    pub fn total_instances(&self) -> usize {
        self.correctly_classified + self.incorrectly_classified
    }

    #[inline]
    pub fn correctly_classified(&self) -> usize {
        self.correctly_classified
    }

    #[inline]
    pub fn incorrectly_classified(&self) -> usize {
        self.incorrectly_classified
    }

    /// Percentage of correct instances, `0.0` before any instance is added.
    pub fn correct_percentage(&self) -> f64 {
        percentage(self.correctly_classified, self.total_instances())
    }

    pub fn incorrect_percentage(&self) -> f64 {
        percentage(self.incorrectly_classified, self.total_instances())
    }

    pub fn summary(&self) -> Summary {
        Summary {
            total_instances: self.total_instances(),
            correctly_classified: self.correctly_classified,
            incorrectly_classified: self.incorrectly_classified,
            correct_percentage: self.correct_percentage(),
            incorrect_percentage: self.incorrect_percentage(),
        }
    }

    /// The text report: summary counts followed by the confusion matrix.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * part as f64 / total as f64
    }
}

/// Formats a percentage with at most four decimals and no trailing zeros.
fn format_percentage(value: f64) -> String {
    let fixed = format!("{value:.4}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "" | "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

fn write_line(f: &mut fmt::Formatter<'_>, caption: &str, value: usize) -> fmt::Result {
    write!(
        f,
        "{caption:<CAPTION_WIDTH$}: {value:>VALUE_WIDTH$}"
    )
}

impl fmt::Display for ResultAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(f, "Summary")?;
        writeln!(f, "{SUB_RULE}")?;

        write_line(f, "Correctly Classified Instances", self.correctly_classified)?;
        writeln!(
            f,
            "\t{:>VALUE_WIDTH$}%",
            format_percentage(self.correct_percentage())
        )?;
        write_line(f, "Incorrectly Classified Instances", self.incorrectly_classified)?;
        writeln!(
            f,
            "\t{:>VALUE_WIDTH$}%",
            format_percentage(self.incorrect_percentage())
        )?;
        write_line(f, "Total Classified Instances", self.total_instances())?;
        writeln!(f)?;

        writeln!(f)?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "Confusion Matrix")?;
        writeln!(f, "{SUB_RULE}")?;
        write!(f, "{}", self.confusion_matrix)
    }
}
