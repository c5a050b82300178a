use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::{error::Result, evaluation::KeyLabel, logging::LogFormat};

/// Report format written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Summary table and confusion matrix.
    #[default]
    Text,
    /// Summary, confusion matrix and record tallies as JSON.
    Json,
}

/// Prints evaluation statistics for the output of a classifier.
///
/// Reads `part-*` parquet files of (key, scores) records, picks the best scoring
/// label of each record and compares it with the label carried by the key.
#[derive(Parser, Debug)]
#[command(name = "rnb-eval", version, about, long_about = None)]
pub struct Cli {
    /// Classifier output directory, or a single record file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Label index mapping score positions to label names (.json or text)
    #[arg(short, long)]
    pub label_index: PathBuf,

    /// Bucket for labels missing from the label index
    #[arg(long, default_value = "DEFAULT")]
    pub default_label: String,

    /// Regex extracting the actual label from a record key (first group or whole match)
    #[arg(long)]
    pub key_pattern: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output_format: OutputFormat,

    /// Log level used when RNB_EVAL_LOG and RUST_LOG are unset
    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[arg(long, default_value_t = LogFormat::Human)]
    pub log_format: LogFormat,
}

impl Cli {
    pub fn key_label(&self) -> Result<KeyLabel> {
        match &self.key_pattern {
            Some(pattern) => KeyLabel::pattern(pattern),
            None => Ok(KeyLabel::Verbatim),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["rnb-eval", "-i", "out", "-l", "labels.json"]).unwrap();
        assert_eq!(cli.input, PathBuf::from("out"));
        assert_eq!(cli.default_label, "DEFAULT");
        assert_eq!(cli.output_format, OutputFormat::Text);
        assert_eq!(cli.log_format, LogFormat::Human);
        assert!(matches!(cli.key_label().unwrap(), KeyLabel::Verbatim));
    }

    #[test]
    fn overrides() {
        let cli = Cli::try_parse_from([
            "rnb-eval",
            "--input",
            "out",
            "--label-index",
            "labelindex",
            "--default-label",
            "Unknown",
            "--key-pattern",
            "^/([^/]+)/",
            "--output-format",
            "json",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.default_label, "Unknown");
        assert_eq!(cli.output_format, OutputFormat::Json);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(matches!(cli.key_label().unwrap(), KeyLabel::Pattern(_)));
    }

    #[test]
    fn label_index_is_required() {
        assert!(Cli::try_parse_from(["rnb-eval", "-i", "out"]).is_err());
    }
}
