use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

use parquet::{
    file::{reader::FileReader, serialized_reader::SerializedFileReader},
    record::{reader::RowIter, ListAccessor, RowAccessor},
};

use crate::error::{EvalError, Result};

/// Parquet schema of a classifier output file.
pub const RECORD_SCHEMA: &str = "
message record {
    required binary key (UTF8);
    repeated double scores;
}
";

/// One classifier output: an instance key and the score of every label position.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub key: String,
    pub scores: Vec<f64>,
}

/// Returns the position and value of the highest score.
///
/// The first position holding the maximum wins ties. Returns `None` for an empty
/// vector or one with no comparable score.
pub fn best_index(scores: &[f64]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    let mut best_score = f64::NEG_INFINITY;
    for (idx, &score) in scores.iter().enumerate() {
        if score > best_score || (best.is_none() && score == f64::NEG_INFINITY) {
            best_score = score;
            best = Some((idx, score));
        }
    }
    best
}

/// Lists the `part-*` files of a classifier output directory in name order.
///
/// A path pointing at a file is returned as is.
pub fn part_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let is_part = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with("part-"));
        if is_part && entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Forward-only reader over the records of one parquet file.
pub struct RecordReader {
    rows: RowIter<'static>,
}

impl RecordReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let reader: SerializedFileReader<File> = SerializedFileReader::new(file)?;
        let rows = RowIter::from_file_into(Box::new(reader));
        Ok(Self { rows })
    }

    /// Number of rows declared in the file metadata.
    pub fn declared_rows(path: &Path) -> Result<i64> {
        let reader = SerializedFileReader::new(File::open(path)?)?;
        Ok(reader.metadata().file_metadata().num_rows())
    }
}

impl Iterator for RecordReader {
    type Item = Result<ScoredRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.rows.next()? {
            Ok(row) => row,
            Err(e) => return Some(Err(e.into())),
        };
        Some(decode(&row))
    }
}

fn decode(row: &parquet::record::Row) -> Result<ScoredRecord> {
    let key = row
        .get_string(0)
        .map_err(|e| EvalError::Record(format!("missing key: {e}")))?
        .clone();
    let list = row
        .get_list(1)
        .map_err(|e| EvalError::Record(format!("missing scores for '{key}': {e}")))?;
    let scores = (0..list.len())
        .map(|i| list.get_double(i))
        .collect::<std::result::Result<Vec<f64>, _>>()
        .map_err(|e| EvalError::Record(format!("bad score for '{key}': {e}")))?;
    Ok(ScoredRecord { key, scores })
}
