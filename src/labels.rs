use std::{fs, path::Path, sync::OnceLock};

use indexmap::IndexMap;
use regex::Regex;

use crate::error::{EvalError, Result};

/// Maps the positions of a score vector to label names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelIndex {
    /// Labels keyed by score vector position, sorted by position.
    labels: IndexMap<usize, Box<str>>,
}

fn entry_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<label>.+?)\s+(?P<index>\d+)$").expect("label index pattern is valid")
    })
}

impl LabelIndex {
    /// Builds an index from `(label, position)` pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<Box<str>>,
    {
        let mut labels = IndexMap::new();
        for (label, index) in pairs {
            let label = label.into();
            if let Some(previous) = labels.insert(index, label) {
                return Err(EvalError::LabelIndex(format!(
                    "position {index} is assigned to more than one label (first '{previous}')"
                )));
            }
        }
        labels.sort_keys();
        Ok(Self { labels })
    }

    /// Loads a label index from a file.
    ///
    /// `.json` files hold an object of `label: position` entries. Any other file holds
    /// one `label position` entry per line; blank lines and `#` comments are ignored.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json(&contents)
        } else {
            Self::parse(&contents)
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let entries: IndexMap<String, usize> = serde_json::from_str(json)?;
        Self::from_pairs(entries)
    }

    /// Parses the line oriented `label position` format.
    pub fn parse(text: &str) -> Result<Self> {
        let re = entry_pattern();
        let mut pairs = Vec::new();

        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let caps = re.captures(line).ok_or_else(|| {
                EvalError::LabelIndex(format!(
                    "line {}: expected '<label> <position>', got '{line}'",
                    lineno + 1
                ))
            })?;
            let index = caps["index"].parse::<usize>().map_err(|e| {
                EvalError::LabelIndex(format!("line {}: {e}", lineno + 1))
            })?;
            pairs.push((caps["label"].to_string(), index));
        }

        Self::from_pairs(pairs)
    }

    /// The label at score vector position `index`.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(&index).map(|l| &**l)
    }

    /// Labels in position order.
    pub fn labels(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.labels.values().map(|l| &**l)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
