use std::collections::HashSet;
use std::io::BufRead;
use std::iter::FusedIterator;
use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::config::SentencePairConfig;
use crate::data::{Record, SentencePair, require};
use crate::errors::{FieldError, ReaderError};
use crate::source::RecordStream;
use crate::transport::fs::{LineReader, LineStream};
use crate::types::{FieldName, Label, LineNumber};

/// Streams projected records from a JSONL sentence-pair corpus.
///
/// Every line must be a JSON object carrying the label field. Lines whose
/// label is outside the configured filter are skipped; the rest are reduced
/// to exactly the target keys, and a missing target key is an error rather
/// than a skip.
pub struct SentencePairReader<R = LineStream> {
    lines: LineReader<R>,
    target_keys: Vec<FieldName>,
    label_field: FieldName,
    label_filters: Option<HashSet<Label>>,
    yielded: usize,
    finished: bool,
}

impl SentencePairReader {
    /// Open the file named by `config.path`.
    pub fn open(config: SentencePairConfig) -> Result<Self, ReaderError> {
        let lines = LineReader::open(&config.path, config.compression)?;
        Ok(Self::with_lines(lines, config))
    }
}

impl<R: BufRead> SentencePairReader<R> {
    /// Read from an already-open stream; `config.path` only labels errors.
    ///
    /// With `config.compression` set to `Gzip`, read failures are reported as
    /// [`ReaderError::Decode`]; otherwise as [`ReaderError::FileAccess`].
    pub fn from_reader(reader: R, config: SentencePairConfig) -> Self {
        let lines = LineReader::new(reader, config.path.clone(), config.compression);
        Self::with_lines(lines, config)
    }

    fn with_lines(lines: LineReader<R>, config: SentencePairConfig) -> Self {
        Self {
            lines,
            target_keys: config.target_keys,
            label_field: config.label_field,
            label_filters: config.label_filters,
            yielded: 0,
            finished: false,
        }
    }

    /// Yield typed [`SentencePair`]s instead of records.
    ///
    /// The target keys must include `sentence1`, `sentence2` and `gold_label`.
    pub fn into_pairs(self) -> SentencePairs<R> {
        SentencePairs { reader: self }
    }

    fn next_record(&mut self) -> Result<Option<Record>, ReaderError> {
        while let Some(line) = self.lines.next_line()? {
            let at = self.lines.location();
            let record: Record = serde_json::from_str(&line).map_err(|err| ReaderError::Parse {
                at: at.clone(),
                reason: format!("invalid JSON object: {err}"),
            })?;
            let label = require(&record, &self.label_field).map_err(|err| err.at(at.clone()))?;
            if let Some(filters) = &self.label_filters
                && !label_allowed(label, filters)
            {
                continue;
            }
            return self.project(&record).map(Some).map_err(|err| err.at(at));
        }
        Ok(None)
    }

    fn project(&self, record: &Record) -> Result<Record, FieldError> {
        let mut projected = Record::new();
        for key in &self.target_keys {
            projected.insert(key.clone(), require(record, key)?.clone());
        }
        Ok(projected)
    }
}

fn label_allowed(label: &Value, filters: &HashSet<Label>) -> bool {
    label
        .as_str()
        .is_some_and(|label| filters.contains(label))
}

impl<R: BufRead> Iterator for SentencePairReader<R> {
    type Item = Result<Record, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_record() {
            Ok(Some(record)) => {
                self.yielded += 1;
                Some(Ok(record))
            }
            Ok(None) => {
                self.finished = true;
                info!(
                    path = %self.lines.path().display(),
                    lines_read = self.lines.lines_read(),
                    yielded = self.yielded,
                    "sentence pair stream exhausted"
                );
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

impl<R: BufRead> FusedIterator for SentencePairReader<R> {}

impl<R: BufRead> RecordStream for SentencePairReader<R> {
    fn origin(&self) -> &Path {
        self.lines.path()
    }

    fn lines_read(&self) -> LineNumber {
        self.lines.lines_read()
    }

    fn yielded(&self) -> usize {
        self.yielded
    }
}

/// Typed view over a [`SentencePairReader`].
pub struct SentencePairs<R = LineStream> {
    reader: SentencePairReader<R>,
}

impl<R: BufRead> Iterator for SentencePairs<R> {
    type Item = Result<SentencePair, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.reader.next()? {
            Ok(record) => record,
            Err(err) => return Some(Err(err)),
        };
        let pair = SentencePair::from_record(&record).map_err(|err| {
            self.reader.finished = true;
            err.at(self.reader.lines.location())
        });
        Some(pair)
    }
}

impl<R: BufRead> FusedIterator for SentencePairs<R> {}
