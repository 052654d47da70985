use std::io::BufRead;
use std::iter::FusedIterator;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::ClassCapConfig;
use crate::data::{ClassKey, Record};
use crate::errors::ReaderError;
use crate::filter::{AcceptAll, RecordFilter};
use crate::literal::decode_record;
use crate::quota::QuotaTable;
use crate::source::RecordStream;
use crate::transport::fs::{LineReader, LineStream};
use crate::types::{FieldName, LineNumber};

/// Streams review records with at most `per_class` records per target class.
///
/// For each line: decode the record, read its class, skip it unless that
/// class still has room, then ask the filter. Only accepted records count
/// against a quota. Once every target class is full the stream ends without
/// pulling another line, so large dumps are not read to the end.
pub struct ClassCappedSampler<R = LineStream, F = AcceptAll> {
    lines: LineReader<R>,
    quota: QuotaTable,
    class_field: FieldName,
    filter: F,
    yielded: usize,
    finished: bool,
}

impl ClassCappedSampler {
    /// Open the file named by `config.path` with the accept-all filter.
    pub fn open(config: ClassCapConfig) -> Result<Self, ReaderError> {
        config.validate()?;
        let lines = LineReader::open(&config.path, config.compression)?;
        Ok(Self::with_lines(lines, config))
    }
}

impl<R: BufRead> ClassCappedSampler<R> {
    /// Sample from an already-decoded stream; `config.path` only labels errors.
    ///
    /// `config.compression` names what the stream was decoded from and decides
    /// how read failures are reported: `Gzip` (the default) reports them as
    /// [`ReaderError::Decode`], `Plain` or `Auto` as [`ReaderError::FileAccess`].
    /// Set it to `Plain` when handing over an uncompressed reader.
    pub fn from_reader(reader: R, config: ClassCapConfig) -> Result<Self, ReaderError> {
        config.validate()?;
        let lines = LineReader::new(reader, config.path.clone(), config.compression);
        Ok(Self::with_lines(lines, config))
    }

    fn with_lines(lines: LineReader<R>, config: ClassCapConfig) -> Self {
        Self {
            lines,
            quota: QuotaTable::new(config.target_classes, config.per_class),
            class_field: config.class_field,
            filter: AcceptAll,
            yielded: 0,
            finished: false,
        }
    }
}

impl<R: BufRead, F: RecordFilter> ClassCappedSampler<R, F> {
    /// Replace the acceptance filter, e.g. with [`crate::filter::LengthBetween`].
    pub fn with_filter<G: RecordFilter>(self, filter: G) -> ClassCappedSampler<R, G> {
        ClassCappedSampler {
            lines: self.lines,
            quota: self.quota,
            class_field: self.class_field,
            filter,
            yielded: self.yielded,
            finished: self.finished,
        }
    }

    /// Per-class counts accepted so far.
    pub fn quota(&self) -> &QuotaTable {
        &self.quota
    }

    fn next_record(&mut self) -> Result<Option<Record>, ReaderError> {
        loop {
            if self.quota.is_satisfied() {
                debug!(
                    path = %self.lines.path().display(),
                    lines_read = self.lines.lines_read(),
                    "all class quotas filled; stopping early"
                );
                return Ok(None);
            }
            let Some(line) = self.lines.next_line()? else {
                warn!(
                    path = %self.lines.path().display(),
                    quota = %quota_summary(&self.quota),
                    "input exhausted before every class quota filled"
                );
                return Ok(None);
            };
            let at = self.lines.location();
            let record = decode_record(&line).map_err(|err| ReaderError::Parse {
                at: at.clone(),
                reason: err.to_string(),
            })?;
            let key = ClassKey::from_record(&record, &self.class_field)
                .map_err(|err| err.at(at.clone()))?;
            if !self.quota.has_room(&key) {
                continue;
            }
            if !self.filter.accept(&record).map_err(|err| err.at(at))? {
                continue;
            }
            self.quota.record(&key);
            return Ok(Some(record));
        }
    }
}

fn quota_summary(quota: &QuotaTable) -> String {
    quota
        .iter()
        .map(|(class, count)| format!("{class}={count}/{}", quota.cap()))
        .collect::<Vec<_>>()
        .join(", ")
}

impl<R: BufRead, F: RecordFilter> Iterator for ClassCappedSampler<R, F> {
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
                    quota = %quota_summary(&self.quota),
                    "class-capped sampling finished"
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

impl<R: BufRead, F: RecordFilter> FusedIterator for ClassCappedSampler<R, F> {}

impl<R: BufRead, F: RecordFilter> RecordStream for ClassCappedSampler<R, F> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::LengthBetween;
    use crate::quota::ClassState;
    use crate::transport::fs::Compression;
    use serde_json::json;
    use std::io::Cursor;

    fn review(overall: f64, text: &str) -> String {
        format!("{{'overall': {overall:?}, 'reviewText': {text:?}}}\n")
    }

    fn sampler(lines: &[String], classes: &[i64], cap: usize) -> ClassCappedSampler<Cursor<Vec<u8>>> {
        let config = ClassCapConfig::new("reviews.json", classes.iter().copied(), cap)
            .with_compression(Compression::Plain);
        ClassCappedSampler::from_reader(Cursor::new(lines.concat().into_bytes()), config).unwrap()
    }

    #[test]
    fn caps_each_class_and_ignores_others() {
        let lines = vec![
            review(5.0, "great"),
            review(3.0, "meh"),
            review(5.0, "superb"),
            review(5.0, "excellent"),
            review(1.0, "awful"),
            review(1.0, "broken"),
        ];
        let records: Vec<Record> = sampler(&lines, &[5, 1], 2)
            .collect::<Result<_, _>>()
            .unwrap();
        let scores: Vec<f64> = records
            .iter()
            .map(|record| record["overall"].as_f64().unwrap())
            .collect();
        assert_eq!(scores, vec![5.0, 5.0, 1.0, 1.0]);
    }

    #[test]
    fn stops_pulling_lines_once_every_quota_is_full() {
        let mut lines: Vec<String> = (0..3).map(|_| review(5.0, "fine")).collect();
        lines.push(review(1.0, "bad"));
        lines.push("this line is never decoded\n".to_string());
        let mut stream = sampler(&lines, &[5, 1], 1);

        let records: Vec<Record> = stream.by_ref().collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(stream.lines_read(), 4);
        assert_eq!(stream.quota().state(&ClassKey::from(5)), ClassState::Full);
    }

    #[test]
    fn rejected_records_do_not_consume_quota() {
        let lines = vec![
            review(5.0, "no"),
            review(5.0, "long enough"),
            review(5.0, "x"),
            review(5.0, "also long enough"),
        ];
        let records: Vec<Record> = sampler(&lines, &[5], 2)
            .with_filter(LengthBetween::new(5, 20))
            .collect::<Result<_, _>>()
            .unwrap();
        let texts: Vec<&str> = records
            .iter()
            .map(|record| record["reviewText"].as_str().unwrap())
            .collect();
        assert_eq!(texts, vec!["long enough", "also long enough"]);
    }

    #[test]
    fn closure_filters_compose() {
        let lines = vec![
            "{'overall': 4.0, 'reviewText': 'a', 'verified': False}\n".to_string(),
            "{'overall': 4.0, 'reviewText': 'b', 'verified': True}\n".to_string(),
        ];
        let records: Vec<Record> = sampler(&lines, &[4], 5)
            .with_filter(|record: &Record| record.get("verified") == Some(&json!(true)))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["reviewText"], "b");
    }

    #[test]
    fn decode_failure_ends_the_stream_after_earlier_records() {
        let lines = vec![
            review(5.0, "kept"),
            "{'overall': 5.0, 'reviewText': __import__('os')}\n".to_string(),
            review(5.0, "never reached"),
        ];
        let mut stream = sampler(&lines, &[5], 10);
        assert!(stream.next().unwrap().is_ok());
        assert!(matches!(
            stream.next(),
            Some(Err(ReaderError::Parse { at, .. })) if at.line == 2
        ));
        assert!(stream.next().is_none());
    }

    #[test]
    fn missing_class_field_is_an_error_even_for_unwanted_records() {
        let lines = vec!["{'reviewText': 'no score'}\n".to_string()];
        let mut stream = sampler(&lines, &[5], 1);
        assert!(matches!(
            stream.next(),
            Some(Err(ReaderError::MissingField { field, .. })) if field == "overall"
        ));
    }

    #[test]
    fn filter_field_errors_carry_the_line() {
        let lines = vec![
            review(2.0, "ok"),
            "{'overall': 2.0, 'summary': 'no body'}\n".to_string(),
        ];
        let mut stream = sampler(&lines, &[2], 5).with_filter(LengthBetween::new(0, 100));
        assert!(stream.next().unwrap().is_ok());
        assert!(matches!(
            stream.next(),
            Some(Err(ReaderError::MissingField { at, field })) if at.line == 2 && field == "reviewText"
        ));
    }

    #[test]
    fn empty_target_set_reads_nothing() {
        let lines = vec![review(5.0, "unused")];
        let mut stream = sampler(&lines, &[], 3);
        assert!(stream.next().is_none());
        assert_eq!(stream.lines_read(), 0);
    }

    #[test]
    fn booleans_count_toward_the_matching_integer_class() {
        let lines = vec![
            "{'overall': True, 'reviewText': 'flag'}\n".to_string(),
            "{'overall': 1, 'reviewText': 'one'}\n".to_string(),
            "{'overall': False, 'reviewText': 'zero'}\n".to_string(),
        ];
        let records: Vec<Record> = sampler(&lines, &[1], 5)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(records.len(), 2);
    }

    /// Yields one line, then fails every read.
    struct FailingReader {
        served: bool,
    }

    impl std::io::Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let data = self.fill_buf()?;
            let len = data.len().min(buf.len());
            buf[..len].copy_from_slice(&data[..len]);
            self.consume(len);
            Ok(len)
        }
    }

    impl BufRead for FailingReader {
        fn fill_buf(&mut self) -> std::io::Result<&[u8]> {
            if self.served {
                Err(std::io::Error::other("device went away"))
            } else {
                Ok(b"{'overall': 5, 'reviewText': 'first'}\n")
            }
        }

        fn consume(&mut self, _amt: usize) {
            self.served = true;
        }
    }

    #[test]
    fn read_failures_follow_the_configured_compression() {
        let plain = ClassCapConfig::new("reviews.json", [5], 10).with_compression(Compression::Plain);
        let mut stream =
            ClassCappedSampler::from_reader(FailingReader { served: false }, plain).unwrap();
        assert!(stream.next().unwrap().is_ok());
        assert!(matches!(stream.next(), Some(Err(ReaderError::FileAccess { .. }))));

        let gzip = ClassCapConfig::new("reviews.json.gz", [5], 10);
        let mut stream =
            ClassCappedSampler::from_reader(FailingReader { served: false }, gzip).unwrap();
        assert!(stream.next().unwrap().is_ok());
        assert!(matches!(
            stream.next(),
            Some(Err(ReaderError::Decode { line: 2, .. }))
        ));
    }

    #[test]
    fn zero_cap_is_rejected() {
        let config = ClassCapConfig::new("reviews.json", [5], 0);
        let result = ClassCappedSampler::from_reader(Cursor::new(Vec::new()), config);
        assert!(matches!(result, Err(ReaderError::Configuration(_))));
    }

    #[test]
    fn quota_summary_lists_classes_in_target_order() {
        let lines = vec![review(1.0, "bad")];
        let mut stream = sampler(&lines, &[5, 1], 2);
        while stream.next().is_some() {}
        assert_eq!(quota_summary(stream.quota()), "5=0/2, 1=1/2");
    }
}
