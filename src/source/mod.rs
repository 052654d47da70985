//! Record streams over local corpus files.
//!
//! Both readers are lazy, single-pass iterators of `Result<Record, _>`:
//! - [`SentencePairReader`] projects fields out of JSONL sentence pairs.
//! - [`ClassCappedSampler`] samples literal-record reviews under per-class caps.
//!
//! Each owns its file handle and releases it when dropped, whether the stream
//! was exhausted or abandoned early. The first error ends the stream.

use std::path::Path;

use crate::data::Record;
use crate::errors::ReaderError;
use crate::types::LineNumber;

/// Class-capped review sampler.
pub mod reviews;
/// NLI sentence-pair reader.
pub mod sentence_pairs;

pub use reviews::ClassCappedSampler;
pub use sentence_pairs::{SentencePairReader, SentencePairs};

/// Progress reporting shared by record streams.
pub trait RecordStream: Iterator<Item = Result<Record, ReaderError>> {
    /// File the stream reads from.
    fn origin(&self) -> &Path;
    /// Input lines consumed so far.
    fn lines_read(&self) -> LineNumber;
    /// Records yielded so far.
    fn yielded(&self) -> usize;
}
