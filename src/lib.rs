#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Reader configuration types.
pub mod config;
/// Centralized constants: default field names and decoder limits.
pub mod constants;
/// Record, class key, and typed pair types.
pub mod data;
/// Record predicates for the class-capped sampler.
pub mod filter;
/// Safe decoder for literal-record lines.
pub mod literal;
/// Per-class quota bookkeeping.
pub mod quota;
/// Record streams over corpus files.
pub mod source;
/// Input transports used by readers (local files today).
pub mod transport;
/// Shared type aliases.
pub mod types;

mod errors;

pub use config::{ClassCapConfig, SentencePairConfig};
pub use data::{ClassKey, Record, SentencePair};
pub use errors::{FieldError, Location, ReaderError};
pub use filter::{AcceptAll, LengthBetween, RecordFilter, TryFilter, length_between};
pub use literal::LiteralError;
pub use quota::{ClassState, QuotaTable};
pub use source::{ClassCappedSampler, RecordStream, SentencePairReader, SentencePairs};
pub use transport::Compression;
pub use types::{FieldName, Label, LineNumber, RawLine};
