//! Record predicates composable into the class-capped sampler.

use crate::constants::reviews::TEXT_FIELD;
use crate::data::{Record, require_str};
use crate::errors::FieldError;
use crate::types::FieldName;

/// Decides whether a candidate record is accepted.
///
/// Any `FnMut(&Record) -> bool` closure is a filter. Implement the trait
/// directly when the decision can fail on a malformed record.
pub trait RecordFilter {
    fn accept(&mut self, record: &Record) -> Result<bool, FieldError>;
}

impl<F> RecordFilter for F
where
    F: FnMut(&Record) -> bool,
{
    fn accept(&mut self, record: &Record) -> Result<bool, FieldError> {
        Ok(self(record))
    }
}

/// Adapts a fallible closure into a filter.
///
/// ```
/// use corpus_readers::filter::{TryFilter, length_between};
/// use corpus_readers::Record;
///
/// let _filter = TryFilter(|record: &Record| length_between(record, 5, 10));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct TryFilter<F>(pub F);

impl<F> RecordFilter for TryFilter<F>
where
    F: FnMut(&Record) -> Result<bool, FieldError>,
{
    fn accept(&mut self, record: &Record) -> Result<bool, FieldError> {
        (self.0)(record)
    }
}

/// Filter that accepts every record.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAll;

impl RecordFilter for AcceptAll {
    fn accept(&mut self, _record: &Record) -> Result<bool, FieldError> {
        Ok(true)
    }
}

/// Accepts records whose text field length lies in `[min, max]`.
///
/// Length counts Unicode scalar values, not bytes.
#[derive(Clone, Debug)]
pub struct LengthBetween {
    field: FieldName,
    min: usize,
    max: usize,
}

impl LengthBetween {
    /// Bounds are inclusive and apply to the review text field.
    pub fn new(min: usize, max: usize) -> Self {
        Self {
            field: TEXT_FIELD.to_string(),
            min,
            max,
        }
    }

    /// Measure `field` instead of the review text.
    pub fn on_field(mut self, field: impl Into<FieldName>) -> Self {
        self.field = field.into();
        self
    }
}

impl RecordFilter for LengthBetween {
    fn accept(&mut self, record: &Record) -> Result<bool, FieldError> {
        length_in_range(record, &self.field, self.min, self.max)
    }
}

/// True if the review text of `record` is between `min` and `max` characters, inclusive.
///
/// To use it as a sampler filter, pass [`LengthBetween::new`] or wrap a
/// closure calling this function in [`TryFilter`].
pub fn length_between(record: &Record, min: usize, max: usize) -> Result<bool, FieldError> {
    length_in_range(record, TEXT_FIELD, min, max)
}

fn length_in_range(
    record: &Record,
    field: &str,
    min: usize,
    max: usize,
) -> Result<bool, FieldError> {
    let length = require_str(record, field)?.chars().count();
    Ok((min..=max).contains(&length))
}
