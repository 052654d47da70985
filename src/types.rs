/// Name of a field inside a record.
/// Examples: `sentence1`, `gold_label`, `reviewText`, `overall`
pub type FieldName = String;
/// Gold label value used by sentence-pair filters.
/// Examples: `entailment`, `contradiction`, `neutral`
pub type Label = String;
/// One-based line number within an input file.
/// Example: `17`
pub type LineNumber = usize;
/// Raw text of one input line with the trailing newline removed.
/// Example: `{'overall': 5.0, 'reviewText': 'Works great.'}`
pub type RawLine = String;
