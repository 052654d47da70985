use std::collections::HashSet;
use std::path::PathBuf;

use crate::constants::reviews::CLASS_FIELD;
use crate::constants::sentence_pairs::{DEFAULT_TARGET_KEYS, LABEL_FIELD};
use crate::data::ClassKey;
use crate::errors::ReaderError;
use crate::transport::fs::Compression;
use crate::types::{FieldName, Label};

/// Configuration for reading a line-delimited JSON sentence-pair corpus.
#[derive(Clone, Debug)]
pub struct SentencePairConfig {
    /// Input file, one JSON object per line.
    pub path: PathBuf,
    /// Fields projected into each yielded record, in output order.
    pub target_keys: Vec<FieldName>,
    /// Labels to keep; `None` keeps every line.
    pub label_filters: Option<HashSet<Label>>,
    /// Field holding the gold label; must be present on every line.
    pub label_field: FieldName,
    /// Input compression.
    pub compression: Compression,
}

impl SentencePairConfig {
    /// Create a config projecting both sentences and the gold label.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            target_keys: DEFAULT_TARGET_KEYS.iter().map(|key| key.to_string()).collect(),
            label_filters: None,
            label_field: LABEL_FIELD.to_string(),
            compression: Compression::Auto,
        }
    }

    /// Override the projected fields.
    pub fn with_target_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<FieldName>,
    {
        self.target_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Keep only lines whose label is one of `labels`.
    pub fn with_label_filters<I, L>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Label>,
    {
        self.label_filters = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    /// Read the label from `field` instead of `gold_label`.
    pub fn with_label_field(mut self, field: impl Into<FieldName>) -> Self {
        self.label_field = field.into();
        self
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }
}

/// Configuration for class-capped sampling of a compressed review dump.
#[derive(Clone, Debug)]
pub struct ClassCapConfig {
    /// Input file, one literal record per line.
    pub path: PathBuf,
    /// Classes to sample; records of any other class are skipped.
    pub target_classes: Vec<ClassKey>,
    /// Maximum records yielded per class.
    pub per_class: usize,
    /// Field holding the class value.
    pub class_field: FieldName,
    /// Input compression; review dumps are gzip by default.
    pub compression: Compression,
}

impl ClassCapConfig {
    /// Create a config sampling up to `per_class` records of each target score.
    pub fn new<I, K>(path: impl Into<PathBuf>, target_classes: I, per_class: usize) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<ClassKey>,
    {
        Self {
            path: path.into(),
            target_classes: target_classes.into_iter().map(Into::into).collect(),
            per_class,
            class_field: CLASS_FIELD.to_string(),
            compression: Compression::Gzip,
        }
    }

    /// Read the class from `field` instead of `overall`.
    pub fn with_class_field(mut self, field: impl Into<FieldName>) -> Self {
        self.class_field = field.into();
        self
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Reject settings that cannot produce a meaningful sample.
    pub fn validate(&self) -> Result<(), ReaderError> {
        if self.per_class == 0 {
            return Err(ReaderError::Configuration(
                "per-class cap must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentence_pair_defaults_project_canonical_fields() {
        let config = SentencePairConfig::new("snli_1.0_dev.jsonl");
        assert_eq!(config.target_keys, vec!["sentence1", "sentence2", "gold_label"]);
        assert_eq!(config.label_field, "gold_label");
        assert!(config.label_filters.is_none());
        assert_eq!(config.compression, Compression::Auto);
    }

    #[test]
    fn sentence_pair_builders_override_defaults() {
        let config = SentencePairConfig::new("pairs.jsonl")
            .with_target_keys(["sentence1"])
            .with_label_filters(["entailment", "neutral"])
            .with_label_field("label")
            .with_compression(Compression::Plain);
        assert_eq!(config.target_keys, vec!["sentence1"]);
        let filters = config.label_filters.unwrap();
        assert!(filters.contains("entailment") && filters.contains("neutral"));
        assert_eq!(config.label_field, "label");
        assert_eq!(config.compression, Compression::Plain);
    }

    #[test]
    fn class_cap_defaults_and_validation() {
        let config = ClassCapConfig::new("reviews.json.gz", [5, 1], 2);
        assert_eq!(config.target_classes, vec![ClassKey::Int(5), ClassKey::Int(1)]);
        assert_eq!(config.class_field, "overall");
        assert_eq!(config.compression, Compression::Gzip);
        assert!(config.validate().is_ok());

        let zero = ClassCapConfig::new("reviews.json.gz", [5], 0);
        assert!(matches!(zero.validate(), Err(ReaderError::Configuration(_))));
    }
}
