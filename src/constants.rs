/// Constants used by the sentence-pair (NLI) reader.
pub mod sentence_pairs {
    /// Field carrying the gold label of a pair.
    pub const LABEL_FIELD: &str = "gold_label";
    /// Field carrying the premise sentence.
    pub const PREMISE_FIELD: &str = "sentence1";
    /// Field carrying the hypothesis sentence.
    pub const HYPOTHESIS_FIELD: &str = "sentence2";
    /// Fields projected when the caller does not choose any.
    pub const DEFAULT_TARGET_KEYS: [&str; 3] = [PREMISE_FIELD, HYPOTHESIS_FIELD, LABEL_FIELD];
}

/// Constants used by the class-capped review sampler.
pub mod reviews {
    /// Field carrying the review score used as class key.
    pub const CLASS_FIELD: &str = "overall";
    /// Field carrying the review body.
    pub const TEXT_FIELD: &str = "reviewText";
}

/// Constants used by the literal record decoder.
pub mod literal {
    /// Maximum container nesting accepted before decoding is refused.
    pub const MAX_NESTING_DEPTH: usize = 128;
}

/// Constants used by file transports.
pub mod transport {
    /// Leading bytes of every gzip member.
    pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
}
