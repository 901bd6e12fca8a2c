//! Error types for oqpack

use thiserror::Error;

/// Result type alias for oqpack operations
pub type Result<T> = std::result::Result<T, OqpackError>;

/// Error types that can occur while transcoding a BAM stream.
///
/// Every error is fatal: the pipeline performs no local recovery, and the
/// driver exits with status 1 after printing the diagnostic.
#[derive(Debug, Error)]
pub enum OqpackError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or wrong BAM magic at the start of the uncompressed stream
    #[error("not a BAM stream: expected magic \"BAM\\x01\", found {found:?}")]
    InvalidMagic {
        /// The four bytes actually read
        found: [u8; 4],
    },

    /// Short read at a structural boundary before the first alignment
    #[error("truncated input while reading {what}")]
    TruncatedHeader {
        /// Which header field was being read
        what: &'static str,
    },

    /// Short read at a structural boundary inside an alignment
    #[error("truncated input while reading {what} in alignment {alignment}")]
    Truncated {
        /// Which alignment field was being read
        what: &'static str,
        /// Zero-based index of the alignment
        alignment: u64,
    },

    /// Aux tag whose type bytes violate the schema (OQ not `Z`, ZQ not
    /// `B`/`C`, or an unknown type code)
    #[error("alignment {alignment}: {message}")]
    TagSchema {
        /// Zero-based index of the alignment
        alignment: u64,
        /// What was wrong with the tag
        message: String,
    },

    /// Declared and computed sizes disagree (negative aux length, or a
    /// decoded ZQ payload that does not match the sequence length)
    #[error("alignment {alignment}: {message}")]
    SizeMismatch {
        /// Zero-based index of the alignment
        alignment: u64,
        /// Which sizes disagreed
        message: String,
    },

    /// A quality score outside the representable range
    #[error("quality score {value} exceeds the maximum of 63")]
    QualityOutOfRange {
        /// The offending raw quality value
        value: u8,
    },

    /// A packed quality stream ended mid-block
    #[error("packed quality stream is truncated")]
    PackedTruncated,
}
