//! Error types for the memory engine.
//!
//! Every failure surfaces synchronously to the caller of the operation that
//! triggered it. Nothing is retried internally and nothing is silently
//! dropped: an export either contains every record or fails.

/// Failure converting a content part to or from its transport form.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Media item carries no bytes.
    #[error("media payload is empty")]
    EmptyPayload,

    /// Bytes do not start with a known image signature.
    #[error("unable to detect image format")]
    UnknownFormat,

    /// Format tag is not one of the supported image formats.
    #[error("unsupported media format: {0}")]
    UnsupportedFormat(String),

    /// Storage tag other than `base64`.
    #[error("unsupported media storage: {0}")]
    UnsupportedStorage(String),

    /// Timestamp cannot be represented as a calendar time.
    #[error("timestamp out of range: {0} ms")]
    TimestampOutOfRange(i64),
    /// Payload is not valid base64.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Engine configuration that cannot be honored.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// `minScreenshots` is larger than `maxScreenshots`.
    #[error("minScreenshots ({min}) must not exceed maxScreenshots ({max})")]
    ScreenshotBounds {
        /// Configured floor.
        min: usize,
        /// Configured ceiling.
        max: usize,
    },
}

/// Errors surfaced by [`AgentMemory`](crate::AgentMemory) operations.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// An observation with no content parts was appended.
    #[error("observation has no content to render")]
    EmptyObservation,

    /// A content part of the record at `index` failed to encode or decode.
    #[error("codec error in observation {index}: {source}")]
    Codec {
        /// Position of the offending record in the log.
        index: usize,
        /// Underlying codec failure.
        #[source]
        source: CodecError,
    },

    /// A mask was applied to a log of a different length.
    #[error("mask covers {mask} records but the log holds {log}")]
    MaskMismatch {
        /// Mask length.
        mask: usize,
        /// Log length.
        log: usize,
    },

    /// Invalid engine configuration.
    #[error("invalid memory configuration: {0}")]
    Config(#[from] ConfigError),

    /// Snapshot JSON could not be parsed or produced.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Snapshot file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MemoryError {
    /// Attach a record index to a codec failure.
    pub fn codec(index: usize, source: CodecError) -> Self {
        Self::Codec { index, source }
    }
}
