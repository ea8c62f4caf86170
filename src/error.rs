use enough::StopReason;

use crate::registry::CodecId;

/// Errors from codec selection, decode, encode, and color transform.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CodecError {
    /// An allocation failed, or the color engine could not build a
    /// profile or transform.
    #[error("out of memory: {0}")]
    OutOfMemory(&'static str),

    /// Stage-order violation, undersized caller buffer, or an
    /// unexpected post-transform pixel layout.
    #[error("invalid internal state: {0}")]
    InvalidInternalState(&'static str),

    /// The underlying PNG library rejected the stream.
    #[error("png decoding failed: {0}")]
    PngDecodingFailed(#[from] png::DecodingError),

    /// The underlying PNG library failed while writing.
    #[error("png encoding failed: {0}")]
    PngEncodingFailed(#[from] png::EncodingError),

    /// The underlying JPEG library rejected the stream.
    #[error("jpeg decoding failed: {0}")]
    JpegDecodingFailed(#[from] jpeg::Error),

    /// No codec definition is registered for this identifier.
    #[error("codec not implemented: {0:?}")]
    NotImplemented(CodecId),

    /// The stream is valid but outside what the decoded-surface
    /// contract supports (e.g. 16-bit lossless JPEG).
    #[error("unsupported format variant: {0}")]
    UnsupportedVariant(String),

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("operation cancelled")]
    Cancelled(StopReason),
}

impl From<StopReason> for CodecError {
    fn from(r: StopReason) -> Self {
        CodecError::Cancelled(r)
    }
}
