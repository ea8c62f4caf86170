//! Resource buffers and the codec state attached to them.

use std::sync::Arc;

use crate::color::ProfileSource;
use crate::jpg::JpegDecoderState;
use crate::limits::Limits;
use crate::png::{PngDecoderState, PngEncoderState};
use crate::registry::CodecId;

/// Position within a decoder's state machine.
///
/// Advances `NotStarted → BeginRead → FinishRead`; any failure moves
/// to `Failed`, from which no operation makes further progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecoderStage {
    NotStarted,
    BeginRead,
    FinishRead,
    Failed,
}

/// Codec state installed on a [`ResourceBuffer`] by acquisition.
pub enum CodecState {
    PngDecoder(PngDecoderState),
    PngEncoder(PngEncoderState),
    JpegDecoder(JpegDecoderState),
}

impl CodecState {
    /// The identifier of the codec this state belongs to.
    pub fn codec_id(&self) -> CodecId {
        match self {
            Self::PngDecoder(_) => CodecId::DecodePng,
            Self::PngEncoder(_) => CodecId::EncodePng,
            Self::JpegDecoder(_) => CodecId::DecodeJpeg,
        }
    }

    /// Decoder stage, or `None` for encoder states.
    pub fn decoder_stage(&self) -> Option<DecoderStage> {
        match self {
            Self::PngDecoder(s) => Some(s.stage()),
            Self::JpegDecoder(s) => Some(s.stage()),
            Self::PngEncoder(_) => None,
        }
    }

    /// Where the decoder's color profile came from.
    pub fn profile_source(&self) -> Option<ProfileSource> {
        match self {
            Self::PngDecoder(s) => Some(s.profile_source()),
            Self::JpegDecoder(s) => Some(s.profile_source()),
            Self::PngEncoder(_) => None,
        }
    }

    /// Required (stride, byte size) for the caller's pixel buffer,
    /// known once header parsing has run.
    pub fn required_layout(&self) -> Option<(usize, usize)> {
        match self {
            Self::PngDecoder(s) => s.required_layout(),
            Self::JpegDecoder(s) => s.required_layout(),
            Self::PngEncoder(_) => None,
        }
    }
}

/// An externally owned byte container with a single opaque
/// codec-state slot.
///
/// For decode, it holds the encoded input; for encode, it receives
/// the produced stream. The slot is written at most once per buffer:
/// re-acquiring returns the already-installed state (see
/// [`crate::acquire_decoder_over_buffer`]).
pub struct ResourceBuffer {
    bytes: Arc<[u8]>,
    limits: Option<Limits>,
    codec_state: Option<CodecState>,
}

impl ResourceBuffer {
    /// Wrap an already-loaded byte buffer.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
            limits: None,
            codec_state: None,
        }
    }

    /// An empty buffer, for use as an encode target.
    pub fn empty() -> Self {
        Self::from_bytes(Vec::<u8>::new())
    }

    /// Attach decode resource limits. Takes effect on the next
    /// acquisition.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// The contained bytes: encoded input, or encoder output after a
    /// successful write.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The installed codec state, if any.
    pub fn codec_state(&self) -> Option<&CodecState> {
        self.codec_state.as_ref()
    }

    pub(crate) fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub(crate) fn limits(&self) -> Option<&Limits> {
        self.limits.as_ref()
    }

    pub(crate) fn codec_state_mut(&mut self) -> Option<&mut CodecState> {
        self.codec_state.as_mut()
    }

    pub(crate) fn install_state(&mut self, state: CodecState) {
        debug_assert!(self.codec_state.is_none());
        self.codec_state = Some(state);
    }

    pub(crate) fn clear_codec_state(&mut self) {
        self.codec_state = None;
    }

    pub(crate) fn set_bytes(&mut self, bytes: Vec<u8>) {
        self.bytes = bytes.into();
    }
}
