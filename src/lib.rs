//! # zenframes
//!
//! Image-codec dispatch for a job pipeline: sniff the format of an
//! in-memory byte buffer, drive a staged decode into a caller-owned
//! BGRA surface, and encode such a surface back to PNG.
//!
//! ## Shape
//!
//! - [`select_codec`] maps a byte prefix to a [`CodecId`] via a
//!   table of magic-byte rules.
//! - A [`ResourceBuffer`] owns the bytes plus a lazily installed,
//!   at-most-once codec state; [`acquire_decoder_over_buffer`]
//!   installs it.
//! - [`decoder_get_frame_info`] runs header parsing and parameter
//!   negotiation once and reports `(width, height, format)`; the
//!   format is always [`PixelFormat::Bgra32`].
//! - The caller allocates a [`PixelSurface`] of that geometry and
//!   [`decoder_read_frame`] bulk-decodes into it, converting to sRGB
//!   when the file carried usable color metadata (ICC profile, or
//!   cHRM + gAMA for PNG).
//! - [`bitmap_write_png`] encodes a BGRA surface to an sRGB-tagged
//!   PNG stream on the buffer.
//!
//! Decoders are strict state machines: operations must be issued in
//! stage order, and any lower-level failure releases everything the
//! state owns and quarantines it, after which every further call
//! reports [`CodecError::InvalidInternalState`].
//!
//! ```no_run
//! use enough::Unstoppable;
//! use zenframes::*;
//!
//! # fn main() -> Result<(), CodecError> {
//! let bytes = std::fs::read("photo.png").expect("read input");
//! let id = select_codec(&bytes);
//! let mut resource = ResourceBuffer::from_bytes(bytes);
//! acquire_decoder_over_buffer(&mut resource, id)?;
//! let info = decoder_get_frame_info(&mut resource, id, Unstoppable)?;
//! let mut surface = PixelSurface::new(info.width, info.height, PixelFormat::Bgra32)?;
//! decoder_read_frame(&mut resource, id, &mut surface, Unstoppable)?;
//! # Ok(()) }
//! ```

#![forbid(unsafe_code)]

mod buffer;
mod color;
mod error;
mod jpg;
mod limits;
mod magic;
mod pixel;
mod png;
mod registry;
mod source;

pub use buffer::{CodecState, DecoderStage, ResourceBuffer};
pub use color::ProfileSource;
pub use enough::{Stop, Unstoppable};
pub use error::CodecError;
pub use jpg::JpegDecoderState;
pub use limits::Limits;
pub use magic::select_codec;
pub use pixel::{FrameInfo, PixelFormat, PixelSurface};
pub use png::{PngDecoderState, PngEncoderState};
pub use registry::{CODEC_DEFINITIONS, CodecDefinition, CodecId, codec_definition};

// ── Facade ──────────────────────────────────────────────────────────

/// Install (or reuse) the codec state for `id` on the buffer.
///
/// Idempotent: a buffer that already carries a codec state keeps it.
/// An identifier without a registry entry reports
/// [`CodecError::NotImplemented`].
pub fn acquire_decoder_over_buffer(
    resource: &mut ResourceBuffer,
    id: CodecId,
) -> Result<(), CodecError> {
    let def = codec_definition(id)?;
    (def.acquire)(resource)
}

/// Drive the decoder through header parsing (once) and report the
/// frame geometry. The decoded format is always
/// [`PixelFormat::Bgra32`].
pub fn decoder_get_frame_info(
    resource: &mut ResourceBuffer,
    id: CodecId,
    stop: impl Stop,
) -> Result<FrameInfo, CodecError> {
    let def = codec_definition(id)?;
    let get_frame_info = def
        .get_frame_info
        .ok_or(CodecError::NotImplemented(id))?;
    let state = resource
        .codec_state_mut()
        .ok_or(CodecError::InvalidInternalState(
            "no codec state acquired on this buffer",
        ))?;
    get_frame_info(state, &stop)
}

/// Bulk-decode the frame into the caller's surface and convert to
/// sRGB when a color profile was recovered.
///
/// Valid only after [`decoder_get_frame_info`]; issuing it from any
/// other stage fails with [`CodecError::InvalidInternalState`]
/// without mutating the state.
pub fn decoder_read_frame(
    resource: &mut ResourceBuffer,
    id: CodecId,
    surface: &mut PixelSurface,
    stop: impl Stop,
) -> Result<(), CodecError> {
    let def = codec_definition(id)?;
    let read_frame = def.read_frame.ok_or(CodecError::NotImplemented(id))?;
    let state = resource
        .codec_state_mut()
        .ok_or(CodecError::InvalidInternalState(
            "no codec state acquired on this buffer",
        ))?;
    read_frame(state, surface, &stop)
}

/// Encode a BGRA surface as PNG onto the buffer.
///
/// Acquires the PNG encoder state if the buffer has none, then
/// replaces the buffer's bytes with the encoded stream. On failure
/// the buffer keeps its previous bytes and no partial output is
/// preserved.
pub fn bitmap_write_png(
    resource: &mut ResourceBuffer,
    surface: &PixelSurface,
    stop: impl Stop,
) -> Result<(), CodecError> {
    let def = codec_definition(CodecId::EncodePng)?;
    (def.acquire)(resource)?;
    let write_frame = def
        .write_frame
        .ok_or(CodecError::NotImplemented(CodecId::EncodePng))?;
    let state = resource
        .codec_state_mut()
        .ok_or(CodecError::InvalidInternalState(
            "no codec state acquired on this buffer",
        ))?;
    write_frame(state, surface, &stop)?;
    let encoded = match resource.codec_state_mut() {
        Some(CodecState::PngEncoder(enc)) => enc.take_output(),
        _ => {
            return Err(CodecError::InvalidInternalState(
                "codec state is not a png encoder",
            ));
        }
    };
    resource.set_bytes(encoded);
    Ok(())
}

/// Run the codec's dispose hook and drop the buffer's codec state.
///
/// Dropping the [`ResourceBuffer`] releases everything as well; this
/// exists for callers that reuse the buffer.
pub fn release_codec_state(resource: &mut ResourceBuffer) {
    if let Some(state) = resource.codec_state_mut() {
        if let Ok(def) = codec_definition(state.codec_id()) {
            if let Some(dispose) = def.dispose {
                dispose(state);
            }
        }
    }
    resource.clear_codec_state();
}
