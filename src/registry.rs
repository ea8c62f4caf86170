//! The static codec registry: identifier, display name, and the
//! operation table for each codec.
//!
//! The registry and the magic-byte rules are process-wide constants;
//! no mutable global state exists anywhere in this crate.

use enough::Stop;

use crate::buffer::{CodecState, ResourceBuffer};
use crate::error::CodecError;
use crate::jpg::JpegDecoderState;
use crate::pixel::{FrameInfo, PixelSurface};
use crate::png::{PngDecoderState, PngEncoderState};

/// Identifier of a registered (or registerable) codec.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CodecId {
    /// No codec; what [`crate::select_codec`] returns on a miss.
    Null,
    DecodePng,
    EncodePng,
    DecodeJpeg,
    /// Declared but not registered; lookups report not-implemented.
    EncodeJpeg,
}

pub type AcquireFn = fn(&mut ResourceBuffer) -> Result<(), CodecError>;
pub type GetFrameInfoFn = fn(&mut CodecState, &dyn Stop) -> Result<FrameInfo, CodecError>;
pub type ReadFrameFn = fn(&mut CodecState, &mut PixelSurface, &dyn Stop) -> Result<(), CodecError>;
pub type WriteFrameFn = fn(&mut CodecState, &PixelSurface, &dyn Stop) -> Result<(), CodecError>;
pub type DisposeFn = fn(&mut CodecState);

/// Operation table for one codec. At most one of `read_frame` /
/// `write_frame` is set per entry.
pub struct CodecDefinition {
    pub id: CodecId,
    pub name: &'static str,
    pub acquire: AcquireFn,
    pub get_frame_info: Option<GetFrameInfoFn>,
    pub read_frame: Option<ReadFrameFn>,
    pub write_frame: Option<WriteFrameFn>,
    pub dispose: Option<DisposeFn>,
}

pub static CODEC_DEFINITIONS: &[CodecDefinition] = &[
    CodecDefinition {
        id: CodecId::DecodePng,
        name: "decode png",
        acquire: acquire_decode_png,
        get_frame_info: Some(png_get_info),
        read_frame: Some(png_read_frame),
        write_frame: None,
        dispose: Some(dispose_png_decoder),
    },
    CodecDefinition {
        id: CodecId::EncodePng,
        name: "encode png",
        acquire: acquire_encode_png,
        get_frame_info: None,
        read_frame: None,
        write_frame: Some(png_write_frame),
        dispose: Some(dispose_png_encoder),
    },
    CodecDefinition {
        id: CodecId::DecodeJpeg,
        name: "decode jpeg",
        acquire: acquire_decode_jpeg,
        get_frame_info: Some(jpeg_get_info),
        read_frame: Some(jpeg_read_frame),
        write_frame: None,
        dispose: Some(dispose_jpeg_decoder),
    },
];

/// Look up the definition for `id`, or not-implemented when the
/// registry has no entry for it.
pub fn codec_definition(id: CodecId) -> Result<&'static CodecDefinition, CodecError> {
    CODEC_DEFINITIONS
        .iter()
        .find(|def| def.id == id)
        .ok_or(CodecError::NotImplemented(id))
}

// ── Acquisition ─────────────────────────────────────────────────────
//
// Acquire-on-buffer is lazy and at-most-once: a buffer that already
// carries a codec state keeps it, whatever its type.

fn acquire_decode_png(resource: &mut ResourceBuffer) -> Result<(), CodecError> {
    if resource.codec_state().is_none() {
        let state = PngDecoderState::new(resource.shared_bytes(), resource.limits().cloned());
        resource.install_state(CodecState::PngDecoder(state));
    }
    Ok(())
}

fn acquire_encode_png(resource: &mut ResourceBuffer) -> Result<(), CodecError> {
    if resource.codec_state().is_none() {
        resource.install_state(CodecState::PngEncoder(PngEncoderState::new()));
    }
    Ok(())
}

fn acquire_decode_jpeg(resource: &mut ResourceBuffer) -> Result<(), CodecError> {
    if resource.codec_state().is_none() {
        let state = JpegDecoderState::new(resource.shared_bytes(), resource.limits().cloned());
        resource.install_state(CodecState::JpegDecoder(state));
    }
    Ok(())
}

// ── Dispatch adapters ───────────────────────────────────────────────

fn png_get_info(state: &mut CodecState, stop: &dyn Stop) -> Result<FrameInfo, CodecError> {
    match state {
        CodecState::PngDecoder(s) => s.get_frame_info(stop),
        _ => Err(CodecError::InvalidInternalState(
            "codec state is not a png decoder",
        )),
    }
}

fn png_read_frame(
    state: &mut CodecState,
    surface: &mut PixelSurface,
    stop: &dyn Stop,
) -> Result<(), CodecError> {
    match state {
        CodecState::PngDecoder(s) => s.read_frame(surface, stop),
        _ => Err(CodecError::InvalidInternalState(
            "codec state is not a png decoder",
        )),
    }
}

fn png_write_frame(
    state: &mut CodecState,
    surface: &PixelSurface,
    stop: &dyn Stop,
) -> Result<(), CodecError> {
    match state {
        CodecState::PngEncoder(s) => s.write_frame(surface, stop),
        _ => Err(CodecError::InvalidInternalState(
            "codec state is not a png encoder",
        )),
    }
}

fn jpeg_get_info(state: &mut CodecState, stop: &dyn Stop) -> Result<FrameInfo, CodecError> {
    match state {
        CodecState::JpegDecoder(s) => s.get_frame_info(stop),
        _ => Err(CodecError::InvalidInternalState(
            "codec state is not a jpeg decoder",
        )),
    }
}

fn jpeg_read_frame(
    state: &mut CodecState,
    surface: &mut PixelSurface,
    stop: &dyn Stop,
) -> Result<(), CodecError> {
    match state {
        CodecState::JpegDecoder(s) => s.read_frame(surface, stop),
        _ => Err(CodecError::InvalidInternalState(
            "codec state is not a jpeg decoder",
        )),
    }
}

fn dispose_png_decoder(state: &mut CodecState) {
    if let CodecState::PngDecoder(s) = state {
        s.reset();
    }
}

fn dispose_png_encoder(state: &mut CodecState) {
    if let CodecState::PngEncoder(s) = state {
        s.clear();
    }
}

fn dispose_jpeg_decoder(state: &mut CodecState) {
    if let CodecState::JpegDecoder(s) = state {
        s.reset();
    }
}
