//! JPEG decode over the underlying JPEG library.

mod decode;
mod source;

pub use decode::JpegDecoderState;
