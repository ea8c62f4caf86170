//! PNG decode and encode over the underlying PNG library.

mod decode;
mod encode;

pub use decode::PngDecoderState;
pub use encode::PngEncoderState;
