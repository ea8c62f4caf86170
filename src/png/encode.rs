//! PNG encoder: 8-bit RGBA, no interlace, sRGB perceptual intent,
//! fast pixel compression.

use enough::Stop;

use crate::error::CodecError;
use crate::pixel::{PixelFormat, PixelSurface};

/// PNG encoder state. The output buffer grows as the underlying
/// writer emits chunks; the facade moves it into the attached
/// resource on success. A failed write leaves it empty.
pub struct PngEncoderState {
    output: Vec<u8>,
}

impl PngEncoderState {
    pub(crate) fn new() -> Self {
        Self { output: Vec::new() }
    }

    /// The most recently encoded stream, until the facade claims it.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub(crate) fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }

    pub(crate) fn clear(&mut self) {
        self.output = Vec::new();
    }

    /// Encode `surface` into the state's output buffer.
    pub(crate) fn write_frame(
        &mut self,
        surface: &PixelSurface,
        stop: &dyn Stop,
    ) -> Result<(), CodecError> {
        self.output = Vec::new();
        self.output = encode_bgra_surface(surface, stop)?;
        Ok(())
    }
}

fn encode_bgra_surface(surface: &PixelSurface, stop: &dyn Stop) -> Result<Vec<u8>, CodecError> {
    stop.check()?;
    if surface.format() != PixelFormat::Bgra32 {
        return Err(CodecError::InvalidInternalState(
            "png encoder expects a bgra32 surface",
        ));
    }
    let width = surface.width();
    let height = surface.height();
    let row_bytes = width as usize * 4;

    // The stream stores RGBA; swap BGR at emit time and drop any
    // stride padding.
    let mut rgba = Vec::new();
    rgba.try_reserve_exact(row_bytes * height as usize)
        .map_err(|_| CodecError::OutOfMemory("png encode staging buffer"))?;
    for row in surface.rows() {
        stop.check()?;
        for px in row[..row_bytes].chunks_exact(4) {
            rgba.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
        }
    }

    let mut out = Vec::new();
    let mut encoder = png::Encoder::new(&mut out, width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Fast);
    encoder.set_source_srgb(png::SrgbRenderingIntent::Perceptual);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&rgba)?;
    writer.finish()?;
    Ok(out)
}
