//! Staged PNG decoder.
//!
//! `begin_read` drives the library through header parsing and
//! transform negotiation; `read_frame` bulk-decodes into the caller's
//! surface and applies the sRGB transform. Any lower-level failure
//! releases every owned handle and quarantines the state in
//! [`DecoderStage::Failed`].

use std::sync::Arc;

use enough::Stop;
use lcms2::Profile;

use crate::buffer::DecoderStage;
use crate::color::{self, DEFAULT_GAMMA, ProfileSource};
use crate::error::CodecError;
use crate::limits::Limits;
use crate::pixel::{self, FrameInfo, PixelFormat, PixelSurface, RowLayout};
use crate::source::MemoryReader;

/// PNG decoder state over a shared input byte range.
pub struct PngDecoderState {
    stage: DecoderStage,
    reader: Option<png::Reader<MemoryReader>>,
    width: u32,
    height: u32,
    /// Normalized BGRA bytes per output row.
    row_bytes: usize,
    source_layout: Option<RowLayout>,
    color_type: Option<png::ColorType>,
    bit_depth: Option<png::BitDepth>,
    bytes: Arc<[u8]>,
    limits: Option<Limits>,
    profile: Option<Profile>,
    profile_source: ProfileSource,
    gamma: f64,
}

impl PngDecoderState {
    pub(crate) fn new(bytes: Arc<[u8]>, limits: Option<Limits>) -> Self {
        Self {
            stage: DecoderStage::NotStarted,
            reader: None,
            width: 0,
            height: 0,
            row_bytes: 0,
            source_layout: None,
            color_type: None,
            bit_depth: None,
            bytes,
            limits,
            profile: None,
            profile_source: ProfileSource::None,
            gamma: DEFAULT_GAMMA,
        }
    }

    pub fn stage(&self) -> DecoderStage {
        self.stage
    }

    /// Origin of the recovered color profile.
    pub fn profile_source(&self) -> ProfileSource {
        self.profile_source
    }

    /// Gamma exponent from the gAMA chunk, or the 0.45455 default.
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Raw header color type, available once the header is parsed.
    pub fn color_type(&self) -> Option<png::ColorType> {
        self.color_type
    }

    /// Raw header bit depth, available once the header is parsed.
    pub fn bit_depth(&self) -> Option<png::BitDepth> {
        self.bit_depth
    }

    /// Required (stride, byte size) of the caller's pixel buffer.
    /// `None` until header parsing has sized the frame.
    pub fn required_layout(&self) -> Option<(usize, usize)> {
        match self.stage {
            DecoderStage::BeginRead | DecoderStage::FinishRead => {
                Some((self.row_bytes, self.row_bytes * self.height as usize))
            }
            _ => None,
        }
    }

    /// Release owned handles, clear geometry, return to `NotStarted`.
    /// Idempotent.
    pub(crate) fn reset(&mut self) {
        self.reader = None;
        self.profile = None;
        self.profile_source = ProfileSource::None;
        self.width = 0;
        self.height = 0;
        self.row_bytes = 0;
        self.source_layout = None;
        self.color_type = None;
        self.bit_depth = None;
        self.gamma = DEFAULT_GAMMA;
        self.stage = DecoderStage::NotStarted;
    }

    fn fail(&mut self, err: CodecError) -> CodecError {
        self.reset();
        self.stage = DecoderStage::Failed;
        err
    }

    /// Lift the state to `BeginRead` on first call and report frame
    /// geometry; idempotent afterwards.
    pub(crate) fn get_frame_info(&mut self, stop: &dyn Stop) -> Result<FrameInfo, CodecError> {
        match self.stage {
            DecoderStage::NotStarted => self.begin_read(stop)?,
            DecoderStage::BeginRead | DecoderStage::FinishRead => {}
            DecoderStage::Failed => {
                return Err(CodecError::InvalidInternalState(
                    "png decoder is in the failed stage",
                ));
            }
        }
        Ok(FrameInfo {
            width: self.width,
            height: self.height,
            format: PixelFormat::Bgra32,
        })
    }

    /// Bulk-decode into `surface` and transform to sRGB. Valid only
    /// in `BeginRead`; moves to `FinishRead` on success, `Failed` on
    /// error.
    pub(crate) fn read_frame(
        &mut self,
        surface: &mut PixelSurface,
        stop: &dyn Stop,
    ) -> Result<(), CodecError> {
        if self.stage != DecoderStage::BeginRead {
            return Err(CodecError::InvalidInternalState(
                "png read_frame requires the begin-read stage",
            ));
        }
        match self.finish_read_inner(surface, stop) {
            Ok(()) => {
                self.stage = DecoderStage::FinishRead;
                if let Some(profile) = &self.profile {
                    color::transform_to_srgb(profile, surface, stop)?;
                }
                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    fn begin_read(&mut self, stop: &dyn Stop) -> Result<(), CodecError> {
        self.reset();
        self.stage = DecoderStage::BeginRead;
        match self.begin_read_inner(stop) {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail(err)),
        }
    }

    fn begin_read_inner(&mut self, stop: &dyn Stop) -> Result<(), CodecError> {
        stop.check()?;
        let source = MemoryReader::new(Arc::clone(&self.bytes));
        let mut decoder = match self.limits.and_then(|limits| limits.max_alloc_bytes) {
            Some(bytes) => png::Decoder::new_with_limits(source, png::Limits { bytes }),
            None => png::Decoder::new(source),
        };
        // Expand palette, low-bit gray, and tRNS; strip 16-bit down
        // to 8. Gray→RGB, the alpha filler, and the BGR swap happen
        // in the row normalizer. Interlace is the library's problem.
        decoder
            .set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
        let reader = decoder.read_info()?;

        let info = reader.info();
        let (width, height) = (info.width, info.height);
        let color_type = info.color_type;
        let bit_depth = info.bit_depth;
        let (profile, profile_source, gamma) = color::recover_png_profile(info);

        if let Some(limits) = &self.limits {
            limits.admit_frame(width, height)?;
        }

        let (out_color, out_depth) = reader.output_color_type();
        if out_depth != png::BitDepth::Eight {
            return Err(CodecError::InvalidInternalState(
                "post-transform rows are not 8-bit",
            ));
        }
        let layout = match out_color {
            png::ColorType::Grayscale => RowLayout::Gray8,
            png::ColorType::GrayscaleAlpha => RowLayout::GrayAlpha8,
            png::ColorType::Rgb => RowLayout::Rgb8,
            png::ColorType::Rgba => RowLayout::Rgba8,
            _ => {
                return Err(CodecError::InvalidInternalState(
                    "unexpected post-transform pixel layout",
                ));
            }
        };

        self.width = width;
        self.height = height;
        self.color_type = Some(color_type);
        self.bit_depth = Some(bit_depth);
        self.profile = profile;
        self.profile_source = profile_source;
        self.gamma = gamma;
        self.source_layout = Some(layout);
        // Advisory only; the caller supplies the actual buffer.
        self.row_bytes = width as usize * PixelFormat::Bgra32.bytes_per_pixel();
        self.reader = Some(reader);
        Ok(())
    }

    fn finish_read_inner(
        &mut self,
        surface: &mut PixelSurface,
        stop: &dyn Stop,
    ) -> Result<(), CodecError> {
        stop.check()?;
        if surface.format() != PixelFormat::Bgra32 {
            return Err(CodecError::InvalidInternalState(
                "decode surface must be bgra32",
            ));
        }
        if surface.width() < self.width || surface.height() < self.height {
            return Err(CodecError::InvalidInternalState(
                "surface smaller than the decoded frame",
            ));
        }
        let layout = self.source_layout.ok_or(CodecError::InvalidInternalState(
            "png decoder has no negotiated layout",
        ))?;
        let width = self.width as usize;
        let height = self.height;
        let row_bytes = self.row_bytes;

        let reader = self.reader.as_mut().ok_or(CodecError::InvalidInternalState(
            "png decoder handle already released",
        ))?;
        let scratch_size = reader.output_buffer_size();
        if let Some(limits) = &self.limits {
            limits.admit_alloc(scratch_size)?;
        }
        let mut scratch = Vec::new();
        scratch
            .try_reserve_exact(scratch_size)
            .map_err(|_| CodecError::OutOfMemory("png decode scratch buffer"))?;
        scratch.resize(scratch_size, 0);

        let out = reader.next_frame(&mut scratch)?;

        let stride = surface.stride();
        let dst_rows = pixel::row_slices_mut(surface.pixels_mut(), stride, height)?;
        let src_len = width * layout.bytes_per_pixel();
        for (src, dst) in scratch
            .chunks_exact(out.line_size)
            .take(height as usize)
            .zip(dst_rows)
        {
            stop.check()?;
            pixel::normalize_row_to_bgra(layout, &src[..src_len], &mut dst[..row_bytes]);
        }

        // End-of-image: validate whatever trails the pixel data.
        reader.finish()?;
        self.reader = None;
        Ok(())
    }
}
