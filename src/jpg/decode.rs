//! Staged JPEG decoder.
//!
//! Mirrors the PNG machine: `begin_read` parses the header and
//! records geometry, `read_frame` decodes scanlines into the caller's
//! surface. The library reports failures as values, so the state is
//! reset and quarantined on any error without non-local control flow.

use std::sync::Arc;

use enough::Stop;
use lcms2::Profile;

use super::source::EoiSource;
use crate::buffer::DecoderStage;
use crate::color::{self, DEFAULT_GAMMA, ProfileSource};
use crate::error::CodecError;
use crate::limits::Limits;
use crate::pixel::{self, FrameInfo, PixelFormat, PixelSurface, RowLayout};

/// JPEG decoder state over a shared input byte range.
pub struct JpegDecoderState {
    stage: DecoderStage,
    decoder: Option<jpeg::Decoder<EoiSource>>,
    width: u32,
    height: u32,
    channels: usize,
    /// Source bytes per row as the library produces them
    /// (width * channels).
    row_stride: usize,
    source_layout: Option<RowLayout>,
    bytes: Arc<[u8]>,
    limits: Option<Limits>,
    profile: Option<Profile>,
    profile_source: ProfileSource,
    gamma: f64,
}

impl JpegDecoderState {
    pub(crate) fn new(bytes: Arc<[u8]>, limits: Option<Limits>) -> Self {
        Self {
            stage: DecoderStage::NotStarted,
            decoder: None,
            width: 0,
            height: 0,
            channels: 0,
            row_stride: 0,
            source_layout: None,
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

    pub fn profile_source(&self) -> ProfileSource {
        self.profile_source
    }

    /// Gamma of the decoded samples. The library does not report one
    /// for baseline streams, so this stays at the 0.45455 default.
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Component count of the source scan, once the header is parsed.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Required (stride, byte size) of the caller's pixel buffer.
    /// `None` until header parsing has sized the frame.
    pub fn required_layout(&self) -> Option<(usize, usize)> {
        match self.stage {
            DecoderStage::BeginRead | DecoderStage::FinishRead => {
                let row = self.width as usize * PixelFormat::Bgra32.bytes_per_pixel();
                Some((row, row * self.height as usize))
            }
            _ => None,
        }
    }

    /// Release owned handles, clear geometry, return to `NotStarted`.
    /// Idempotent.
    pub(crate) fn reset(&mut self) {
        self.decoder = None;
        self.profile = None;
        self.profile_source = ProfileSource::None;
        self.width = 0;
        self.height = 0;
        self.channels = 0;
        self.row_stride = 0;
        self.source_layout = None;
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
                    "jpeg decoder is in the failed stage",
                ));
            }
        }
        Ok(FrameInfo {
            width: self.width,
            height: self.height,
            format: PixelFormat::Bgra32,
        })
    }

    /// Decode scanlines into `surface` and transform to sRGB. Valid
    /// only in `BeginRead`; moves to `FinishRead` on success,
    /// `Failed` on error.
    pub(crate) fn read_frame(
        &mut self,
        surface: &mut PixelSurface,
        stop: &dyn Stop,
    ) -> Result<(), CodecError> {
        if self.stage != DecoderStage::BeginRead {
            return Err(CodecError::InvalidInternalState(
                "jpeg read_frame requires the begin-read stage",
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
        let mut decoder = jpeg::Decoder::new(EoiSource::new(Arc::clone(&self.bytes)));
        decoder.read_info()?;
        let info = decoder.info().ok_or(CodecError::InvalidInternalState(
            "jpeg header parse produced no frame info",
        ))?;

        let width = u32::from(info.width);
        let height = u32::from(info.height);
        if let Some(limits) = &self.limits {
            limits.admit_frame(width, height)?;
        }

        let layout = match info.pixel_format {
            jpeg::PixelFormat::L8 => RowLayout::Gray8,
            jpeg::PixelFormat::RGB24 => RowLayout::Rgb8,
            jpeg::PixelFormat::CMYK32 => RowLayout::Cmyk32,
            other => {
                return Err(CodecError::UnsupportedVariant(format!(
                    "jpeg pixel format {other:?} exceeds 8 bits per channel"
                )));
            }
        };

        if let Some(icc) = decoder.icc_profile() {
            let (profile, source) = color::adopt_icc_profile(&icc, layout.is_color());
            self.profile = profile;
            self.profile_source = source;
        }

        self.width = width;
        self.height = height;
        self.channels = layout.bytes_per_pixel();
        self.row_stride = width as usize * self.channels;
        self.source_layout = Some(layout);
        self.decoder = Some(decoder);
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
            "jpeg decoder has no negotiated layout",
        ))?;
        let width = self.width as usize;
        let height = self.height;
        let row_stride = self.row_stride;

        if let Some(limits) = &self.limits {
            limits.admit_alloc(row_stride * height as usize)?;
        }
        let decoder = self.decoder.as_mut().ok_or(CodecError::InvalidInternalState(
            "jpeg decoder handle already released",
        ))?;
        let data = decoder.decode()?;

        let stride = surface.stride();
        let dst_rows = pixel::row_slices_mut(surface.pixels_mut(), stride, height)?;
        let mut rows_written = 0usize;
        for (src, dst) in data
            .chunks_exact(row_stride)
            .take(height as usize)
            .zip(dst_rows)
        {
            stop.check()?;
            pixel::normalize_row_to_bgra(layout, src, &mut dst[..width * 4]);
            rows_written += 1;
        }
        if rows_written < height as usize {
            return Err(CodecError::JpegDecodingFailed(jpeg::Error::Format(
                format!("decoder produced {rows_written} of {height} scanlines"),
            )));
        }

        self.decoder = None;
        Ok(())
    }
}
