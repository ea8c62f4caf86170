//! Color-profile recovery and the pixelwise transform to sRGB.
//!
//! A decoder recovers at most one source profile per image: an
//! embedded ICC profile whose color space matches the image, or for
//! PNG a profile synthesized from the cHRM primaries and gAMA
//! exponent. Streams tagged sRGB need no transform and recover
//! nothing.

use enough::Stop;
use lcms2::{
    CIExyY, CIExyYTRIPLE, ColorSpaceSignature, Intent, Profile, ToneCurve, Transform,
};
use rgb::FromSlice;
use rgb::alt::{BGR8, BGRA8};

use crate::error::CodecError;
use crate::pixel::{PixelFormat, PixelSurface};

/// Default gamma exponent (≈ 1/2.2), used until a gAMA value is seen.
pub(crate) const DEFAULT_GAMMA: f64 = 0.45455;

/// Where a decoder's color profile came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProfileSource {
    /// No profile recovered; pixels are passed through untransformed.
    #[default]
    None,
    /// Embedded ICC profile on a color image.
    Iccp,
    /// Embedded gray ICC profile on a gray image. Recorded but the
    /// profile is released; the gray transform is not performed.
    IccpGray,
    /// RGB profile synthesized from cHRM primaries plus gAMA.
    GamaChrm,
}

/// Match an embedded ICC profile against the image's color-ness.
///
/// A color image adopts an RGB profile; a gray image records (but
/// does not keep) a gray profile; every other combination is ignored,
/// as is a profile Little CMS cannot parse.
pub(crate) fn adopt_icc_profile(icc: &[u8], is_color: bool) -> (Option<Profile>, ProfileSource) {
    match Profile::new_icc(icc) {
        Ok(profile) => match profile.color_space() {
            ColorSpaceSignature::RgbData if is_color => (Some(profile), ProfileSource::Iccp),
            ColorSpaceSignature::GrayData if !is_color => (None, ProfileSource::IccpGray),
            _ => (None, ProfileSource::None),
        },
        Err(_) => (None, ProfileSource::None),
    }
}

/// Recover the color profile, source tag, and gamma from a parsed
/// PNG header.
///
/// An sRGB chunk takes precedence: gamma stays at the default, no
/// profile is recovered, and no synthesis happens (the PNG library
/// backfills gAMA/cHRM from sRGB, so the chunk check must come
/// first). Otherwise an embedded ICC profile is matched against the
/// image's color-ness, and failing that, gAMA+cHRM synthesize one.
pub(crate) fn recover_png_profile(info: &png::Info<'_>) -> (Option<Profile>, ProfileSource, f64) {
    let has_srgb = info.srgb.is_some();
    let mut gamma = DEFAULT_GAMMA;
    if !has_srgb {
        if let Some(g) = info.source_gamma {
            gamma = f64::from(g.into_value());
        }
    }

    let is_color = matches!(
        info.color_type,
        png::ColorType::Rgb | png::ColorType::Rgba | png::ColorType::Indexed
    );

    let mut profile = None;
    let mut source = ProfileSource::None;
    if let Some(icc) = info.icc_profile.as_ref() {
        (profile, source) = adopt_icc_profile(icc, is_color);
    }

    if profile.is_none() && is_color && !has_srgb && info.source_gamma.is_some() {
        if let Some(chrm) = info.source_chromaticities.as_ref() {
            source = ProfileSource::GamaChrm;
            profile = synthesize_rgb_profile(chrm, gamma);
        }
    }

    (profile, source, gamma)
}

/// Build an RGB profile from the cHRM white point and primaries
/// (Y = 1 each) with a single 1/gamma tone curve on all channels.
fn synthesize_rgb_profile(chrm: &png::SourceChromaticities, gamma: f64) -> Option<Profile> {
    if !(gamma > 0.0) {
        return None;
    }
    let white = CIExyY {
        x: f64::from(chrm.white.0.into_value()),
        y: f64::from(chrm.white.1.into_value()),
        Y: 1.0,
    };
    let primaries = CIExyYTRIPLE {
        Red: CIExyY {
            x: f64::from(chrm.red.0.into_value()),
            y: f64::from(chrm.red.1.into_value()),
            Y: 1.0,
        },
        Green: CIExyY {
            x: f64::from(chrm.green.0.into_value()),
            y: f64::from(chrm.green.1.into_value()),
            Y: 1.0,
        },
        Blue: CIExyY {
            x: f64::from(chrm.blue.0.into_value()),
            y: f64::from(chrm.blue.1.into_value()),
            Y: 1.0,
        },
    };
    let curve = ToneCurve::new(1.0 / gamma);
    Profile::new_rgb(&white, &primaries, &[&curve, &curve, &curve]).ok()
}

/// Transform the surface's pixels to sRGB in place, row by row, with
/// perceptual intent and the transform shape matching the surface
/// format. Profile or transform creation failure reports
/// out-of-memory.
pub(crate) fn transform_to_srgb(
    profile: &Profile,
    surface: &mut PixelSurface,
    stop: &dyn Stop,
) -> Result<(), CodecError> {
    let srgb = Profile::new_srgb();
    let width = surface.width() as usize;
    match surface.format() {
        PixelFormat::Bgra32 => {
            let transform: Transform<BGRA8, BGRA8> = Transform::new(
                profile,
                lcms2::PixelFormat::BGRA_8,
                &srgb,
                lcms2::PixelFormat::BGRA_8,
                Intent::Perceptual,
            )
            .map_err(|_| CodecError::OutOfMemory("sRGB transform"))?;
            for row in surface.rows_mut() {
                stop.check()?;
                transform.transform_in_place(row[..width * 4].as_bgra_mut());
            }
        }
        PixelFormat::Bgr24 => {
            let transform: Transform<BGR8, BGR8> = Transform::new(
                profile,
                lcms2::PixelFormat::BGR_8,
                &srgb,
                lcms2::PixelFormat::BGR_8,
                Intent::Perceptual,
            )
            .map_err(|_| CodecError::OutOfMemory("sRGB transform"))?;
            for row in surface.rows_mut() {
                stop.check()?;
                transform.transform_in_place(row[..width * 3].as_bgr_mut());
            }
        }
        PixelFormat::Gray8 => {
            let transform: Transform<u8, u8> = Transform::new(
                profile,
                lcms2::PixelFormat::GRAY_8,
                &srgb,
                lcms2::PixelFormat::GRAY_8,
                Intent::Perceptual,
            )
            .map_err(|_| CodecError::OutOfMemory("sRGB transform"))?;
            for row in surface.rows_mut() {
                stop.check()?;
                transform.transform_in_place(&mut row[..width]);
            }
        }
    }
    Ok(())
}
