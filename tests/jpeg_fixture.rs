//! JPEG decode against hand-assembled baseline streams.
//!
//! The fixtures use a unit quantization table, the standard DC
//! luminance code lengths, a one-code AC table (EOB only), and
//! DC-only blocks, so every expected sample value is known exactly
//! up to IDCT rounding.

use enough::Unstoppable;
use zenframes::*;

fn push_marker(out: &mut Vec<u8>, marker: u8, payload: &[u8]) {
    out.push(0xFF);
    out.push(marker);
    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(payload);
}

/// Baseline 4:4:4 JPEG with one unit quant table and shared Huffman
/// tables. `components` lists the component ids of the single scan.
fn baseline_jpeg(components: &[u8], width: u16, height: u16, scan: &[u8]) -> Vec<u8> {
    let mut out = vec![0xFF, 0xD8];

    let mut dqt = vec![0x00];
    dqt.extend_from_slice(&[1u8; 64]);
    push_marker(&mut out, 0xDB, &dqt);

    let mut sof = vec![0x08];
    sof.extend_from_slice(&height.to_be_bytes());
    sof.extend_from_slice(&width.to_be_bytes());
    sof.push(components.len() as u8);
    for &id in components {
        sof.extend_from_slice(&[id, 0x11, 0x00]);
    }
    push_marker(&mut out, 0xC0, &sof);

    // DC table 0: standard luminance code lengths, categories 0-11.
    let mut dht = vec![0x00];
    dht.extend_from_slice(&[0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0]);
    dht.extend_from_slice(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);
    push_marker(&mut out, 0xC4, &dht);

    // AC table 0: a single one-bit code for EOB.
    let mut dht = vec![0x10];
    dht.extend_from_slice(&[1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    dht.push(0x00);
    push_marker(&mut out, 0xC4, &dht);

    let mut sos = vec![components.len() as u8];
    for &id in components {
        sos.extend_from_slice(&[id, 0x00]);
    }
    sos.extend_from_slice(&[0x00, 0x3F, 0x00]);
    push_marker(&mut out, 0xDA, &sos);

    out.extend_from_slice(scan);
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

/// 2x1, pure red: DC-only blocks with Y=76, Cb=85, Cr=255.
fn red_2x1_jpeg() -> Vec<u8> {
    baseline_jpeg(&[1, 2, 3], 2, 1, &[0xFC, 0x5F, 0x7E, 0x53, 0xBF, 0xBF, 0x87])
}

/// 1x1, single gray component with zero DC diff: every sample 128.
fn gray_1x1_jpeg() -> Vec<u8> {
    baseline_jpeg(&[1], 1, 1, &[0x1F])
}

fn decode_jpeg(bytes: Vec<u8>) -> (ResourceBuffer, PixelSurface) {
    let mut resource = ResourceBuffer::from_bytes(bytes);
    acquire_decoder_over_buffer(&mut resource, CodecId::DecodeJpeg).unwrap();
    let info = decoder_get_frame_info(&mut resource, CodecId::DecodeJpeg, Unstoppable).unwrap();
    assert_eq!(info.format, PixelFormat::Bgra32);
    let mut surface = PixelSurface::new(info.width, info.height, PixelFormat::Bgra32).unwrap();
    decoder_read_frame(&mut resource, CodecId::DecodeJpeg, &mut surface, Unstoppable).unwrap();
    (resource, surface)
}

#[test]
fn red_jpeg_decodes_to_bgra_within_lossy_tolerance() {
    let bytes = red_2x1_jpeg();
    assert_eq!(select_codec(&bytes), CodecId::DecodeJpeg);

    let (resource, surface) = decode_jpeg(bytes);
    assert_eq!((surface.width(), surface.height()), (2, 1));
    for px in surface.pixels().chunks_exact(4) {
        let (b, g, r, a) = (px[0], px[1], px[2], px[3]);
        assert!(r >= 0xFD, "red channel {r:#04x} not within 2 of 0xFF");
        assert!(g <= 0x02, "green channel {g:#04x} not within 2 of 0x00");
        assert!(b <= 0x02, "blue channel {b:#04x} not within 2 of 0x00");
        assert_eq!(a, 0xFF);
    }
    assert_eq!(
        resource.codec_state().unwrap().decoder_stage(),
        Some(DecoderStage::FinishRead)
    );
    // No color metadata in the stream, so nothing was recovered.
    assert_eq!(
        resource.codec_state().unwrap().profile_source(),
        Some(ProfileSource::None)
    );
}

#[test]
fn gray_jpeg_normalizes_to_bgra() {
    let (_, surface) = decode_jpeg(gray_1x1_jpeg());
    let px = surface.pixels();
    assert_eq!(px[3], 0xFF);
    for channel in &px[..3] {
        let diff = (i32::from(*channel) - 128).abs();
        assert!(diff <= 1, "gray sample {channel} not within 1 of 128");
    }
    assert_eq!(px[0], px[1]);
    assert_eq!(px[1], px[2]);
}

#[test]
fn cmyk_jpeg_normalizes_to_bgra() {
    // Four components, every DC diff zero: each decoded sample is
    // exactly 128, i.e. half-coverage ink on every channel. The
    // reflectance conversion lands all three color channels on the
    // same mid-dark gray, (255-128)*(255-128)/255 = 63 (one off if
    // the library re-inverts the samples).
    let scan = [0x00, 0x0F];
    let (resource, surface) = decode_jpeg(baseline_jpeg(&[1, 2, 3, 4], 2, 1, &scan));
    assert_eq!((surface.width(), surface.height()), (2, 1));
    for px in surface.pixels().chunks_exact(4) {
        assert_eq!(px[3], 0xFF);
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
        assert!(
            (62..=65).contains(&px[0]),
            "cmyk gray sample {} outside the expected band",
            px[0]
        );
    }
    assert_eq!(
        resource.codec_state().unwrap().decoder_stage(),
        Some(DecoderStage::FinishRead)
    );
}

#[test]
fn truncated_scan_finishes_or_fails_without_leaking() {
    let mut bytes = red_2x1_jpeg();
    // Drop the last five scan bytes and the EOI marker; the source
    // adapter injects end-of-image when the library runs dry.
    bytes.truncate(bytes.len() - 7);

    let mut resource = ResourceBuffer::from_bytes(bytes);
    acquire_decoder_over_buffer(&mut resource, CodecId::DecodeJpeg).unwrap();
    let info = decoder_get_frame_info(&mut resource, CodecId::DecodeJpeg, Unstoppable).unwrap();
    assert_eq!((info.width, info.height), (2, 1));

    let mut surface = PixelSurface::new(info.width, info.height, PixelFormat::Bgra32).unwrap();
    let result = decoder_read_frame(&mut resource, CodecId::DecodeJpeg, &mut surface, Unstoppable);
    let stage = resource.codec_state().unwrap().decoder_stage().unwrap();
    match result {
        Ok(()) => assert_eq!(stage, DecoderStage::FinishRead),
        Err(_) => assert_eq!(stage, DecoderStage::Failed),
    }
}

#[test]
fn truncated_header_fails_begin_read() {
    let mut bytes = red_2x1_jpeg();
    bytes.truncate(12);
    let mut resource = ResourceBuffer::from_bytes(bytes);
    acquire_decoder_over_buffer(&mut resource, CodecId::DecodeJpeg).unwrap();
    assert!(decoder_get_frame_info(&mut resource, CodecId::DecodeJpeg, Unstoppable).is_err());
    assert_eq!(
        resource.codec_state().unwrap().decoder_stage(),
        Some(DecoderStage::Failed)
    );
}

#[test]
fn embedded_srgb_icc_profile_is_adopted_for_color_jpeg() {
    let icc = lcms2::Profile::new_srgb().icc().unwrap();
    let mut payload = b"ICC_PROFILE\0".to_vec();
    payload.push(1); // sequence number
    payload.push(1); // segment count
    payload.extend_from_slice(&icc);

    let base = red_2x1_jpeg();
    let mut bytes = base[..2].to_vec();
    push_marker(&mut bytes, 0xE2, &payload);
    bytes.extend_from_slice(&base[2..]);

    // An APP2-first stream is not in the magic-byte table.
    assert_eq!(select_codec(&bytes), CodecId::Null);

    let (resource, surface) = decode_jpeg(bytes);
    assert_eq!(
        resource.codec_state().unwrap().profile_source(),
        Some(ProfileSource::Iccp)
    );
    // sRGB → sRGB is near-identity; the pixels stay red and alpha is
    // untouched by the in-place transform.
    for px in surface.pixels().chunks_exact(4) {
        assert!(px[2] > 0xC8);
        assert!(px[1] < 0x30 && px[0] < 0x30);
        assert_eq!(px[3], 0xFF);
    }
}

#[test]
fn limits_apply_to_jpeg_headers() {
    let limits = Limits {
        max_width: Some(1),
        ..Limits::default()
    };
    let mut resource = ResourceBuffer::from_bytes(red_2x1_jpeg()).with_limits(limits);
    acquire_decoder_over_buffer(&mut resource, CodecId::DecodeJpeg).unwrap();
    let err =
        decoder_get_frame_info(&mut resource, CodecId::DecodeJpeg, Unstoppable).unwrap_err();
    assert!(matches!(err, CodecError::LimitExceeded(_)));
}

#[test]
fn alloc_cap_rejects_the_scanline_buffer() {
    let limits = Limits {
        max_alloc_bytes: Some(2),
        ..Limits::default()
    };
    let mut resource = ResourceBuffer::from_bytes(red_2x1_jpeg()).with_limits(limits);
    acquire_decoder_over_buffer(&mut resource, CodecId::DecodeJpeg).unwrap();
    let info = decoder_get_frame_info(&mut resource, CodecId::DecodeJpeg, Unstoppable).unwrap();

    // The 2x1 RGB frame needs a six-byte scanline buffer; the cap
    // trips before the decode allocates it.
    let mut surface = PixelSurface::new(info.width, info.height, PixelFormat::Bgra32).unwrap();
    let err = decoder_read_frame(&mut resource, CodecId::DecodeJpeg, &mut surface, Unstoppable)
        .unwrap_err();
    assert!(matches!(err, CodecError::LimitExceeded(_)));
    assert_eq!(
        resource.codec_state().unwrap().decoder_stage(),
        Some(DecoderStage::Failed)
    );
}
