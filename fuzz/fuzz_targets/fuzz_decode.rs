#![no_main]
use libfuzzer_sys::fuzz_target;

use zenframes::{
    CodecId, PixelFormat, PixelSurface, ResourceBuffer, acquire_decoder_over_buffer,
    decoder_get_frame_info, decoder_read_frame, select_codec,
};

fuzz_target!(|data: &[u8]| {
    // Sniff + full decode drive over arbitrary bytes — must never
    // panic, whatever the stream contains.
    let id = select_codec(data);
    if id == CodecId::Null {
        return;
    }
    let mut resource = ResourceBuffer::from_bytes(data.to_vec());
    if acquire_decoder_over_buffer(&mut resource, id).is_err() {
        return;
    }
    let Ok(info) = decoder_get_frame_info(&mut resource, id, enough::Unstoppable) else {
        return;
    };
    if u64::from(info.width) * u64::from(info.height) > 1 << 22 {
        return;
    }
    if let Ok(mut surface) = PixelSurface::new(info.width, info.height, PixelFormat::Bgra32) {
        let _ = decoder_read_frame(&mut resource, id, &mut surface, enough::Unstoppable);
    }
});
