//! Bounded in-memory source that never starves the JPEG library.

use std::io::Read;
use std::sync::Arc;

const EOI_MARKER: [u8; 2] = [0xFF, 0xD9];

/// Hands out the byte range, then an endless stream of end-of-image
/// markers once it is exhausted, so the library terminates a
/// truncated stream gracefully instead of waiting for input that
/// will never arrive. Skips are ordinary reads under `io::Read`.
pub(crate) struct EoiSource {
    bytes: Arc<[u8]>,
    pos: usize,
    marker_phase: usize,
}

impl EoiSource {
    pub(crate) fn new(bytes: Arc<[u8]>) -> Self {
        Self {
            bytes,
            pos: 0,
            marker_phase: 0,
        }
    }
}

impl Read for EoiSource {
    fn read(&mut self, out: &mut [u8]) -> std::io::Result<usize> {
        let remaining = &self.bytes[self.pos..];
        if !remaining.is_empty() {
            let n = remaining.len().min(out.len());
            out[..n].copy_from_slice(&remaining[..n]);
            self.pos += n;
            return Ok(n);
        }
        for slot in out.iter_mut() {
            *slot = EOI_MARKER[self.marker_phase];
            self.marker_phase = (self.marker_phase + 1) % EOI_MARKER.len();
        }
        Ok(out.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn exhausted_source_substitutes_eoi_markers() {
        let mut src = EoiSource::new(Arc::from(&[0xAAu8, 0xBB][..]));
        let mut buf = [0u8; 6];
        assert_eq!(src.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], &[0xAA, 0xBB]);
        assert_eq!(src.read(&mut buf).unwrap(), 6);
        assert_eq!(buf, [0xFF, 0xD9, 0xFF, 0xD9, 0xFF, 0xD9]);
    }

    #[test]
    fn marker_phase_survives_odd_reads() {
        let mut src = EoiSource::new(Arc::from(&[][..]));
        let mut one = [0u8; 1];
        assert_eq!(src.read(&mut one).unwrap(), 1);
        assert_eq!(one[0], 0xFF);
        assert_eq!(src.read(&mut one).unwrap(), 1);
        assert_eq!(one[0], 0xD9);
    }
}
