//! Bounded in-memory input source for pull-style codec libraries.

use std::io::Read;
use std::sync::Arc;

/// Presents a shared byte range to a library that reads incrementally.
///
/// End of input is reported as an ordinary zero-length read, so a
/// library that needs more bytes raises its own truncation error.
pub(crate) struct MemoryReader {
    bytes: Arc<[u8]>,
    pos: usize,
}

impl MemoryReader {
    pub(crate) fn new(bytes: Arc<[u8]>) -> Self {
        Self { bytes, pos: 0 }
    }
}

impl Read for MemoryReader {
    fn read(&mut self, out: &mut [u8]) -> std::io::Result<usize> {
        let remaining = &self.bytes[self.pos..];
        let n = remaining.len().min(out.len());
        out[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }
}
