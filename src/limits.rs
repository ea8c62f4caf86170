use crate::error::CodecError;

/// Caps enforced while driving a decoder.
///
/// Every cap defaults to off. The frame caps are applied as soon as
/// the header reveals the geometry, before any bulk work; the
/// allocation cap bounds each decode-side scratch buffer and is also
/// handed to the PNG library to bound its internal allocations.
#[derive(Clone, Copy, Debug, Default)]
pub struct Limits {
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    /// Cap on width * height.
    pub max_pixels: Option<u64>,
    /// Cap on any single decode-side buffer, in bytes.
    pub max_alloc_bytes: Option<usize>,
}

impl Limits {
    /// Admit or reject a frame of the given geometry, naming the
    /// first cap it blows through.
    pub(crate) fn admit_frame(&self, width: u32, height: u32) -> Result<(), CodecError> {
        let checks = [
            ("width", u64::from(width), self.max_width.map(u64::from)),
            ("height", u64::from(height), self.max_height.map(u64::from)),
            (
                "pixel count",
                u64::from(width) * u64::from(height),
                self.max_pixels,
            ),
        ];
        for (what, actual, cap) in checks {
            if let Some(cap) = cap {
                if actual > cap {
                    return Err(CodecError::LimitExceeded(format!(
                        "frame {what} {actual} over cap {cap}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Admit or reject one decode-side allocation.
    pub(crate) fn admit_alloc(&self, bytes: usize) -> Result<(), CodecError> {
        match self.max_alloc_bytes {
            Some(cap) if bytes > cap => Err(CodecError::LimitExceeded(format!(
                "decode buffer of {bytes} bytes over cap {cap}"
            ))),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_caps_admit_anything() {
        let limits = Limits::default();
        assert!(limits.admit_frame(u32::MAX, u32::MAX).is_ok());
        assert!(limits.admit_alloc(usize::MAX).is_ok());
    }

    #[test]
    fn first_violated_cap_is_named() {
        let limits = Limits {
            max_width: Some(4),
            max_pixels: Some(8),
            ..Limits::default()
        };
        assert!(limits.admit_frame(4, 2).is_ok());
        match limits.admit_frame(5, 1) {
            Err(CodecError::LimitExceeded(msg)) => assert!(msg.contains("width")),
            other => panic!("expected LimitExceeded, got {other:?}"),
        }
        match limits.admit_frame(3, 3) {
            Err(CodecError::LimitExceeded(msg)) => assert!(msg.contains("pixel count")),
            other => panic!("expected LimitExceeded, got {other:?}"),
        }
    }

    #[test]
    fn alloc_cap_is_inclusive() {
        let limits = Limits {
            max_alloc_bytes: Some(16),
            ..Limits::default()
        };
        assert!(limits.admit_alloc(16).is_ok());
        assert!(limits.admit_alloc(17).is_err());
    }
}
