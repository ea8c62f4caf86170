//! Content-based codec selection.
//!
//! The rule table is data: a codec identifier plus the byte prefix
//! that selects it. Rules are tried in declaration order and the
//! first match wins, so more specific prefixes belong earlier.

use crate::registry::CodecId;

pub(crate) struct MagicByteRule {
    pub codec: CodecId,
    pub prefix: &'static [u8],
}

/// PNG is identified by the first 7 bytes of its 8-byte signature;
/// JPEG by three alternative 4-byte SOI+marker prefixes.
pub(crate) static MAGIC_BYTE_RULES: &[MagicByteRule] = &[
    MagicByteRule {
        codec: CodecId::DecodePng,
        prefix: &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A],
    },
    MagicByteRule {
        codec: CodecId::DecodeJpeg,
        prefix: &[0xFF, 0xD8, 0xFF, 0xDB],
    },
    MagicByteRule {
        codec: CodecId::DecodeJpeg,
        prefix: &[0xFF, 0xD8, 0xFF, 0xE0],
    },
    MagicByteRule {
        codec: CodecId::DecodeJpeg,
        prefix: &[0xFF, 0xD8, 0xFF, 0xE1],
    },
];

/// Identify the codec for a byte buffer from its leading bytes.
///
/// Returns [`CodecId::Null`] when no rule matches, including when the
/// input is shorter than every rule's prefix. Pure function of the
/// prefix; never fails.
pub fn select_codec(data: &[u8]) -> CodecId {
    for rule in MAGIC_BYTE_RULES {
        if data.starts_with(rule.prefix) {
            return rule.codec;
        }
    }
    CodecId::Null
}
