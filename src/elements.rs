//! Matroska element definitions and subtitle codec ID mappings.
//!
//! Only the elements this crate walks are defined here; everything else in a
//! container is skipped by ID without being named.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Top-level elements
// =============================================================================

/// EBML Header element.
pub const EBML: u32 = 0x1A45DFA3;
/// Segment (the root container for all Matroska data).
pub const SEGMENT: u32 = 0x18538067;

// =============================================================================
// Segment Information
// =============================================================================

/// Segment Info.
pub const INFO: u32 = 0x1549A966;
/// Timecode Scale (nanoseconds per timecode unit, default 1000000 = 1ms).
pub const TIMECODE_SCALE: u32 = 0x2AD7B1;

// =============================================================================
// Track elements
// =============================================================================

/// Tracks.
pub const TRACKS: u32 = 0x1654AE6B;
/// Track Entry.
pub const TRACK_ENTRY: u32 = 0xAE;
/// Track Number.
pub const TRACK_NUMBER: u32 = 0xD7;
/// Track Type.
pub const TRACK_TYPE: u32 = 0x83;
/// Codec ID.
pub const CODEC_ID: u32 = 0x86;
/// Flag Default.
pub const FLAG_DEFAULT: u32 = 0x88;
/// Language (ISO 639-2).
pub const LANGUAGE: u32 = 0x22B59C;
/// Track Name.
pub const NAME: u32 = 0x536E;

// =============================================================================
// Cluster elements
// =============================================================================

/// Cluster (contains blocks of media data).
pub const CLUSTER: u32 = 0x1F43B675;
/// Cluster Timecode.
pub const TIMECODE: u32 = 0xE7;
/// SimpleBlock (basic block without group info).
pub const SIMPLE_BLOCK: u32 = 0xA3;
/// BlockGroup (block with additional info).
pub const BLOCK_GROUP: u32 = 0xA0;
/// Block.
pub const BLOCK: u32 = 0xA1;
/// Block Duration (in track timecode units).
pub const BLOCK_DURATION: u32 = 0x9B;

// =============================================================================
// Void and CRC
// =============================================================================

/// Void (padding).
pub const VOID: u32 = 0xEC;
/// CRC-32.
pub const CRC32: u32 = 0xBF;

// =============================================================================
// Track types
// =============================================================================

/// Track type: Subtitle.
pub const TRACK_TYPE_SUBTITLE: u8 = 17;

/// Matroska codec ID strings for text subtitles.
pub mod codec_ids {
    /// SRT-style plain UTF-8 text.
    pub const S_TEXT_UTF8: &str = "S_TEXT/UTF8";
    /// Plain ASCII text.
    pub const S_TEXT_ASCII: &str = "S_TEXT/ASCII";
    /// Advanced SubStation Alpha.
    pub const S_TEXT_ASS: &str = "S_TEXT/ASS";
    /// SubStation Alpha.
    pub const S_TEXT_SSA: &str = "S_TEXT/SSA";
    /// WebVTT text.
    pub const S_TEXT_WEBVTT: &str = "S_TEXT/WEBVTT";
}

/// A supported text-subtitle codec.
///
/// Binary subtitle codecs (VobSub, PGS) are not representable here; tracks
/// carrying them are never subtitle candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubtitleCodec {
    /// `S_TEXT/UTF8` - SRT-style plain text.
    Utf8,
    /// `S_TEXT/ASCII` - plain ASCII text.
    Ascii,
    /// `S_TEXT/ASS` - Advanced SubStation Alpha dialogue records.
    Ass,
    /// `S_TEXT/SSA` - SubStation Alpha dialogue records.
    Ssa,
    /// `S_TEXT/WEBVTT` - WebVTT cue text.
    WebVtt,
}

impl SubtitleCodec {
    /// The Matroska codec ID string for this codec.
    pub fn as_str(self) -> &'static str {
        match self {
            SubtitleCodec::Utf8 => codec_ids::S_TEXT_UTF8,
            SubtitleCodec::Ascii => codec_ids::S_TEXT_ASCII,
            SubtitleCodec::Ass => codec_ids::S_TEXT_ASS,
            SubtitleCodec::Ssa => codec_ids::S_TEXT_SSA,
            SubtitleCodec::WebVtt => codec_ids::S_TEXT_WEBVTT,
        }
    }

    /// Whether payloads are ASS/SSA `Dialogue:` records rather than plain text.
    pub fn is_dialogue(self) -> bool {
        matches!(self, SubtitleCodec::Ass | SubtitleCodec::Ssa)
    }
}

impl fmt::Display for SubtitleCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a Matroska codec ID to a supported subtitle codec.
pub fn subtitle_codec_from_mkv_id(codec_id: &str) -> Option<SubtitleCodec> {
    match codec_id {
        codec_ids::S_TEXT_UTF8 => Some(SubtitleCodec::Utf8),
        codec_ids::S_TEXT_ASCII => Some(SubtitleCodec::Ascii),
        codec_ids::S_TEXT_ASS => Some(SubtitleCodec::Ass),
        codec_ids::S_TEXT_SSA => Some(SubtitleCodec::Ssa),
        codec_ids::S_TEXT_WEBVTT => Some(SubtitleCodec::WebVtt),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_id_mapping() {
        assert_eq!(
            subtitle_codec_from_mkv_id("S_TEXT/UTF8"),
            Some(SubtitleCodec::Utf8)
        );
        assert_eq!(
            subtitle_codec_from_mkv_id("S_TEXT/ASS"),
            Some(SubtitleCodec::Ass)
        );
        assert_eq!(
            subtitle_codec_from_mkv_id("S_TEXT/WEBVTT"),
            Some(SubtitleCodec::WebVtt)
        );

        // Binary subtitle codecs are not supported.
        assert_eq!(subtitle_codec_from_mkv_id("S_VOBSUB"), None);
        assert_eq!(subtitle_codec_from_mkv_id("S_HDMV/PGS"), None);
        assert_eq!(subtitle_codec_from_mkv_id("V_VP9"), None);
    }

    #[test]
    fn test_codec_roundtrip() {
        for codec in [
            SubtitleCodec::Utf8,
            SubtitleCodec::Ascii,
            SubtitleCodec::Ass,
            SubtitleCodec::Ssa,
            SubtitleCodec::WebVtt,
        ] {
            assert_eq!(subtitle_codec_from_mkv_id(codec.as_str()), Some(codec));
        }
    }

    #[test]
    fn test_dialogue_codecs() {
        assert!(SubtitleCodec::Ass.is_dialogue());
        assert!(SubtitleCodec::Ssa.is_dialogue());
        assert!(!SubtitleCodec::Utf8.is_dialogue());
        assert!(!SubtitleCodec::WebVtt.is_dialogue());
    }
}
