//! Property-based tests for EBML parsing and extraction robustness.
//!
//! The extractor's contract is that no byte buffer, however malformed, makes
//! it panic or return an inconsistent cue list. These tests drive the public
//! API and the EBML primitives with arbitrary input to hold that line.

mod common;

use mkvtext::ebml::{read_element_id, read_element_size, ElementHeader};
use mkvtext::{extract_subtitles, subtitle_tracks};
use proptest::prelude::*;

proptest! {
    /// VINT primitives accept any buffer and offset without panicking.
    #[test]
    fn vint_readers_never_panic(data in prop::collection::vec(any::<u8>(), 0..64), offset in 0usize..80) {
        let _ = read_element_id(&data, offset);
        let _ = read_element_size(&data, offset);
    }

    /// Header reads are bounded by the parent end they were given.
    #[test]
    fn element_header_respects_bounds(
        data in prop::collection::vec(any::<u8>(), 0..64),
        offset in 0usize..80,
        max_end in 0usize..80,
    ) {
        if let Some(header) = ElementHeader::read(&data, offset, max_end) {
            let limit = max_end.min(data.len());
            prop_assert!(header.data_start <= header.end);
            prop_assert!(header.end <= limit);
        }
    }

    /// Sizes written by the fixture encoder decode back to the same value.
    #[test]
    fn size_vint_roundtrip(value in 0u64..0x00FF_FFFF_FFFF_FFFE) {
        let encoded = common::encode_size_vint(value);
        let vint = read_element_size(&encoded, 0).unwrap();
        prop_assert!(!vint.unknown);
        prop_assert_eq!(vint.value, value);
        prop_assert_eq!(vint.length, encoded.len());
    }

    /// Arbitrary garbage never panics and never produces invalid cues.
    #[test]
    fn extraction_survives_arbitrary_buffers(data in prop::collection::vec(any::<u8>(), 0..2048)) {
        let cues = extract_subtitles(&data);
        for pair in cues.windows(2) {
            prop_assert!(pair[0].start_time <= pair[1].start_time);
        }
        for cue in &cues {
            prop_assert!(cue.start_time < cue.end_time);
        }
        let _ = subtitle_tracks(&data);
    }

    /// Extraction is a pure function of the buffer.
    #[test]
    fn extraction_is_deterministic(data in prop::collection::vec(any::<u8>(), 0..1024)) {
        prop_assert_eq!(extract_subtitles(&data), extract_subtitles(&data));
    }

    /// Cutting a valid container at any point degrades, never breaks.
    #[test]
    fn truncation_never_panics(cut in 0usize..400, payload in "[a-zA-Z ]{1,32}") {
        let data = common::mkv(&[
            common::tracks(&[common::track_entry(&common::TrackSpec::subtitle(1, "S_TEXT/UTF8"))]),
            common::cluster(0, &[common::simple_block(1, 0, payload.as_bytes())]),
            common::cluster(4000, &[common::block_group(1, 0, Some(1500), payload.as_bytes())]),
        ]);

        let cut = cut.min(data.len());
        let cues = extract_subtitles(&data[..cut]);
        for cue in &cues {
            prop_assert!(cue.start_time < cue.end_time);
        }
    }
}
