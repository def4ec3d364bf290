//! Matroska segment walking and subtitle block extraction.
//!
//! The walkers here are pure functions of the input buffer. Each takes a byte
//! slice plus the bounds of the element it is inside, and each treats a
//! failed header read or a non-advancing element as the end of that branch:
//! malformed or truncated structure costs the remainder of one loop, never
//! the whole extraction.

use crate::ebml::{self, ElementHeader};
use crate::elements::{
    subtitle_codec_from_mkv_id, SubtitleCodec, BLOCK, BLOCK_DURATION, BLOCK_GROUP, CLUSTER,
    CODEC_ID, FLAG_DEFAULT, INFO, LANGUAGE, NAME, SEGMENT, SIMPLE_BLOCK, TIMECODE,
    TIMECODE_SCALE, TRACKS, TRACK_ENTRY, TRACK_NUMBER, TRACK_TYPE, TRACK_TYPE_SUBTITLE,
};
use crate::error::BlockError;
use crate::text;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default timecode scale (1 millisecond in nanoseconds).
pub const DEFAULT_TIMECODE_SCALE: u64 = 1_000_000;

/// A text-subtitle track advertised by a container's `Tracks` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    /// Track number blocks refer to (1-based).
    pub number: u64,
    /// The track's text codec.
    pub codec: SubtitleCodec,
    /// FlagDefault bit; true when the element is absent.
    pub is_default: bool,
    /// Language (ISO 639-2), when declared.
    pub language: Option<String>,
    /// Human-readable track name, when declared.
    pub name: Option<String>,
}

/// One decoded subtitle payload, still positioned in timecode units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEvent {
    /// Cluster base timecode plus the block's relative timecode.
    pub start_unit: i64,
    /// BlockDuration in timecode units, when the block carried one.
    pub duration_unit: Option<u64>,
    /// Decoded, normalized text; never empty.
    pub text: String,
}

/// Byte range of the Segment data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SegmentBounds {
    pub start: usize,
    pub end: usize,
}

/// Metadata gathered from the front of the segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SegmentMetadata {
    /// Nanoseconds per timecode unit.
    pub timecode_scale: u64,
    /// Subtitle candidates in declaration order.
    pub tracks: Vec<SubtitleTrack>,
}

/// Scan the top level of the buffer for the Segment element.
pub(crate) fn find_segment(data: &[u8]) -> Option<SegmentBounds> {
    let mut offset = 0;
    while offset < data.len() {
        let element = match ElementHeader::read(data, offset, data.len()) {
            Some(element) => element,
            None => break,
        };

        if element.id == SEGMENT {
            return Some(SegmentBounds {
                start: element.data_start,
                end: element.end,
            });
        }

        if element.end <= offset {
            break;
        }
        offset = element.end;
    }
    None
}

/// Collect `Info` and `Tracks` metadata, stopping at the first `Cluster`.
///
/// Files that interleave clusters before their track definitions yield
/// whatever metadata appeared first rather than failing.
pub(crate) fn read_metadata(data: &[u8], bounds: SegmentBounds) -> SegmentMetadata {
    let mut metadata = SegmentMetadata {
        timecode_scale: DEFAULT_TIMECODE_SCALE,
        tracks: Vec::new(),
    };

    let mut offset = bounds.start;
    while offset < bounds.end {
        let element = match ElementHeader::read(data, offset, bounds.end) {
            Some(element) => element,
            None => break,
        };

        match element.id {
            INFO => {
                metadata.timecode_scale = parse_info(data, element.data_start, element.end);
            }
            TRACKS => {
                metadata.tracks = parse_tracks(data, element.data_start, element.end);
            }
            CLUSTER => break,
            _ => {}
        }

        if element.end <= offset {
            break;
        }
        offset = element.end;
    }

    metadata
}

/// Parse the Info element for the timecode scale.
fn parse_info(data: &[u8], start: usize, end: usize) -> u64 {
    let mut timecode_scale = DEFAULT_TIMECODE_SCALE;

    let mut offset = start;
    while offset < end {
        let element = match ElementHeader::read(data, offset, end) {
            Some(element) => element,
            None => break,
        };

        if element.id == TIMECODE_SCALE {
            timecode_scale = ebml::read_unsigned_int(data, element.data_start, element.end);
        }

        if element.end <= offset {
            break;
        }
        offset = element.end;
    }

    timecode_scale
}

/// Parse the Tracks element into the list of subtitle candidates.
fn parse_tracks(data: &[u8], start: usize, end: usize) -> Vec<SubtitleTrack> {
    let mut tracks = Vec::new();

    let mut offset = start;
    while offset < end {
        let element = match ElementHeader::read(data, offset, end) {
            Some(element) => element,
            None => break,
        };

        if element.id == TRACK_ENTRY {
            if let Some(track) = parse_track_entry(data, element.data_start, element.end) {
                tracks.push(track);
            }
        }

        if element.end <= offset {
            break;
        }
        offset = element.end;
    }

    tracks
}

/// Parse a single TrackEntry; `None` unless it is a text-subtitle candidate.
fn parse_track_entry(data: &[u8], start: usize, end: usize) -> Option<SubtitleTrack> {
    let mut number = 0u64;
    let mut track_type = 0u64;
    let mut codec_id = String::new();
    let mut is_default = true;
    let mut language = None;
    let mut name = None;

    let mut offset = start;
    while offset < end {
        let element = match ElementHeader::read(data, offset, end) {
            Some(element) => element,
            None => break,
        };

        match element.id {
            TRACK_NUMBER => {
                number = ebml::read_unsigned_int(data, element.data_start, element.end);
            }
            TRACK_TYPE => {
                track_type = ebml::read_unsigned_int(data, element.data_start, element.end);
            }
            CODEC_ID => {
                codec_id = ebml::read_string(data, element.data_start, element.end);
            }
            FLAG_DEFAULT => {
                is_default = ebml::read_unsigned_int(data, element.data_start, element.end) != 0;
            }
            LANGUAGE => {
                language = Some(ebml::read_string(data, element.data_start, element.end));
            }
            NAME => {
                name = Some(ebml::read_string(data, element.data_start, element.end));
            }
            _ => {}
        }

        if element.end <= offset {
            break;
        }
        offset = element.end;
    }

    if number == 0 || track_type != u64::from(TRACK_TYPE_SUBTITLE) {
        return None;
    }
    let codec = subtitle_codec_from_mkv_id(&codec_id)?;

    Some(SubtitleTrack {
        number,
        codec,
        is_default,
        language,
        name,
    })
}

/// Pick the track to extract from the candidate list.
///
/// Order of preference: an explicitly requested track number, the first
/// default-flagged candidate, the first `S_TEXT/UTF8` candidate, then the
/// first candidate in declaration order.
pub(crate) fn select_track<'a>(
    tracks: &'a [SubtitleTrack],
    preferred: Option<u64>,
) -> Option<&'a SubtitleTrack> {
    if let Some(number) = preferred {
        if let Some(track) = tracks.iter().find(|track| track.number == number) {
            return Some(track);
        }
    }

    tracks
        .iter()
        .find(|track| track.is_default)
        .or_else(|| tracks.iter().find(|track| track.codec == SubtitleCodec::Utf8))
        .or_else(|| tracks.first())
}

/// A block header parsed out of a SimpleBlock or Block payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RawBlock {
    track_number: u64,
    relative_timecode: i16,
    payload_start: usize,
    payload_end: usize,
}

/// Parse the fixed part of a block: track VINT, relative timecode, flags.
///
/// The track number uses size-VINT semantics (marker bit stripped). Any
/// lacing mode is a reject; this engine only reads one frame per block.
fn parse_block(data: &[u8], start: usize, end: usize) -> Result<RawBlock, BlockError> {
    let track_vint =
        ebml::read_element_size(data, start).ok_or(BlockError::Truncated { offset: start })?;
    if track_vint.unknown || track_vint.value == 0 {
        return Err(BlockError::InvalidTrackNumber { offset: start });
    }

    let timecode_offset = start + track_vint.length;
    if timecode_offset + 3 > end || end > data.len() {
        return Err(BlockError::Truncated { offset: start });
    }

    let relative_timecode = i16::from_be_bytes([data[timecode_offset], data[timecode_offset + 1]]);
    let flags = data[timecode_offset + 2];
    let lacing = (flags >> 1) & 0x03;
    if lacing != 0 {
        return Err(BlockError::Lacing {
            mode: lacing,
            track: track_vint.value,
        });
    }

    Ok(RawBlock {
        track_number: track_vint.value,
        relative_timecode,
        payload_start: timecode_offset + 3,
        payload_end: end,
    })
}

/// The pieces of a BlockGroup this engine cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct BlockGroup {
    /// Data range of the contained Block element.
    block: Option<(usize, usize)>,
    /// BlockDuration in timecode units.
    duration_unit: Option<u64>,
}

/// Scan a BlockGroup for its Block and optional BlockDuration.
fn parse_block_group(data: &[u8], start: usize, end: usize) -> BlockGroup {
    let mut group = BlockGroup::default();

    let mut offset = start;
    while offset < end {
        let element = match ElementHeader::read(data, offset, end) {
            Some(element) => element,
            None => break,
        };

        match element.id {
            BLOCK => {
                group.block = Some((element.data_start, element.end));
            }
            BLOCK_DURATION => {
                group.duration_unit =
                    Some(ebml::read_unsigned_int(data, element.data_start, element.end));
            }
            _ => {}
        }

        if element.end <= offset {
            break;
        }
        offset = element.end;
    }

    group
}

/// Walk every Cluster in the segment and collect the selected track's events.
pub(crate) fn collect_events(
    data: &[u8],
    bounds: SegmentBounds,
    track: &SubtitleTrack,
) -> Vec<SubtitleEvent> {
    let mut events = Vec::new();

    let mut offset = bounds.start;
    while offset < bounds.end {
        let element = match ElementHeader::read(data, offset, bounds.end) {
            Some(element) => element,
            None => break,
        };

        if element.id == CLUSTER {
            walk_cluster(data, &element, track, &mut events);
        }

        if element.end <= offset {
            break;
        }
        offset = element.end;
    }

    events
}

/// Walk one Cluster: track its base timecode and record subtitle blocks.
fn walk_cluster(
    data: &[u8],
    cluster: &ElementHeader,
    track: &SubtitleTrack,
    events: &mut Vec<SubtitleEvent>,
) {
    let mut cluster_timecode = 0u64;

    let mut offset = cluster.data_start;
    while offset < cluster.end {
        let element = match ElementHeader::read(data, offset, cluster.end) {
            Some(element) => element,
            None => break,
        };

        match element.id {
            TIMECODE => {
                cluster_timecode = ebml::read_unsigned_int(data, element.data_start, element.end);
            }
            SIMPLE_BLOCK => {
                record_block(
                    data,
                    element.data_start,
                    element.end,
                    None,
                    cluster_timecode,
                    track,
                    events,
                );
            }
            BLOCK_GROUP => {
                let group = parse_block_group(data, element.data_start, element.end);
                if let Some((block_start, block_end)) = group.block {
                    record_block(
                        data,
                        block_start,
                        block_end,
                        group.duration_unit,
                        cluster_timecode,
                        track,
                        events,
                    );
                }
            }
            _ => {}
        }

        if element.end <= offset {
            break;
        }
        offset = element.end;
    }
}

/// Parse one block and append an event if it carries the selected track's text.
fn record_block(
    data: &[u8],
    start: usize,
    end: usize,
    duration_unit: Option<u64>,
    cluster_timecode: u64,
    track: &SubtitleTrack,
    events: &mut Vec<SubtitleEvent>,
) {
    match parse_block(data, start, end) {
        Ok(block) if block.track_number == track.number => {
            let payload = &data[block.payload_start..block.payload_end];
            let text = text::decode_payload(track.codec, payload);
            if text.is_empty() {
                return;
            }

            let base = i64::try_from(cluster_timecode).unwrap_or(i64::MAX);
            events.push(SubtitleEvent {
                start_unit: base.saturating_add(i64::from(block.relative_timecode)),
                duration_unit,
                text,
            });
        }
        Ok(_) => {}
        Err(BlockError::Lacing { mode, track: laced }) if laced == track.number => {
            debug!(offset = start, mode, "skipping laced subtitle block");
        }
        Err(BlockError::Lacing { .. }) => {}
        Err(err) => {
            debug!(offset = start, error = %err, "skipping unreadable block");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subtitle_track(number: u64, codec: SubtitleCodec, is_default: bool) -> SubtitleTrack {
        SubtitleTrack {
            number,
            codec,
            is_default,
            language: None,
            name: None,
        }
    }

    #[test]
    fn test_parse_block_basic() {
        // Track 1, relative timecode 0x0102, no lacing, two payload bytes.
        let data = [0x81, 0x01, 0x02, 0x00, b'h', b'i'];
        let block = parse_block(&data, 0, data.len()).unwrap();
        assert_eq!(block.track_number, 1);
        assert_eq!(block.relative_timecode, 0x0102);
        assert_eq!(block.payload_start, 4);
        assert_eq!(block.payload_end, 6);
    }

    #[test]
    fn test_parse_block_negative_timecode() {
        let data = [0x81, 0xFF, 0xFE, 0x00];
        let block = parse_block(&data, 0, data.len()).unwrap();
        assert_eq!(block.relative_timecode, -2);
    }

    #[test]
    fn test_parse_block_two_byte_track_number() {
        let data = [0x41, 0x00, 0x00, 0x00, 0x00];
        let block = parse_block(&data, 0, data.len()).unwrap();
        assert_eq!(block.track_number, 256);
        assert_eq!(block.payload_start, 5);
    }

    #[test]
    fn test_parse_block_rejects_lacing() {
        for (flags, mode) in [(0x02u8, 1u8), (0x04, 2), (0x06, 3)] {
            let data = [0x81, 0x00, 0x00, flags, b'x'];
            let err = parse_block(&data, 0, data.len()).unwrap_err();
            assert_eq!(err, BlockError::Lacing { mode, track: 1 });
        }
    }

    #[test]
    fn test_parse_block_rejects_short_header() {
        let data = [0x81, 0x00];
        assert_eq!(
            parse_block(&data, 0, data.len()),
            Err(BlockError::Truncated { offset: 0 })
        );
    }

    #[test]
    fn test_parse_block_rejects_zero_track() {
        // 0x80 decodes to track number 0 in size-VINT semantics.
        let data = [0x80, 0x00, 0x00, 0x00];
        assert_eq!(
            parse_block(&data, 0, data.len()),
            Err(BlockError::InvalidTrackNumber { offset: 0 })
        );
    }

    #[test]
    fn test_parse_block_allows_empty_payload() {
        let data = [0x81, 0x00, 0x00, 0x00];
        let block = parse_block(&data, 0, data.len()).unwrap();
        assert_eq!(block.payload_start, block.payload_end);
    }

    #[test]
    fn test_select_track_prefers_default_flag() {
        let tracks = vec![
            subtitle_track(1, SubtitleCodec::Utf8, false),
            subtitle_track(2, SubtitleCodec::Ass, true),
        ];
        assert_eq!(select_track(&tracks, None).unwrap().number, 2);
    }

    #[test]
    fn test_select_track_prefers_utf8_without_default() {
        let tracks = vec![
            subtitle_track(1, SubtitleCodec::Ass, false),
            subtitle_track(2, SubtitleCodec::Utf8, false),
            subtitle_track(3, SubtitleCodec::WebVtt, false),
        ];
        assert_eq!(select_track(&tracks, None).unwrap().number, 2);
    }

    #[test]
    fn test_select_track_falls_back_to_first() {
        let tracks = vec![
            subtitle_track(4, SubtitleCodec::Ssa, false),
            subtitle_track(5, SubtitleCodec::WebVtt, false),
        ];
        assert_eq!(select_track(&tracks, None).unwrap().number, 4);
    }

    #[test]
    fn test_select_track_preferred_number_wins() {
        let tracks = vec![
            subtitle_track(1, SubtitleCodec::Utf8, true),
            subtitle_track(2, SubtitleCodec::Ass, false),
        ];
        assert_eq!(select_track(&tracks, Some(2)).unwrap().number, 2);
    }

    #[test]
    fn test_select_track_unknown_preference_is_ignored() {
        let tracks = vec![subtitle_track(1, SubtitleCodec::Utf8, true)];
        assert_eq!(select_track(&tracks, Some(9)).unwrap().number, 1);
    }

    #[test]
    fn test_select_track_empty() {
        assert_eq!(select_track(&[], None), None);
        assert_eq!(select_track(&[], Some(1)), None);
    }

    #[test]
    fn test_find_segment_absent() {
        assert_eq!(find_segment(&[]), None);
        // A Void element but no Segment.
        assert_eq!(find_segment(&[0xEC, 0x81, 0x00]), None);
    }
}
