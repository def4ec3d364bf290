//! # mkvtext
//!
//! Text-subtitle extraction from Matroska (`.mkv`) and WebM containers.
//!
//! Given a complete in-memory byte buffer, this crate locates the container's
//! text-subtitle track, walks every Cluster for that track's blocks, decodes
//! each payload according to its codec, and returns a flat, time-sorted list
//! of cues in milliseconds. Extraction is a pure, synchronous function of the
//! buffer: no I/O, no shared state, and no failure mode beyond returning
//! fewer cues than a pristine file would have yielded.
//!
//! ## Example
//!
//! ```no_run
//! let data = std::fs::read("movie.mkv").unwrap();
//!
//! for cue in mkvtext::extract_subtitles(&data) {
//!     println!(
//!         "{} -> {}: {}",
//!         cue.start_time,
//!         cue.end_time,
//!         cue.text().unwrap_or_default()
//!     );
//! }
//! ```
//!
//! ## Container structure
//!
//! The walkers touch only the spine of the element tree:
//!
//! ```text
//! EBML Header            (skipped)
//! Segment
//! ├── Info
//! │   └── TimecodeScale  (ns per timecode unit)
//! ├── Tracks
//! │   └── TrackEntry     (number, type, codec, default flag, language, name)
//! └── Cluster            (repeated)
//!     ├── Timecode       (cluster base time)
//!     ├── SimpleBlock    (subtitle payload)
//!     └── BlockGroup
//!         ├── Block
//!         └── BlockDuration
//! ```
//!
//! Everything else (chapters, cues, tags, attachments, CRC-32 elements) is
//! skipped by element size without being parsed.
//!
//! ## Malformed input
//!
//! The parser is built for untrusted bytes. Every element is bounded by its
//! parent, every walker aborts its own loop on a bad or non-advancing header,
//! and truncated files yield whatever cues were complete before the cut. No
//! input causes a panic or an error return.
//!
//! ## Unsupported container features
//!
//! Laced blocks (multiple frames per block) are skipped, binary subtitle
//! codecs such as VobSub are never selected, and CRC-32 elements are not
//! validated. Blocking a thread for the length of the walk is the caller's
//! concern; large files are best handed to a worker.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cue;
pub mod demuxer;
pub mod ebml;
pub mod elements;
pub mod error;
pub mod text;

pub use cue::{ExtractOptions, SubtitleCue, DEFAULT_FALLBACK_CUE_DURATION_MS, TRACK_TAG};
pub use demuxer::{SubtitleEvent, SubtitleTrack, DEFAULT_TIMECODE_SCALE};
pub use ebml::{ElementHeader, Vint};
pub use elements::{subtitle_codec_from_mkv_id, SubtitleCodec};
pub use error::BlockError;

use tracing::debug;

/// Check whether a buffer starts with the EBML header signature.
///
/// A quick probe for "is this worth parsing"; extraction itself does not
/// require the EBML header and scans straight for the Segment.
pub fn is_mkv_signature(data: &[u8]) -> bool {
    data.len() >= 4 && data[0..4] == [0x1A, 0x45, 0xDF, 0xA3]
}

/// Extract subtitle cues from a Matroska buffer with default options.
///
/// Returns an empty list when the buffer has no Segment, no text-subtitle
/// track, or no decodable subtitle blocks; none of those are errors.
pub fn extract_subtitles(data: &[u8]) -> Vec<SubtitleCue> {
    extract_subtitles_with(data, &ExtractOptions::default())
}

/// Extract subtitle cues from a Matroska buffer.
///
/// The walk is single-pass and bounded: segment metadata is read up to the
/// first Cluster, one track is selected, and every Cluster is then scanned
/// for that track's blocks.
pub fn extract_subtitles_with(data: &[u8], options: &ExtractOptions) -> Vec<SubtitleCue> {
    let bounds = match demuxer::find_segment(data) {
        Some(bounds) => bounds,
        None => return Vec::new(),
    };

    let metadata = demuxer::read_metadata(data, bounds);
    let track = match demuxer::select_track(&metadata.tracks, options.preferred_track) {
        Some(track) => track,
        None => return Vec::new(),
    };
    debug!(
        track = track.number,
        codec = %track.codec,
        "selected subtitle track"
    );

    let events = demuxer::collect_events(data, bounds, track);
    cue::assemble_cues(events, metadata.timecode_scale, options)
}

/// List the text-subtitle tracks a container advertises.
///
/// Useful for hosts that offer track selection before extracting with
/// [`ExtractOptions::preferred_track`].
pub fn subtitle_tracks(data: &[u8]) -> Vec<SubtitleTrack> {
    match demuxer::find_segment(data) {
        Some(bounds) => demuxer::read_metadata(data, bounds).tracks,
        None => Vec::new(),
    }
}
