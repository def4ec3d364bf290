//! Cue assembly: timecode-unit events to millisecond cues.
//!
//! Events arrive from the cluster walker in file order with start positions
//! in timecode units. This module converts them to milliseconds, infers
//! missing end times, merges simultaneous events, and produces the final
//! sorted cue list in the shape shared by every subtitle source the host
//! consumes.

use crate::demuxer::SubtitleEvent;

use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Track tag used for every cue this engine produces.
///
/// Extraction selects exactly one text track per file, so the per-language
/// map in [`SubtitleCue`] always holds a single entry under this key.
pub const TRACK_TAG: &str = "x";

/// Cue length used when a block has no duration and no successor to infer
/// an end time from.
pub const DEFAULT_FALLBACK_CUE_DURATION_MS: u64 = 3_000;

/// A time-bounded subtitle entry in milliseconds.
///
/// Invariants: `start_time < end_time`, and a returned cue list is sorted
/// ascending by `start_time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleCue {
    /// Display start in integer milliseconds.
    #[serde(rename = "startTime")]
    pub start_time: u64,
    /// Display end in integer milliseconds.
    #[serde(rename = "endTime")]
    pub end_time: u64,
    /// Cue text keyed by track tag (always [`TRACK_TAG`] for this engine).
    pub languages: BTreeMap<String, String>,
}

impl SubtitleCue {
    /// The cue's text under this engine's track tag, if present.
    pub fn text(&self) -> Option<&str> {
        self.languages.get(TRACK_TAG).map(String::as_str)
    }
}

/// Tunables for an extraction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// End-time fallback when neither a duration nor a following event
    /// provides one.
    pub fallback_cue_duration_ms: u64,
    /// Extract this track number instead of applying the default selection
    /// policy. Ignored when it does not name a subtitle candidate.
    pub preferred_track: Option<u64>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            fallback_cue_duration_ms: DEFAULT_FALLBACK_CUE_DURATION_MS,
            preferred_track: None,
        }
    }
}

/// Convert raw events into the final sorted, grouped cue list.
pub(crate) fn assemble_cues(
    mut events: Vec<SubtitleEvent>,
    timecode_scale: u64,
    options: &ExtractOptions,
) -> Vec<SubtitleCue> {
    events.sort_by_key(|event| event.start_unit);

    let scale_to_ms = timecode_scale as f64 / 1_000_000.0;

    struct Group {
        end: u64,
        lines: Vec<String>,
    }
    let mut groups: BTreeMap<u64, Group> = BTreeMap::new();

    for (index, event) in events.iter().enumerate() {
        let start_ms = (event.start_unit as f64 * scale_to_ms).max(0.0);
        let end_ms = resolve_end(&events, index, scale_to_ms, start_ms, options);
        if end_ms <= start_ms || event.text.is_empty() {
            continue;
        }

        let start = start_ms.floor() as u64;
        let end = end_ms.ceil() as u64;

        match groups.entry(start) {
            Entry::Occupied(mut entry) => {
                let group = entry.get_mut();
                group.end = group.end.max(end);
                if !group.lines.iter().any(|line| line == &event.text) {
                    group.lines.push(event.text.clone());
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(Group {
                    end,
                    lines: vec![event.text.clone()],
                });
            }
        }
    }

    groups
        .into_iter()
        .map(|(start, group)| SubtitleCue {
            start_time: start,
            end_time: group.end,
            languages: BTreeMap::from([(TRACK_TAG.to_string(), group.lines.join("\n"))]),
        })
        .collect()
}

/// Resolve an event's end time in milliseconds.
///
/// Priority: the block's own duration, then the next event's start when it
/// lies strictly after this event, then the fallback duration.
fn resolve_end(
    events: &[SubtitleEvent],
    index: usize,
    scale_to_ms: f64,
    start_ms: f64,
    options: &ExtractOptions,
) -> f64 {
    let event = &events[index];
    if let Some(duration) = event.duration_unit {
        return start_ms + duration as f64 * scale_to_ms;
    }

    match events.get(index + 1) {
        Some(next) => {
            let next_start_ms = next.start_unit as f64 * scale_to_ms;
            if next_start_ms <= start_ms {
                start_ms + options.fallback_cue_duration_ms as f64
            } else {
                next_start_ms
            }
        }
        None => start_ms + options.fallback_cue_duration_ms as f64,
    }
}
