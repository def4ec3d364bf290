//! Subtitle payload decoding and text normalization.
//!
//! Matroska carries text subtitles as raw UTF-8 block payloads. Plain-text
//! codecs need only line-ending normalization; ASS/SSA blocks hold a single
//! `Dialogue:`-style record whose text field has to be dug out from behind
//! nine metadata fields and stripped of styling override codes.

use crate::elements::SubtitleCodec;
use regex::Regex;

/// Decode a raw block payload into normalized subtitle text.
///
/// Returns an empty string when nothing displayable is left; callers drop
/// such events rather than emitting blank cues.
pub fn decode_payload(codec: SubtitleCodec, payload: &[u8]) -> String {
    let raw = String::from_utf8_lossy(payload);
    if raw.is_empty() {
        return String::new();
    }

    if codec.is_dialogue() {
        dialogue_text(&raw)
    } else {
        normalize_text(&raw)
    }
}

/// Normalize line endings, strip NUL padding, and trim.
fn normalize_text(value: &str) -> String {
    value
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\0', "")
        .trim()
        .to_string()
}

/// The remainder of `value` after `count` commas, or the whole string when
/// there are fewer commas than that.
fn text_after_comma(value: &str, count: usize) -> &str {
    let mut seen = 0;
    for (index, byte) in value.bytes().enumerate() {
        if byte == b',' {
            seen += 1;
            if seen == count {
                return &value[index + 1..];
            }
        }
    }
    value
}

/// Extract the display text from an ASS/SSA dialogue record.
///
/// The text field is the 10th field of a `Dialogue:` line (9th when the
/// prefix itself was dropped by the muxer). `{...}` override blocks are
/// removed, `\N`/`\n` become newlines, `\h` becomes a space, and any other
/// backslash override code is stripped.
fn dialogue_text(value: &str) -> String {
    let record = value.trim();
    let (record, has_prefix) = match record.strip_prefix("Dialogue:") {
        Some(rest) => (rest.trim_start(), true),
        None => (record, false),
    };

    let field = text_after_comma(record, if has_prefix { 9 } else { 8 });

    let override_blocks = Regex::new(r"\{[^}]*\}").unwrap();
    let cleaned = override_blocks.replace_all(field, "");

    let cleaned = cleaned
        .replace("\\N", "\n")
        .replace("\\n", "\n")
        .replace("\\h", " ");

    let override_codes = Regex::new(r"\\[A-Za-z]+\d*(?:\([^)]*\))?").unwrap();
    let cleaned = override_codes.replace_all(&cleaned, "");

    // Unbalanced closing braces and stray read-order counters survive the
    // passes above on malformed records.
    let cleaned = cleaned.replace('}', "");
    let counter = Regex::new(r"^\d+\)").unwrap();
    let cleaned = counter.replace(&cleaned, "");

    normalize_text(&cleaned)
}
