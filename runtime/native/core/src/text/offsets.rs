//! Offset translation between UTF-8 bytes and native widget units.
//!
//! The core addresses text in UTF-8 bytes. Native widgets do not agree:
//! GTK text buffers count Unicode scalar values, AppKit and Qt count UTF-16
//! code units, and the winit editor uses bytes directly.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionUnit {
    Utf8,
    Scalar,
    Utf16,
}

/// Clamp a byte index to the string and back onto a character boundary.
///
/// ```
/// use weft_native_core::text::offsets::clamp_to_char_boundary;
///
/// let s = "a€b";
/// assert_eq!(clamp_to_char_boundary(s, 2), 1);
/// assert_eq!(clamp_to_char_boundary(s, 100), 5);
/// ```
#[inline]
pub fn clamp_to_char_boundary(s: &str, index: usize) -> usize {
    let mut index = index.min(s.len());
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Boundary of the character before `index`, or 0.
pub fn prev_char_boundary(s: &str, index: usize) -> usize {
    let index = clamp_to_char_boundary(s, index);
    s[..index]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Boundary of the character after `index`, or `s.len()`.
pub fn next_char_boundary(s: &str, index: usize) -> usize {
    let index = clamp_to_char_boundary(s, index);
    s[index..]
        .chars()
        .next()
        .map(|c| index + c.len_utf8())
        .unwrap_or(s.len())
}

/// Length of `s` in `unit`.
pub fn unit_len(s: &str, unit: PositionUnit) -> usize {
    match unit {
        PositionUnit::Utf8 => s.len(),
        PositionUnit::Scalar => s.chars().count(),
        PositionUnit::Utf16 => s.encode_utf16().count(),
    }
}

/// Convert a byte offset into `unit`. The offset is clamped first.
pub fn byte_to_unit(s: &str, byte: usize, unit: PositionUnit) -> usize {
    let byte = clamp_to_char_boundary(s, byte);
    match unit {
        PositionUnit::Utf8 => byte,
        _ => unit_len(&s[..byte], unit),
    }
}

/// Convert a position in `unit` into a byte offset.
///
/// Positions past the end map to `s.len()`. A UTF-16 position between the
/// two halves of a surrogate pair maps to the start of that character.
pub fn unit_to_byte(s: &str, position: usize, unit: PositionUnit) -> usize {
    match unit {
        PositionUnit::Utf8 => clamp_to_char_boundary(s, position),
        PositionUnit::Scalar => s
            .char_indices()
            .nth(position)
            .map(|(i, _)| i)
            .unwrap_or(s.len()),
        PositionUnit::Utf16 => {
            let mut units = 0;
            for (i, c) in s.char_indices() {
                if units >= position {
                    return i;
                }
                units += c.len_utf16();
                if units > position {
                    return i;
                }
            }
            s.len()
        }
    }
}

pub fn byte_range_to_unit(s: &str, range: Range<usize>, unit: PositionUnit) -> Range<usize> {
    byte_to_unit(s, range.start, unit)..byte_to_unit(s, range.end, unit)
}

pub fn unit_range_to_byte(s: &str, range: Range<usize>, unit: PositionUnit) -> Range<usize> {
    unit_to_byte(s, range.start, unit)..unit_to_byte(s, range.end, unit)
}

/// Turn a `(start, len)` byte pair into a valid range of `s`.
///
/// Returns the range and whether anything had to be adjusted.
pub fn clamp_span(s: &str, start: usize, len: usize) -> (Range<usize>, bool) {
    let end = start.saturating_add(len);
    let clamped_start = clamp_to_char_boundary(s, start);
    let clamped_end = clamp_to_char_boundary(s, end).max(clamped_start);
    let adjusted = clamped_start != start || clamped_end != end;
    (clamped_start..clamped_end, adjusted)
}

/// Like [`clamp_span`] for a half-open `start..end` pair; a reversed pair is
/// treated as empty at `start`.
pub fn clamp_range(s: &str, start: usize, end: usize) -> (Range<usize>, bool) {
    let (range, adjusted) = clamp_span(s, start, end.saturating_sub(start));
    (range, adjusted || end < start)
}
