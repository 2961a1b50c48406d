//! Character and line attributes, and the run map that tracks them.

use std::ops::Range;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// `rrggbbaa`, used to name native tags.
    pub fn hex(self) -> String {
        format!("{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }

    pub fn to_f64(self) -> [f64; 4] {
        [self.r, self.g, self.b, self.a].map(|c| f64::from(c) / 255.0)
    }
}

/// Per-character styling. `None` colors leave the widget default in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CharAttributes {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub background: Option<Color>,
    pub foreground: Option<Color>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Justification {
    #[default]
    Left,
    Center,
    Right,
}

impl Justification {
    /// Wire encoding: negative is left, zero is center, positive is right.
    pub fn from_sign(sign: i32) -> Self {
        match sign.signum() {
            -1 => Justification::Left,
            0 => Justification::Center,
            _ => Justification::Right,
        }
    }

    pub fn sign(self) -> i32 {
        match self {
            Justification::Left => -1,
            Justification::Center => 0,
            Justification::Right => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineAttributes {
    pub justification: Justification,
    /// Indentation in logical pixels.
    pub leading: f64,
    pub trailing: f64,
}

/// Styling for a whole label or text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextStyle {
    pub attributes: CharAttributes,
    /// Lines shown before the text is truncated. Zero means no limit.
    pub max_lines: u32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            attributes: CharAttributes::default(),
            max_lines: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Run<T> {
    pub range: Range<usize>,
    pub value: T,
}

/// Values over `[0, len)`, stored as maximal runs of equal values.
#[derive(Debug, Clone, PartialEq)]
pub struct RunMap<T> {
    runs: Vec<Run<T>>,
    len: usize,
    default: T,
}

impl<T: Clone + PartialEq> RunMap<T> {
    pub fn new(len: usize, default: T) -> Self {
        let runs = if len > 0 {
            vec![Run {
                range: 0..len,
                value: default.clone(),
            }]
        } else {
            Vec::new()
        };
        Self { runs, len, default }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn runs(&self) -> &[Run<T>] {
        &self.runs
    }

    /// Reset to a single default run over `len`.
    pub fn reset(&mut self, len: usize) {
        *self = Self::new(len, self.default.clone());
    }

    pub fn at(&self, index: usize) -> &T {
        self.runs
            .iter()
            .find(|run| run.range.contains(&index))
            .map(|run| &run.value)
            .unwrap_or(&self.default)
    }

    /// Overwrite `range` with `value`. The range is clipped to the map.
    pub fn set(&mut self, range: Range<usize>, value: T) {
        let start = range.start.min(self.len);
        let end = range.end.min(self.len);
        if start >= end {
            return;
        }

        let mut out = Vec::with_capacity(self.runs.len() + 2);
        let mut placed = false;
        for run in self.runs.drain(..) {
            if run.range.end <= start || run.range.start >= end {
                if run.range.start >= end && !placed {
                    out.push(Run { range: start..end, value: value.clone() });
                    placed = true;
                }
                out.push(run);
                continue;
            }
            if run.range.start < start {
                out.push(Run { range: run.range.start..start, value: run.value.clone() });
            }
            if !placed {
                out.push(Run { range: start..end, value: value.clone() });
                placed = true;
            }
            if run.range.end > end {
                out.push(Run { range: end..run.range.end, value: run.value });
            }
        }
        if !placed {
            out.push(Run { range: start..end, value });
        }
        self.runs = merge(out);
    }

    /// Follow a text edit: `removed` positions at `at` were replaced by
    /// `inserted` new ones.
    ///
    /// Inserted positions take the value of the position before the edit, or
    /// of the first position when editing at the start.
    pub fn splice(&mut self, at: usize, removed: usize, inserted: usize) {
        let at = at.min(self.len);
        let removed = removed.min(self.len - at);
        let inherit = if at > 0 {
            self.at(at - 1).clone()
        } else if self.len > removed {
            self.at(removed).clone()
        } else {
            self.default.clone()
        };

        let end = at + removed;
        let cut = |p: usize| -> usize {
            if p <= at {
                p
            } else if p >= end {
                p - removed
            } else {
                at
            }
        };

        let mut out = Vec::with_capacity(self.runs.len() + 2);
        for run in self.runs.drain(..) {
            let range = cut(run.range.start)..cut(run.range.end);
            if range.is_empty() {
                continue;
            }
            if range.end <= at {
                out.push(Run { range, value: run.value });
            } else if range.start >= at {
                out.push(Run {
                    range: range.start + inserted..range.end + inserted,
                    value: run.value,
                });
            } else {
                out.push(Run { range: range.start..at, value: run.value.clone() });
                out.push(Run { range: at + inserted..range.end + inserted, value: run.value });
            }
        }
        if inserted > 0 {
            out.push(Run { range: at..at + inserted, value: inherit });
        }
        out.sort_by_key(|run| run.range.start);

        self.len = self.len - removed + inserted;
        self.runs = merge(out);
    }
}

fn merge<T: PartialEq>(runs: Vec<Run<T>>) -> Vec<Run<T>> {
    let mut out: Vec<Run<T>> = Vec::with_capacity(runs.len());
    for run in runs {
        if run.range.is_empty() {
            continue;
        }
        if let Some(last) = out.last_mut() {
            if last.value == run.value && last.range.end == run.range.start {
                last.range.end = run.range.end;
                continue;
            }
        }
        out.push(run);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(map: &RunMap<u8>) -> Vec<(usize, usize, u8)> {
        map.runs()
            .iter()
            .map(|run| (run.range.start, run.range.end, run.value))
            .collect()
    }

    #[test]
    fn set_splits_and_merges() {
        let mut map = RunMap::new(10, 0u8);
        map.set(2..5, 1);
        assert_eq!(spans(&map), vec![(0, 2, 0), (2, 5, 1), (5, 10, 0)]);

        map.set(5..7, 1);
        assert_eq!(spans(&map), vec![(0, 2, 0), (2, 7, 1), (7, 10, 0)]);

        map.set(0..10, 0);
        assert_eq!(spans(&map), vec![(0, 10, 0)]);
    }

    #[test]
    fn set_is_last_write_wins() {
        let mut map = RunMap::new(6, 0u8);
        map.set(0..4, 1);
        map.set(2..6, 2);
        assert_eq!(*map.at(1), 1);
        assert_eq!(*map.at(2), 2);
        assert_eq!(*map.at(5), 2);
    }

    #[test]
    fn set_clips_to_length() {
        let mut map = RunMap::new(3, 0u8);
        map.set(2..100, 7);
        assert_eq!(spans(&map), vec![(0, 2, 0), (2, 3, 7)]);
        map.set(5..9, 9);
        assert_eq!(spans(&map), vec![(0, 2, 0), (2, 3, 7)]);
    }

    #[test]
    fn insertion_inherits_preceding_value() {
        let mut map = RunMap::new(4, 0u8);
        map.set(0..2, 1);
        map.splice(2, 0, 3);
        assert_eq!(map.len(), 7);
        assert_eq!(spans(&map), vec![(0, 5, 1), (5, 7, 0)]);
    }

    #[test]
    fn insertion_at_start_takes_first_value() {
        let mut map = RunMap::new(2, 0u8);
        map.set(0..2, 4);
        map.splice(0, 0, 2);
        assert_eq!(spans(&map), vec![(0, 4, 4)]);
    }

    #[test]
    fn insertion_inside_run_keeps_it_whole() {
        let mut map = RunMap::new(6, 0u8);
        map.set(1..5, 3);
        map.splice(3, 0, 2);
        assert_eq!(spans(&map), vec![(0, 1, 0), (1, 7, 3), (7, 8, 0)]);
    }

    #[test]
    fn removal_shrinks_runs() {
        let mut map = RunMap::new(10, 0u8);
        map.set(3..6, 1);
        map.splice(2, 5, 0);
        assert_eq!(map.len(), 5);
        assert_eq!(spans(&map), vec![(0, 5, 0)]);
    }

    #[test]
    fn replacement_spanning_runs() {
        let mut map = RunMap::new(9, 0u8);
        map.set(0..3, 1);
        map.set(3..6, 2);
        map.set(6..9, 3);
        map.splice(2, 5, 1);
        assert_eq!(map.len(), 5);
        assert_eq!(spans(&map), vec![(0, 3, 1), (3, 5, 3)]);
    }

    #[test]
    fn splice_on_empty_map_uses_default() {
        let mut map = RunMap::new(0, 5u8);
        map.splice(0, 0, 3);
        assert_eq!(spans(&map), vec![(0, 3, 5)]);
        map.reset(0);
        assert!(map.is_empty());
        assert!(map.runs().is_empty());
    }

    #[test]
    fn justification_sign_encoding() {
        assert_eq!(Justification::from_sign(-7), Justification::Left);
        assert_eq!(Justification::from_sign(0), Justification::Center);
        assert_eq!(Justification::from_sign(2), Justification::Right);
        assert_eq!(Justification::Right.sign(), 1);
    }

    #[test]
    fn color_hex_names() {
        assert_eq!(Color::rgba(255, 0, 16, 128).hex(), "ff001080");
    }
}
