//! Adapter-side mirror of the core's document.
//!
//! Offsets here are UTF-8 bytes. Callers clamp before calling in; the mirror
//! only asserts what it is given is already valid.

use super::attributes::{CharAttributes, LineAttributes, Run, RunMap};
use super::offsets::clamp_range;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    content: String,
    selection: Range<usize>,
    chars: RunMap<CharAttributes>,
    lines: Vec<LineAttributes>,
    editing: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self::new("")
    }
}

impl Document {
    pub fn new(content: &str) -> Self {
        Self {
            content: content.to_owned(),
            selection: 0..0,
            chars: RunMap::new(content.len(), CharAttributes::default()),
            lines: vec![LineAttributes::default(); line_count_of(content)],
            editing: true,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn selection(&self) -> Range<usize> {
        self.selection.clone()
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn set_editing(&mut self, editing: bool) {
        self.editing = editing;
    }

    /// Replace everything and reset attributes. Editing state survives.
    pub fn reset(&mut self, content: &str) {
        let editing = self.editing;
        *self = Self::new(content);
        self.editing = editing;
    }

    /// Set the selection, clamping it into the content. Returns whether the
    /// stored selection changed.
    pub fn set_selection(&mut self, start: usize, end: usize) -> bool {
        let (range, adjusted) = clamp_range(&self.content, start, end);
        if adjusted {
            log::warn!(
                "selection {}..{} clamped to {}..{} (len {})",
                start,
                end,
                range.start,
                range.end,
                self.content.len()
            );
        }
        if range == self.selection {
            return false;
        }
        self.selection = range;
        true
    }

    /// Splice `text` over `range`, which must lie on character boundaries.
    pub fn replace(&mut self, range: Range<usize>, text: &str) {
        debug_assert!(range.start <= range.end && range.end <= self.content.len());
        debug_assert!(self.content.is_char_boundary(range.start));
        debug_assert!(self.content.is_char_boundary(range.end));

        let line = self.content[..range.start].matches('\n').count();
        let removed_lines = self.content[range.clone()].matches('\n').count();
        let inserted_lines = text.matches('\n').count();

        let removed = range.end - range.start;
        self.chars.splice(range.start, removed, text.len());
        self.content.replace_range(range.clone(), text);

        let inherited = self.lines.get(line).copied().unwrap_or_default();
        let tail = (line + 1).min(self.lines.len());
        let drop_to = (line + 1 + removed_lines).min(self.lines.len());
        self.lines
            .splice(tail..drop_to, std::iter::repeat(inherited).take(inserted_lines));

        let map = |p: usize| -> usize {
            if p <= range.start {
                p
            } else if p >= range.end {
                p - removed + text.len()
            } else {
                range.start + text.len()
            }
        };
        self.selection = map(self.selection.start)..map(self.selection.end);
    }

    pub fn set_char_attributes(&mut self, range: Range<usize>, attributes: CharAttributes) {
        self.chars.set(range, attributes);
    }

    pub fn char_attributes_at(&self, index: usize) -> CharAttributes {
        *self.chars.at(index)
    }

    pub fn char_runs(&self) -> &[Run<CharAttributes>] {
        self.chars.runs()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line_attributes(&self, line: usize) -> Option<LineAttributes> {
        self.lines.get(line).copied()
    }

    /// Returns `false` if `line` does not exist.
    pub fn set_line_attributes(&mut self, line: usize, attributes: LineAttributes) -> bool {
        match self.lines.get_mut(line) {
            Some(slot) => {
                *slot = attributes;
                true
            }
            None => false,
        }
    }

    /// Byte range of `line`, excluding its terminating newline.
    pub fn line_range(&self, line: usize) -> Option<Range<usize>> {
        let mut start = 0;
        for (index, text) in self.content.split('\n').enumerate() {
            if index == line {
                return Some(start..start + text.len());
            }
            start += text.len() + 1;
        }
        None
    }
}

fn line_count_of(text: &str) -> usize {
    text.matches('\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::attributes::Justification;

    fn centered() -> LineAttributes {
        LineAttributes {
            justification: Justification::Center,
            leading: 4.0,
            trailing: 0.0,
        }
    }

    #[test]
    fn replace_updates_content_and_selection() {
        let mut doc = Document::new("hello world");
        doc.set_selection(6, 11);
        doc.replace(0..5, "HI");
        assert_eq!(doc.content(), "HI world");
        assert_eq!(doc.selection(), 3..8);
    }

    #[test]
    fn selection_inside_replaced_span_moves_to_insertion_end() {
        let mut doc = Document::new("abcdef");
        doc.set_selection(2, 3);
        doc.replace(1..5, "XY");
        assert_eq!(doc.selection(), 3..3);
    }

    #[test]
    fn selection_is_clamped_to_boundaries() {
        let mut doc = Document::new("a€b");
        assert!(doc.set_selection(2, 40));
        assert_eq!(doc.selection(), 1..5);
        assert!(!doc.set_selection(1, 5));
    }

    #[test]
    fn char_attributes_follow_edits() {
        let mut doc = Document::new("abcd");
        let bold = CharAttributes { bold: true, ..Default::default() };
        doc.set_char_attributes(0..2, bold);
        doc.replace(2..2, "zz");
        assert!(doc.char_attributes_at(3).bold);
        assert!(!doc.char_attributes_at(4).bold);
    }

    #[test]
    fn new_lines_inherit_attributes_of_edited_line() {
        let mut doc = Document::new("one\ntwo");
        assert_eq!(doc.line_count(), 2);
        assert!(doc.set_line_attributes(0, centered()));
        doc.replace(3..3, "\nmid");
        assert_eq!(doc.content(), "one\nmid\ntwo");
        assert_eq!(doc.line_count(), 3);
        assert_eq!(doc.line_attributes(1), Some(centered()));
        assert_eq!(doc.line_attributes(2), Some(LineAttributes::default()));
    }

    #[test]
    fn joining_lines_keeps_first_line_attributes() {
        let mut doc = Document::new("a\nb\nc");
        doc.set_line_attributes(1, centered());
        doc.replace(2..4, "");
        assert_eq!(doc.content(), "a\nc");
        assert_eq!(doc.line_count(), 2);
        assert_eq!(doc.line_attributes(1), Some(centered()));
    }

    #[test]
    fn line_ranges_exclude_newline() {
        let doc = Document::new("ab\n\ncd");
        assert_eq!(doc.line_range(0), Some(0..2));
        assert_eq!(doc.line_range(1), Some(3..3));
        assert_eq!(doc.line_range(2), Some(4..6));
        assert_eq!(doc.line_range(3), None);

        let mut single = Document::new("x");
        assert!(!single.set_line_attributes(4, centered()));
    }

    #[test]
    fn reset_keeps_editing_state() {
        let mut doc = Document::new("abc");
        doc.set_editing(false);
        doc.set_char_attributes(0..3, CharAttributes { italic: true, ..Default::default() });
        doc.reset("xyz");
        assert!(!doc.is_editing());
        assert!(!doc.char_attributes_at(0).italic);
        assert_eq!(doc.selection(), 0..0);
    }
}
