//! Attributed text for one rendered line.
//!
//! [`StyledText`] keeps a sorted list of non-overlapping runs that cover the whole line. Setting
//! attributes on a range splits the runs at the range bounds and overlays the new attributes,
//! so applying styles in order lets later (more specific) styles win.

use crate::byte::TextRange;
use crate::theme::{Color, Font, FontTraits, Shadow, Theme};

/// Attributes of a run of text. `None` means "not set".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextAttributes {
    /// Foreground color.
    pub color: Option<Color>,
    /// Font.
    pub font: Option<Font>,
    /// Shadow.
    pub shadow: Option<Shadow>,
    /// Bold/italic traits.
    pub traits: FontTraits,
}

impl TextAttributes {
    /// Attributes `theme` assigns to a highlight name.
    pub fn from_theme(theme: &dyn Theme, highlight_name: &str) -> Self {
        Self {
            color: theme.text_color(highlight_name),
            font: theme.font(highlight_name),
            shadow: theme.shadow(highlight_name),
            traits: theme.font_traits(highlight_name),
        }
    }

    /// Whether no attribute is set.
    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.font.is_none() && self.shadow.is_none() && self.traits.is_empty()
    }

    /// Overlay `other`: every color, font or shadow `other` sets replaces ours, and its traits
    /// are added to ours.
    pub fn overlay(&mut self, other: &TextAttributes) {
        if let Some(color) = other.color {
            self.color = Some(color);
        }
        if let Some(font) = &other.font {
            self.font = Some(font.clone());
        }
        if let Some(shadow) = other.shadow {
            self.shadow = Some(shadow);
        }
        self.traits |= other.traits;
    }
}

/// A run of text sharing the same attributes. Ranges are local to the line.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledRun {
    /// Range within the line, in UTF-16 code units.
    pub range: TextRange,
    /// Attributes of the run.
    pub attributes: TextAttributes,
}

/// A line of text with attribute runs.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledText {
    text: String,
    length: usize,
    runs: Vec<StyledRun>,
}

impl StyledText {
    /// Unstyled text.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let length = text.encode_utf16().count();
        let runs = if length == 0 {
            Vec::new()
        } else {
            vec![StyledRun {
                range: TextRange::new(0, length),
                attributes: TextAttributes::default(),
            }]
        };
        Self { text, length, runs }
    }

    /// The text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in UTF-16 code units.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Whether the text is empty.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Runs in order. Together they cover the whole text.
    pub fn runs(&self) -> &[StyledRun] {
        &self.runs
    }

    /// Attributes at a code-unit offset.
    pub fn attributes_at(&self, offset: usize) -> Option<&TextAttributes> {
        let index = self
            .runs
            .partition_point(|run| run.range.upper_bound() <= offset);
        self.runs
            .get(index)
            .filter(|run| run.range.contains(offset))
            .map(|run| &run.attributes)
    }

    /// Remove all attributes.
    pub fn clear_attributes(&mut self) {
        *self = Self::new(std::mem::take(&mut self.text));
    }

    /// Overlay `attributes` on `range`. The range is clipped to the text.
    pub fn set_attributes(&mut self, range: TextRange, attributes: &TextAttributes) {
        let start = range.location.min(self.length);
        let end = range.upper_bound().min(self.length);
        if start >= end {
            return;
        }
        self.split_at(start);
        self.split_at(end);
        for run in &mut self.runs {
            if run.range.location >= start && run.range.upper_bound() <= end {
                run.attributes.overlay(attributes);
            }
        }
        self.coalesce();
    }

    fn split_at(&mut self, offset: usize) {
        let index = self
            .runs
            .partition_point(|run| run.range.upper_bound() <= offset);
        let Some(run) = self.runs.get(index) else {
            return;
        };
        if run.range.location == offset {
            return;
        }
        let tail = StyledRun {
            range: TextRange::from_bounds(offset, run.range.upper_bound()),
            attributes: run.attributes.clone(),
        };
        self.runs[index].range = TextRange::from_bounds(run.range.location, offset);
        self.runs.insert(index + 1, tail);
    }

    fn coalesce(&mut self) {
        let mut merged: Vec<StyledRun> = Vec::with_capacity(self.runs.len());
        for run in self.runs.drain(..) {
            match merged.last_mut() {
                Some(last) if last.attributes == run.attributes => {
                    last.range.length += run.range.length;
                }
                _ => merged.push(run),
            }
        }
        self.runs = merged;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color(r: u8) -> TextAttributes {
        TextAttributes {
            color: Some(Color::rgb(r, 0, 0)),
            ..TextAttributes::default()
        }
    }

    #[test]
    fn test_later_attributes_win() {
        let mut text = StyledText::new("let value = 1;");
        text.set_attributes(TextRange::new(0, 14), &color(1));
        text.set_attributes(TextRange::new(4, 5), &color(2));
        assert_eq!(text.attributes_at(0), Some(&color(1)));
        assert_eq!(text.attributes_at(4), Some(&color(2)));
        assert_eq!(text.attributes_at(9), Some(&color(1)));
        assert_eq!(text.runs().len(), 3);
    }

    #[test]
    fn test_overlay_keeps_unset_attributes() {
        let mut text = StyledText::new("abc");
        let bold = TextAttributes {
            traits: FontTraits::BOLD,
            ..TextAttributes::default()
        };
        text.set_attributes(TextRange::new(0, 3), &color(1));
        text.set_attributes(TextRange::new(1, 1), &bold);
        let middle = text.attributes_at(1).unwrap();
        assert_eq!(middle.color, Some(Color::rgb(1, 0, 0)));
        assert_eq!(middle.traits, FontTraits::BOLD);
    }

    #[test]
    fn test_range_is_clipped() {
        let mut text = StyledText::new("ab");
        text.set_attributes(TextRange::new(1, 10), &color(3));
        assert_eq!(text.attributes_at(1), Some(&color(3)));
        assert_eq!(text.attributes_at(2), None);
    }
}
