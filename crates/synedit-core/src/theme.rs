//! Theme values resolved from highlight capture names.

use bitflags::bitflags;
use std::collections::HashMap;

/// An sRGB color with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red component.
    pub r: u8,
    /// Green component.
    pub g: u8,
    /// Blue component.
    pub b: u8,
    /// Alpha component.
    pub a: u8,
}

impl Color {
    /// An opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    /// A color with alpha.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let component = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
        match digits.len() {
            6 => Some(Self::rgb(component(0)?, component(2)?, component(4)?)),
            8 => Some(Self::rgba(
                component(0)?,
                component(2)?,
                component(4)?,
                component(6)?,
            )),
            _ => None,
        }
    }
}

/// A font face and size.
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    /// Family name.
    pub family: String,
    /// Point size.
    pub size: f32,
}

/// A text shadow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    /// Shadow color.
    pub color: Color,
    /// Horizontal offset.
    pub offset_x: f32,
    /// Vertical offset.
    pub offset_y: f32,
    /// Blur radius.
    pub blur_radius: f32,
}

bitflags! {
    /// Symbolic font traits applied on top of the resolved font.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FontTraits: u8 {
        /// Bold weight.
        const BOLD = 1 << 0;
        /// Italic style.
        const ITALIC = 1 << 1;
    }
}

/// Maps highlight capture names such as `"keyword"` or `"variable.builtin"` to styling.
///
/// Unknown names resolve to `None` and produce no styling.
pub trait Theme: Send + Sync {
    /// Foreground color for a capture.
    fn text_color(&self, highlight_name: &str) -> Option<Color>;

    /// Font for a capture.
    fn font(&self, _highlight_name: &str) -> Option<Font> {
        None
    }

    /// Shadow for a capture.
    fn shadow(&self, _highlight_name: &str) -> Option<Shadow> {
        None
    }

    /// Bold/italic traits for a capture.
    fn font_traits(&self, _highlight_name: &str) -> FontTraits {
        FontTraits::empty()
    }
}

/// Styling for one capture name in a [`SimpleTheme`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HighlightStyle {
    /// Foreground color.
    pub color: Option<Color>,
    /// Font.
    pub font: Option<Font>,
    /// Shadow.
    pub shadow: Option<Shadow>,
    /// Traits.
    pub traits: FontTraits,
}

impl HighlightStyle {
    /// A style that only sets a color.
    pub fn color(color: Color) -> Self {
        Self {
            color: Some(color),
            ..Self::default()
        }
    }

    /// Add traits.
    pub fn with_traits(mut self, traits: FontTraits) -> Self {
        self.traits |= traits;
        self
    }

    /// Set the font.
    pub fn with_font(mut self, font: Font) -> Self {
        self.font = Some(font);
        self
    }

    /// Set the shadow.
    pub fn with_shadow(mut self, shadow: Shadow) -> Self {
        self.shadow = Some(shadow);
        self
    }
}

/// A map-backed [`Theme`].
///
/// Lookups try the exact capture name first, then progressively shorter dotted prefixes, so a
/// style for `"function"` also applies to `"function.method.call"`.
#[derive(Debug, Clone, Default)]
pub struct SimpleTheme {
    styles: HashMap<String, HighlightStyle>,
}

impl SimpleTheme {
    /// Create an empty theme.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a style for a capture name.
    pub fn with_style(mut self, name: impl Into<String>, style: HighlightStyle) -> Self {
        self.styles.insert(name.into(), style);
        self
    }

    /// Resolve the style for a capture name.
    pub fn style_for_capture(&self, name: &str) -> Option<&HighlightStyle> {
        if let Some(style) = self.styles.get(name) {
            return Some(style);
        }
        let mut prefix = name;
        while let Some(dot) = prefix.rfind('.') {
            prefix = &prefix[..dot];
            if let Some(style) = self.styles.get(prefix) {
                return Some(style);
            }
        }
        None
    }
}

impl Theme for SimpleTheme {
    fn text_color(&self, highlight_name: &str) -> Option<Color> {
        self.style_for_capture(highlight_name)?.color
    }

    fn font(&self, highlight_name: &str) -> Option<Font> {
        self.style_for_capture(highlight_name)?.font.clone()
    }

    fn shadow(&self, highlight_name: &str) -> Option<Shadow> {
        self.style_for_capture(highlight_name)?.shadow
    }

    fn font_traits(&self, highlight_name: &str) -> FontTraits {
        self.style_for_capture(highlight_name)
            .map(|style| style.traits)
            .unwrap_or_default()
    }
}
