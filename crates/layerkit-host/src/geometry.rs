#![forbid(unsafe_code)]

//! Pixel geometry for the host document.

/// Rendered outer size of an element, in CSS pixels.
///
/// Outer size includes border and padding; the host (or test) that performs
/// layout assigns it via [`crate::dom::Document::set_outer_size`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    /// Zero-sized.
    pub const ZERO: Self = Self {
        width: 0.0,
        height: 0.0,
    };

    /// Create a new size.
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Whether either dimension is zero or negative.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// The visible window of the document plus its vertical scroll offset.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    /// Vertical scroll offset of the document, in pixels.
    pub scroll_top: f32,
}

impl Viewport {
    /// Create a viewport at scroll offset zero.
    pub const fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            scroll_top: 0.0,
        }
    }

    /// Set the scroll offset.
    pub const fn with_scroll_top(mut self, scroll_top: f32) -> Self {
        self.scroll_top = scroll_top;
        self
    }

    /// Whether content of the given height fits within the viewport.
    pub fn fits_height(&self, height: f32) -> bool {
        height <= self.height
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1024.0, 768.0)
    }
}
