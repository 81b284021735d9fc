#![forbid(unsafe_code)]

//! Layer configuration: resolved options, partial patches, and the markup
//! attribute contract.
//!
//! Options are resolved once, when an instance is constructed:
//! defaults ← markup-declared attributes ← call-site patch. Unparseable
//! markup values are ignored rather than erroring; configuration is part of
//! the "effectively total" surface.

use layerkit_host::{Document, ElementId};

/// Markup attribute carrying the per-element `keyboard` override.
pub const KEYBOARD_ATTR: &str = "data-keyboard";
/// Markup attribute carrying the per-element `backdrop` override.
pub const BACKDROP_ATTR: &str = "data-backdrop";
/// Markup attribute carrying the per-element `opacity` override.
pub const OPACITY_ATTR: &str = "data-opacity";
/// Markup attribute carrying the per-element `show` override.
pub const SHOW_ATTR: &str = "data-show";

/// Backdrop behavior behind a shown layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BackdropMode {
    /// No overlay at all.
    Off,
    /// Overlay shown; clicking it dismisses the layer.
    #[default]
    On,
    /// Overlay shown; clicking it does nothing.
    Lock,
}

impl BackdropMode {
    /// Whether an overlay element is created on show.
    pub const fn is_enabled(self) -> bool {
        !matches!(self, Self::Off)
    }

    /// Whether clicks on the overlay are inert.
    pub const fn locks_dismiss(self) -> bool {
        matches!(self, Self::Lock)
    }
}

/// Error parsing a backdrop mode from markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidBackdropMode(String);

impl std::fmt::Display for InvalidBackdropMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid backdrop mode {:?}", self.0)
    }
}

impl std::error::Error for InvalidBackdropMode {}

impl std::str::FromStr for BackdropMode {
    type Err = InvalidBackdropMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "true" => Ok(Self::On),
            "false" => Ok(Self::Off),
            "lock" => Ok(Self::Lock),
            other => Err(InvalidBackdropMode(other.to_owned())),
        }
    }
}

/// Resolved per-instance configuration, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerOptions {
    /// Escape key dismisses the layer.
    pub keyboard: bool,
    /// Backdrop behavior.
    pub backdrop: BackdropMode,
    /// Backdrop target opacity in `[0, 1]`.
    pub opacity: f32,
    /// Show as soon as the instance is resolved by the manager.
    pub show: bool,
}

impl Default for LayerOptions {
    fn default() -> Self {
        Self {
            keyboard: true,
            backdrop: BackdropMode::On,
            opacity: 0.5,
            show: true,
        }
    }
}

impl LayerOptions {
    /// Set escape-key dismissal.
    pub fn keyboard(mut self, keyboard: bool) -> Self {
        self.keyboard = keyboard;
        self
    }

    /// Set backdrop behavior.
    pub fn backdrop(mut self, backdrop: BackdropMode) -> Self {
        self.backdrop = backdrop;
        self
    }

    /// Set backdrop opacity (clamped to `[0, 1]`).
    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Set show-on-resolve.
    pub fn show(mut self, show: bool) -> Self {
        self.show = show;
        self
    }
}

/// Partial option overrides, merged over [`LayerOptions::default`] and
/// under later patches.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptionsPatch {
    pub keyboard: Option<bool>,
    pub backdrop: Option<BackdropMode>,
    pub opacity: Option<f32>,
    pub show: Option<bool>,
}

impl OptionsPatch {
    /// An empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the element's markup-declared overrides. Missing and
    /// unparseable attributes contribute nothing.
    pub fn from_markup(doc: &Document, element: ElementId) -> Self {
        Self {
            keyboard: doc.attr(element, KEYBOARD_ATTR).and_then(parse_bool),
            backdrop: doc
                .attr(element, BACKDROP_ATTR)
                .and_then(|v| v.parse().ok()),
            opacity: doc.attr(element, OPACITY_ATTR).and_then(|v| v.parse().ok()),
            show: doc.attr(element, SHOW_ATTR).and_then(parse_bool),
        }
    }

    /// Override `keyboard`.
    pub fn keyboard(mut self, keyboard: bool) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    /// Override `backdrop`.
    pub fn backdrop(mut self, backdrop: BackdropMode) -> Self {
        self.backdrop = Some(backdrop);
        self
    }

    /// Override `opacity`.
    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = Some(opacity);
        self
    }

    /// Override `show`.
    pub fn show(mut self, show: bool) -> Self {
        self.show = Some(show);
        self
    }

    /// Layer `other` on top: its set fields win.
    pub fn merge(&mut self, other: Self) {
        self.keyboard = other.keyboard.or(self.keyboard);
        self.backdrop = other.backdrop.or(self.backdrop);
        self.opacity = other.opacity.or(self.opacity);
        self.show = other.show.or(self.show);
    }

    /// Apply the set fields onto resolved options.
    pub fn apply_to(&self, options: &mut LayerOptions) {
        if let Some(keyboard) = self.keyboard {
            options.keyboard = keyboard;
        }
        if let Some(backdrop) = self.backdrop {
            options.backdrop = backdrop;
        }
        if let Some(opacity) = self.opacity {
            options.opacity = opacity.clamp(0.0, 1.0);
        }
        if let Some(show) = self.show {
            options.show = show;
        }
    }

    /// Defaults with this patch applied.
    pub fn resolve(&self) -> LayerOptions {
        let mut options = LayerOptions::default();
        self.apply_to(&mut options);
        options
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
