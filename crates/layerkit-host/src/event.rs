#![forbid(unsafe_code)]

//! Input events delivered by the host.
//!
//! Events are mutable while they are being dispatched: a handler that
//! consumes an event suppresses its default action with
//! [`ClickEvent::prevent_default`] / [`KeyEvent::prevent_default`], and the
//! host consults the flag once dispatch is over (e.g. to skip link
//! navigation).

use bitflags::bitflags;

use crate::dom::ElementId;

bitflags! {
    /// Keyboard modifier state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2;
        const META = 1 << 3;
    }
}

/// Key identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Escape,
    Enter,
    Tab,
    Backspace,
    Char(char),
}

/// Press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventKind {
    Press,
    Release,
}

/// A keyboard event.
#[derive(Debug, Clone)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
    pub kind: KeyEventKind,
    default_prevented: bool,
}

impl KeyEvent {
    /// A plain key press with no modifiers.
    pub fn press(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
            kind: KeyEventKind::Press,
            default_prevented: false,
        }
    }

    /// Suppress the host's default action for this key.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Whether the default action was suppressed.
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Pointer button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
    Auxiliary,
}

/// A click on a document element.
///
/// `target` is the innermost element under the pointer; handlers walk its
/// ancestor chain themselves for delegated matching.
#[derive(Debug, Clone)]
pub struct ClickEvent {
    pub target: ElementId,
    pub button: PointerButton,
    default_prevented: bool,
}

impl ClickEvent {
    /// A primary-button click on the given element.
    pub fn new(target: ElementId) -> Self {
        Self {
            target,
            button: PointerButton::Primary,
            default_prevented: false,
        }
    }

    /// Set the button.
    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }

    /// Suppress the host's default action (e.g. link navigation).
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Whether the default action was suppressed.
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    #[test]
    fn key_press_defaults() {
        let ev = KeyEvent::press(KeyCode::Escape);
        assert_eq!(ev.kind, KeyEventKind::Press);
        assert!(ev.modifiers.is_empty());
        assert!(!ev.default_prevented());
    }

    #[test]
    fn prevent_default_sticks() {
        let mut ev = KeyEvent::press(KeyCode::Enter);
        ev.prevent_default();
        assert!(ev.default_prevented());
    }

    #[test]
    fn click_event_builder() {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        let mut ev = ClickEvent::new(el).with_button(PointerButton::Secondary);
        assert_eq!(ev.target, el);
        assert_eq!(ev.button, PointerButton::Secondary);
        ev.prevent_default();
        assert!(ev.default_prevented());
    }
}
