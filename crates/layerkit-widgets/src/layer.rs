#![forbid(unsafe_code)]

//! The layer state machine: show/hide transitions, viewport positioning,
//! and the backdrop lifecycle.
//!
//! A [`Layer`] is bound to one host element. It owns nothing but its
//! backdrop overlay: the bound element belongs to the host, and the layer
//! only toggles its visibility, position, and transition styles.
//!
//! # Invariants
//!
//! - `show()` while shown and `hide()` while hidden are no-ops; the
//!   cancelable notifications fire at most once per real transition.
//! - The backdrop reference is non-null only between the start of a show
//!   cycle's backdrop step and the end of the following hide cycle's; after
//!   a finished hide the overlay is detached and the reference is null.
//! - Every show/hide bumps a transition sequence number. Completion
//!   callbacks capture the number they were scheduled under and are
//!   discarded when it is stale, so rapid toggling settles on whichever
//!   transition was requested last.
//!
//! # Failure modes
//!
//! - A bound element missing from the document degrades to no-ops:
//!   positioning and style writes are skipped, notifications still fire.
//! - Listeners may re-enter the layer during notification dispatch; the
//!   shown flag is re-checked after the cancelable notifications to keep
//!   such re-entry consistent.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, trace};

use layerkit_host::{
    AnimatedProp, AnimationSpec, ClickEvent, CssPosition, Display, ElementId, KeyCode, KeyEvent,
    KeyEventKind, SharedDocument,
};

use crate::event::{LayerEvent, LayerEventKind, Listeners, Subscription};
use crate::options::LayerOptions;

/// Entrance/exit transition length for the layer element.
pub const TRANSITION_DURATION: Duration = Duration::from_millis(300);
/// Fade length for the backdrop overlay.
pub const BACKDROP_TRANSITION_DURATION: Duration = Duration::from_millis(150);

/// Markup attribute marking elements inside a layer that dismiss it when
/// clicked.
pub const DISMISS_ATTR: &str = "data-dismiss";
/// Expected value of [`DISMISS_ATTR`].
pub const DISMISS_VALUE: &str = "layer";

const LAYER_Z_INDEX: i32 = 1001;
const BACKDROP_Z_INDEX: i32 = 1000;
const ENTER_MARGIN_OFFSET: f32 = -30.0;
const BACKDROP_BACKGROUND: &str = "#000";

struct LayerState {
    doc: SharedDocument,
    element: ElementId,
    options: LayerOptions,
    is_shown: bool,
    is_fixed: bool,
    backdrop: Option<ElementId>,
    transition_seq: u64,
    listeners: Listeners,
}

/// A modal layer bound to one host element.
///
/// `Layer` is a cheaply-cloneable handle; clones address the same instance.
/// Instances live for the page session: there is no destructor path, and
/// the state is dropped with the last handle.
#[derive(Clone)]
pub struct Layer {
    state: Rc<RefCell<LayerState>>,
}

impl Layer {
    /// Bind a layer to `element` with resolved options.
    ///
    /// Does not show the layer; auto-show on resolve is the manager's job.
    pub fn new(doc: SharedDocument, element: ElementId, options: LayerOptions) -> Self {
        doc.with_mut(|d| {
            if let Some(style) = d.style_mut(element) {
                style.z_index = Some(LAYER_Z_INDEX);
            }
        });
        Self {
            state: Rc::new(RefCell::new(LayerState {
                doc,
                element,
                options,
                is_shown: false,
                is_fixed: true,
                backdrop: None,
                transition_seq: 0,
                listeners: Listeners::new(),
            })),
        }
    }

    /// The bound element.
    pub fn element(&self) -> ElementId {
        self.state.borrow().element
    }

    /// The options this instance was constructed with.
    pub fn options(&self) -> LayerOptions {
        self.state.borrow().options
    }

    /// Current visibility state.
    pub fn is_shown(&self) -> bool {
        self.state.borrow().is_shown
    }

    /// Whether the last adjustment chose viewport-fixed positioning.
    pub fn is_fixed(&self) -> bool {
        self.state.borrow().is_fixed
    }

    /// The backdrop overlay element, while one exists.
    pub fn backdrop(&self) -> Option<ElementId> {
        self.state.borrow().backdrop
    }

    /// Register a notification listener. Dropping the returned handle
    /// detaches it.
    pub fn on(&self, listener: impl Fn(&mut LayerEvent) + 'static) -> Subscription {
        self.state.borrow().listeners.subscribe(listener)
    }

    /// Show the layer. `related_target` is carried on the `show`/`shown`
    /// notifications (usually the trigger element). No-op while shown;
    /// listeners may cancel via the `show` notification.
    pub fn show(&self, related_target: Option<ElementId>) {
        if self.state.borrow().is_shown {
            return;
        }

        let mut ev = LayerEvent::new(LayerEventKind::Show, related_target);
        self.emit(&mut ev);
        // A listener may have canceled, or shown the layer itself, during
        // dispatch.
        if ev.default_prevented() || self.state.borrow().is_shown {
            return;
        }

        let token = {
            let mut state = self.state.borrow_mut();
            state.is_shown = true;
            state.transition_seq += 1;
            state.transition_seq
        };
        debug!(element = self.element().id(), "showing layer");

        self.adjust();

        let layer = self.clone();
        self.begin_backdrop_show(move || {
            if !layer.transition_current(token) {
                trace!("discarding stale show completion");
                return;
            }
            let element = layer.element();
            layer.doc().with_mut(|d| {
                if let Some(style) = d.style_mut(element) {
                    style.display = Display::Block;
                }
            });
            let mut shown = LayerEvent::new(LayerEventKind::Shown, related_target);
            layer.emit(&mut shown);
            layer.enter_effect();
        });
    }

    /// Hide the layer. No-op while hidden; listeners may cancel via the
    /// `hide` notification.
    pub fn hide(&self) {
        self.hide_impl();
    }

    /// Hide in response to an input event, suppressing its default action
    /// first.
    pub fn hide_with(&self, event: &mut ClickEvent) {
        event.prevent_default();
        self.hide_impl();
    }

    /// Hide if shown, otherwise show.
    pub fn toggle(&self, related_target: Option<ElementId>) {
        if self.is_shown() {
            self.hide();
        } else {
            self.show(related_target);
        }
    }

    /// Re-run the positioning pass. Idempotent; never changes visibility.
    pub fn handle_update(&self) {
        self.adjust();
    }

    /// Escape-key dismissal. Returns whether this layer consumed the event.
    pub fn handle_key(&self, event: &mut KeyEvent) -> bool {
        let (shown, keyboard) = {
            let state = self.state.borrow();
            (state.is_shown, state.options.keyboard)
        };
        if shown
            && keyboard
            && event.code == KeyCode::Escape
            && event.kind == KeyEventKind::Press
        {
            event.prevent_default();
            self.hide();
            true
        } else {
            false
        }
    }

    /// Viewport resize: reposition while shown.
    pub fn handle_resize(&self) {
        if self.state.borrow().is_shown {
            self.handle_update();
        }
    }

    /// Backdrop and dismiss-marker clicks. Returns whether this layer
    /// claimed the event. Only active while shown.
    pub fn handle_click(&self, event: &mut ClickEvent) -> bool {
        let (shown, backdrop, mode, element) = {
            let state = self.state.borrow();
            (
                state.is_shown,
                state.backdrop,
                state.options.backdrop,
                state.element,
            )
        };
        if !shown {
            return false;
        }

        if backdrop == Some(event.target) {
            if !mode.locks_dismiss() {
                self.hide_with(event);
            }
            return true;
        }

        // Delegated dismiss: the click target or an ancestor strictly below
        // the layer element carries the dismiss marker.
        let dismissed = self.doc().with(|d| {
            if !d.contains(element, event.target) {
                return false;
            }
            let mut current = Some(event.target);
            while let Some(id) = current {
                if id == element {
                    break;
                }
                if d.attr(id, DISMISS_ATTR) == Some(DISMISS_VALUE) {
                    return true;
                }
                current = d.parent(id);
            }
            false
        });
        if dismissed {
            self.hide_with(event);
            return true;
        }
        false
    }

    fn doc(&self) -> SharedDocument {
        self.state.borrow().doc.clone()
    }

    fn transition_current(&self, token: u64) -> bool {
        self.state.borrow().transition_seq == token
    }

    fn emit(&self, ev: &mut LayerEvent) {
        trace!(kind = ev.kind().as_str(), "layer notification");
        let listeners = self.state.borrow().listeners.snapshot();
        for listener in listeners {
            listener(ev);
        }
    }

    fn hide_impl(&self) {
        if !self.state.borrow().is_shown {
            return;
        }

        let mut ev = LayerEvent::new(LayerEventKind::Hide, None);
        self.emit(&mut ev);
        if ev.default_prevented() || !self.state.borrow().is_shown {
            return;
        }

        let token = {
            let mut state = self.state.borrow_mut();
            state.is_shown = false;
            state.transition_seq += 1;
            state.transition_seq
        };
        debug!(element = self.element().id(), "hiding layer");

        self.exit_effect(token);
    }

    /// Center horizontally; center vertically in the viewport while the
    /// element fits, otherwise pin it to the top of the scrolled-to area so
    /// oversized content scrolls with the page instead of clipping.
    fn adjust(&self) {
        let element = self.element();
        let fixed = self.doc().with_mut(|d| {
            let size = d.outer_size(element)?;
            let viewport = d.viewport();
            let fixed = viewport.fits_height(size.height);
            let left = (viewport.width - size.width) / 2.0;
            let top = if fixed {
                (viewport.height - size.height) / 2.0
            } else {
                viewport.scroll_top
            };
            let style = d.style_mut(element)?;
            style.position = if fixed {
                CssPosition::Fixed
            } else {
                CssPosition::Absolute
            };
            style.left = Some(left);
            style.top = Some(top);
            Some(fixed)
        });
        if let Some(fixed) = fixed {
            self.state.borrow_mut().is_fixed = fixed;
            trace!(element = element.id(), fixed, "layer position adjusted");
        }
    }

    fn enter_effect(&self) {
        let element = self.element();
        self.doc().with_mut(|d| {
            d.stop_animations(element);
            if let Some(style) = d.style_mut(element) {
                style.margin_top = ENTER_MARGIN_OFFSET;
                style.opacity = 0.0;
            }
            d.animate(
                AnimationSpec::new(element)
                    .track(AnimatedProp::MarginTop, 0.0)
                    .track(AnimatedProp::Opacity, 1.0)
                    .duration(TRANSITION_DURATION),
            );
        });
    }

    fn exit_effect(&self, token: u64) {
        let element = self.element();
        let layer = self.clone();
        self.doc().with_mut(|d| {
            d.stop_animations(element);
            d.animate(
                AnimationSpec::new(element)
                    .track(AnimatedProp::MarginTop, ENTER_MARGIN_OFFSET)
                    .track(AnimatedProp::Opacity, 0.0)
                    .duration(TRANSITION_DURATION)
                    .on_complete(move || {
                        if !layer.transition_current(token) {
                            trace!("discarding stale hide completion");
                            return;
                        }
                        let element = layer.element();
                        layer.doc().with_mut(|d| {
                            if let Some(style) = d.style_mut(element) {
                                style.display = Display::None;
                            }
                        });
                        layer.begin_backdrop_hide(None);
                        let mut hidden = LayerEvent::new(LayerEventKind::Hidden, None);
                        layer.emit(&mut hidden);
                    }),
            );
        });
    }

    /// Backdrop step of the show transition. With the backdrop disabled the
    /// completion runs immediately and synchronously.
    fn begin_backdrop_show(&self, then: impl FnOnce() + 'static) {
        let (mode, opacity) = {
            let state = self.state.borrow();
            (state.options.backdrop, state.options.opacity)
        };
        if !mode.is_enabled() {
            then();
            return;
        }

        let doc = self.doc();
        // An overlay left over from an aborted hide is discarded outright;
        // each show cycle owns a fresh one.
        if let Some(stale) = self.state.borrow_mut().backdrop.take() {
            trace!(backdrop = stale.id(), "discarding stale backdrop");
            doc.with_mut(|d| {
                d.stop_animations(stale);
                d.remove(stale);
            });
        }

        let backdrop = doc.with_mut(|d| {
            let backdrop = d.create_element("div");
            if let Some(style) = d.style_mut(backdrop) {
                style.position = CssPosition::Fixed;
                style.top = Some(0.0);
                style.right = Some(0.0);
                style.bottom = Some(0.0);
                style.left = Some(0.0);
                style.z_index = Some(BACKDROP_Z_INDEX);
                style.background = Some(BACKDROP_BACKGROUND.to_owned());
                style.opacity = 0.0;
            }
            let body = d.body();
            d.append(body, backdrop);
            backdrop
        });
        self.state.borrow_mut().backdrop = Some(backdrop);

        doc.with_mut(|d| {
            d.animate(
                AnimationSpec::new(backdrop)
                    .track(AnimatedProp::Opacity, opacity)
                    .duration(BACKDROP_TRANSITION_DURATION)
                    .on_complete(then),
            );
        });
    }

    /// Backdrop step of the hide transition. Without an overlay the
    /// completion runs immediately and synchronously; otherwise the overlay
    /// fades out, is detached and dropped, and the reference is nulled
    /// before the completion runs.
    fn begin_backdrop_hide(&self, then: Option<Box<dyn FnOnce()>>) {
        let backdrop = self.state.borrow().backdrop;
        let Some(backdrop) = backdrop else {
            if let Some(then) = then {
                then();
            }
            return;
        };

        let layer = self.clone();
        self.doc().with_mut(|d| {
            d.stop_animations(backdrop);
            d.animate(
                AnimationSpec::new(backdrop)
                    .track(AnimatedProp::Opacity, 0.0)
                    .duration(BACKDROP_TRANSITION_DURATION)
                    .on_complete(move || {
                        layer.doc().with_mut(|d| d.remove(backdrop));
                        {
                            let mut state = layer.state.borrow_mut();
                            // A newer show cycle may already own a fresh
                            // overlay; only null our own.
                            if state.backdrop == Some(backdrop) {
                                state.backdrop = None;
                            }
                        }
                        if let Some(then) = then {
                            then();
                        }
                    }),
            );
        });
    }
}

impl std::fmt::Debug for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Layer")
            .field("element", &state.element)
            .field("is_shown", &state.is_shown)
            .field("is_fixed", &state.is_fixed)
            .field("backdrop", &state.backdrop)
            .finish()
    }
}
