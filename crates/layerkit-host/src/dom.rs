#![forbid(unsafe_code)]

//! Element arena and document handle.
//!
//! A [`Document`] owns a flat arena of elements rooted at a `body` element,
//! the current [`Viewport`], and the animation [`Timeline`]. Elements carry
//! a tag, an attribute map, a typed [`InlineStyle`], parent/child links, and
//! a host-assigned outer [`Size`].
//!
//! # Failure modes
//!
//! Lookups for missing elements return `None` and mutations on missing ids
//! are silent no-ops; nothing here panics on a dangling [`ElementId`].
//! Detaching or removing the `body` root is also a no-op.
//!
//! [`SharedDocument`] is the `Rc<RefCell<..>>` handle widget code holds.
//! Its [`SharedDocument::advance`] steps the timeline, releases the borrow,
//! and only then runs animation completion callbacks, so callbacks may
//! re-enter the document (and typically do).

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use ahash::AHashMap;
use smallvec::SmallVec;

use crate::animate::{AnimatedProp, AnimationSpec, Completion, ResolvedTrack, Timeline};
use crate::geometry::{Size, Viewport};

/// Opaque element identity. Ids are unique for the lifetime of a document
/// and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    /// Raw id value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// `display` values the widget layer cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
    /// No inline override; the host stylesheet decides.
    #[default]
    Unset,
    Block,
    None,
}

/// `position` values the widget layer cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CssPosition {
    #[default]
    Static,
    /// Positioned relative to the viewport, ignoring page scroll.
    Fixed,
    /// Positioned relative to the document, scrolling with the page.
    Absolute,
}

/// Typed inline style. Only the properties the layer widget reads and
/// writes are modeled; everything else stays with the host stylesheet.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineStyle {
    pub display: Display,
    pub position: CssPosition,
    pub left: Option<f32>,
    pub top: Option<f32>,
    pub right: Option<f32>,
    pub bottom: Option<f32>,
    pub margin_top: f32,
    pub opacity: f32,
    pub z_index: Option<i32>,
    pub background: Option<String>,
}

impl Default for InlineStyle {
    fn default() -> Self {
        Self {
            display: Display::Unset,
            position: CssPosition::Static,
            left: None,
            top: None,
            right: None,
            bottom: None,
            margin_top: 0.0,
            opacity: 1.0,
            z_index: None,
            background: None,
        }
    }
}

struct Node {
    tag: String,
    attrs: AHashMap<String, String>,
    style: InlineStyle,
    parent: Option<ElementId>,
    children: SmallVec<[ElementId; 4]>,
    outer_size: Size,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: AHashMap::new(),
            style: InlineStyle::default(),
            parent: None,
            children: SmallVec::new(),
            outer_size: Size::ZERO,
        }
    }
}

/// The host document: element arena, viewport, and animation timeline.
pub struct Document {
    nodes: AHashMap<ElementId, Node>,
    body: ElementId,
    next_id: u64,
    viewport: Viewport,
    timeline: Timeline,
}

impl Document {
    /// Create an empty document containing only the `body` root.
    pub fn new() -> Self {
        let body = ElementId(1);
        let mut nodes = AHashMap::new();
        nodes.insert(body, Node::new("body"));
        Self {
            nodes,
            body,
            next_id: 2,
            viewport: Viewport::default(),
            timeline: Timeline::new(),
        }
    }

    /// The root element.
    #[inline]
    pub fn body(&self) -> ElementId {
        self.body
    }

    // --- Structure ---

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Node::new(tag));
        id
    }

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous parent. No-op if either id is missing, the two are equal,
    /// or the append would create a cycle.
    pub fn append(&mut self, parent: ElementId, child: ElementId) {
        if parent == child
            || !self.nodes.contains_key(&parent)
            || !self.nodes.contains_key(&child)
            || self.contains(child, parent)
        {
            return;
        }
        self.detach(child);
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
    }

    /// Unlink an element from its parent, keeping it (and its subtree) in
    /// the arena. No-op for the body root or missing ids.
    pub fn detach(&mut self, id: ElementId) {
        if id == self.body {
            return;
        }
        let Some(parent) = self.nodes.get(&id).and_then(|n| n.parent) else {
            return;
        };
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.retain(|c| *c != id);
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = None;
        }
    }

    /// Detach an element and drop it and its whole subtree from the arena,
    /// discarding any of the subtree's animations. No-op for the body root
    /// or missing ids.
    pub fn remove(&mut self, id: ElementId) {
        if id == self.body || !self.nodes.contains_key(&id) {
            return;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                self.timeline.stop(current);
                stack.extend(node.children);
            }
        }
    }

    /// Whether the element's ancestor chain reaches the body root.
    pub fn is_connected(&self, id: ElementId) -> bool {
        self.contains(self.body, id)
    }

    /// Whether `id` is `ancestor` or lies in its subtree.
    pub fn contains(&self, ancestor: ElementId, id: ElementId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Parent of the element, if attached.
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    /// Children of the element, oldest first.
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Lowercased tag name.
    pub fn tag(&self, id: ElementId) -> Option<&str> {
        self.nodes.get(&id).map(|n| n.tag.as_str())
    }

    // --- Attributes ---

    /// Attribute value, if present.
    pub fn attr(&self, id: ElementId, name: &str) -> Option<&str> {
        self.nodes
            .get(&id)
            .and_then(|n| n.attrs.get(name))
            .map(String::as_str)
    }

    /// Set an attribute. No-op for missing ids.
    pub fn set_attr(&mut self, id: ElementId, name: &str, value: &str) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.attrs.insert(name.to_owned(), value.to_owned());
        }
    }

    /// Resolve an id selector (`"#dialog"` or a bare id value) against
    /// connected elements' `id` attributes.
    pub fn element_by_id(&self, selector: &str) -> Option<ElementId> {
        let wanted = selector.strip_prefix('#').unwrap_or(selector);
        if wanted.is_empty() {
            return None;
        }
        self.nodes
            .iter()
            .filter(|(id, node)| {
                node.attrs.get("id").is_some_and(|v| v == wanted) && self.is_connected(**id)
            })
            .map(|(id, _)| *id)
            .min()
    }

    // --- Style & geometry ---

    /// Inline style, if the element exists.
    pub fn style(&self, id: ElementId) -> Option<&InlineStyle> {
        self.nodes.get(&id).map(|n| &n.style)
    }

    /// Mutable inline style, if the element exists.
    pub fn style_mut(&mut self, id: ElementId) -> Option<&mut InlineStyle> {
        self.nodes.get_mut(&id).map(|n| &mut n.style)
    }

    /// Host-assigned rendered outer size.
    pub fn outer_size(&self, id: ElementId) -> Option<Size> {
        self.nodes.get(&id).map(|n| n.outer_size)
    }

    /// Assign the rendered outer size (the host performs layout, not this
    /// model). No-op for missing ids.
    pub fn set_outer_size(&mut self, id: ElementId, size: Size) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.outer_size = size;
        }
    }

    /// Current viewport.
    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Replace the viewport wholesale.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Resize the visible window, keeping the scroll offset.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport.width = width;
        self.viewport.height = height;
    }

    /// Set the vertical scroll offset.
    pub fn set_scroll_top(&mut self, scroll_top: f32) {
        self.viewport.scroll_top = scroll_top;
    }

    // --- Animation ---

    /// Schedule an animation. Tracks without an explicit start value capture
    /// the element's current style value; a missing target still completes
    /// on schedule so that chained callbacks keep running.
    pub fn animate(&mut self, spec: AnimationSpec) {
        let AnimationSpec {
            target,
            tracks,
            duration,
            easing,
            on_complete,
        } = spec;
        let resolved = tracks
            .into_iter()
            .map(|track| {
                let from = track
                    .from
                    .or_else(|| self.style(target).map(|s| read_prop(s, track.prop)))
                    .unwrap_or(track.to);
                ResolvedTrack {
                    prop: track.prop,
                    from,
                    to: track.to,
                }
            })
            .collect();
        self.timeline
            .schedule(target, resolved, duration, easing, on_complete);
    }

    /// Discard the element's in-flight animations without firing their
    /// completions.
    pub fn stop_animations(&mut self, id: ElementId) {
        self.timeline.stop(id);
    }

    /// Whether the element has an in-flight animation.
    pub fn is_animating(&self, id: ElementId) -> bool {
        self.timeline.is_animating(id)
    }

    /// Whether any animation is in flight.
    pub fn has_active_animations(&self) -> bool {
        !self.timeline.is_idle()
    }

    /// Step the timeline by `dt`, applying interpolated values to element
    /// styles. Returns the completion callbacks that came due; the caller
    /// runs them once it no longer borrows the document
    /// (see [`SharedDocument::advance`]).
    #[must_use]
    pub fn advance(&mut self, dt: Duration) -> Vec<Completion> {
        let (writes, completions) = self.timeline.advance(dt);
        for write in writes {
            if let Some(style) = self.style_mut(write.target) {
                write_prop(style, write.prop, write.value);
            }
        }
        completions
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("elements", &self.nodes.len())
            .field("viewport", &self.viewport)
            .field("timeline", &self.timeline)
            .finish()
    }
}

fn read_prop(style: &InlineStyle, prop: AnimatedProp) -> f32 {
    match prop {
        AnimatedProp::Opacity => style.opacity,
        AnimatedProp::MarginTop => style.margin_top,
    }
}

fn write_prop(style: &mut InlineStyle, prop: AnimatedProp, value: f32) {
    match prop {
        AnimatedProp::Opacity => style.opacity = value,
        AnimatedProp::MarginTop => style.margin_top = value,
    }
}

/// Shared single-threaded handle to a [`Document`].
///
/// Cloning is cheap (`Rc`). All access goes through [`Self::with`] /
/// [`Self::with_mut`]; holding the closure's borrow across a call that
/// re-enters the handle will panic, which is the standard `RefCell`
/// discipline of this crate.
#[derive(Clone)]
pub struct SharedDocument(Rc<RefCell<Document>>);

impl SharedDocument {
    /// Create a handle around a fresh document.
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(Document::new())))
    }

    /// Read access.
    pub fn with<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
        f(&self.0.borrow())
    }

    /// Write access.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }

    /// Step the timeline by `dt`, then run the completion callbacks that
    /// came due. The borrow is released first, so callbacks may re-enter
    /// the document and schedule follow-up animations.
    pub fn advance(&self, dt: Duration) {
        let completions = self.0.borrow_mut().advance(dt);
        for callback in completions {
            callback();
        }
    }

    /// Advance in fixed steps until the timeline is idle, including
    /// animations scheduled by completion callbacks along the way. Bounded,
    /// so a callback loop cannot hang the caller.
    pub fn drain(&self) {
        const STEP: Duration = Duration::from_millis(50);
        const MAX_STEPS: u32 = 10_000;
        for _ in 0..MAX_STEPS {
            if !self.0.borrow().has_active_animations() {
                break;
            }
            self.advance(STEP);
        }
    }
}

impl Default for SharedDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SharedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.borrow().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animate::{AnimatedProp, AnimationSpec};
    use std::cell::Cell;
    use std::rc::Rc;

    /// An id no document in the test holds.
    fn ghost_id() -> ElementId {
        let mut other = Document::new();
        for _ in 0..16 {
            other.create_element("div");
        }
        other.create_element("div")
    }

    #[test]
    fn body_is_connected_root() {
        let doc = Document::new();
        assert!(doc.is_connected(doc.body()));
        assert_eq!(doc.tag(doc.body()), Some("body"));
    }

    #[test]
    fn append_and_detach() {
        let mut doc = Document::new();
        let body = doc.body();
        let el = doc.create_element("DIV");
        assert_eq!(doc.tag(el), Some("div"));
        assert!(!doc.is_connected(el));

        doc.append(body, el);
        assert!(doc.is_connected(el));
        assert_eq!(doc.parent(el), Some(body));
        assert_eq!(doc.children(body), &[el]);

        doc.detach(el);
        assert!(!doc.is_connected(el));
        assert!(doc.children(body).is_empty());
        assert!(doc.style(el).is_some(), "detached element stays in arena");
    }

    #[test]
    fn append_reparents() {
        let mut doc = Document::new();
        let body = doc.body();
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        doc.append(body, a);
        doc.append(body, b);
        let child = doc.create_element("span");
        doc.append(a, child);
        doc.append(b, child);
        assert_eq!(doc.parent(child), Some(b));
        assert!(doc.children(a).is_empty());
    }

    #[test]
    fn append_rejects_cycles() {
        let mut doc = Document::new();
        let body = doc.body();
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        doc.append(body, a);
        doc.append(a, b);
        doc.append(b, a);
        assert_eq!(doc.parent(a), Some(body));
    }

    #[test]
    fn remove_drops_subtree_and_animations() {
        let mut doc = Document::new();
        let body = doc.body();
        let a = doc.create_element("div");
        let child = doc.create_element("span");
        doc.append(body, a);
        doc.append(a, child);
        doc.animate(
            AnimationSpec::new(child)
                .track(AnimatedProp::Opacity, 0.0)
                .duration(Duration::from_millis(100))
                .on_complete(|| panic!("removed element must not complete")),
        );

        doc.remove(a);
        assert!(doc.style(a).is_none());
        assert!(doc.style(child).is_none());
        let completions = doc.advance(Duration::from_millis(200));
        assert!(completions.is_empty());
    }

    #[test]
    fn body_cannot_be_removed() {
        let mut doc = Document::new();
        let body = doc.body();
        doc.remove(body);
        doc.detach(body);
        assert!(doc.is_connected(body));
    }

    #[test]
    fn missing_ids_degrade_silently() {
        let mut doc = Document::new();
        let ghost = ghost_id();
        assert!(doc.style(ghost).is_none());
        assert!(doc.outer_size(ghost).is_none());
        doc.set_attr(ghost, "id", "x");
        doc.set_outer_size(ghost, Size::new(1.0, 1.0));
        doc.stop_animations(ghost);
        doc.remove(ghost);
    }

    #[test]
    fn element_by_id_requires_connection() {
        let mut doc = Document::new();
        let body = doc.body();
        let el = doc.create_element("div");
        doc.set_attr(el, "id", "dialog");
        assert_eq!(doc.element_by_id("#dialog"), None);

        doc.append(body, el);
        assert_eq!(doc.element_by_id("#dialog"), Some(el));
        assert_eq!(doc.element_by_id("dialog"), Some(el));
        assert_eq!(doc.element_by_id("#missing"), None);
        assert_eq!(doc.element_by_id("#"), None);
    }

    #[test]
    fn animate_captures_current_value() {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        doc.style_mut(el).unwrap().opacity = 0.25;
        doc.animate(
            AnimationSpec::new(el)
                .track(AnimatedProp::Opacity, 1.0)
                .duration(Duration::from_millis(100)),
        );
        let _ = doc.advance(Duration::from_millis(50));
        let opacity = doc.style(el).unwrap().opacity;
        assert!(opacity > 0.25 && opacity < 1.0, "opacity was {opacity}");

        let _ = doc.advance(Duration::from_millis(50));
        assert_eq!(doc.style(el).unwrap().opacity, 1.0);
    }

    #[test]
    fn missing_animation_target_still_completes() {
        let mut doc = Document::new();
        let ghost = ghost_id();
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        doc.animate(
            AnimationSpec::new(ghost)
                .track(AnimatedProp::Opacity, 0.0)
                .duration(Duration::from_millis(10))
                .on_complete(move || flag.set(true)),
        );
        for callback in doc.advance(Duration::from_millis(20)) {
            callback();
        }
        assert!(fired.get());
    }

    #[test]
    fn shared_document_advance_runs_completions_outside_borrow() {
        let doc = SharedDocument::new();
        let el = doc.with_mut(|d| {
            let el = d.create_element("div");
            let body = d.body();
            d.append(body, el);
            el
        });
        let inner = doc.clone();
        doc.with_mut(|d| {
            d.animate(
                AnimationSpec::new(el)
                    .track(AnimatedProp::Opacity, 0.0)
                    .duration(Duration::from_millis(10))
                    // Re-entering the handle here would panic if the borrow
                    // were still held.
                    .on_complete(move || inner.with_mut(|d| d.remove(el))),
            );
        });
        doc.advance(Duration::from_millis(20));
        assert!(doc.with(|d| d.style(el).is_none()));
    }

    #[test]
    fn drain_settles_chained_animations() {
        let doc = SharedDocument::new();
        let el = doc.with_mut(|d| d.create_element("div"));
        let chained = doc.clone();
        doc.with_mut(|d| {
            d.animate(
                AnimationSpec::new(el)
                    .track(AnimatedProp::Opacity, 0.0)
                    .duration(Duration::from_millis(150))
                    .on_complete(move || {
                        chained.with_mut(|d| {
                            d.animate(
                                AnimationSpec::new(el)
                                    .track(AnimatedProp::Opacity, 1.0)
                                    .duration(Duration::from_millis(300)),
                            );
                        });
                    }),
            );
        });
        doc.drain();
        assert!(!doc.with(Document::has_active_animations));
        assert_eq!(doc.with(|d| d.style(el).unwrap().opacity), 1.0);
    }
}
