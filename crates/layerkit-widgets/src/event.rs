#![forbid(unsafe_code)]

//! Layer lifecycle notifications.
//!
//! A layer emits four notifications: `show` and `hide` before the
//! respective transition (cancelable), `shown` and `hidden` once the
//! element is visible / the exit transition has finished (not cancelable).
//!
//! Listeners are registered with [`crate::Layer::on`], which returns an
//! RAII [`Subscription`]; dropping it detaches the listener. Dispatch runs
//! over a snapshot of the listener list in registration order, so a
//! listener may re-enter the layer, register further listeners, or drop
//! its own subscription while being invoked.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use layerkit_host::ElementId;

/// The four lifecycle notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerEventKind {
    /// About to show; cancelable.
    Show,
    /// Element made visible, entrance transition starting.
    Shown,
    /// About to hide; cancelable.
    Hide,
    /// Exit transition finished, element hidden.
    Hidden,
}

impl LayerEventKind {
    /// Whether listeners may cancel the transition.
    pub const fn is_cancelable(self) -> bool {
        matches!(self, Self::Show | Self::Hide)
    }

    /// Notification name, as it appears in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Show => "show",
            Self::Shown => "shown",
            Self::Hide => "hide",
            Self::Hidden => "hidden",
        }
    }
}

/// A notification being dispatched to listeners.
#[derive(Debug)]
pub struct LayerEvent {
    kind: LayerEventKind,
    related_target: Option<ElementId>,
    default_prevented: bool,
}

impl LayerEvent {
    pub(crate) fn new(kind: LayerEventKind, related_target: Option<ElementId>) -> Self {
        Self {
            kind,
            related_target,
            default_prevented: false,
        }
    }

    /// Which notification this is.
    pub fn kind(&self) -> LayerEventKind {
        self.kind
    }

    /// The trigger element that initiated the transition, when known.
    pub fn related_target(&self) -> Option<ElementId> {
        self.related_target
    }

    /// Cancel the transition. Ignored for non-cancelable notifications.
    pub fn prevent_default(&mut self) {
        if self.kind.is_cancelable() {
            self.default_prevented = true;
        }
    }

    /// Whether a listener canceled the transition.
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

type Listener = Rc<dyn Fn(&mut LayerEvent)>;

struct ListenerList {
    entries: Vec<(u64, Listener)>,
    next_id: u64,
}

/// Per-layer listener registry.
#[derive(Clone)]
pub(crate) struct Listeners(Rc<RefCell<ListenerList>>);

impl Listeners {
    pub(crate) fn new() -> Self {
        Self(Rc::new(RefCell::new(ListenerList {
            entries: Vec::new(),
            next_id: 1,
        })))
    }

    pub(crate) fn subscribe(&self, listener: impl Fn(&mut LayerEvent) + 'static) -> Subscription {
        let mut list = self.0.borrow_mut();
        let id = list.next_id;
        list.next_id += 1;
        list.entries.push((id, Rc::new(listener)));
        Subscription {
            list: Rc::downgrade(&self.0),
            id,
        }
    }

    /// Clone out the current listeners so dispatch holds no borrow.
    pub(crate) fn snapshot(&self) -> Vec<Listener> {
        self.0
            .borrow()
            .entries
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect()
    }
}

/// RAII listener handle; dropping it detaches the listener.
///
/// Detaching through a handle affects exactly one registration; it can
/// never unhook another listener, or anything registered on another layer.
#[must_use = "dropping a Subscription immediately detaches its listener"]
pub struct Subscription {
    list: Weak<RefCell<ListenerList>>,
    id: u64,
}

impl Subscription {
    /// Detach now. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(list) = self.list.upgrade() {
            list.borrow_mut().entries.retain(|(id, _)| *id != self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
