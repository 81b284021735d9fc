#![forbid(unsafe_code)]

//! Host substrate for LayerKit.
//!
//! The layer widget is a thin state machine over a host environment: a
//! document of styled elements, an input event stream, and an animation
//! facility it delegates transitions to. This crate provides that seam:
//!
//! - [`dom`]: an element arena with attributes, typed inline styles, and
//!   parent/child structure, rooted at a `body` element.
//! - [`event`]: keyboard and pointer input with cancelable default actions.
//! - [`animate`]: a property timeline; animations are scheduled against
//!   elements and stepped explicitly with [`dom::Document::advance`].
//! - [`clock`]: a frame clock for hosts that drive the timeline in real time.
//!
//! Everything is single-threaded and cooperative. The shared handle,
//! [`dom::SharedDocument`], uses `Rc<RefCell<..>>` ownership; animation
//! completion callbacks are run only after the document borrow has been
//! released, so they may freely re-enter the document.

pub mod animate;
pub mod clock;
pub mod dom;
pub mod event;
pub mod geometry;

pub use animate::{AnimatedProp, AnimationSpec, Easing, Track};
pub use clock::FrameClock;
pub use dom::{CssPosition, Display, Document, ElementId, InlineStyle, SharedDocument};
pub use event::{ClickEvent, KeyCode, KeyEvent, KeyEventKind, Modifiers, PointerButton};
pub use geometry::{Size, Viewport};
