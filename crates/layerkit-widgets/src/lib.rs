#![forbid(unsafe_code)]

//! Modal layer widget for the LayerKit host model.
//!
//! A [`Layer`] binds to one host element and manages its visibility: an
//! entrance/exit transition on the element, an optional dimming backdrop,
//! viewport-centered positioning (scroll-following when the element is
//! taller than the viewport), and dismissal via the escape key, backdrop
//! clicks, or `data-dismiss="layer"` descendants.
//!
//! [`LayerManager`] caches one instance per element, merges configuration
//! from markup and call sites, dispatches named methods through the closed
//! [`LayerMethod`] enum, and fans document input out to shown instances,
//! including the `data-toggle="layer"` declarative trigger binding.
//!
//! # Example
//!
//! ```
//! use layerkit_host::{SharedDocument, Size};
//! use layerkit_widgets::{LayerManager, OptionsPatch};
//!
//! let doc = SharedDocument::new();
//! let dialog = doc.with_mut(|d| {
//!     let dialog = d.create_element("div");
//!     let body = d.body();
//!     d.append(body, dialog);
//!     d.set_outer_size(dialog, Size::new(400.0, 300.0));
//!     dialog
//! });
//!
//! let mut manager = LayerManager::new(doc.clone());
//! manager.apply(dialog, OptionsPatch::new(), None);
//! doc.drain();
//! assert!(manager.get(dialog).unwrap().is_shown());
//! ```

pub mod adapter;
pub mod event;
pub mod layer;
pub mod options;
pub mod trigger;

pub use adapter::{AdapterError, LayerManager, LayerMethod};
pub use event::{LayerEvent, LayerEventKind, Subscription};
pub use layer::{
    BACKDROP_TRANSITION_DURATION, DISMISS_ATTR, DISMISS_VALUE, Layer, TRANSITION_DURATION,
};
pub use options::{BackdropMode, LayerOptions, OptionsPatch};
pub use trigger::{TARGET_ATTR, TOGGLE_ATTR, TOGGLE_VALUE};
