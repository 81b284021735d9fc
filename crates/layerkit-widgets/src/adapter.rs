#![forbid(unsafe_code)]

//! Instance registry and input fan-out.
//!
//! [`LayerManager`] is the plugin surface of the crate: it resolves one
//! cached [`Layer`] per element, merges configuration
//! (defaults ← markup ← call site), and dispatches named methods through
//! the closed [`LayerMethod`] enum.
//!
//! It is also the process-wide input dispatcher. Instead of each instance
//! hooking global key/resize listeners, the host forwards input here once
//! and the manager fans it out to whichever registered instances are
//! currently shown. One instance hiding can therefore never detach
//! another's handling.
//!
//! Registry entries are created on first use and never torn down; retention
//! is scoped to the page session, the same lifetime as the elements
//! themselves.

use ahash::AHashMap;

use layerkit_host::{ClickEvent, ElementId, KeyEvent, SharedDocument};

use crate::layer::Layer;
use crate::options::OptionsPatch;
use crate::trigger;

/// The closed set of externally invokable layer methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerMethod {
    Show,
    Hide,
    Toggle,
    HandleUpdate,
}

impl LayerMethod {
    /// The wire name accepted by [`LayerManager::apply_method`].
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Show => "show",
            Self::Hide => "hide",
            Self::Toggle => "toggle",
            Self::HandleUpdate => "handleUpdate",
        }
    }
}

impl std::str::FromStr for LayerMethod {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "show" => Ok(Self::Show),
            "hide" => Ok(Self::Hide),
            "toggle" => Ok(Self::Toggle),
            "handleUpdate" => Ok(Self::HandleUpdate),
            other => Err(AdapterError::InvalidMethodName(other.to_owned())),
        }
    }
}

/// Errors surfaced by the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// A method string named none of the [`LayerMethod`] variants.
    InvalidMethodName(String),
}

impl std::fmt::Display for AdapterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMethodName(name) => write!(f, "no method named {name:?}"),
        }
    }
}

impl std::error::Error for AdapterError {}

/// Registry of layer instances plus input fan-out.
pub struct LayerManager {
    doc: SharedDocument,
    layers: AHashMap<ElementId, Layer>,
}

impl LayerManager {
    /// Create a manager over the given document.
    pub fn new(doc: SharedDocument) -> Self {
        Self {
            doc,
            layers: AHashMap::new(),
        }
    }

    /// The document handle this manager dispatches against.
    pub fn document(&self) -> &SharedDocument {
        &self.doc
    }

    /// Registered instance for the element, if one exists.
    pub fn get(&self, element: ElementId) -> Option<&Layer> {
        self.layers.get(&element)
    }

    /// Whether the element already has a registered instance.
    pub fn contains(&self, element: ElementId) -> bool {
        self.layers.contains_key(&element)
    }

    /// Number of registered instances.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether no instances are registered.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Resolve the element's instance, creating it on first use with
    /// defaults ← markup-declared options.
    pub fn layer(&mut self, element: ElementId) -> Layer {
        if let Some(layer) = self.layers.get(&element) {
            return layer.clone();
        }
        let options = self
            .doc
            .with(|d| OptionsPatch::from_markup(d, element))
            .resolve();
        let layer = Layer::new(self.doc.clone(), element, options);
        self.layers.insert(element, layer.clone());
        layer
    }

    /// Configuration entry point: resolve-or-create the instance with
    /// defaults ← markup ← `patch`, then show it when the freshly resolved
    /// `show` flag is set.
    ///
    /// An existing instance keeps the options it was constructed with; only
    /// the resolved `show` flag of this call is honored.
    pub fn apply(
        &mut self,
        element: ElementId,
        patch: OptionsPatch,
        related_target: Option<ElementId>,
    ) {
        let mut resolved_patch = self.doc.with(|d| OptionsPatch::from_markup(d, element));
        resolved_patch.merge(patch);
        let resolved = resolved_patch.resolve();

        let layer = match self.layers.get(&element) {
            Some(layer) => layer.clone(),
            None => {
                let layer = Layer::new(self.doc.clone(), element, resolved);
                self.layers.insert(element, layer.clone());
                layer
            }
        };
        if resolved.show {
            layer.show(related_target);
        }
    }

    /// Invoke a method on the element's instance (creating it on first
    /// use), dispatching through the closed enum.
    pub fn invoke(
        &mut self,
        element: ElementId,
        method: LayerMethod,
        related_target: Option<ElementId>,
    ) {
        let layer = self.layer(element);
        match method {
            LayerMethod::Show => layer.show(related_target),
            LayerMethod::Hide => layer.hide(),
            LayerMethod::Toggle => layer.toggle(related_target),
            LayerMethod::HandleUpdate => layer.handle_update(),
        }
    }

    /// String entry point for hosts carrying method names in markup or
    /// scripts. Unknown names fail synchronously without touching any
    /// instance state.
    pub fn apply_method(
        &mut self,
        element: ElementId,
        name: &str,
        related_target: Option<ElementId>,
    ) -> Result<(), AdapterError> {
        let method: LayerMethod = name.parse()?;
        self.invoke(element, method, related_target);
        Ok(())
    }

    /// Fan a key event out to shown instances. Returns whether any layer
    /// consumed it.
    pub fn dispatch_key(&mut self, event: &mut KeyEvent) -> bool {
        let mut handled = false;
        for layer in self.layers.values() {
            handled |= layer.handle_key(event);
        }
        handled
    }

    /// Reposition every shown instance after a viewport change.
    pub fn dispatch_resize(&mut self) {
        for layer in self.layers.values() {
            layer.handle_resize();
        }
    }

    /// Route a click: backdrop and dismiss-marker handling for shown
    /// instances first, then the declarative trigger binding. Returns
    /// whether anything claimed the event.
    pub fn dispatch_click(&mut self, event: &mut ClickEvent) -> bool {
        for layer in self.layers.values() {
            if layer.handle_click(event) {
                return true;
            }
        }
        trigger::handle_toggle_click(self, event)
    }
}

impl std::fmt::Debug for LayerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerManager")
            .field("layers", &self.layers.len())
            .finish()
    }
}
