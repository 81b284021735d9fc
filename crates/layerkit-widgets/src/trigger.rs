#![forbid(unsafe_code)]

//! Declarative trigger binding.
//!
//! Elements marked with `data-toggle="layer"` open and close a layer
//! declared elsewhere in the document: the trigger's `data-target`
//! attribute names the layer element by id selector. The host forwards
//! document clicks to [`crate::LayerManager::dispatch_click`], which calls
//! [`handle_toggle_click`] for anything no shown layer claimed.
//!
//! Matching is delegated: the click target or any of its ancestors may be
//! the marked trigger. Link triggers (`a` / `area`) get their default
//! navigation suppressed. A marked trigger whose target selector resolves
//! to nothing claims the click but does nothing else.

use tracing::debug;

use layerkit_host::{ClickEvent, Document, ElementId};

use crate::adapter::LayerManager;
use crate::options::OptionsPatch;

/// Markup attribute marking a trigger element.
pub const TOGGLE_ATTR: &str = "data-toggle";
/// Expected value of [`TOGGLE_ATTR`].
pub const TOGGLE_VALUE: &str = "layer";
/// Markup attribute on a trigger naming its target layer element.
pub const TARGET_ATTR: &str = "data-target";

/// Handle a document click against the toggle markup contract. Returns
/// whether a trigger claimed the event.
///
/// First activation creates the target's instance with
/// defaults ← target markup ← trigger markup (the trigger's declarations
/// win) and shows it per the resolved `show` flag; later activations
/// toggle the cached instance, carrying the trigger as related target.
pub fn handle_toggle_click(manager: &mut LayerManager, event: &mut ClickEvent) -> bool {
    let doc = manager.document().clone();
    let Some(trigger) = doc.with(|d| find_trigger(d, event.target)) else {
        return false;
    };

    if doc.with(|d| matches!(d.tag(trigger), Some("a" | "area"))) {
        event.prevent_default();
    }

    let target = doc.with(|d| {
        d.attr(trigger, TARGET_ATTR)
            .and_then(|selector| d.element_by_id(selector))
    });
    let Some(target) = target else {
        return true;
    };

    if manager.contains(target) {
        debug!(
            trigger = trigger.id(),
            target = target.id(),
            "toggling layer from trigger"
        );
        manager.layer(target).toggle(Some(trigger));
    } else {
        let patch = doc.with(|d| {
            let mut patch = OptionsPatch::from_markup(d, target);
            patch.merge(OptionsPatch::from_markup(d, trigger));
            patch
        });
        manager.apply(target, patch, Some(trigger));
    }
    true
}

fn find_trigger(doc: &Document, from: ElementId) -> Option<ElementId> {
    let mut current = Some(from);
    while let Some(id) = current {
        if doc.attr(id, TOGGLE_ATTR) == Some(TOGGLE_VALUE) {
            return Some(id);
        }
        current = doc.parent(id);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::LayerEventKind;
    use crate::options::{BACKDROP_ATTR, BackdropMode, OPACITY_ATTR, SHOW_ATTR};
    use layerkit_host::{SharedDocument, Size, Viewport};
    use std::cell::Cell;
    use std::rc::Rc;

    struct Fixture {
        doc: SharedDocument,
        manager: LayerManager,
        dialog: ElementId,
        trigger: ElementId,
    }

    fn fixture(trigger_tag: &str) -> Fixture {
        let doc = SharedDocument::new();
        let (dialog, trigger) = doc.with_mut(|d| {
            d.set_viewport(Viewport::new(1000.0, 800.0));
            let body = d.body();

            let dialog = d.create_element("div");
            d.set_attr(dialog, "id", "dialog");
            d.set_outer_size(dialog, Size::new(400.0, 300.0));
            d.append(body, dialog);

            let trigger = d.create_element(trigger_tag);
            d.set_attr(trigger, TOGGLE_ATTR, TOGGLE_VALUE);
            d.set_attr(trigger, TARGET_ATTR, "#dialog");
            d.append(body, trigger);

            (dialog, trigger)
        });
        let manager = LayerManager::new(doc.clone());
        Fixture {
            doc,
            manager,
            dialog,
            trigger,
        }
    }

    #[test]
    fn first_click_creates_and_shows() {
        let mut fx = fixture("button");
        let mut click = ClickEvent::new(fx.trigger);
        assert!(fx.manager.dispatch_click(&mut click));
        fx.doc.drain();

        let layer = fx.manager.get(fx.dialog).expect("instance created");
        assert!(layer.is_shown());
        assert!(!click.default_prevented(), "buttons keep their default");
    }

    #[test]
    fn second_click_toggles_hidden() {
        let mut fx = fixture("button");
        let mut click = ClickEvent::new(fx.trigger);
        fx.manager.dispatch_click(&mut click);
        fx.doc.drain();

        let mut click = ClickEvent::new(fx.trigger);
        fx.manager.dispatch_click(&mut click);
        fx.doc.drain();
        assert!(!fx.manager.get(fx.dialog).unwrap().is_shown());
    }

    #[test]
    fn link_trigger_suppresses_navigation() {
        let mut fx = fixture("a");
        let mut click = ClickEvent::new(fx.trigger);
        assert!(fx.manager.dispatch_click(&mut click));
        assert!(click.default_prevented());
    }

    #[test]
    fn click_inside_trigger_resolves_via_ancestors() {
        let mut fx = fixture("button");
        let icon = fx.doc.with_mut(|d| {
            let icon = d.create_element("span");
            d.append(fx.trigger, icon);
            icon
        });

        let mut click = ClickEvent::new(icon);
        assert!(fx.manager.dispatch_click(&mut click));
        fx.doc.drain();
        assert!(fx.manager.get(fx.dialog).unwrap().is_shown());
    }

    #[test]
    fn related_target_is_the_trigger() {
        let mut fx = fixture("button");
        let related: Rc<Cell<Option<ElementId>>> = Rc::new(Cell::new(None));
        let seen = related.clone();

        let layer = fx.manager.layer(fx.dialog);
        let _sub = layer.on(move |ev| {
            if ev.kind() == LayerEventKind::Show {
                seen.set(ev.related_target());
            }
        });

        let mut click = ClickEvent::new(fx.trigger);
        fx.manager.dispatch_click(&mut click);
        fx.doc.drain();
        assert_eq!(related.get(), Some(fx.trigger));
    }

    #[test]
    fn missing_target_is_claimed_but_inert() {
        let mut fx = fixture("button");
        fx.doc
            .with_mut(|d| d.set_attr(fx.trigger, TARGET_ATTR, "#nowhere"));

        let mut click = ClickEvent::new(fx.trigger);
        assert!(fx.manager.dispatch_click(&mut click));
        fx.doc.drain();
        assert!(fx.manager.is_empty());
    }

    #[test]
    fn unmarked_click_is_not_claimed() {
        let mut fx = fixture("button");
        let plain = fx.doc.with_mut(|d| {
            let plain = d.create_element("div");
            let body = d.body();
            d.append(body, plain);
            plain
        });
        let mut click = ClickEvent::new(plain);
        assert!(!fx.manager.dispatch_click(&mut click));
        assert!(fx.manager.is_empty());
    }

    #[test]
    fn trigger_markup_overrides_target_markup() {
        let mut fx = fixture("button");
        fx.doc.with_mut(|d| {
            d.set_attr(fx.dialog, OPACITY_ATTR, "0.3");
            d.set_attr(fx.trigger, OPACITY_ATTR, "0.7");
            d.set_attr(fx.trigger, BACKDROP_ATTR, "lock");
        });

        let mut click = ClickEvent::new(fx.trigger);
        fx.manager.dispatch_click(&mut click);
        fx.doc.drain();

        let options = fx.manager.get(fx.dialog).unwrap().options();
        assert_eq!(options.opacity, 0.7);
        assert_eq!(options.backdrop, BackdropMode::Lock);
    }

    #[test]
    fn target_show_false_creates_without_showing() {
        let mut fx = fixture("button");
        fx.doc
            .with_mut(|d| d.set_attr(fx.dialog, SHOW_ATTR, "false"));

        let mut click = ClickEvent::new(fx.trigger);
        assert!(fx.manager.dispatch_click(&mut click));
        fx.doc.drain();

        let layer = fx.manager.get(fx.dialog).expect("instance created");
        assert!(!layer.is_shown());
    }
}
