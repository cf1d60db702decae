//! DOM-style event registration and dispatch.
//!
//! A virtual canvas has no real DOM behind it, but renderer libraries still
//! call `addEventListener`/`dispatchEvent` on their target element (context
//! loss, pointer capture shims, resize observers). This module provides that
//! surface: an ordered per-kind listener registry with synchronous dispatch.

use serde_json::Value;
use std::collections::HashMap;
use std::rc::Rc;

/// A registered event callback.
///
/// Listeners are held behind `Rc` so removal can match by reference identity
/// (`Rc::ptr_eq`), mirroring DOM `removeEventListener` semantics. Callers
/// keep a clone of the handle they registered if they intend to remove it.
pub type Listener = Rc<dyn Fn(&Event)>;

/// Snapshot of the canvas an event was dispatched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventTarget {
    /// Unique id of the dispatching canvas.
    pub canvas_id: u64,
    /// Logical width of the canvas at dispatch time.
    pub width: u32,
    /// Logical height of the canvas at dispatch time.
    pub height: u32,
}

/// A synthetic DOM-style event.
#[derive(Debug, Clone)]
pub struct Event {
    /// Event type string, e.g. `"click"` or `"webglcontextlost"`.
    pub kind: String,
    /// Stamped by `dispatch_event` before listeners run; `None` until then.
    pub target: Option<EventTarget>,
    /// Optional payload, `CustomEvent.detail`-style.
    pub detail: Value,
}

impl Event {
    /// Create an event of the given type with no payload.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            target: None,
            detail: Value::Null,
        }
    }

    /// Attach a `detail` payload.
    #[must_use]
    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = detail;
        self
    }
}

/// Ordered listener lists keyed by event type.
#[derive(Default)]
pub struct EventRegistry {
    listeners: HashMap<String, Vec<Listener>>,
}

impl EventRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener for `kind`, preserving registration order.
    pub fn add(&mut self, kind: &str, listener: Listener) {
        self.listeners
            .entry(kind.to_string())
            .or_default()
            .push(listener);
    }

    /// Remove listeners for `kind`.
    ///
    /// With `Some(listener)`, removes every registration of that exact
    /// listener (reference identity). With `None`, clears all listeners for
    /// the kind.
    pub fn remove(&mut self, kind: &str, listener: Option<&Listener>) {
        match listener {
            Some(l) => {
                if let Some(list) = self.listeners.get_mut(kind) {
                    list.retain(|x| !Rc::ptr_eq(x, l));
                }
            }
            None => {
                self.listeners.remove(kind);
            }
        }
    }

    /// Invoke all listeners registered for `event.kind`, in registration
    /// order, and return how many ran.
    ///
    /// Dispatch iterates a snapshot of the list, so a listener cannot
    /// observe registrations made while the event is in flight.
    pub fn dispatch(&self, event: &Event) -> usize {
        let Some(list) = self.listeners.get(&event.kind) else {
            return 0;
        };
        let snapshot: Vec<Listener> = list.clone();
        for listener in &snapshot {
            listener(event);
        }
        snapshot.len()
    }

    /// Number of listeners currently registered for `kind`.
    pub fn count(&self, kind: &str) -> usize {
        self.listeners.get(kind).map_or(0, Vec::len)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn recording_listener(log: &Rc<RefCell<Vec<String>>>, tag: &str) -> Listener {
        let log = Rc::clone(log);
        let tag = tag.to_string();
        Rc::new(move |event: &Event| {
            log.borrow_mut().push(format!("{tag}:{}", event.kind));
        })
    }

    #[test]
    fn dispatch_runs_listeners_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = EventRegistry::new();
        registry.add("click", recording_listener(&log, "a"));
        registry.add("click", recording_listener(&log, "b"));

        let ran = registry.dispatch(&Event::new("click"));

        assert_eq!(ran, 2);
        assert_eq!(*log.borrow(), vec!["a:click", "b:click"]);
    }

    #[test]
    fn dispatch_without_listeners_is_a_no_op() {
        let registry = EventRegistry::new();
        assert_eq!(registry.dispatch(&Event::new("click")), 0);
    }

    #[test]
    fn remove_by_reference_only_drops_that_listener() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = EventRegistry::new();
        let first = recording_listener(&log, "a");
        registry.add("click", Rc::clone(&first));
        registry.add("click", recording_listener(&log, "b"));

        registry.remove("click", Some(&first));
        registry.dispatch(&Event::new("click"));

        assert_eq!(*log.borrow(), vec!["b:click"]);
        assert_eq!(registry.count("click"), 1);
    }

    #[test]
    fn remove_without_reference_clears_the_kind() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = EventRegistry::new();
        registry.add("click", recording_listener(&log, "a"));
        registry.add("click", recording_listener(&log, "b"));
        registry.add("resize", recording_listener(&log, "c"));

        registry.remove("click", None);

        assert_eq!(registry.count("click"), 0);
        assert_eq!(registry.count("resize"), 1);
    }

    #[test]
    fn detail_payload_reaches_listeners() {
        let seen = Rc::new(RefCell::new(Value::Null));
        let seen_clone = Rc::clone(&seen);
        let mut registry = EventRegistry::new();
        registry.add(
            "message",
            Rc::new(move |event: &Event| {
                *seen_clone.borrow_mut() = event.detail.clone();
            }),
        );

        let detail = serde_json::json!({ "button": 0 });
        registry.dispatch(&Event::new("message").with_detail(detail.clone()));

        assert_eq!(*seen.borrow(), detail);
    }
}
