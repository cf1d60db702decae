//! DOM-style event semantics on the canvas: registration order, target
//! stamping, and the two removal modes.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use std::cell::RefCell;
use std::rc::Rc;
use vcanvas::{create_canvas, Event, Listener};

fn tagging_listener(log: &Rc<RefCell<Vec<&'static str>>>, tag: &'static str) -> Listener {
    let log = Rc::clone(log);
    Rc::new(move |_event: &Event| log.borrow_mut().push(tag))
}

#[test]
fn both_listeners_fire_with_the_canvas_as_target() {
    let mut canvas = create_canvas(320, 240);
    let targets = Rc::new(RefCell::new(Vec::new()));

    for _ in 0..2 {
        let targets = Rc::clone(&targets);
        canvas.add_event_listener(
            "click",
            Rc::new(move |event: &Event| {
                targets.borrow_mut().push(event.target);
            }),
        );
    }

    let handled = canvas.dispatch_event(Event::new("click"));
    assert!(handled);

    let seen = targets.borrow();
    assert_eq!(seen.len(), 2);
    for target in seen.iter() {
        let target = target.expect("dispatch must stamp the target");
        assert_eq!(target.canvas_id, canvas.id());
        assert_eq!((target.width, target.height), (320, 240));
    }
}

#[test]
fn order_is_registration_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut canvas = create_canvas(8, 8);
    canvas.add_event_listener("click", tagging_listener(&log, "first"));
    canvas.add_event_listener("click", tagging_listener(&log, "second"));
    canvas.add_event_listener("click", tagging_listener(&log, "third"));

    canvas.dispatch_event(Event::new("click"));

    assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
}

#[test]
fn dispatch_only_reaches_listeners_of_the_event_kind() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut canvas = create_canvas(8, 8);
    canvas.add_event_listener("click", tagging_listener(&log, "click"));
    canvas.add_event_listener("resize", tagging_listener(&log, "resize"));

    let handled = canvas.dispatch_event(Event::new("resize"));

    assert!(handled);
    assert_eq!(*log.borrow(), vec!["resize"]);
}

#[test]
fn dispatch_with_no_listeners_reports_unhandled() {
    let canvas = create_canvas(8, 8);
    assert!(!canvas.dispatch_event(Event::new("click")));
}

#[test]
fn removal_by_reference_stops_future_invocations() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut canvas = create_canvas(8, 8);
    let removable = tagging_listener(&log, "removable");
    canvas.add_event_listener("click", Rc::clone(&removable));
    canvas.add_event_listener("click", tagging_listener(&log, "stays"));

    canvas.dispatch_event(Event::new("click"));
    canvas.remove_event_listener("click", Some(&removable));
    canvas.dispatch_event(Event::new("click"));

    assert_eq!(*log.borrow(), vec!["removable", "stays", "stays"]);
}

#[test]
fn removal_without_reference_clears_the_kind() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut canvas = create_canvas(8, 8);
    canvas.add_event_listener("click", tagging_listener(&log, "a"));
    canvas.add_event_listener("click", tagging_listener(&log, "b"));
    canvas.add_event_listener("resize", tagging_listener(&log, "c"));

    canvas.remove_event_listener("click", None);

    assert!(!canvas.dispatch_event(Event::new("click")));
    assert!(canvas.dispatch_event(Event::new("resize")));
    assert_eq!(*log.borrow(), vec!["c"]);
}

#[test]
fn detail_payload_is_forwarded() {
    let seen = Rc::new(RefCell::new(serde_json::Value::Null));
    let mut canvas = create_canvas(8, 8);
    {
        let seen = Rc::clone(&seen);
        canvas.add_event_listener(
            "wheel",
            Rc::new(move |event: &Event| {
                *seen.borrow_mut() = event.detail.clone();
            }),
        );
    }

    let detail = serde_json::json!({ "deltaY": -120 });
    canvas.dispatch_event(Event::new("wheel").with_detail(detail.clone()));

    assert_eq!(*seen.borrow(), detail);
}
