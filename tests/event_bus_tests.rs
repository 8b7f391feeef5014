use std::cell::RefCell;
use std::rc::Rc;

use scene_gallery::events::{BusError, EventBus, EventKind, SceneEvent};

fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&str) -> Box<dyn Fn(&SceneEvent) -> anyhow::Result<()>>) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let make = move |tag: &str| {
        let sink = Rc::clone(&sink);
        let tag = tag.to_string();
        Box::new(move |event: &SceneEvent| {
            sink.borrow_mut().push(format!("{}:{:?}", tag, event));
            Ok(())
        }) as Box<dyn Fn(&SceneEvent) -> anyhow::Result<()>>
    };
    (log, make)
}

// ============================================================================
// Delivery
// ============================================================================

#[test]
fn test_publish_without_subscribers_is_ok() {
    let bus = EventBus::new();
    assert!(bus.publish(&SceneEvent::InspectorToggle).is_ok());
    assert!(bus.publish(&SceneEvent::SceneChanged("sphere".into())).is_ok());
}

#[test]
fn test_handlers_run_in_subscription_order() {
    let bus = EventBus::new();
    let (log, make) = recorder();

    bus.subscribe(EventKind::SceneChanged, make("a"));
    bus.subscribe(EventKind::SceneChanged, make("b"));
    bus.subscribe(EventKind::SceneChanged, make("c"));

    bus.publish(&SceneEvent::SceneChanged("x".into())).unwrap();
    bus.publish(&SceneEvent::SceneChanged("y".into())).unwrap();

    let names: Vec<String> = log.borrow().iter().map(|entry| entry[..1].to_string()).collect();
    assert_eq!(names, ["a", "b", "c", "a", "b", "c"]);
}

#[test]
fn test_events_only_reach_their_kind() {
    let bus = EventBus::new();
    let (log, make) = recorder();
    bus.subscribe(EventKind::InspectorToggle, make("toggle"));

    bus.publish(&SceneEvent::SceneChanged("default".into())).unwrap();
    assert!(log.borrow().is_empty());

    bus.publish(&SceneEvent::InspectorToggle).unwrap();
    assert_eq!(log.borrow().len(), 1);
}

// ============================================================================
// Unsubscribe
// ============================================================================

#[test]
fn test_unsubscribed_handler_is_not_called() {
    let bus = EventBus::new();
    let (log, make) = recorder();

    let a = bus.subscribe(EventKind::SceneChanged, make("a"));
    bus.subscribe(EventKind::SceneChanged, make("b"));
    bus.unsubscribe(EventKind::SceneChanged, a);

    bus.publish(&SceneEvent::SceneChanged("x".into())).unwrap();
    assert_eq!(log.borrow().len(), 1);
    assert!(log.borrow()[0].starts_with('b'));
}

#[test]
fn test_unsubscribe_unknown_pair_is_noop() {
    let bus = EventBus::new();
    let id = bus.subscribe(EventKind::SceneChanged, |_| Ok(()));

    // Right id, wrong kind
    bus.unsubscribe(EventKind::InspectorToggle, id);
    assert_eq!(bus.subscriber_count(EventKind::SceneChanged), 1);

    bus.unsubscribe(EventKind::SceneChanged, id);
    bus.unsubscribe(EventKind::SceneChanged, id);
    assert!(!bus.is_registered(EventKind::SceneChanged));
}

#[test]
fn test_handler_may_unsubscribe_itself_while_dispatching() {
    let bus = Rc::new(EventBus::new());
    let calls = Rc::new(RefCell::new(0));
    let slot = Rc::new(RefCell::new(None));

    let weak_bus = Rc::downgrade(&bus);
    let counter = Rc::clone(&calls);
    let own_id = Rc::clone(&slot);
    let id = bus.subscribe(EventKind::InspectorToggle, move |_| {
        *counter.borrow_mut() += 1;
        if let (Some(bus), Some(id)) = (weak_bus.upgrade(), *own_id.borrow()) {
            bus.unsubscribe(EventKind::InspectorToggle, id);
        }
        Ok(())
    });
    *slot.borrow_mut() = Some(id);

    bus.publish(&SceneEvent::InspectorToggle).unwrap();
    bus.publish(&SceneEvent::InspectorToggle).unwrap();
    assert_eq!(*calls.borrow(), 1);
}

// ============================================================================
// Failure isolation
// ============================================================================

#[test]
fn test_failing_handler_does_not_block_others() {
    let bus = EventBus::new();
    let (log, make) = recorder();

    bus.subscribe(EventKind::SceneChanged, |_| anyhow::bail!("boom"));
    bus.subscribe(EventKind::SceneChanged, make("after"));

    let err = bus.publish(&SceneEvent::SceneChanged("x".into())).unwrap_err();
    assert_eq!(log.borrow().len(), 1, "later handler still ran");

    let BusError::HandlerFailed { kind, total, failures } = err;
    assert_eq!(kind, EventKind::SceneChanged);
    assert_eq!(total, 2);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].to_string(), "boom");
}
