/// Storage change notifications
///
/// Imported share data must show up in every open view. Views subscribe to
/// the bus and re-read storage when a change names one of their keys.
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub struct StorageChanged {
    /// Storage keys that were overwritten
    pub keys: Vec<String>,
    /// Kind tag of the share payload that caused the change
    pub source_kind: String,
}

impl StorageChanged {
    pub fn touches(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }
}

type Listener = Rc<dyn Fn(&StorageChanged)>;

/// Single-threaded publish/subscribe bus; clones share the same listeners
#[derive(Clone, Default)]
pub struct ChangeBus {
    listeners: Rc<RefCell<Vec<(usize, Listener)>>>,
    next_id: Rc<Cell<usize>>,
}

/// Handle returned by [`ChangeBus::subscribe`]; dropping it does not unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(usize);

impl ChangeBus {
    pub fn new() -> Self {
        ChangeBus::default()
    }

    pub fn subscribe(&self, listener: impl Fn(&StorageChanged) + 'static) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let listener: Listener = Rc::new(listener);
        self.listeners.borrow_mut().push((id, listener));
        Subscription(id)
    }

    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let original_len = listeners.len();
        listeners.retain(|(id, _)| *id != subscription.0);
        listeners.len() < original_len
    }

    pub fn publish(&self, change: &StorageChanged) {
        // Snapshot so listeners may subscribe or unsubscribe while being notified
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        log::debug!("Notifying {} listener(s) of {:?}", listeners.len(), change.keys);
        for listener in listeners {
            listener(change);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}
