//! Registration handles and ordered callback lists.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Handle returned by every registration API.
///
/// Dropping the handle keeps the registration alive; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
pub struct Subscription {
    remove: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Creates a handle that runs `remove` when unsubscribed.
    pub fn new(remove: impl FnOnce() + 'static) -> Self {
        Self {
            remove: Some(Box::new(remove)),
        }
    }

    /// Creates a handle with nothing to remove.
    pub fn noop() -> Self {
        Self { remove: None }
    }

    /// Removes the registration.
    pub fn unsubscribe(mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.remove.is_some())
            .finish()
    }
}

/// An ordered list of callbacks addressable by id.
pub(crate) struct Registry<T> {
    entries: RefCell<Vec<(u64, T)>>,
    next_id: Cell<u64>,
}

impl<T: Clone> Registry<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    /// Appends an entry and returns its id.
    pub(crate) fn add(&self, entry: T) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.entries.borrow_mut().push((id, entry));
        id
    }

    pub(crate) fn remove(&self, id: u64) {
        self.entries.borrow_mut().retain(|(entry_id, _)| *entry_id != id);
    }

    /// Copies the current entries so callbacks may register or unregister
    /// while the list is being walked.
    pub(crate) fn snapshot(&self) -> Vec<T> {
        self.entries
            .borrow()
            .iter()
            .map(|(_, entry)| entry.clone())
            .collect()
    }
}

/// Adds `entry` to a shared registry and returns a handle that removes it.
///
/// The handle holds the registry weakly, so it never keeps its owner alive.
pub(crate) fn subscribe<T: Clone + 'static>(registry: &Rc<Registry<T>>, entry: T) -> Subscription {
    let id = registry.add(entry);
    let registry = Rc::downgrade(registry);
    Subscription::new(move || {
        if let Some(registry) = registry.upgrade() {
            registry.remove(id);
        }
    })
}
