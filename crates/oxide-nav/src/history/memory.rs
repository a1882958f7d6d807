//! In-memory history.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::Value;

use super::{HistoryListener, NavigationDirection, NavigationInfo, RouterHistory};
use crate::subscription::{subscribe, Registry, Subscription};

/// A history stack kept in memory, with tab-like semantics: pushing discards
/// every entry after the cursor.
///
/// ```
/// use oxide_nav::history::{MemoryHistory, RouterHistory};
///
/// let history = MemoryHistory::new();
/// history.push("/a", None).unwrap();
/// history.push("/b", None).unwrap();
/// history.go(-1);
/// assert_eq!(history.location(), "/a");
/// history.push("/c", None).unwrap();
/// assert_eq!(history.entries(), ["/", "/a", "/c"]);
/// ```
pub struct MemoryHistory {
    base: String,
    queue: RefCell<Vec<String>>,
    position: Cell<usize>,
    listeners: Rc<Registry<HistoryListener>>,
}

impl MemoryHistory {
    /// Creates a history holding a single `/` entry.
    pub fn new() -> Self {
        Self::with_base("")
    }

    /// Creates a history whose hrefs are prefixed with `base`.
    pub fn with_base(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            queue: RefCell::new(vec!["/".to_string()]),
            position: Cell::new(0),
            listeners: Rc::new(Registry::new()),
        }
    }

    /// Returns every entry, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.queue.borrow().clone()
    }

    /// Returns the cursor position.
    pub fn position(&self) -> usize {
        self.position.get()
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterHistory for MemoryHistory {
    fn base(&self) -> &str {
        &self.base
    }

    fn location(&self) -> String {
        self.queue.borrow()[self.position.get()].clone()
    }

    fn push(&self, to: &str, _data: Option<Value>) -> crate::Result<()> {
        let position = self.position.get() + 1;
        let mut queue = self.queue.borrow_mut();
        queue.truncate(position);
        queue.push(to.to_string());
        self.position.set(position);
        Ok(())
    }

    fn replace(&self, to: &str, _data: Option<Value>) -> crate::Result<()> {
        self.queue.borrow_mut()[self.position.get()] = to.to_string();
        Ok(())
    }

    fn go(&self, delta: i64) {
        let (from, to) = {
            let queue = self.queue.borrow();
            let current = self.position.get();
            let Some(target) = i64::try_from(current)
                .ok()
                .and_then(|current| current.checked_add(delta))
                .and_then(|target| usize::try_from(target).ok())
                .filter(|target| *target < queue.len())
            else {
                return;
            };
            self.position.set(target);
            (queue[current].clone(), queue[target].clone())
        };

        let info = NavigationInfo {
            direction: NavigationDirection::from_delta(delta),
        };
        for listener in self.listeners.snapshot() {
            listener(&to, &from, info);
        }
    }

    fn listen(&self, listener: HistoryListener) -> Subscription {
        subscribe(&self.listeners, listener)
    }

    fn create_href(&self, location: &str) -> String {
        format!("{}{location}", self.base)
    }
}
