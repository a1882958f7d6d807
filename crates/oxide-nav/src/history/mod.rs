//! Location backends.
//!
//! The router only talks to a backend through [`RouterHistory`]. Three
//! implementations are provided:
//! - [`MemoryHistory`]: an in-process stack, usable anywhere
//! - [`WebHistory`]: base-path aware browser history over a [`BrowserApi`]
//! - [`hash_history`]: browser history with the location kept after `#`

mod hash;
mod memory;
mod web;
#[cfg(feature = "web")]
mod window;

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

pub use hash::hash_history;
pub use memory::MemoryHistory;
pub use web::{normalize_base, BrowserApi, BrowserLocation, EntryState, PopStateHandler, WebHistory};
#[cfg(feature = "web")]
pub use window::{browser_history, browser_hash_history, WindowApi};

use crate::subscription::Subscription;

/// Direction of an externally triggered navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDirection {
    /// Towards older entries.
    Back,
    /// Towards newer entries.
    Forward,
    /// Could not be determined.
    Unknown,
}

impl NavigationDirection {
    /// Direction implied by a position delta.
    pub fn from_delta(delta: i64) -> Self {
        match delta.signum() {
            1 => Self::Forward,
            -1 => Self::Back,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for NavigationDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Back => "back",
            Self::Forward => "forward",
            Self::Unknown => "unknown",
        })
    }
}

/// Extra information passed to history listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationInfo {
    /// Which way the navigation went.
    pub direction: NavigationDirection,
}

/// Callback invoked with `(to, from, info)` on externally triggered changes.
pub type HistoryListener = Rc<dyn Fn(&str, &str, NavigationInfo)>;

/// The contract every location backend satisfies.
///
/// `push` and `replace` change the location without notifying listeners;
/// listeners only hear about changes the backend did not initiate itself
/// (`go`, browser back/forward).
pub trait RouterHistory {
    /// Base prepended to every rendered href.
    fn base(&self) -> &str;

    /// The current location, relative to the base.
    fn location(&self) -> String;

    /// Adds a new entry, discarding any forward entries.
    fn push(&self, to: &str, data: Option<Value>) -> crate::Result<()>;

    /// Replaces the current entry.
    fn replace(&self, to: &str, data: Option<Value>) -> crate::Result<()>;

    /// Moves through history; out-of-range deltas do nothing.
    fn go(&self, delta: i64);

    /// Registers a listener for externally triggered changes.
    fn listen(&self, listener: HistoryListener) -> Subscription;

    /// Renders an absolute reference for a location.
    fn create_href(&self, location: &str) -> String;
}

impl<H: RouterHistory + ?Sized> RouterHistory for Rc<H> {
    fn base(&self) -> &str {
        (**self).base()
    }

    fn location(&self) -> String {
        (**self).location()
    }

    fn push(&self, to: &str, data: Option<Value>) -> crate::Result<()> {
        (**self).push(to, data)
    }

    fn replace(&self, to: &str, data: Option<Value>) -> crate::Result<()> {
        (**self).replace(to, data)
    }

    fn go(&self, delta: i64) {
        (**self).go(delta);
    }

    fn listen(&self, listener: HistoryListener) -> Subscription {
        (**self).listen(listener)
    }

    fn create_href(&self, location: &str) -> String {
        (**self).create_href(location)
    }
}
