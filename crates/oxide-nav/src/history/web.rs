//! Browser history over an abstract window API.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{HistoryListener, NavigationDirection, NavigationInfo, RouterHistory};
use crate::error::{NavError, Result};
use crate::subscription::{Registry, Subscription};

/// The parts of the browser location the history reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowserLocation {
    /// Path, starting with `/`.
    pub pathname: String,
    /// Search string including `?`, or empty.
    pub search: String,
    /// Hash including `#`, or empty.
    pub hash: String,
}

/// State stored with every entry the history creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryState {
    /// Location of the entry, relative to the base.
    pub current: String,
    /// Index of the entry in the session, used to tell back from forward.
    pub position: i64,
    /// Data passed to `push`/`replace`.
    #[serde(default)]
    pub data: Option<Value>,
}

/// Callback receiving the state of the entry a popstate landed on.
pub type PopStateHandler = Rc<dyn Fn(Option<EntryState>)>;

/// The native operations [`WebHistory`] needs from the browser.
pub trait BrowserApi {
    /// Current location.
    fn location(&self) -> BrowserLocation;

    /// State of the current entry, if it carries one of ours.
    fn state(&self) -> Option<EntryState>;

    /// `href` of the document's `<base>` element.
    fn base_href(&self) -> Option<String>;

    /// `history.pushState`.
    fn push_state(&self, state: &EntryState, url: &str) -> std::result::Result<(), String>;

    /// `history.replaceState`.
    fn replace_state(&self, state: &EntryState, url: &str) -> std::result::Result<(), String>;

    /// `location.assign`, the fallback when `pushState` fails.
    fn assign(&self, url: &str) -> std::result::Result<(), String>;

    /// `location.replace`, the fallback when `replaceState` fails.
    fn replace_location(&self, url: &str) -> std::result::Result<(), String>;

    /// `history.go`.
    fn go(&self, delta: i64);

    /// Attaches a `popstate` listener, removed when the handle is unsubscribed.
    fn on_popstate(&self, handler: PopStateHandler) -> Subscription;
}

/// Normalizes a history base.
///
/// Without an explicit base, the document's `<base href>` is used, falling
/// back to `/`. The result starts with `/` and has no trailing `/` (except
/// for the root itself).
///
/// ```
/// use oxide_nav::history::normalize_base;
///
/// assert_eq!(normalize_base(None, None), "/");
/// assert_eq!(normalize_base(Some("app/"), None), "/app");
/// assert_eq!(normalize_base(None, Some("https://example.com/docs/")), "/docs");
/// ```
pub fn normalize_base(base: Option<&str>, base_href: Option<&str>) -> String {
    let base = base
        .filter(|b| !b.is_empty())
        .or(base_href)
        .unwrap_or("/");

    let base = match base.find("://") {
        Some(scheme_end) => {
            let rest = &base[scheme_end + 3..];
            rest.find('/').map_or("", |path_start| &rest[path_start..])
        }
        None => base,
    };

    let mut normalized = if base.starts_with('/') {
        base.to_string()
    } else {
        format!("/{base}")
    };
    if normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

/// Derives the router location from the browser location.
fn current_location(base: &str, location: &BrowserLocation) -> String {
    if let Some(hash_start) = base.find('#') {
        let prefix = &base[hash_start..];
        let fragment = location
            .hash
            .strip_prefix(prefix)
            .or_else(|| location.hash.strip_prefix('#'))
            .unwrap_or(&location.hash);
        return if fragment.starts_with('/') {
            fragment.to_string()
        } else {
            format!("/{fragment}")
        };
    }

    let BrowserLocation {
        pathname,
        search,
        hash,
    } = location;
    let path = if base == "/" {
        pathname.as_str()
    } else {
        match pathname.strip_prefix(base) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
            _ => pathname.as_str(),
        }
    };
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    format!("{path}{search}{hash}")
}

struct WebHistoryInner<B> {
    api: B,
    base: String,
    listeners: Registry<HistoryListener>,
    position: Cell<i64>,
    current: RefCell<String>,
}

impl<B: BrowserApi> WebHistoryInner<B> {
    fn read_location(&self) -> String {
        current_location(&self.base, &self.api.location())
    }

    fn url_for(&self, to: &str) -> String {
        if self.base == "/" {
            to.to_string()
        } else if to == "/" {
            self.base.clone()
        } else {
            format!("{}{to}", self.base)
        }
    }

    fn change_location(&self, to: &str, replace: bool, data: Option<Value>) -> Result<()> {
        let url = self.url_for(to);
        let position = if replace {
            self.position.get()
        } else {
            self.position.get() + 1
        };
        let state = EntryState {
            current: to.to_string(),
            position,
            data,
        };

        let native = if replace {
            self.api.replace_state(&state, &url)
        } else {
            self.api.push_state(&state, &url)
        };
        if let Err(error) = native {
            warn!(%url, %error, "history state change failed, falling back to a full load");
            let fallback = if replace {
                self.api.replace_location(&url)
            } else {
                self.api.assign(&url)
            };
            fallback.map_err(NavError::History)?;
        }

        self.position.set(position);
        *self.current.borrow_mut() = to.to_string();
        Ok(())
    }

    fn handle_popstate(&self, state: Option<EntryState>) {
        let to = self.read_location();
        let from = self.current.replace(to.clone());
        let direction = match state {
            Some(state) => {
                let delta = state.position - self.position.get();
                self.position.set(state.position);
                NavigationDirection::from_delta(delta)
            }
            None => NavigationDirection::Unknown,
        };
        debug!(%to, %from, %direction, "popstate");

        let info = NavigationInfo { direction };
        for listener in self.listeners.snapshot() {
            listener(&to, &from, info);
        }
    }
}

/// Browser-backed history.
///
/// Construction attaches a single `popstate` listener through the
/// [`BrowserApi`]; [`destroy`](Self::destroy) or dropping the history removes
/// it.
pub struct WebHistory<B: BrowserApi + 'static> {
    inner: Rc<WebHistoryInner<B>>,
    popstate: RefCell<Option<Subscription>>,
}

impl<B: BrowserApi + 'static> WebHistory<B> {
    /// Creates a history rooted at `base`.
    pub fn new(api: B, base: Option<&str>) -> Self {
        let base = normalize_base(base, api.base_href().as_deref());
        let initial_state = api.state();
        let inner = Rc::new(WebHistoryInner {
            base,
            listeners: Registry::new(),
            position: Cell::new(initial_state.as_ref().map_or(0, |s| s.position)),
            current: RefCell::new(String::new()),
            api,
        });

        let current = inner.read_location();
        if initial_state.is_none() {
            let state = EntryState {
                current: current.clone(),
                position: 0,
                data: None,
            };
            let url = inner.url_for(&current);
            if let Err(error) = inner.api.replace_state(&state, &url) {
                warn!(%error, "could not stamp the initial history entry");
            }
        }
        *inner.current.borrow_mut() = current;

        let weak: Weak<WebHistoryInner<B>> = Rc::downgrade(&inner);
        let popstate = inner.api.on_popstate(Rc::new(move |state| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_popstate(state);
            }
        }));

        Self {
            inner,
            popstate: RefCell::new(Some(popstate)),
        }
    }

    /// Removes the `popstate` listener. Listeners registered with
    /// [`listen`](RouterHistory::listen) stop receiving events.
    pub fn destroy(&self) {
        if let Some(popstate) = self.popstate.borrow_mut().take() {
            popstate.unsubscribe();
        }
    }

    /// Returns the underlying browser API.
    pub fn api(&self) -> &B {
        &self.inner.api
    }
}

impl<B: BrowserApi + 'static> Drop for WebHistory<B> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<B: BrowserApi + 'static> RouterHistory for WebHistory<B> {
    fn base(&self) -> &str {
        &self.inner.base
    }

    fn location(&self) -> String {
        self.inner.read_location()
    }

    fn push(&self, to: &str, data: Option<Value>) -> Result<()> {
        self.inner.change_location(to, false, data)
    }

    fn replace(&self, to: &str, data: Option<Value>) -> Result<()> {
        self.inner.change_location(to, true, data)
    }

    fn go(&self, delta: i64) {
        self.inner.api.go(delta);
    }

    fn listen(&self, listener: HistoryListener) -> Subscription {
        let id = self.inner.listeners.add(listener);
        let inner = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.listeners.remove(id);
            }
        })
    }

    fn create_href(&self, location: &str) -> String {
        if self.inner.base == "/" {
            location.to_string()
        } else {
            format!("{}{location}", self.inner.base)
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fake::FakeBrowser;
    use super::*;

    type Log = Rc<RefCell<Vec<(String, String, NavigationDirection)>>>;

    fn record(history: &WebHistory<FakeBrowser>) -> Log {
        let log: Log = Rc::default();
        let sink = Rc::clone(&log);
        history.listen(Rc::new(move |to: &str, from: &str, info: NavigationInfo| {
            sink.borrow_mut()
                .push((to.to_string(), from.to_string(), info.direction));
        }));
        log
    }

    #[test]
    fn test_normalize_base() {
        assert_eq!(normalize_base(None, None), "/");
        assert_eq!(normalize_base(Some(""), None), "/");
        assert_eq!(normalize_base(Some("/"), None), "/");
        assert_eq!(normalize_base(Some("/app/"), None), "/app");
        assert_eq!(normalize_base(Some("app"), None), "/app");
        assert_eq!(normalize_base(None, Some("/from-doc/")), "/from-doc");
        assert_eq!(normalize_base(Some("/explicit"), Some("/from-doc")), "/explicit");
        assert_eq!(normalize_base(None, Some("https://example.com")), "/");
        assert_eq!(normalize_base(Some("#"), None), "/#");
        assert_eq!(normalize_base(Some("/app#"), None), "/app#");
    }

    #[test]
    fn test_current_location_strips_base() {
        let loc = BrowserLocation {
            pathname: "/app/users".into(),
            search: "?page=2".into(),
            hash: "#top".into(),
        };
        assert_eq!(current_location("/app", &loc), "/users?page=2#top");
        assert_eq!(current_location("/", &loc), "/app/users?page=2#top");
        assert_eq!(current_location("/other", &loc), "/app/users?page=2#top");

        let root = BrowserLocation {
            pathname: "/app".into(),
            ..BrowserLocation::default()
        };
        assert_eq!(current_location("/app", &root), "/");

        let prefix_only = BrowserLocation {
            pathname: "/application".into(),
            ..BrowserLocation::default()
        };
        assert_eq!(current_location("/app", &prefix_only), "/application");
    }

    #[test]
    fn test_current_location_hash_base() {
        let loc = BrowserLocation {
            pathname: "/".into(),
            search: String::new(),
            hash: "#/users?x=1".into(),
        };
        assert_eq!(current_location("/#", &loc), "/users?x=1");

        let empty = BrowserLocation {
            pathname: "/index.html".into(),
            ..BrowserLocation::default()
        };
        assert_eq!(current_location("/#", &empty), "/");
    }

    #[test]
    fn test_initial_entry_is_stamped() {
        let browser = FakeBrowser::at("/app/users");
        let history = WebHistory::new(browser.clone(), Some("/app"));
        assert_eq!(history.base(), "/app");
        assert_eq!(history.location(), "/users");
        let state = history.api().state().unwrap();
        assert_eq!(state.current, "/users");
        assert_eq!(state.position, 0);
        assert_eq!(browser.url(), "/app/users");
    }

    #[test]
    fn test_push_and_replace_build_urls() {
        let browser = FakeBrowser::at("/app");
        let history = WebHistory::new(browser.clone(), Some("/app/"));

        history.push("/users?x=1", Some(serde_json::json!({"k": 1}))).unwrap();
        assert_eq!(browser.url(), "/app/users?x=1");
        assert_eq!(history.location(), "/users?x=1");
        let state = history.api().state().unwrap();
        assert_eq!(state.position, 1);
        assert_eq!(state.data, Some(serde_json::json!({"k": 1})));

        history.replace("/", None).unwrap();
        assert_eq!(browser.url(), "/app");
        assert_eq!(history.location(), "/");
        assert_eq!(browser.urls(), ["/app", "/app"]);
    }

    #[test]
    fn test_root_base_uses_location_as_url() {
        let browser = FakeBrowser::at("/");
        let history = WebHistory::new(browser.clone(), None);
        history.push("/about", None).unwrap();
        assert_eq!(browser.url(), "/about");
        assert_eq!(history.create_href("/about"), "/about");
    }

    #[test]
    fn test_base_from_document() {
        let browser = FakeBrowser::at("/docs/intro");
        browser.0.borrow_mut().base_href = Some("/docs/".into());
        let history = WebHistory::new(browser, None);
        assert_eq!(history.base(), "/docs");
        assert_eq!(history.location(), "/intro");
        assert_eq!(history.create_href("/intro"), "/docs/intro");
    }

    #[test]
    fn test_popstate_reports_direction() {
        let browser = FakeBrowser::at("/");
        let history = WebHistory::new(browser, None);
        history.push("/a", None).unwrap();
        history.push("/b", None).unwrap();
        let log = record(&history);

        history.go(-2);
        history.go(1);
        assert_eq!(
            *log.borrow(),
            [
                ("/".to_string(), "/b".to_string(), NavigationDirection::Back),
                ("/a".to_string(), "/".to_string(), NavigationDirection::Forward),
            ]
        );
        assert_eq!(history.location(), "/a");
    }

    #[test]
    fn test_popstate_without_state_is_unknown() {
        let browser = FakeBrowser::at("/");
        let history = WebHistory::new(browser.clone(), None);
        browser.visit("/plain");
        let log = record(&history);

        history.go(-1);
        history.go(1);
        assert_eq!(log.borrow().len(), 2);
        assert_eq!(
            log.borrow()[1],
            ("/plain".to_string(), "/".to_string(), NavigationDirection::Unknown)
        );
    }

    #[test]
    fn test_state_change_failure_falls_back_to_load() {
        let browser = FakeBrowser::at("/");
        let history = WebHistory::new(browser.clone(), None);
        browser.0.borrow_mut().fail_state_changes = true;

        history.push("/a", None).unwrap();
        history.replace("/b", None).unwrap();
        assert_eq!(browser.0.borrow().loads, ["/a", "/b"]);
        assert_eq!(history.location(), "/b");
    }

    #[test]
    fn test_destroy_removes_popstate_listener() {
        let browser = FakeBrowser::at("/");
        let history = WebHistory::new(browser.clone(), None);
        assert_eq!(browser.handler_count(), 1);
        history.push("/a", None).unwrap();
        let log = record(&history);

        history.destroy();
        assert_eq!(browser.handler_count(), 0);
        history.go(-1);
        assert!(log.borrow().is_empty());
        history.destroy();
    }

    #[test]
    fn test_drop_removes_popstate_listener() {
        let browser = FakeBrowser::at("/");
        drop(WebHistory::new(browser.clone(), None));
        assert_eq!(browser.handler_count(), 0);
    }
}
