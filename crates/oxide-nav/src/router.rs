//! Main router implementation.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::mem;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::error::{NavError, Result};
use crate::guard::{async_guard_fn, guard_fn, GuardResult, NavigationGuard, SharedGuard};
use crate::history::{NavigationInfo, RouterHistory};
use crate::location::RouteLocationRaw;
use crate::matcher::{RouteRecord, RouteRecordRaw, RouterMatcher};
use crate::name::RouteName;
use crate::route::{Route, SealedRoute};
use crate::subscription::{subscribe, Registry, Subscription};

/// Maximum number of consecutive guard redirects a single navigation follows.
pub const MAX_REDIRECTS: usize = 10;

/// Hook run after a navigation commits, with `(to, from)`.
pub type AfterHook = Rc<dyn Fn(&SealedRoute, &SealedRoute)>;

/// Listener notified with the new current route.
pub type RouteListener = Rc<dyn Fn(&SealedRoute)>;

/// Router construction options.
pub struct RouterOptions {
    history: Rc<dyn RouterHistory>,
    routes: Vec<RouteRecordRaw>,
}

impl RouterOptions {
    /// Creates options over a history backend with an empty route table.
    pub fn new(history: impl RouterHistory + 'static) -> Self {
        Self {
            history: Rc::new(history),
            routes: Vec::new(),
        }
    }

    /// Adds a top-level route.
    #[must_use]
    pub fn route(mut self, route: RouteRecordRaw) -> Self {
        self.routes.push(route);
        self
    }

    /// Adds several top-level routes.
    #[must_use]
    pub fn routes(mut self, routes: impl IntoIterator<Item = RouteRecordRaw>) -> Self {
        self.routes.extend(routes);
        self
    }
}

impl fmt::Debug for RouterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterOptions")
            .field("base", &self.history.base())
            .field("routes", &self.routes)
            .finish()
    }
}

struct RouterState {
    current: SealedRoute,
    previous: Option<SealedRoute>,
}

struct RouterInner {
    history: Rc<dyn RouterHistory>,
    matcher: RouterMatcher,
    state: RefCell<RouterState>,
    before_guards: Rc<Registry<SharedGuard>>,
    after_hooks: Rc<Registry<AfterHook>>,
    listeners: Rc<Registry<RouteListener>>,
    history_listener: RefCell<Option<Subscription>>,
    /// Id of the most recently started navigation.
    latest: Cell<u64>,
}

impl RouterInner {
    fn current(&self) -> SealedRoute {
        self.state.borrow().current.clone()
    }

    fn begin(&self) -> u64 {
        let id = self.latest.get() + 1;
        self.latest.set(id);
        id
    }

    async fn run_guards(&self, to: &Route, from: &SealedRoute) -> GuardResult {
        let record_guard = to.record().and_then(|record| record.before_enter.clone());
        let guards = self.before_guards.snapshot();

        for guard in guards.iter().chain(record_guard.iter()) {
            let result = guard.check(to, from).await;
            if result != GuardResult::Continue {
                debug!(to = %to.full_path, ?result, "guard stopped navigation");
                return result;
            }
        }
        GuardResult::Continue
    }

    /// Writes the target to history, then makes it current.
    fn commit(&self, to: Route, from: &SealedRoute, replace: bool, id: u64) -> Result<SealedRoute> {
        if id != self.latest.get() {
            warn!(
                to = %to.full_path,
                "navigation committed while a newer one is still pending"
            );
        }

        if replace {
            self.history.replace(&to.full_path, None)?;
        } else {
            self.history.push(&to.full_path, None)?;
        }
        Ok(self.finalize(to, from))
    }

    /// Seals the target, swaps it in and notifies hooks and listeners.
    fn finalize(&self, mut to: Route, from: &SealedRoute) -> SealedRoute {
        to.previous_full_path = Some(from.full_path.clone());
        let to = to.seal();
        {
            let mut state = self.state.borrow_mut();
            let previous = mem::replace(&mut state.current, to.clone());
            state.previous = Some(previous);
        }
        debug!(from = %from.full_path, to = %to.full_path, "navigation committed");

        for hook in self.after_hooks.snapshot() {
            hook(&to, from);
        }
        for listener in self.listeners.snapshot() {
            listener(&to);
        }
        to
    }

    /// Commits a change the history backend made on its own, skipping guards.
    fn handle_external(&self, location: &str, info: NavigationInfo) {
        let from = self.current();
        match self.matcher.resolve(location, &from) {
            Ok(to) => {
                debug!(location, direction = %info.direction, "external navigation");
                self.finalize(to, &from);
            }
            Err(error) => warn!(location, %error, "could not resolve external navigation"),
        }
    }

    fn unlisten(&self) {
        if let Some(subscription) = self.history_listener.borrow_mut().take() {
            subscription.unsubscribe();
        }
    }
}

impl Drop for RouterInner {
    fn drop(&mut self) {
        self.unlisten();
    }
}

/// The navigation router.
///
/// Owns a history backend and a compiled route table, tracks the current and
/// previous routes and runs the guard pipeline for every navigation it starts.
/// Cloning a router yields another handle to the same state.
///
/// # Example
///
/// ```
/// use oxide_nav::history::MemoryHistory;
/// use oxide_nav::{GuardResult, RouteRecordRaw, Router, RouterOptions};
///
/// # futures::executor::block_on(async {
/// let router = Router::new(
///     RouterOptions::new(MemoryHistory::new())
///         .route(RouteRecordRaw::new("/").name("home"))
///         .route(RouteRecordRaw::new("/users/:id").name("user")),
/// )
/// .unwrap();
///
/// router.before_each(|to, _from| GuardResult::from(to.param("id") != Some("0")));
///
/// let route = router.push("/users/7").await.unwrap();
/// assert_eq!(route.param("id"), Some("7"));
/// assert_eq!(route.previous_full_path.as_deref(), Some("/"));
/// assert!(router.push("/users/0").await.is_err());
/// # });
/// ```
#[derive(Clone)]
pub struct Router {
    inner: Rc<RouterInner>,
}

impl Router {
    /// Compiles the route table and resolves the history's current location
    /// as the initial route.
    pub fn new(options: RouterOptions) -> Result<Self> {
        let RouterOptions { history, routes } = options;
        let matcher = RouterMatcher::new(&routes)?;
        let current = matcher.resolve(history.location(), &Route::start())?.seal();
        debug!(location = %current.full_path, routes = matcher.routes().len(), "router created");

        let inner = Rc::new(RouterInner {
            history,
            matcher,
            state: RefCell::new(RouterState {
                current,
                previous: None,
            }),
            before_guards: Rc::new(Registry::new()),
            after_hooks: Rc::new(Registry::new()),
            listeners: Rc::new(Registry::new()),
            history_listener: RefCell::new(None),
            latest: Cell::new(0),
        });

        let weak = Rc::downgrade(&inner);
        let subscription = inner.history.listen(Rc::new(move |to, _from, info| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_external(to, info);
            }
        }));
        *inner.history_listener.borrow_mut() = Some(subscription);

        Ok(Self { inner })
    }

    /// Returns the current route.
    pub fn current(&self) -> SealedRoute {
        self.inner.current()
    }

    /// Returns the route that was current before the last commit.
    pub fn previous(&self) -> Option<SealedRoute> {
        self.inner.state.borrow().previous.clone()
    }

    /// Resolves a target against the current route without navigating.
    pub fn resolve(&self, to: impl Into<RouteLocationRaw>) -> Result<Route> {
        self.inner.matcher.resolve(to, &self.current())
    }

    /// Resolves a target and renders it as an href for the history backend.
    pub fn href(&self, to: impl Into<RouteLocationRaw>) -> Result<String> {
        let route = self.resolve(to)?;
        Ok(self.inner.history.create_href(&route.full_path))
    }

    /// Returns the compiled records in match order.
    pub fn routes(&self) -> &[Rc<RouteRecord>] {
        self.inner.matcher.routes()
    }

    /// Returns whether a record with the given name exists.
    pub fn has_route(&self, name: impl Into<RouteName>) -> bool {
        self.inner.matcher.get_route(&name.into()).is_some()
    }

    /// Navigates to a target, adding a history entry unless the target asks
    /// to replace.
    pub async fn push(&self, to: impl Into<RouteLocationRaw>) -> Result<SealedRoute> {
        let to = to.into();
        let replace = to.is_replace();
        self.navigate(to, replace).await
    }

    /// Navigates to a target, replacing the current history entry.
    pub async fn replace(&self, to: impl Into<RouteLocationRaw>) -> Result<SealedRoute> {
        self.navigate(to.into(), true).await
    }

    async fn navigate(&self, mut target: RouteLocationRaw, mut replace: bool) -> Result<SealedRoute> {
        let inner = &self.inner;
        let mut redirects = 0;

        loop {
            let id = inner.begin();
            let from = inner.current();
            let to = inner.matcher.resolve(target, &from)?;

            match inner.run_guards(&to, &from).await {
                GuardResult::Continue => return inner.commit(to, &from, replace, id),
                GuardResult::Cancel => {
                    return Err(NavError::NavigationCancelled {
                        from: from.full_path.clone(),
                        to: to.full_path,
                    });
                }
                GuardResult::Redirect(next) => {
                    redirects += 1;
                    if redirects > MAX_REDIRECTS {
                        let to = inner.matcher.resolve(next, &from)?.full_path;
                        return Err(NavError::RedirectLimitExceeded {
                            limit: MAX_REDIRECTS,
                            to,
                        });
                    }
                    debug!(from = %to.full_path, redirects, "redirecting");
                    replace = next.is_replace();
                    target = next;
                }
            }
        }
    }

    /// Moves through history. Guards do not run for these navigations.
    pub fn go(&self, delta: i64) {
        self.inner.history.go(delta);
    }

    /// Equivalent to `go(-1)`.
    pub fn back(&self) {
        self.go(-1);
    }

    /// Equivalent to `go(1)`.
    pub fn forward(&self) {
        self.go(1);
    }

    /// Registers a synchronous before-guard.
    pub fn before_each<F>(&self, guard: F) -> Subscription
    where
        F: Fn(&Route, &SealedRoute) -> GuardResult + 'static,
    {
        self.add_guard(guard_fn(guard))
    }

    /// Registers an async before-guard.
    pub fn before_each_async<F, Fut>(&self, guard: F) -> Subscription
    where
        F: Fn(Route, SealedRoute) -> Fut + 'static,
        Fut: Future<Output = GuardResult> + 'static,
    {
        self.add_guard(async_guard_fn(guard))
    }

    /// Registers any [`NavigationGuard`] as a before-guard.
    pub fn add_guard(&self, guard: impl NavigationGuard + 'static) -> Subscription {
        subscribe(&self.inner.before_guards, Rc::new(guard) as SharedGuard)
    }

    /// Registers a hook run after every commit with `(to, from)`.
    pub fn after_each<F>(&self, hook: F) -> Subscription
    where
        F: Fn(&SealedRoute, &SealedRoute) + 'static,
    {
        subscribe(&self.inner.after_hooks, Rc::new(hook) as AfterHook)
    }

    /// Registers a listener notified with every new current route.
    pub fn listen<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SealedRoute) + 'static,
    {
        subscribe(&self.inner.listeners, Rc::new(listener) as RouteListener)
    }

    /// Stops following external history changes.
    pub fn destroy(&self) {
        self.inner.unlisten();
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("current", &self.current().full_path)
            .field("routes", &self.routes().len())
            .finish()
    }
}
