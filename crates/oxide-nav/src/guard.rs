//! Navigation guards.

use std::future::Future;
use std::rc::Rc;

use futures::future::{self, LocalBoxFuture};
use serde_json::Value;
use tracing::{debug, info};

use crate::location::RouteLocationRaw;
use crate::route::{Route, SealedRoute};

/// What a guard decided about a pending navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardResult {
    /// Let the navigation proceed to the next guard.
    Continue,
    /// Abort the whole navigation.
    Cancel,
    /// Abandon this navigation and push the given target instead.
    Redirect(RouteLocationRaw),
}

impl GuardResult {
    /// Shorthand for [`GuardResult::Redirect`].
    pub fn redirect(to: impl Into<RouteLocationRaw>) -> Self {
        Self::Redirect(to.into())
    }
}

impl From<()> for GuardResult {
    fn from((): ()) -> Self {
        Self::Continue
    }
}

impl From<bool> for GuardResult {
    fn from(allow: bool) -> Self {
        if allow {
            Self::Continue
        } else {
            Self::Cancel
        }
    }
}

/// Trait for guards that run before a navigation commits.
///
/// Guards run one at a time, in registration order. A guard whose future never
/// completes stalls its navigation.
///
/// # Example
///
/// ```
/// use futures::future::{self, LocalBoxFuture};
/// use oxide_nav::{GuardResult, NavigationGuard, Route, SealedRoute};
///
/// struct NoAdmin;
///
/// impl NavigationGuard for NoAdmin {
///     fn check<'a>(&'a self, to: &'a Route, _from: &'a SealedRoute) -> LocalBoxFuture<'a, GuardResult> {
///         let result = if to.path.starts_with("/admin") {
///             GuardResult::Cancel
///         } else {
///             GuardResult::Continue
///         };
///         Box::pin(future::ready(result))
///     }
/// }
/// ```
pub trait NavigationGuard {
    /// Inspects the target and the current route.
    fn check<'a>(&'a self, to: &'a Route, from: &'a SealedRoute)
        -> LocalBoxFuture<'a, GuardResult>;
}

/// Shared handle to a registered guard.
pub type SharedGuard = Rc<dyn NavigationGuard>;

/// A guard backed by a synchronous closure.
pub struct FnGuard<F>(F);

impl<F> NavigationGuard for FnGuard<F>
where
    F: Fn(&Route, &SealedRoute) -> GuardResult,
{
    fn check<'a>(&'a self, to: &'a Route, from: &'a SealedRoute) -> LocalBoxFuture<'a, GuardResult> {
        Box::pin(future::ready((self.0)(to, from)))
    }
}

/// A guard backed by a closure returning a future.
///
/// The closure receives owned copies of both routes so the future can outlive
/// the call.
pub struct AsyncFnGuard<F>(F);

impl<F, Fut> NavigationGuard for AsyncFnGuard<F>
where
    F: Fn(Route, SealedRoute) -> Fut,
    Fut: Future<Output = GuardResult> + 'static,
{
    fn check<'a>(&'a self, to: &'a Route, from: &'a SealedRoute) -> LocalBoxFuture<'a, GuardResult> {
        Box::pin((self.0)(to.clone(), from.clone()))
    }
}

/// Wraps a synchronous closure as a guard.
pub fn guard_fn<F>(f: F) -> FnGuard<F>
where
    F: Fn(&Route, &SealedRoute) -> GuardResult,
{
    FnGuard(f)
}

/// Wraps an async closure as a guard.
pub fn async_guard_fn<F, Fut>(f: F) -> AsyncFnGuard<F>
where
    F: Fn(Route, SealedRoute) -> Fut,
    Fut: Future<Output = GuardResult> + 'static,
{
    AsyncFnGuard(f)
}

/// Guard that redirects unauthenticated users away from protected routes.
///
/// A route is protected when its meta holds `true` under the configured key
/// (`requiresAuth` by default).
pub struct AuthGuard {
    /// Paths to exclude from the check.
    pub exclude: Vec<String>,
    /// Meta key that marks a protected route.
    pub meta_key: String,
    /// Where unauthenticated navigations are sent.
    pub login: RouteLocationRaw,
    is_authenticated: Box<dyn Fn() -> bool>,
}

impl AuthGuard {
    /// Creates a new auth guard.
    pub fn new(
        login: impl Into<RouteLocationRaw>,
        is_authenticated: impl Fn() -> bool + 'static,
    ) -> Self {
        Self {
            exclude: Vec::new(),
            meta_key: "requiresAuth".to_string(),
            login: login.into(),
            is_authenticated: Box::new(is_authenticated),
        }
    }

    /// Adds path prefixes to exclude from the check.
    #[must_use]
    pub fn exclude(mut self, paths: &[&str]) -> Self {
        self.exclude = paths.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Sets the meta key that marks a protected route.
    #[must_use]
    pub fn meta_key(mut self, key: impl Into<String>) -> Self {
        self.meta_key = key.into();
        self
    }

    fn is_excluded(&self, path: &str) -> bool {
        self.exclude.iter().any(|p| path.starts_with(p))
    }

    fn is_protected(&self, route: &Route) -> bool {
        route.meta.get(&self.meta_key) == Some(&Value::Bool(true))
    }
}

impl NavigationGuard for AuthGuard {
    fn check<'a>(&'a self, to: &'a Route, _from: &'a SealedRoute) -> LocalBoxFuture<'a, GuardResult> {
        let result = if self.is_excluded(&to.path) || !self.is_protected(to) {
            GuardResult::Continue
        } else if (self.is_authenticated)() {
            GuardResult::Continue
        } else {
            debug!(to = %to.full_path, "auth guard redirecting to login");
            GuardResult::Redirect(self.login.clone())
        };
        Box::pin(future::ready(result))
    }
}

/// Guard that logs every navigation and lets it through.
pub struct LoggingGuard;

impl NavigationGuard for LoggingGuard {
    fn check<'a>(&'a self, to: &'a Route, from: &'a SealedRoute) -> LocalBoxFuture<'a, GuardResult> {
        info!(from = %from.full_path, to = %to.full_path, "navigating");
        Box::pin(future::ready(GuardResult::Continue))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::matcher::Meta;

    fn route(path: &str, meta: Meta) -> Route {
        let mut route = Route::start();
        route.path = path.to_string();
        route.full_path = path.to_string();
        route.meta = meta;
        route
    }

    fn protected() -> Meta {
        let mut meta = Meta::new();
        meta.insert("requiresAuth".into(), Value::Bool(true));
        meta
    }

    fn check(guard: &dyn NavigationGuard, to: &Route) -> GuardResult {
        futures::executor::block_on(guard.check(to, &Route::start().seal()))
    }

    #[test]
    fn test_guard_result_conversions() {
        assert_eq!(GuardResult::from(()), GuardResult::Continue);
        assert_eq!(GuardResult::from(true), GuardResult::Continue);
        assert_eq!(GuardResult::from(false), GuardResult::Cancel);
        assert_eq!(
            GuardResult::redirect("/login"),
            GuardResult::Redirect(RouteLocationRaw::from("/login"))
        );
    }

    #[test]
    fn test_fn_guard() {
        let guard = guard_fn(|to, _from| (to.path != "/blocked").into());
        assert_eq!(check(&guard, &route("/open", Meta::new())), GuardResult::Continue);
        assert_eq!(check(&guard, &route("/blocked", Meta::new())), GuardResult::Cancel);
    }

    #[test]
    fn test_async_fn_guard() {
        let guard = async_guard_fn(|to: Route, from: SealedRoute| async move {
            if to.path == from.path {
                GuardResult::Cancel
            } else {
                GuardResult::Continue
            }
        });
        assert_eq!(check(&guard, &route("/", Meta::new())), GuardResult::Cancel);
        assert_eq!(check(&guard, &route("/x", Meta::new())), GuardResult::Continue);
    }

    #[test]
    fn test_auth_guard() {
        let logged_in = Rc::new(Cell::new(false));
        let flag = Rc::clone(&logged_in);
        let guard = AuthGuard::new("/login", move || flag.get()).exclude(&["/public"]);

        assert_eq!(check(&guard, &route("/home", Meta::new())), GuardResult::Continue);
        assert_eq!(
            check(&guard, &route("/admin", protected())),
            GuardResult::redirect("/login")
        );
        assert_eq!(check(&guard, &route("/public/doc", protected())), GuardResult::Continue);

        logged_in.set(true);
        assert_eq!(check(&guard, &route("/admin", protected())), GuardResult::Continue);
    }

    #[test]
    fn test_auth_guard_meta_key() {
        let guard = AuthGuard::new("/login", || false).meta_key("private");
        assert_eq!(check(&guard, &route("/admin", protected())), GuardResult::Continue);

        let mut meta = Meta::new();
        meta.insert("private".into(), Value::Bool(true));
        assert_eq!(check(&guard, &route("/admin", meta)), GuardResult::redirect("/login"));
    }

    #[test]
    fn test_logging_guard_continues() {
        assert_eq!(check(&LoggingGuard, &route("/a", Meta::new())), GuardResult::Continue);
    }
}
