//! Resolved routes.

use std::ops::Deref;
use std::rc::Rc;

use serde::Serialize;

use crate::location::{Params, Query};
use crate::matcher::{Meta, RouteRecord};
use crate::name::RouteName;

/// The outcome of resolving a navigation target.
///
/// A `Route` returned by [`Router::resolve`](crate::Router::resolve) is a plain
/// value owned by the caller. Once the router commits it, it becomes a
/// [`SealedRoute`] and can no longer be changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    /// Path, query string and hash, as shown in a location bar.
    pub full_path: String,
    /// Path component.
    pub path: String,
    /// Decoded params captured by the matched pattern.
    pub params: Params,
    /// Query mapping.
    pub query: Query,
    /// Hash, including the leading `#`, or empty.
    pub hash: String,
    /// Name of the matched record.
    pub name: Option<RouteName>,
    /// Meta of the matched record, or empty.
    pub meta: Meta,
    /// The matched record, or empty when nothing matched.
    pub matched: Vec<Rc<RouteRecord>>,
    /// Full path of the route this one replaced once committed.
    pub previous_full_path: Option<String>,
}

impl Route {
    /// The placeholder route the router resolves its initial location against.
    pub fn start() -> Self {
        Self {
            full_path: "/".to_string(),
            path: "/".to_string(),
            params: Params::new(),
            query: Query::new(),
            hash: String::new(),
            name: None,
            meta: Meta::new(),
            matched: Vec::new(),
            previous_full_path: None,
        }
    }

    /// Returns the matched record, if any.
    pub fn record(&self) -> Option<&Rc<RouteRecord>> {
        self.matched.first()
    }

    /// Returns a decoded param.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Seals the route, giving up write access to every field.
    pub fn seal(self) -> SealedRoute {
        SealedRoute(Rc::new(self))
    }
}

/// A committed, read-only route.
///
/// Fields are readable through `Deref`; there is no write path:
///
/// ```
/// use oxide_nav::Route;
///
/// let sealed = Route::start().seal();
/// assert_eq!(sealed.path, "/");
/// ```
///
/// ```compile_fail
/// use oxide_nav::Route;
///
/// let sealed = Route::start().seal();
/// sealed.path = "/mutated".to_string();
/// ```
///
/// ```compile_fail
/// use oxide_nav::Route;
///
/// let mut sealed = Route::start().seal();
/// sealed.params.insert("id".into(), "1".into());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SealedRoute(Rc<Route>);

impl SealedRoute {
    /// Returns whether both handles point at the same committed route.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    /// Copies the route out into a new, unsealed value.
    pub fn to_route(&self) -> Route {
        Route::clone(&self.0)
    }
}

impl Deref for SealedRoute {
    type Target = Route;

    fn deref(&self) -> &Route {
        &self.0
    }
}

impl AsRef<Route> for SealedRoute {
    fn as_ref(&self) -> &Route {
        &self.0
    }
}
