//! # oxide-nav
//!
//! Client-side route matching and guarded navigation.
//!
//! This crate provides:
//! - Path patterns with `:param` captures and `*` wildcards
//! - A flat, first-match route table built from nested declarations
//! - Resolution of string and structured targets, including named routes
//! - An ordered guard pipeline that can continue, cancel or redirect
//! - Pluggable history backends (memory, browser, hash)
//!
//! ## Quick Start
//!
//! ```
//! use oxide_nav::history::MemoryHistory;
//! use oxide_nav::{RouteLocation, RouteRecordRaw, Router, RouterOptions};
//!
//! # futures::executor::block_on(async {
//! let router = Router::new(
//!     RouterOptions::new(MemoryHistory::new())
//!         .route(RouteRecordRaw::new("/").name("home"))
//!         .route(
//!             RouteRecordRaw::new("/users")
//!                 .name("users")
//!                 .child(RouteRecordRaw::new(":id").name("user")),
//!         ),
//! )
//! .unwrap();
//!
//! let route = router
//!     .push(RouteLocation::named("user").param("id", 42).query("tab", "posts"))
//!     .await
//!     .unwrap();
//! assert_eq!(route.full_path, "/users/42?tab=posts");
//! assert_eq!(route.previous_full_path.as_deref(), Some("/"));
//! # });
//! ```
//!
//! ## Guards
//!
//! Before-guards run one at a time, in registration order, and return a
//! [`GuardResult`]:
//!
//! ```
//! use oxide_nav::history::MemoryHistory;
//! use oxide_nav::{GuardResult, RouteRecordRaw, Router, RouterOptions};
//!
//! # futures::executor::block_on(async {
//! let router = Router::new(
//!     RouterOptions::new(MemoryHistory::new())
//!         .route(RouteRecordRaw::new("/"))
//!         .route(RouteRecordRaw::new("/login"))
//!         .route(RouteRecordRaw::new("/admin").meta("requiresAuth", true)),
//! )
//! .unwrap();
//!
//! let guard = router.before_each(|to, _from| {
//!     if to.meta.get("requiresAuth").is_some() {
//!         GuardResult::redirect("/login")
//!     } else {
//!         GuardResult::Continue
//!     }
//! });
//!
//! assert_eq!(router.push("/admin").await.unwrap().path, "/login");
//!
//! guard.unsubscribe();
//! assert_eq!(router.push("/admin").await.unwrap().path, "/admin");
//! # });
//! ```
//!
//! ## Route Tables as Data
//!
//! ```
//! use oxide_nav::{Route, RouteRecordRaw, RouterMatcher};
//!
//! let routes = RouteRecordRaw::from_json(r#"[{"path": "/files/*", "name": "files"}]"#).unwrap();
//! let matcher = RouterMatcher::new(&routes).unwrap();
//! let route = matcher.resolve("/files/a/b.txt", &Route::start()).unwrap();
//! assert_eq!(route.param("pathMatch"), Some("a/b.txt"));
//! ```

pub mod encoding;
mod error;
mod guard;
pub mod history;
mod location;
mod matcher;
mod name;
mod route;
mod router;
mod subscription;

pub use error::{NavError, Result};
pub use guard::{
    async_guard_fn, guard_fn, AsyncFnGuard, AuthGuard, FnGuard, GuardResult, LoggingGuard,
    NavigationGuard, SharedGuard,
};
pub use location::{Params, Query, QueryValue, RouteLocation, RouteLocationRaw};
pub use matcher::{
    Meta, PathPattern, PathToken, RouteRecord, RouteRecordRaw, RouterMatcher, DEFAULT_VIEW,
    WILDCARD_PARAM,
};
pub use name::{RouteName, Symbol};
pub use route::{Route, SealedRoute};
pub use router::{AfterHook, RouteListener, Router, RouterOptions, MAX_REDIRECTS};
pub use subscription::Subscription;
