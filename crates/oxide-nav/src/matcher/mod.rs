//! Route matching.
//!
//! Declared records are flattened into a single ordered list at construction
//! time. Resolution scans that list and the first matching record wins, so
//! more specific routes must be declared before overlapping ones.

mod pattern;
mod record;

use std::rc::Rc;

use tracing::debug;
use url::Url;

pub use pattern::{PathPattern, PathToken, WILDCARD_PARAM};
pub use record::{Meta, RouteRecord, RouteRecordRaw, DEFAULT_VIEW};

use crate::encoding::{decode, encode_param, parse_query, stringify_query};
use crate::error::{NavError, Result};
use crate::location::{Params, Query, RouteLocation, RouteLocationRaw};
use crate::name::RouteName;
use crate::route::Route;

/// Base URL string targets are parsed against. Only its path, query and
/// fragment are ever read back.
const PARSE_BASE: &str = "http://dummy.com";

/// Compiles route records and resolves navigation targets against them.
#[derive(Debug, Default)]
pub struct RouterMatcher {
    records: Vec<Rc<RouteRecord>>,
}

impl RouterMatcher {
    /// Compiles a route table.
    pub fn new(routes: &[RouteRecordRaw]) -> Result<Self> {
        let mut matcher = Self::default();
        for route in routes {
            matcher.add_route(route)?;
        }
        Ok(matcher)
    }

    /// Compiles a record and its descendants, appending them after the
    /// existing records.
    pub fn add_route(&mut self, record: &RouteRecordRaw) -> Result<()> {
        self.add_route_with_parent(record, "")
    }

    fn add_route_with_parent(&mut self, raw: &RouteRecordRaw, parent_path: &str) -> Result<()> {
        let path = join_paths(parent_path, &raw.path);
        let record = Rc::new(RouteRecord::compile(raw, path)?);
        debug!(path = %record.path, pattern = record.pattern.as_regex(), "compiled route");
        self.records.push(Rc::clone(&record));

        let child_parent = if record.path == "/" { "" } else { record.path.as_str() };
        for child in &raw.children {
            self.add_route_with_parent(child, child_parent)?;
        }
        Ok(())
    }

    /// Returns the compiled records in match order.
    pub fn routes(&self) -> &[Rc<RouteRecord>] {
        &self.records
    }

    /// Returns the first record with the given name.
    pub fn get_route(&self, name: &RouteName) -> Option<&Rc<RouteRecord>> {
        self.records
            .iter()
            .find(|record| record.name.as_ref() == Some(name))
    }

    /// Resolves a target into a route.
    ///
    /// `current` supplies the path when the target names neither a path nor a
    /// route. An unmatched path is not an error: it yields a route with an
    /// empty `matched` list. Only an unknown route name fails.
    ///
    /// # Example
    ///
    /// ```
    /// use oxide_nav::{Route, RouteRecordRaw, RouterMatcher};
    ///
    /// let matcher = RouterMatcher::new(&[RouteRecordRaw::new("/users/:id").name("user")]).unwrap();
    /// let route = matcher.resolve("/users/42?tab=posts#bio", &Route::start()).unwrap();
    /// assert_eq!(route.param("id"), Some("42"));
    /// assert_eq!(route.full_path, "/users/42?tab=posts#bio");
    /// ```
    pub fn resolve(&self, target: impl Into<RouteLocationRaw>, current: &Route) -> Result<Route> {
        let (path, query, hash) = match target.into() {
            RouteLocationRaw::Str(location) => parse_location(&location)?,
            RouteLocationRaw::Location(location) => self.locate(location, current)?,
        };

        let found = self
            .records
            .iter()
            .find_map(|record| record.pattern.match_path(&path).map(|raw| (record, raw)));

        let Some((record, raw_params)) = found else {
            debug!(path, "no route matched");
            return Ok(Route {
                full_path: format!("{path}{hash}"),
                path,
                params: Params::new(),
                query,
                hash,
                name: None,
                meta: Meta::new(),
                matched: Vec::new(),
                previous_full_path: None,
            });
        };

        let params: Params = raw_params
            .into_iter()
            .map(|(key, value)| {
                let decoded = decode(&value);
                (key, decoded)
            })
            .collect();

        let query_string = if query.is_empty() {
            String::new()
        } else {
            format!("?{}", stringify_query(&query))
        };

        debug!(path, record = %record.path, "route matched");
        Ok(Route {
            full_path: format!("{path}{query_string}{hash}"),
            path,
            params,
            query,
            hash,
            name: record.name.clone(),
            meta: record.meta.clone(),
            matched: vec![Rc::clone(record)],
            previous_full_path: None,
        })
    }

    /// Determines path, query and hash for a structured target.
    fn locate(&self, location: RouteLocation, current: &Route) -> Result<(String, Query, String)> {
        let RouteLocation {
            path,
            name,
            params,
            query,
            hash,
            ..
        } = location;

        let path = match (path.filter(|p| !p.is_empty()), name.filter(|n| !n.is_empty())) {
            (Some(path), _) => path,
            (None, Some(name)) => {
                let record = self
                    .get_route(&name)
                    .ok_or_else(|| NavError::RouteNotFound(name.to_string()))?;
                let mut path = record.path.clone();
                for (key, value) in &params {
                    path = path.replacen(&format!(":{key}"), &encode_param(value), 1);
                }
                path
            }
            (None, None) => current.path.clone(),
        };

        Ok((path, query, hash))
    }
}

/// Joins a declared path onto its parent and collapses repeated slashes.
fn join_paths(parent: &str, path: &str) -> String {
    let joined = if path.starts_with('/') {
        format!("{parent}{path}")
    } else {
        format!("{parent}/{path}")
    };

    let mut normalized = String::with_capacity(joined.len());
    for c in joined.chars() {
        if c == '/' && normalized.ends_with('/') {
            continue;
        }
        normalized.push(c);
    }
    normalized
}

/// Splits a location string into path, query and hash.
fn parse_location(location: &str) -> Result<(String, Query, String)> {
    let invalid = |source: url::ParseError| NavError::InvalidLocation {
        location: location.to_string(),
        source,
    };
    let url = Url::parse(PARSE_BASE)
        .and_then(|base| base.join(location))
        .map_err(invalid)?;

    let query = url.query().map(parse_query).unwrap_or_default();
    let hash = match url.fragment() {
        Some(fragment) if !fragment.is_empty() => format!("#{fragment}"),
        _ => String::new(),
    };

    Ok((url.path().to_string(), query, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::QueryValue;
    use crate::name::Symbol;
    use serde_json::json;

    fn routes() -> Vec<RouteRecordRaw> {
        vec![
            RouteRecordRaw::new("/").name("home").component("Home"),
            RouteRecordRaw::new("/users").name("users").component("Users"),
            RouteRecordRaw::new("/users/:id")
                .name("user")
                .component("UserDetail")
                .meta("requiresAuth", true),
            RouteRecordRaw::new("/about").name("about"),
            RouteRecordRaw::new("/files/*").name("files"),
        ]
    }

    fn matcher() -> RouterMatcher {
        RouterMatcher::new(&routes()).unwrap()
    }

    fn paths(matcher: &RouterMatcher) -> Vec<&str> {
        matcher.routes().iter().map(|r| r.path.as_str()).collect()
    }

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("", "/"), "/");
        assert_eq!(join_paths("", "about"), "/about");
        assert_eq!(join_paths("/users", ":id"), "/users/:id");
        assert_eq!(join_paths("/users", "/:id"), "/users/:id");
        assert_eq!(join_paths("", "//a///b/"), "/a/b/");
        assert_eq!(join_paths("", "///"), "/");
    }

    #[test]
    fn test_flatten_children() {
        let matcher = RouterMatcher::new(&[
            RouteRecordRaw::new("/")
                .child(RouteRecordRaw::new("dashboard"))
                .child(RouteRecordRaw::new("/settings")),
            RouteRecordRaw::new("users")
                .child(RouteRecordRaw::new(":id").child(RouteRecordRaw::new("posts/"))),
        ])
        .unwrap();

        assert_eq!(
            paths(&matcher),
            [
                "/",
                "/dashboard",
                "/settings",
                "/users",
                "/users/:id",
                "/users/:id/posts/"
            ]
        );
        assert_eq!(matcher.routes()[0].children.len(), 2);
    }

    #[test]
    fn test_add_route_appends() {
        let mut matcher = RouterMatcher::new(&[RouteRecordRaw::new("/*")]).unwrap();
        matcher.add_route(&RouteRecordRaw::new("/late")).unwrap();
        assert_eq!(paths(&matcher), ["/*", "/late"]);

        let route = matcher.resolve("/late", &Route::start()).unwrap();
        assert_eq!(route.record().unwrap().path, "/*");
    }

    #[test]
    fn test_resolve_string() {
        let route = matcher().resolve("/users/123", &Route::start()).unwrap();
        assert_eq!(route.path, "/users/123");
        assert_eq!(route.full_path, "/users/123");
        assert_eq!(route.param("id"), Some("123"));
        assert_eq!(route.name, Some(RouteName::from("user")));
        assert_eq!(route.meta.get("requiresAuth"), Some(&json!(true)));
        assert_eq!(route.matched.len(), 1);
        assert_eq!(route.previous_full_path, None);
    }

    #[test]
    fn test_trailing_slash_matches_same_record() {
        let matcher = matcher();
        for path in ["/users", "/about", "/users/7"] {
            let plain = matcher.resolve(path, &Route::start()).unwrap();
            let slashed = matcher.resolve(format!("{path}/"), &Route::start()).unwrap();
            assert_eq!(plain.record(), slashed.record(), "{path}");
            assert!(plain.record().is_some());
        }
    }

    #[test]
    fn test_first_match_wins() {
        let matcher = RouterMatcher::new(&[
            RouteRecordRaw::new("/users/:id").name("by-id"),
            RouteRecordRaw::new("/users/me").name("me"),
            RouteRecordRaw::new("/*").name("catch-all"),
        ])
        .unwrap();

        let route = matcher.resolve("/users/me", &Route::start()).unwrap();
        assert_eq!(route.name, Some(RouteName::from("by-id")));
        assert_eq!(route.param("id"), Some("me"));

        let route = matcher.resolve("/elsewhere", &Route::start()).unwrap();
        assert_eq!(route.name, Some(RouteName::from("catch-all")));
    }

    #[test]
    fn test_wildcard_capture() {
        let route = matcher().resolve("/files/path/to/file.txt", &Route::start()).unwrap();
        assert_eq!(route.name, Some(RouteName::from("files")));
        assert_eq!(route.param(WILDCARD_PARAM), Some("path/to/file.txt"));
    }

    #[test]
    fn test_query_multiplicity() {
        let route = matcher().resolve("/users?tag=a&tag=b&page=2", &Route::start()).unwrap();
        assert_eq!(route.query.get("tag"), Some(&QueryValue::from(vec!["a", "b"])));
        assert_eq!(route.query.get("page"), Some(&QueryValue::from("2")));
        assert_eq!(route.full_path, "/users?tag=a&tag=b&page=2");
    }

    #[test]
    fn test_hash() {
        let route = matcher().resolve("/about#team", &Route::start()).unwrap();
        assert_eq!(route.hash, "#team");
        assert_eq!(route.full_path, "/about#team");

        let route = matcher().resolve("/about#", &Route::start()).unwrap();
        assert_eq!(route.hash, "");
    }

    #[test]
    fn test_relative_string_target() {
        let route = matcher().resolve("about", &Route::start()).unwrap();
        assert_eq!(route.path, "/about");
        let route = matcher().resolve("/users/../about", &Route::start()).unwrap();
        assert_eq!(route.path, "/about");
    }

    #[test]
    fn test_no_match_omits_query_from_full_path() {
        let route = matcher().resolve("/missing/page?x=1#top", &Route::start()).unwrap();
        assert!(route.matched.is_empty());
        assert!(route.params.is_empty());
        assert!(route.meta.is_empty());
        assert_eq!(route.name, None);
        assert_eq!(route.query.get("x"), Some(&QueryValue::from("1")));
        assert_eq!(route.full_path, "/missing/page#top");
    }

    #[test]
    fn test_resolve_by_name_encodes_params() {
        let matcher = matcher();
        let route = matcher
            .resolve(RouteLocation::named("user").param("id", "c++"), &Route::start())
            .unwrap();
        assert_eq!(route.path, "/users/c%2B%2B");
        assert_eq!(route.param("id"), Some("c++"));

        let again = matcher.resolve(route.full_path.as_str(), &Route::start()).unwrap();
        assert_eq!(again.param("id"), Some("c++"));
    }

    #[test]
    fn test_resolve_by_name_replaces_first_token_only() {
        let matcher = RouterMatcher::new(&[
            RouteRecordRaw::new("/:a/:ab").name("pair"),
        ])
        .unwrap();
        let route = matcher
            .resolve(
                RouteLocation::named("pair").param("ab", "2").param("a", "1"),
                &Route::start(),
            )
            .unwrap();
        assert_eq!(route.path, "/1/2");
    }

    #[test]
    fn test_resolve_by_symbol_name() {
        let sym = Symbol::new("secret");
        let matcher = RouterMatcher::new(&[RouteRecordRaw::new("/secret").name(&sym)]).unwrap();
        let route = matcher.resolve(RouteLocation::named(&sym), &Route::start()).unwrap();
        assert_eq!(route.path, "/secret");

        let err = matcher
            .resolve(RouteLocation::named(Symbol::new("secret")), &Route::start())
            .unwrap_err();
        assert!(matches!(err, NavError::RouteNotFound(_)));
    }

    #[test]
    fn test_unknown_name_fails() {
        let err = matcher()
            .resolve(RouteLocation::named("nope"), &Route::start())
            .unwrap_err();
        assert!(matches!(err, NavError::RouteNotFound(ref name) if name == "nope"));
        assert_eq!(err.to_string(), "route with name 'nope' not found");
    }

    #[test]
    fn test_path_takes_precedence_over_name() {
        let route = matcher()
            .resolve(
                RouteLocation {
                    path: Some("/about".into()),
                    name: Some("nope".into()),
                    ..RouteLocation::default()
                },
                &Route::start(),
            )
            .unwrap();
        assert_eq!(route.path, "/about");
    }

    #[test]
    fn test_object_target_query_and_hash() {
        let route = matcher()
            .resolve(
                RouteLocation::path("/users").query("q", "a b").hash("#list"),
                &Route::start(),
            )
            .unwrap();
        assert_eq!(route.full_path, "/users?q=a+b#list");
        assert_eq!(route.hash, "#list");
    }

    #[test]
    fn test_empty_target_reuses_current_path() {
        let matcher = matcher();
        let current = matcher.resolve("/users/9?x=1", &Route::start()).unwrap();
        let route = matcher
            .resolve(RouteLocation::new().query("page", "2"), &current)
            .unwrap();
        assert_eq!(route.path, "/users/9");
        assert_eq!(route.full_path, "/users/9?page=2");
        assert_eq!(route.param("id"), Some("9"));
    }

    #[test]
    fn test_malformed_param_falls_back_to_raw() {
        let route = matcher().resolve(RouteLocation::path("/users/100%"), &Route::start()).unwrap();
        assert_eq!(route.param("id"), Some("100%"));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let matcher = matcher();
        let target = RouteLocation::named("user").param("id", 5).query("tab", "x");
        let first = matcher.resolve(target.clone(), &Route::start()).unwrap();
        let second = matcher.resolve(target, &Route::start()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_location() {
        let err = matcher().resolve("http://[::1", &Route::start()).unwrap_err();
        assert!(matches!(err, NavError::InvalidLocation { .. }));
    }
}
