//! Declared and compiled route records.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::guard::{guard_fn, GuardResult, NavigationGuard, SharedGuard};
use crate::matcher::pattern::PathPattern;
use crate::name::RouteName;
use crate::route::{Route, SealedRoute};

/// Opaque per-route metadata.
pub type Meta = serde_json::Map<String, Value>;

/// Name of the view slot a single declared component is registered under.
pub const DEFAULT_VIEW: &str = "default";

/// A user-declared route.
///
/// Route tables can be built in code or deserialized from JSON:
///
/// ```
/// use oxide_nav::RouteRecordRaw;
///
/// let routes = RouteRecordRaw::from_json(r#"[
///     {"path": "/", "name": "home"},
///     {"path": "/users", "name": "users", "children": [
///         {"path": ":id", "name": "user", "meta": {"requiresAuth": true}}
///     ]}
/// ]"#).unwrap();
/// assert_eq!(routes[1].children[0].path, ":id");
/// ```
#[derive(Clone, Default, Deserialize)]
pub struct RouteRecordRaw {
    /// Path, absolute or relative to the parent.
    pub path: String,
    /// Optional unique name.
    #[serde(default)]
    pub name: Option<RouteName>,
    /// Opaque component payload for the default view.
    #[serde(default)]
    pub component: Option<Value>,
    /// Nested routes.
    #[serde(default)]
    pub children: Vec<RouteRecordRaw>,
    /// Opaque metadata.
    #[serde(default)]
    pub meta: Meta,
    /// Guard that runs only when this record is matched.
    #[serde(skip)]
    pub before_enter: Option<SharedGuard>,
}

impl RouteRecordRaw {
    /// Creates a record for a path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Parses a JSON array of records.
    pub fn from_json(json: &str) -> Result<Vec<Self>> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the name.
    #[must_use]
    pub fn name(mut self, name: impl Into<RouteName>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the component payload.
    #[must_use]
    pub fn component(mut self, component: impl Into<Value>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Adds a meta entry.
    #[must_use]
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Adds a child record.
    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Sets a synchronous guard for this record.
    #[must_use]
    pub fn before_enter<F>(self, guard: F) -> Self
    where
        F: Fn(&Route, &SealedRoute) -> GuardResult + 'static,
    {
        self.before_enter_guard(guard_fn(guard))
    }

    /// Sets any [`NavigationGuard`] for this record.
    #[must_use]
    pub fn before_enter_guard(mut self, guard: impl NavigationGuard + 'static) -> Self {
        self.before_enter = Some(Rc::new(guard));
        self
    }
}

impl fmt::Debug for RouteRecordRaw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteRecordRaw")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("component", &self.component)
            .field("children", &self.children)
            .field("meta", &self.meta)
            .field("before_enter", &self.before_enter.is_some())
            .finish()
    }
}

/// A compiled route record.
#[derive(Clone, Serialize)]
pub struct RouteRecord {
    /// Normalized absolute path.
    pub path: String,
    /// Optional unique name.
    pub name: Option<RouteName>,
    /// Compiled pattern.
    #[serde(skip)]
    pub pattern: PathPattern,
    /// Components by view name.
    pub components: IndexMap<String, Value>,
    /// Opaque metadata.
    pub meta: Meta,
    /// Declared children, kept for reference only.
    #[serde(skip)]
    pub children: Vec<RouteRecordRaw>,
    /// Guard that runs only when this record is matched.
    #[serde(skip)]
    pub before_enter: Option<SharedGuard>,
}

impl RouteRecord {
    /// Compiles a declared record whose path is already normalized.
    pub(crate) fn compile(raw: &RouteRecordRaw, path: String) -> Result<Self> {
        let pattern = PathPattern::new(&path)?;
        let mut components = IndexMap::new();
        if let Some(component) = &raw.component {
            components.insert(DEFAULT_VIEW.to_string(), component.clone());
        }

        Ok(Self {
            path,
            name: raw.name.clone(),
            pattern,
            components,
            meta: raw.meta.clone(),
            children: raw.children.clone(),
            before_enter: raw.before_enter.clone(),
        })
    }
}

impl PartialEq for RouteRecord {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.name == other.name
            && self.components == other.components
            && self.meta == other.meta
    }
}

impl fmt::Debug for RouteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteRecord")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_regex())
            .field("components", &self.components)
            .field("meta", &self.meta)
            .field("children", &self.children.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let raw = RouteRecordRaw::new("/users")
            .name("users")
            .component("UsersView")
            .meta("title", "Users")
            .child(RouteRecordRaw::new(":id"));

        assert_eq!(raw.name, Some(RouteName::from("users")));
        assert_eq!(raw.component, Some(json!("UsersView")));
        assert_eq!(raw.meta.get("title"), Some(&json!("Users")));
        assert_eq!(raw.children.len(), 1);
        assert!(raw.before_enter.is_none());
    }

    #[test]
    fn test_from_json() {
        let routes = RouteRecordRaw::from_json(
            r#"[{"path": "/about", "component": {"template": "about"}, "meta": {"order": 2}}]"#,
        )
        .unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].path, "/about");
        assert_eq!(routes[0].name, None);
        assert_eq!(routes[0].component, Some(json!({"template": "about"})));
        assert_eq!(routes[0].meta.get("order"), Some(&json!(2)));
    }

    #[test]
    fn test_from_json_rejects_missing_path() {
        let err = RouteRecordRaw::from_json(r#"[{"name": "nowhere"}]"#).unwrap_err();
        assert!(matches!(err, crate::NavError::RouteTable(_)));
    }

    #[test]
    fn test_compile_components() {
        let raw = RouteRecordRaw::new("/a").component("A");
        let record = RouteRecord::compile(&raw, "/a".into()).unwrap();
        assert_eq!(record.components.get(DEFAULT_VIEW), Some(&json!("A")));

        let record = RouteRecord::compile(&RouteRecordRaw::new("/b"), "/b".into()).unwrap();
        assert!(record.components.is_empty());
    }

    #[test]
    fn test_serialize_record() {
        let raw = RouteRecordRaw::new("/a").name("a").meta("k", 1);
        let record = RouteRecord::compile(&raw, "/a".into()).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, json!({"path": "/a", "name": "a", "components": {}, "meta": {"k": 1}}));
    }
}
