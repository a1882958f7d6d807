//! Navigation targets and query values.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::name::RouteName;

/// Decoded route params, keyed by capture name.
pub type Params = IndexMap<String, String>;

/// Query mapping, in order of first appearance.
pub type Query = IndexMap<String, QueryValue>;

/// A query value: a key seen once holds a single string, a repeated key holds
/// every value in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    /// A key that appeared once.
    Single(String),
    /// A key that appeared more than once.
    Multiple(Vec<String>),
}

impl QueryValue {
    /// Returns the value when the key appeared exactly once.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Single(s) => Some(s),
            Self::Multiple(_) => None,
        }
    }

    /// Iterates over every value of the key.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let values: &[String] = match self {
            Self::Single(s) => std::slice::from_ref(s),
            Self::Multiple(v) => v,
        };
        values.iter().map(String::as_str)
    }

    /// Appends another occurrence, turning a single value into a list.
    pub fn push(&mut self, value: String) {
        match self {
            Self::Single(first) => {
                let first = std::mem::take(first);
                *self = Self::Multiple(vec![first, value]);
            }
            Self::Multiple(values) => values.push(value),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(s: &str) -> Self {
        Self::Single(s.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(s: String) -> Self {
        Self::Single(s)
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multiple(values)
    }
}

impl From<Vec<&str>> for QueryValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Multiple(values.into_iter().map(str::to_string).collect())
    }
}

/// A structured navigation target.
///
/// `path` takes precedence over `name`; with neither set, the target reuses
/// the current route's path.
///
/// ```
/// use oxide_nav::RouteLocation;
///
/// let by_name = RouteLocation::named("user").param("id", 42).query("tab", "posts");
/// let by_path = RouteLocation::path("/users/42").hash("#top");
/// assert_eq!(by_name.params.get("id").map(String::as_str), Some("42"));
/// assert_eq!(by_path.hash, "#top");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteLocation {
    /// Literal path, used verbatim when non-empty.
    pub path: Option<String>,
    /// Name of a declared route, used when `path` is not set.
    pub name: Option<RouteName>,
    /// Values substituted for `:key` tokens of a named route.
    pub params: Params,
    /// Query mapping.
    pub query: Query,
    /// Hash, including the leading `#`.
    pub hash: String,
    /// Turns a `push` into a `replace`.
    pub replace: bool,
}

impl RouteLocation {
    /// Creates an empty target that resolves against the current path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a target for a literal path.
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Creates a target for a named route.
    pub fn named(name: impl Into<RouteName>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Sets a param for a named route.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    /// Adds a query value; repeating a key builds a list.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.query.get_mut(&key) {
            Some(existing) => existing.push(value),
            None => {
                self.query.insert(key, QueryValue::Single(value));
            }
        }
        self
    }

    /// Sets the hash.
    #[must_use]
    pub fn hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = hash.into();
        self
    }

    /// Marks the target as a replacement of the current history entry.
    #[must_use]
    pub fn replace(mut self) -> Self {
        self.replace = true;
        self
    }
}

/// Anything a navigation can target: a raw location string or a structured
/// [`RouteLocation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteLocationRaw {
    /// A location string such as `/search?q=rust#results`.
    Str(String),
    /// A structured target.
    Location(RouteLocation),
}

impl RouteLocationRaw {
    /// Returns whether the target asks to replace the current entry.
    pub fn is_replace(&self) -> bool {
        matches!(self, Self::Location(loc) if loc.replace)
    }
}

impl From<&str> for RouteLocationRaw {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for RouteLocationRaw {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&String> for RouteLocationRaw {
    fn from(s: &String) -> Self {
        Self::Str(s.clone())
    }
}

impl From<RouteLocation> for RouteLocationRaw {
    fn from(loc: RouteLocation) -> Self {
        Self::Location(loc)
    }
}
