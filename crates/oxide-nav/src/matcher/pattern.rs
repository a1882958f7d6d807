//! Path pattern compilation.

use regex::Regex;

use crate::error::{NavError, Result};
use crate::location::Params;

/// Capture name used for `*` wildcards.
pub const WILDCARD_PARAM: &str = "pathMatch";

/// A segment of a declared path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathToken {
    /// Literal text, matched exactly.
    Literal(String),
    /// A `:name` param (one or more characters other than `/`).
    Param(String),
    /// A `*` wildcard (any characters, including `/`).
    Wildcard,
}

/// A compiled path pattern for matching locations.
#[derive(Debug, Clone)]
pub struct PathPattern {
    /// The declared path.
    path: String,
    /// Parsed tokens.
    tokens: Vec<PathToken>,
    /// Compiled regex for matching.
    regex: Regex,
    /// Capture names in order.
    param_names: Vec<String>,
}

impl PathPattern {
    /// Compiles a declared path.
    ///
    /// Pattern syntax:
    /// - `/users` - literal path, also matching `/users/`
    /// - `/users/:id` - param capturing a single segment
    /// - `/files/*` - wildcard captured as `pathMatch`
    ///
    /// # Example
    ///
    /// ```
    /// use oxide_nav::PathPattern;
    ///
    /// let pattern = PathPattern::new("/posts/:id/comments/:comment_id").unwrap();
    /// let params = pattern.match_path("/posts/123/comments/456").unwrap();
    /// assert_eq!(params.get("id").map(String::as_str), Some("123"));
    /// assert_eq!(params.get("comment_id").map(String::as_str), Some("456"));
    /// ```
    pub fn new(path: &str) -> Result<Self> {
        let tokens = tokenize(path);
        let mut param_names = Vec::new();
        let mut regex_str = String::from("^");

        for token in &tokens {
            match token {
                PathToken::Literal(text) => regex_str.push_str(&regex::escape(text)),
                PathToken::Param(name) => {
                    param_names.push(name.clone());
                    regex_str.push_str("([^/]+)");
                }
                PathToken::Wildcard => {
                    param_names.push(WILDCARD_PARAM.to_string());
                    regex_str.push_str("(.*)");
                }
            }
        }

        // `*` already consumes any trailing slash.
        if !path.ends_with('*') {
            regex_str.push_str("/?");
        }
        regex_str.push('$');

        let regex = Regex::new(&regex_str).map_err(|source| NavError::InvalidPattern {
            path: path.to_string(),
            source,
        })?;

        Ok(Self {
            path: path.to_string(),
            tokens,
            regex,
            param_names,
        })
    }

    /// Attempts to match a path against this pattern.
    ///
    /// Returns the raw, still percent-encoded captures if the path matches.
    pub fn match_path(&self, path: &str) -> Option<Params> {
        let caps = self.regex.captures(path)?;

        let mut params = Params::new();

        for (i, name) in self.param_names.iter().enumerate() {
            if let Some(value) = caps.get(i + 1) {
                params.insert(name.clone(), value.as_str().to_string());
            }
        }

        Some(params)
    }

    /// Returns the declared path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the compiled regex source.
    pub fn as_regex(&self) -> &str {
        self.regex.as_str()
    }

    /// Returns the parsed tokens.
    pub fn tokens(&self) -> &[PathToken] {
        &self.tokens
    }

    /// Returns the capture names.
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn tokenize(path: &str) -> Vec<PathToken> {
    let bytes = path.as_bytes();
    let mut tokens = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    let flush = |tokens: &mut Vec<PathToken>, start: usize, end: usize| {
        if start < end {
            tokens.push(PathToken::Literal(path[start..end].to_string()));
        }
    };

    while i < bytes.len() {
        match bytes[i] {
            b':' => {
                let name_len = bytes[i + 1..].iter().take_while(|b| is_ident_byte(**b)).count();
                if name_len == 0 {
                    i += 1;
                    continue;
                }
                flush(&mut tokens, literal_start, i);
                tokens.push(PathToken::Param(path[i + 1..i + 1 + name_len].to_string()));
                i += 1 + name_len;
                literal_start = i;
            }
            b'*' => {
                flush(&mut tokens, literal_start, i);
                tokens.push(PathToken::Wildcard);
                i += 1;
                literal_start = i;
            }
            _ => i += 1,
        }
    }
    flush(&mut tokens, literal_start, bytes.len());

    tokens
}
