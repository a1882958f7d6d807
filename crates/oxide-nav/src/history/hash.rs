//! Hash-fragment history.

use super::web::{BrowserApi, WebHistory};

/// Creates a browser history that keeps the router location after `#`.
///
/// `base` defaults to the current document path; the `#` is always appended,
/// so `/app` produces URLs like `/app#/users`.
pub fn hash_history<B: BrowserApi + 'static>(api: B, base: Option<&str>) -> WebHistory<B> {
    let base = format!("{}#", base.unwrap_or_default());
    WebHistory::new(api, Some(&base))
}
