//! Path variables captured while resolving a request against the routing trie.

use std::collections::HashMap;

/// Represents path parameters extracted from the URL path of an HTTP request.
///
/// For a route registered as `/user/:id`, a request to `/user/42` yields a single
/// parameter `id = "42"`. Keys are unique; the map is filled once by the router and
/// is read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    inner: HashMap<String, String>,
}

impl PathParams {
    /// Creates an empty PathParams instance with no parameters
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Gets the value of a path parameter by its name
    /// Returns None if the parameter doesn't exist
    #[inline]
    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        self.inner.get(key.as_ref()).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<HashMap<String, String>> for PathParams {
    fn from(inner: HashMap<String, String>) -> Self {
        Self { inner }
    }
}
