//! Convenience builder for request query parameters.
//!
//! Collects key/value pairs for [`crate::client::CloudClient::call`], which
//! percent-encodes them onto the request URL. The `depth` parameter controls
//! how many levels of nested sub-resources the server embeds and is passed
//! through unmodified; when a caller supplies none, the client appends
//! `depth=0`.

use std::fmt::Display;

/// Name of the embedding-depth parameter.
pub const DEPTH: &str = "depth";

/// Builder for assembling query parameter pairs.
#[derive(Debug, Default, Clone)]
pub struct QueryParams {
    pairs: Vec<(&'static str, String)>,
}

impl QueryParams {
    /// Create a new, empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Builder for a paged collection request.
    #[must_use]
    pub fn paged(depth: u32, offset: u32, limit: u32) -> Self {
        let mut params = Self::new();
        params.push(DEPTH, depth);
        params.push("offset", offset);
        params.push("limit", limit);
        params
    }

    /// Builder carrying only a depth.
    #[must_use]
    pub fn depth(depth: u32) -> Self {
        let mut params = Self::new();
        params.push(DEPTH, depth);
        params
    }

    /// Append a required key/value pair.
    pub fn push<T>(&mut self, key: &'static str, value: T)
    where
        T: Display,
    {
        self.pairs.push((key, value.to_string()));
    }

    /// Append a key/value pair when the value is present.
    pub fn push_opt<T>(&mut self, key: &'static str, value: Option<T>)
    where
        T: Display,
    {
        if let Some(value) = value {
            self.push(key, value);
        }
    }

    /// True when a pair with this key has been added.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| *k == key)
    }

    /// Returns true if no parameters have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Borrow the collected pairs.
    #[must_use]
    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.pairs
    }
}
