//! Per-route render-tree cache.
//!
//! An explicitly constructed object the embedding server builds once at
//! startup and injects into its request path, rather than a process-wide
//! mutable map. Routes register either as exact paths or as URL regex
//! patterns; exact entries win over patterns, and patterns match in
//! registration order.

use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use gesso_fresco::SsrRenderTree;
use regex::Regex;
use tracing::debug;

#[derive(Default)]
pub struct RouteCache {
    exact: DashMap<String, Arc<SsrRenderTree>>,
    patterns: RwLock<Vec<(Regex, Arc<SsrRenderTree>)>>,
}

impl RouteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a tree for an exact request path, replacing any previous entry
    pub fn insert(&self, path: impl Into<String>, tree: SsrRenderTree) {
        let path = path.into();
        debug!(%path, "caching render tree");
        self.exact.insert(path, Arc::new(tree));
    }

    /// Record a tree for every path the pattern matches
    pub fn insert_pattern(&self, pattern: Regex, tree: SsrRenderTree) {
        debug!(pattern = %pattern.as_str(), "caching render tree");
        // A poisoned lock cannot leave the Vec half-written; keep serving
        let mut patterns = self
            .patterns
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        patterns.push((pattern, Arc::new(tree)));
    }

    /// Cached tree for a request path, if any
    pub fn lookup(&self, path: &str) -> Option<Arc<SsrRenderTree>> {
        if let Some(tree) = self.exact.get(path) {
            return Some(tree.clone());
        }
        let patterns = self
            .patterns
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        patterns
            .iter()
            .find(|(pattern, _)| pattern.is_match(path))
            .map(|(_, tree)| tree.clone())
    }

    /// Drop the exact entry for a path, e.g. after a failed optimization
    pub fn remove(&self, path: &str) {
        self.exact.remove(path);
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
            && self
                .patterns
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .is_empty()
    }
}
