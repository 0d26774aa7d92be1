//! Per-run memo of service responses.
//!
//! Resource files repeat themselves (the same label in several arrays, the same
//! string in several files), and a run translates the same protected fragment into
//! the same locale many times. The cache answers those repeats without a service call.

use std::collections::HashMap;

use serde::Serialize;
use tracing::trace;

use crate::{error::Error, service::TranslationService};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    text: String,
    source: String,
    target: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

/// Raw service responses keyed by (protected text, source locale, target locale).
///
/// Only successful responses are stored; a failed call is retried the next time the
/// same fragment comes up.
#[derive(Debug, Default)]
pub struct MemoCache {
    entries: HashMap<CacheKey, String>,
    stats: CacheStats,
}

impl MemoCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, text: &str, source: &str, target: &str) -> Option<&str> {
        let key = CacheKey {
            text: text.to_string(),
            source: source.to_string(),
            target: target.to_string(),
        };
        self.entries.get(&key).map(String::as_str)
    }

    /// Returns the cached response or asks `service` and remembers its answer.
    pub fn translate<S: TranslationService + ?Sized>(
        &mut self,
        service: &S,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, Error> {
        let key = CacheKey {
            text: text.to_string(),
            source: source.to_string(),
            target: target.to_string(),
        };
        if let Some(hit) = self.entries.get(&key) {
            self.stats.hits += 1;
            trace!(target_locale = target, "cache hit");
            return Ok(hit.clone());
        }
        self.stats.misses += 1;
        let translated = service.translate(text, source, target)?;
        self.entries.insert(key, translated.clone());
        Ok(translated)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
