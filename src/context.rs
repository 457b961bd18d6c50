//! Resolution context - active placeholders + TTL-gated value cache
//!
//! One context per binding type (and transform set). Items created from the
//! same context share its cache, so two items showing `%coins_total%` inside
//! one TTL window cost a single resolver call.
//!
//! Cache entries are keyed by the full token (`coins_total`), never by the
//! identifier (`coins`). Per token:
//! - cached and (fresh or const): reuse, resolver not called
//! - recomputed, same value: refresh timestamp only, batch not updated
//! - recomputed, new value: store, batch updated
//! - resolver failed: last good value (or the raw token) until one TTL
//!   window after the failure, then retried

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use crate::clock::Clock;
use crate::config::ContextConfig;
use crate::display::Composite;
use crate::item::{CompositeItem, LiteralItem, TreeItem};
use crate::placeholder::Placeholder;
use crate::text::Component;
use crate::token;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    computed_at: Instant,
    accessed_at: Instant,
    is_const: bool,
}

/// Output of one resolution batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// token -> value, for every token with a registered identifier
    pub values: FxHashMap<String, String>,
    /// True iff some token's value differs from its previous cached value
    pub updated: bool,
}

pub struct PlaceholderContext<T: ?Sized> {
    placeholders: DashMap<Arc<str>, Placeholder<T>>,
    config: ContextConfig,
    clock: Arc<dyn Clock>,
    cache: DashMap<String, CacheEntry>,
    /// token -> instant of its last failed resolution
    failures: DashMap<String, Instant>,
    last_sweep: Mutex<Instant>,
}

impl<T: ?Sized> fmt::Debug for PlaceholderContext<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaceholderContext")
            .field("binding", &std::any::type_name::<T>())
            .field("placeholders", &self.placeholders.len())
            .field("cached", &self.cache.len())
            .field("config", &self.config)
            .finish()
    }
}

impl<T: ?Sized + 'static> PlaceholderContext<T> {
    /// Build from an ordered list; a repeated identifier keeps the last one
    pub fn new(
        placeholders: impl IntoIterator<Item = Placeholder<T>>,
        config: ContextConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let context = Self {
            placeholders: DashMap::new(),
            config,
            last_sweep: Mutex::new(clock.now()),
            clock,
            cache: DashMap::new(),
            failures: DashMap::new(),
        };
        context.add_placeholders(placeholders);
        debug!(
            binding = std::any::type_name::<T>(),
            placeholders = context.placeholders.len(),
            ttl = ?context.config.ttl(),
            "created placeholder context"
        );
        context
    }

    pub fn add_placeholder(&self, placeholder: Placeholder<T>) {
        self.placeholders
            .insert(Arc::from(placeholder.identifier()), placeholder);
    }

    pub fn add_placeholders(&self, placeholders: impl IntoIterator<Item = Placeholder<T>>) {
        for placeholder in placeholders {
            self.add_placeholder(placeholder);
        }
    }

    pub fn placeholder(&self, identifier: &str) -> Option<Placeholder<T>> {
        self.placeholders.get(identifier).map(|entry| entry.value().clone())
    }

    pub fn is_registered(&self, identifier: &str) -> bool {
        self.placeholders.contains_key(identifier)
    }

    /// Active identifiers, sorted
    pub fn identifiers(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .placeholders
            .iter()
            .map(|entry| entry.key().to_string())
            .collect();
        ids.sort();
        ids
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Check if `token` currently holds a cached value
    pub fn is_cached(&self, token: &str) -> bool {
        self.cache.contains_key(token)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        self.failures.clear();
    }

    fn failed_within(&self, token: &str, now: Instant, ttl: Duration) -> bool {
        self.failures
            .get(token)
            .is_some_and(|failed_at| now.saturating_duration_since(*failed_at) < ttl)
    }

    /// Keep only tokens whose identifier is active here, in first-seen order
    pub(crate) fn registered_tokens<'s>(&self, tokens: impl IntoIterator<Item = &'s str>) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for token in tokens {
            if self.is_registered(token::identifier(token)) && !out.iter().any(|t| t == token) {
                out.push(token.to_string());
            }
        }
        out
    }

    /// Resolve `tokens` against `binding`, reusing fresh cache entries
    pub fn generate_result(&self, binding: &T, tokens: &[String]) -> Resolution {
        let now = self.clock.now();
        let ttl = self.config.ttl();
        let mut resolution = Resolution::default();

        for token in tokens {
            let identifier = token::identifier(token);
            let Some(placeholder) = self.placeholder(identifier) else {
                continue;
            };

            let previous = match self.cache.get_mut(token.as_str()) {
                Some(mut entry) => {
                    entry.accessed_at = now;
                    if placeholder.is_const() || now.saturating_duration_since(entry.computed_at) < ttl {
                        resolution.values.insert(token.clone(), entry.value.clone());
                        continue;
                    }
                    Some(entry.value.clone())
                }
                None => None,
            };

            if self.failed_within(token, now, ttl) {
                trace!(token = %token, "failed recently, retry deferred");
                if let Some(previous) = previous {
                    resolution.values.insert(token.clone(), previous);
                }
                continue;
            }

            let value = match placeholder.apply(binding, token) {
                Ok(value) => {
                    self.failures.remove(token.as_str());
                    value
                }
                Err(err) => {
                    warn!(token = %token, error = %err, "placeholder resolution failed");
                    // Last good value stays visible; retried one TTL window later
                    self.failures.insert(token.clone(), now);
                    if let Some(previous) = previous {
                        resolution.values.insert(token.clone(), previous);
                    }
                    continue;
                }
            };

            if previous.as_deref() == Some(value.as_str()) {
                if let Some(mut entry) = self.cache.get_mut(token.as_str()) {
                    entry.computed_at = now;
                }
                trace!(token = %token, "recomputed, unchanged");
            } else {
                trace!(token = %token, "recomputed, changed");
                self.cache.insert(
                    token.clone(),
                    CacheEntry {
                        value: value.clone(),
                        computed_at: now,
                        accessed_at: now,
                        is_const: placeholder.is_const(),
                    },
                );
                resolution.updated = true;
            }
            resolution.values.insert(token.clone(), value);
        }

        self.maybe_sweep(now);
        resolution
    }

    /// Evict non-const entries not read within the sweep window.
    /// Returns the number of evicted entries; no-op without `sweep_after`.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        *self.last_sweep.lock() = now;
        self.sweep_at(now)
    }

    fn sweep_at(&self, now: Instant) -> usize {
        let Some(window) = self.config.sweep_window() else {
            return 0;
        };
        let before = self.cache.len();
        self.cache
            .retain(|_, entry| entry.is_const || now.saturating_duration_since(entry.accessed_at) < window);
        self.failures
            .retain(|_, failed_at| now.saturating_duration_since(*failed_at) < window);
        let evicted = before.saturating_sub(self.cache.len());
        if evicted > 0 {
            debug!(evicted, remaining = self.cache.len(), "swept placeholder cache");
        }
        evicted
    }

    fn maybe_sweep(&self, now: Instant) {
        let Some(window) = self.config.sweep_window() else {
            return;
        };
        let due = {
            let mut last = self.last_sweep.lock();
            if now.saturating_duration_since(*last) >= window {
                *last = now;
                true
            } else {
                false
            }
        };
        if due {
            self.sweep_at(now);
        }
    }

    pub fn create_literal(self: &Arc<Self>, binding: &T, literal: impl Into<String>) -> LiteralItem<T> {
        LiteralItem::new(Arc::clone(self), binding, literal.into())
    }

    pub fn create_tree(self: &Arc<Self>, binding: &T, component: Component) -> TreeItem<T> {
        TreeItem::new(Arc::clone(self), binding, Arc::new(component))
    }

    pub fn create_composite<C: Composite>(self: &Arc<Self>, binding: &T, composite: C) -> CompositeItem<T, C> {
        CompositeItem::new(Arc::clone(self), binding, Arc::new(composite))
    }
}
