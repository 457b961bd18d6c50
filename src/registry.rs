//! Placeholder registry - binding type -> placeholder table
//!
//! Explicitly constructed and owned; no global state. A binding type sees:
//! 1. placeholders of every capability it declared (transitively), then
//! 2. its own placeholders
//!
//! so that, after last-wins deduplication in the context, the most specific
//! registration wins.
//!
//! ```text
//!   Player ──declare_capability──▶ Entity ──declare_capability──▶ dyn Named
//!     │                              │                               │
//!   [balance]                     [health]                        [name]
//!
//!   lookup::<Player>() = [name, health, balance]
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use rustc_hash::FxHashSet;
use tracing::{debug, instrument};

use crate::clock::{Clock, SystemClock};
use crate::config::ContextConfig;
use crate::context::PlaceholderContext;
use crate::placeholder::Placeholder;

/// Stable identity of a binding type (including trait objects)
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({})", self.name)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

type Lift<T> = Arc<dyn Fn(&PlaceholderRegistry, &mut FxHashSet<TypeTag>) -> Vec<Placeholder<T>> + Send + Sync>;

/// "T satisfies S": how to pull S's placeholders up to T
struct CapabilityEdge<T: ?Sized> {
    target: TypeTag,
    lift: Lift<T>,
}

impl<T: ?Sized> Clone for CapabilityEdge<T> {
    fn clone(&self) -> Self {
        Self {
            target: self.target,
            lift: Arc::clone(&self.lift),
        }
    }
}

/// Values are `Vec<Placeholder<T>>` / `Vec<CapabilityEdge<T>>` keyed by `TypeTag::of::<T>()`
type ErasedTable = DashMap<TypeTag, Box<dyn Any + Send + Sync>>;

#[derive(Default)]
pub struct PlaceholderRegistry {
    placeholders: ErasedTable,
    capabilities: ErasedTable,
    /// Untyped mirror of `capabilities`, for hierarchy queries
    capability_targets: DashMap<TypeTag, Vec<TypeTag>>,
}

impl fmt::Debug for PlaceholderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaceholderRegistry")
            .field("types", &self.placeholders.len())
            .field("capability_sets", &self.capabilities.len())
            .finish()
    }
}

impl PlaceholderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append placeholders to `T`'s table. Duplicates accumulate.
    pub fn register<T, I>(&self, placeholders: I)
    where
        T: ?Sized + 'static,
        I: IntoIterator<Item = Placeholder<T>>,
    {
        let tag = TypeTag::of::<T>();
        let mut entry = self
            .placeholders
            .entry(tag)
            .or_insert_with(|| Box::new(Vec::<Placeholder<T>>::new()));
        if let Some(table) = entry.downcast_mut::<Vec<Placeholder<T>>>() {
            let before = table.len();
            table.extend(placeholders);
            debug!(binding = tag.name(), added = table.len() - before, "registered placeholders");
        }
    }

    pub fn register_one<T: ?Sized + 'static>(&self, placeholder: Placeholder<T>) {
        self.register(std::iter::once(placeholder));
    }

    /// Declare that binding type `T` satisfies `S` (a supertype or capability
    /// interface, possibly `dyn Trait`), reachable through `project`.
    pub fn declare_capability<T, S>(&self, project: fn(&T) -> &S)
    where
        T: ?Sized + 'static,
        S: ?Sized + 'static,
    {
        let target = TypeTag::of::<S>();
        let lift: Lift<T> = Arc::new(move |registry: &PlaceholderRegistry, seen: &mut FxHashSet<TypeTag>| {
            registry
                .collect::<S>(seen)
                .iter()
                .map(|placeholder| placeholder.project(project))
                .collect()
        });

        let mut entry = self
            .capabilities
            .entry(TypeTag::of::<T>())
            .or_insert_with(|| Box::new(Vec::<CapabilityEdge<T>>::new()));
        if let Some(edges) = entry.downcast_mut::<Vec<CapabilityEdge<T>>>() {
            if !edges.iter().any(|edge| edge.target == target) {
                edges.push(CapabilityEdge { target, lift });
                self.capability_targets
                    .entry(TypeTag::of::<T>())
                    .or_default()
                    .push(target);
                debug!(binding = std::any::type_name::<T>(), capability = target.name(), "declared capability");
            }
        }
    }

    /// Every placeholder visible to `T`, capabilities first, own table last.
    ///
    /// This order takes precedence over registration order: a placeholder
    /// registered for `T` before a capability was declared still comes after
    /// the capability's, so `T`'s own registration wins in a context.
    pub fn lookup<T: ?Sized + 'static>(&self) -> Vec<Placeholder<T>> {
        self.collect::<T>(&mut FxHashSet::default())
    }

    /// Transitive capability set of `T` (excluding `T` itself), declaration order
    pub fn capabilities<T: ?Sized + 'static>(&self) -> Vec<TypeTag> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        seen.insert(TypeTag::of::<T>());
        self.walk_capabilities(TypeTag::of::<T>(), &mut seen, &mut out);
        out
    }

    /// Check if `T` is `S` or declared (transitively) to satisfy it
    pub fn satisfies<T: ?Sized + 'static, S: ?Sized + 'static>(&self) -> bool {
        let target = TypeTag::of::<S>();
        TypeTag::of::<T>() == target || self.capabilities::<T>().contains(&target)
    }

    pub fn registered_types(&self) -> Vec<TypeTag> {
        self.placeholders.iter().map(|entry| *entry.key()).collect()
    }

    /// Fresh context for `T` with the default config and clock
    pub fn resolver_for<T: ?Sized + 'static>(&self, ttl_ticks: u32) -> Arc<PlaceholderContext<T>> {
        self.context::<T>().ttl_ticks(ttl_ticks).build()
    }

    pub fn context<T: ?Sized + 'static>(&self) -> ContextBuilder<'_, T> {
        ContextBuilder {
            registry: self,
            config: ContextConfig::default(),
            clock: Arc::new(SystemClock),
            adapters: Vec::new(),
            extra: Vec::new(),
        }
    }

    fn collect<T: ?Sized + 'static>(&self, seen: &mut FxHashSet<TypeTag>) -> Vec<Placeholder<T>> {
        let tag = TypeTag::of::<T>();
        if !seen.insert(tag) {
            return Vec::new();
        }

        // Clone out before recursing: never hold a shard guard across lifts
        let edges: Vec<CapabilityEdge<T>> = self
            .capabilities
            .get(&tag)
            .and_then(|entry| entry.downcast_ref::<Vec<CapabilityEdge<T>>>().cloned())
            .unwrap_or_default();

        let mut out = Vec::new();
        for edge in &edges {
            out.extend((edge.lift)(self, seen));
        }

        if let Some(entry) = self.placeholders.get(&tag) {
            if let Some(own) = entry.downcast_ref::<Vec<Placeholder<T>>>() {
                out.extend(own.iter().cloned());
            }
        }
        out
    }

    fn walk_capabilities(&self, tag: TypeTag, seen: &mut FxHashSet<TypeTag>, out: &mut Vec<TypeTag>) {
        let targets = self.edge_targets(tag);
        for target in targets {
            if seen.insert(target) {
                out.push(target);
                self.walk_capabilities(target, seen, out);
            }
        }
    }

    fn edge_targets(&self, tag: TypeTag) -> Vec<TypeTag> {
        self.capability_targets
            .get(&tag)
            .map(|targets| targets.clone())
            .unwrap_or_default()
    }
}

/// Source of extra placeholders for a context of `A`, built at context construction
pub trait Adapter<A: ?Sized>: Send + Sync {
    /// Binding type whose placeholders are adapted
    fn target(&self) -> TypeTag;
    fn generate(&self, registry: &PlaceholderRegistry) -> Vec<Placeholder<A>>;
}

/// Reuse `B`'s placeholders for `A` through an owned `A -> B` conversion
pub struct Transform<A: ?Sized, B> {
    convert: Arc<dyn Fn(&A) -> B + Send + Sync>,
}

impl<A: ?Sized + 'static, B: 'static> Transform<A, B> {
    pub fn new<F>(convert: F) -> Self
    where
        F: Fn(&A) -> B + Send + Sync + 'static,
    {
        Self {
            convert: Arc::new(convert),
        }
    }
}

impl<A: ?Sized + 'static, B: 'static> Adapter<A> for Transform<A, B> {
    fn target(&self) -> TypeTag {
        TypeTag::of::<B>()
    }

    fn generate(&self, registry: &PlaceholderRegistry) -> Vec<Placeholder<A>> {
        registry
            .lookup::<B>()
            .iter()
            .map(|placeholder| placeholder.adapt(Arc::clone(&self.convert)))
            .collect()
    }
}

pub struct ContextBuilder<'r, T: ?Sized> {
    registry: &'r PlaceholderRegistry,
    config: ContextConfig,
    clock: Arc<dyn Clock>,
    adapters: Vec<Box<dyn Adapter<T>>>,
    extra: Vec<Placeholder<T>>,
}

impl<'r, T: ?Sized + 'static> ContextBuilder<'r, T> {
    pub fn ttl_ticks(mut self, ttl_ticks: u32) -> Self {
        self.config.ttl_ticks = ttl_ticks;
        self
    }

    pub fn config(mut self, config: ContextConfig) -> Self {
        self.config = config;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn transform<B: 'static>(self, transform: Transform<T, B>) -> Self {
        self.adapter(transform)
    }

    pub fn adapter(mut self, adapter: impl Adapter<T> + 'static) -> Self {
        self.adapters.push(Box::new(adapter));
        self
    }

    /// Context-local placeholder, applied after everything from the registry
    pub fn placeholder(mut self, placeholder: Placeholder<T>) -> Self {
        self.extra.push(placeholder);
        self
    }

    #[instrument(skip(self), fields(binding = std::any::type_name::<T>()))]
    pub fn build(self) -> Arc<PlaceholderContext<T>> {
        let mut placeholders = self.registry.lookup::<T>();
        for adapter in &self.adapters {
            let generated = adapter.generate(self.registry);
            debug!(target_type = adapter.target().name(), generated = generated.len(), "applied transform");
            placeholders.extend(generated);
        }
        placeholders.extend(self.extra);

        Arc::new(PlaceholderContext::new(placeholders, self.config, self.clock))
    }
}
