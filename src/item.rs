//! Tracked items - an original value, its tokens, and the last render
//!
//! States:
//! - Static: no registered token found; never recomputes
//! - Fresh: last update produced the same render (`was_updated == false`)
//! - Updated: last update changed the render
//!
//! The first pass runs at construction and always materializes the render.
//! Afterwards a rebuild happens only when the resolved values moved.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::context::PlaceholderContext;
use crate::display::Composite;
use crate::text::Component;
use crate::token;

/// A render and whether it differs from the previous one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered<V> {
    pub value: V,
    pub was_updated: bool,
}

impl<V> Rendered<V> {
    fn unchanged(value: V) -> Self {
        Self {
            value,
            was_updated: false,
        }
    }
}

pub trait Item<T: ?Sized> {
    type Value;

    fn latest(&self) -> &Rendered<Self::Value>;

    fn is_static(&self) -> bool;

    /// Re-resolve against `binding`. Any binding instance may be passed; the
    /// token set found at construction is reused.
    fn try_update(&mut self, binding: &T) -> &Rendered<Self::Value>;
}

/// Token list plus the values the owning item last rendered with
struct Tracker<T: ?Sized> {
    context: Arc<PlaceholderContext<T>>,
    tokens: Vec<String>,
    rendered_with: FxHashMap<String, String>,
}

impl<T: ?Sized + 'static> Tracker<T> {
    fn new<'s>(context: Arc<PlaceholderContext<T>>, found: impl IntoIterator<Item = &'s str>) -> Self {
        let tokens = context.registered_tokens(found);
        Self {
            context,
            tokens,
            rendered_with: FxHashMap::default(),
        }
    }

    /// Values to rebuild with, or `None` when the render cannot have changed.
    ///
    /// Besides the batch flag, values are compared with what this item last
    /// used: another item sharing the context may already have pulled a new
    /// value into the cache, in which case the batch reports no change here.
    fn poll(&mut self, binding: &T, first_time: bool) -> Option<&FxHashMap<String, String>> {
        let resolution = self.context.generate_result(binding, &self.tokens);
        if !first_time && !resolution.updated && resolution.values == self.rendered_with {
            return None;
        }
        self.rendered_with = resolution.values;
        Some(&self.rendered_with)
    }
}

pub struct LiteralItem<T: ?Sized> {
    original: String,
    tracker: Tracker<T>,
    latest: Rendered<String>,
}

impl<T: ?Sized + 'static> LiteralItem<T> {
    pub(crate) fn new(context: Arc<PlaceholderContext<T>>, binding: &T, original: String) -> Self {
        let tracker = Tracker::new(context, token::find_tokens(&original));
        let mut item = Self {
            latest: Rendered::unchanged(original.clone()),
            original,
            tracker,
        };
        if !item.is_static() {
            item.apply(binding, true);
        }
        item
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn tokens(&self) -> &[String] {
        &self.tracker.tokens
    }

    fn apply(&mut self, binding: &T, first_time: bool) {
        match self.tracker.poll(binding, first_time) {
            Some(values) => {
                let value = token::substitute(&self.original, values).into_owned();
                let was_updated = value != self.latest.value;
                self.latest = Rendered { value, was_updated };
            }
            None => self.latest.was_updated = false,
        }
    }
}

impl<T: ?Sized + 'static> Item<T> for LiteralItem<T> {
    type Value = String;

    fn latest(&self) -> &Rendered<String> {
        &self.latest
    }

    fn is_static(&self) -> bool {
        self.tracker.tokens.is_empty()
    }

    fn try_update(&mut self, binding: &T) -> &Rendered<String> {
        if !self.is_static() {
            self.apply(binding, false);
        }
        &self.latest
    }
}

pub struct TreeItem<T: ?Sized> {
    original: Arc<Component>,
    tracker: Tracker<T>,
    latest: Rendered<Arc<Component>>,
}

impl<T: ?Sized + 'static> TreeItem<T> {
    pub(crate) fn new(context: Arc<PlaceholderContext<T>>, binding: &T, original: Arc<Component>) -> Self {
        let found = original.find_placeholders();
        let tracker = Tracker::new(context, found.iter().map(String::as_str));
        let mut item = Self {
            latest: Rendered::unchanged(Arc::clone(&original)),
            original,
            tracker,
        };
        if !item.is_static() {
            item.apply(binding, true);
        }
        item
    }

    pub fn original(&self) -> &Arc<Component> {
        &self.original
    }

    pub fn tokens(&self) -> &[String] {
        &self.tracker.tokens
    }

    fn apply(&mut self, binding: &T, first_time: bool) {
        match self.tracker.poll(binding, first_time) {
            Some(values) => {
                let value = self.original.replace_placeholders(values);
                let was_updated = value != *self.latest.value;
                self.latest = Rendered {
                    value: Arc::new(value),
                    was_updated,
                };
            }
            None => self.latest.was_updated = false,
        }
    }
}

impl<T: ?Sized + 'static> Item<T> for TreeItem<T> {
    type Value = Arc<Component>;

    fn latest(&self) -> &Rendered<Arc<Component>> {
        &self.latest
    }

    fn is_static(&self) -> bool {
        self.tracker.tokens.is_empty()
    }

    fn try_update(&mut self, binding: &T) -> &Rendered<Arc<Component>> {
        if !self.is_static() {
            self.apply(binding, false);
        }
        &self.latest
    }
}

/// Name and description lines tracked independently; the composite itself
/// is only cloned when at least one of them changed.
pub struct CompositeItem<T: ?Sized, C> {
    original: Arc<C>,
    name: Option<TreeItem<T>>,
    description: Option<Vec<TreeItem<T>>>,
    has_name_placeholders: bool,
    has_description_placeholders: bool,
    latest: Rendered<Arc<C>>,
}

impl<T: ?Sized + 'static, C: Composite> CompositeItem<T, C> {
    pub(crate) fn new(context: Arc<PlaceholderContext<T>>, binding: &T, original: Arc<C>) -> Self {
        let name = original
            .display_name()
            .map(|name| TreeItem::new(Arc::clone(&context), binding, Arc::new(name.clone())));
        let description = original.description().map(|lines| {
            lines
                .iter()
                .map(|line| TreeItem::new(Arc::clone(&context), binding, Arc::new(line.clone())))
                .collect::<Vec<_>>()
        });

        let has_name_placeholders = name.as_ref().is_some_and(|item| !item.is_static());
        let has_description_placeholders = description
            .as_ref()
            .is_some_and(|lines| lines.iter().any(|item| !item.is_static()));

        let mut item = Self {
            latest: Rendered::unchanged(Arc::clone(&original)),
            original,
            name,
            description,
            has_name_placeholders,
            has_description_placeholders,
        };

        if !item.is_static() {
            let name_updated = item.has_name_placeholders
                && item.name.as_ref().is_some_and(|n| n.latest().was_updated);
            let description_updated = item.has_description_placeholders
                && item
                    .description
                    .as_ref()
                    .is_some_and(|lines| lines.iter().any(|l| l.latest().was_updated));
            if name_updated || description_updated {
                item.latest = Rendered {
                    value: Arc::new(item.rebuild()),
                    was_updated: true,
                };
            }
        }
        item
    }

    pub fn original(&self) -> &Arc<C> {
        &self.original
    }

    pub fn name_item(&self) -> Option<&TreeItem<T>> {
        self.name.as_ref()
    }

    pub fn description_items(&self) -> Option<&[TreeItem<T>]> {
        self.description.as_deref()
    }

    pub fn has_name_placeholders(&self) -> bool {
        self.has_name_placeholders
    }

    pub fn has_description_placeholders(&self) -> bool {
        self.has_description_placeholders
    }

    fn rebuild(&self) -> C {
        let name = self.name.as_ref().map(|n| Component::clone(&n.latest().value));
        let description = self.description.as_ref().map(|lines| {
            lines
                .iter()
                .map(|line| Component::clone(&line.latest().value))
                .collect()
        });
        self.original.with_display(name, description)
    }
}

impl<T: ?Sized + 'static, C: Composite> Item<T> for CompositeItem<T, C> {
    type Value = Arc<C>;

    fn latest(&self) -> &Rendered<Arc<C>> {
        &self.latest
    }

    fn is_static(&self) -> bool {
        !self.has_name_placeholders && !self.has_description_placeholders
    }

    fn try_update(&mut self, binding: &T) -> &Rendered<Arc<C>> {
        if self.is_static() {
            return &self.latest;
        }

        let mut name_updated = false;
        if self.has_name_placeholders {
            if let Some(name) = self.name.as_mut() {
                name_updated = name.try_update(binding).was_updated;
            }
        }

        let mut description_updated = false;
        if self.has_description_placeholders {
            if let Some(lines) = self.description.as_mut() {
                for line in lines.iter_mut() {
                    // every line must tick, no short-circuit
                    description_updated |= line.try_update(binding).was_updated;
                }
            }
        }

        if name_updated || description_updated {
            self.latest = Rendered {
                value: Arc::new(self.rebuild()),
                was_updated: true,
            };
        } else {
            self.latest.was_updated = false;
        }
        &self.latest
    }
}
