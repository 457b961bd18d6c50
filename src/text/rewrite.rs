//! Structure-preserving tree rewrites
//!
//! Three algorithms share one traversal skeleton:
//! - [`replace_placeholders_with`]: every string goes through an updater fn
//! - [`replace_placeholders`]: exact `%token%` -> value map, no resolver calls
//! - [`replace_with`]: literal substrings spliced out for whole sub-trees
//!
//! The strings a rewrite may touch are: text content, the insertion string,
//! and (recursively) the `show_text` tooltip tree. Everything else is copied.

use std::borrow::Cow;
use std::collections::BTreeSet;

use regex::Regex;
use rustc_hash::FxHashMap;

use crate::error::ReplaceError;
use crate::token::{self, PLACEHOLDER_RE};

use super::component::{Component, Content, HoverEvent, Style};

/// String transformation applied by the shared traversal
pub trait TextMapper {
    fn map<'s>(&mut self, text: &'s str) -> Cow<'s, str>;
}

/// Updater function adapter
struct FnMapper<F>(F);

impl<F> TextMapper for FnMapper<F>
where
    F: FnMut(&str) -> String,
{
    fn map<'s>(&mut self, text: &'s str) -> Cow<'s, str> {
        Cow::Owned((self.0)(text))
    }
}

/// Exact token map adapter
struct ValueMapper<'v, V>(&'v FxHashMap<String, V>);

impl<V: AsRef<str>> TextMapper for ValueMapper<'_, V> {
    fn map<'s>(&mut self, text: &'s str) -> Cow<'s, str> {
        token::substitute(text, self.0)
    }
}

/// Rebuild `component` bottom-up with every touchable string mapped
pub fn map_text<M: TextMapper + ?Sized>(component: &Component, mapper: &mut M) -> Component {
    let style = map_style(&component.style, mapper);
    let content = match &component.content {
        Content::Text { text } => Content::Text {
            text: mapper.map(text).into_owned(),
        },
        other => other.clone(),
    };
    let children = component
        .children
        .iter()
        .map(|child| map_text(child, mapper))
        .collect();

    Component {
        content,
        style,
        children,
    }
}

fn map_style<M: TextMapper + ?Sized>(style: &Style, mapper: &mut M) -> Style {
    let hover = style.hover.as_ref().map(|hover| match hover {
        HoverEvent::ShowText(tooltip) => HoverEvent::ShowText(Box::new(map_text(tooltip, mapper))),
        other => other.clone(),
    });
    let insertion = style
        .insertion
        .as_deref()
        .map(|insertion| mapper.map(insertion).into_owned());

    style.restyle(hover, insertion)
}

/// Visit every touchable string; stops early when `visit` returns `true`
fn any_text<F>(component: &Component, visit: &mut F) -> bool
where
    F: FnMut(&str) -> bool,
{
    if let Some(text) = component.text_content() {
        if visit(text) {
            return true;
        }
    }
    if let Some(insertion) = component.style.insertion.as_deref() {
        if visit(insertion) {
            return true;
        }
    }
    if let Some(tooltip) = component.style.hover_text() {
        if any_text(tooltip, visit) {
            return true;
        }
    }
    component.children.iter().any(|child| any_text(child, visit))
}

/// Collect every token in the tree (content, insertion and tooltips)
pub fn find_placeholders(component: &Component) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    any_text(component, &mut |text| {
        found.extend(token::find_tokens(text).map(str::to_string));
        false
    });
    found
}

pub fn contains_placeholder(component: &Component) -> bool {
    any_text(component, &mut |text| token::has_placeholder(text))
}

/// Substitution by function: each touchable string is passed through `updater`
pub fn replace_placeholders_with<F>(component: &Component, updater: F) -> Component
where
    F: FnMut(&str) -> String,
{
    map_text(component, &mut FnMapper(updater))
}

/// Substitution by exact map: `%token%` -> `values[token]`, unknown tokens kept
pub fn replace_placeholders<V: AsRef<str>>(
    component: &Component,
    values: &FxHashMap<String, V>,
) -> Component {
    map_text(component, &mut ValueMapper(values))
}

type Maker<'f> = Box<dyn Fn() -> Component + 'f>;

/// Builder for a [`Splice`]
#[derive(Default)]
pub struct SpliceBuilder<'f> {
    entries: Vec<(String, Maker<'f>)>,
}

impl<'f> SpliceBuilder<'f> {
    /// Replace every occurrence of `literal` by a fresh `make()` sub-tree.
    /// Empty literals are ignored; a repeated literal keeps its first maker.
    pub fn with(mut self, literal: impl Into<String>, make: impl Fn() -> Component + 'f) -> Self {
        let literal = literal.into();
        if !literal.is_empty() && !self.entries.iter().any(|(key, _)| *key == literal) {
            self.entries.push((literal, Box::new(make)));
        }
        self
    }

    pub fn build(self) -> Result<Splice<'f>, ReplaceError> {
        let matcher = if self.entries.is_empty() {
            None
        } else {
            let pattern = self
                .entries
                .iter()
                .map(|(key, _)| regex::escape(key))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&pattern)?)
        };

        let mut index = FxHashMap::default();
        let mut makers = Vec::with_capacity(self.entries.len());
        for (i, (key, make)) in self.entries.into_iter().enumerate() {
            index.insert(key, i);
            makers.push(make);
        }

        Ok(Splice {
            matcher,
            index,
            makers,
        })
    }
}

/// Compiled literal-substring -> sub-tree table.
///
/// Matching is leftmost-first: at a given position the literal registered
/// first wins, and matches never overlap.
pub struct Splice<'f> {
    matcher: Option<Regex>,
    index: FxHashMap<String, usize>,
    makers: Vec<Maker<'f>>,
}

impl<'f> Splice<'f> {
    pub fn builder() -> SpliceBuilder<'f> {
        SpliceBuilder::default()
    }

    pub fn is_empty(&self) -> bool {
        self.makers.is_empty()
    }

    fn make(&self, literal: &str) -> Option<Component> {
        self.index.get(literal).map(|&i| (self.makers[i])())
    }
}

/// Splice by exact substring match.
///
/// A text node `"Hello NAME!"` with style `S` becomes `"Hello "` (style `S`)
/// followed by children `[make(NAME), "!" (style S), ..original children]`.
pub fn replace_with(component: &Component, splice: &Splice<'_>) -> Component {
    match &splice.matcher {
        Some(matcher) => splice_node(component, matcher, splice),
        None => component.clone(),
    }
}

fn splice_node(component: &Component, matcher: &Regex, splice: &Splice<'_>) -> Component {
    let hover = component.style.hover.as_ref().map(|hover| match hover {
        HoverEvent::ShowText(tooltip) => {
            HoverEvent::ShowText(Box::new(splice_node(tooltip, matcher, splice)))
        }
        other => other.clone(),
    });
    let style = component
        .style
        .restyle(hover, component.style.insertion.clone());

    let mut children = Vec::with_capacity(component.children.len());
    let content = match &component.content {
        Content::Text { text } => {
            let mut head: Option<&str> = None;
            let mut last = 0;

            for m in matcher.find_iter(text) {
                let before = &text[last..m.start()];
                if head.is_none() {
                    head = Some(before);
                } else if !before.is_empty() {
                    children.push(fragment(before, &style));
                }
                if let Some(inserted) = splice.make(m.as_str()) {
                    children.push(inserted);
                }
                last = m.end();
            }

            match head {
                Some(head) => {
                    let tail = &text[last..];
                    if !tail.is_empty() {
                        children.push(fragment(tail, &style));
                    }
                    Content::Text {
                        text: head.to_string(),
                    }
                }
                None => component.content.clone(),
            }
        }
        other => other.clone(),
    };

    children.extend(
        component
            .children
            .iter()
            .map(|child| splice_node(child, matcher, splice)),
    );

    Component {
        content,
        style,
        children,
    }
}

fn fragment(text: &str, style: &Style) -> Component {
    Component::text(text).with_style(style.clone())
}

impl Component {
    pub fn find_placeholders(&self) -> BTreeSet<String> {
        find_placeholders(self)
    }

    pub fn contains_placeholder(&self) -> bool {
        contains_placeholder(self)
    }

    pub fn replace_placeholders_with<F: FnMut(&str) -> String>(&self, updater: F) -> Component {
        replace_placeholders_with(self, updater)
    }

    pub fn replace_placeholders<V: AsRef<str>>(&self, values: &FxHashMap<String, V>) -> Component {
        replace_placeholders(self, values)
    }

    pub fn replace_with(&self, splice: &Splice<'_>) -> Component {
        replace_with(self, splice)
    }
}

/// Updater that resolves every `%token%` through `resolve`, keeping the
/// token when it returns `None`
pub fn token_updater<F>(mut resolve: F) -> impl FnMut(&str) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    move |text: &str| {
        PLACEHOLDER_RE
            .replace_all(text, |cap: &regex::Captures<'_>| {
                resolve(&cap[1]).unwrap_or_else(|| cap[0].to_string())
            })
            .into_owned()
    }
}
