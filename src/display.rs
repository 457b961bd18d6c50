//! Composite display objects - a name tree plus description lines
//!
//! The engine only needs to read the name / description and to produce a
//! modified clone; [`DisplayStack`] is the bundled item-stack shaped model.

use serde::{Deserialize, Serialize};

use crate::text::Component;

pub trait Composite {
    fn display_name(&self) -> Option<&Component>;

    fn description(&self) -> Option<&[Component]>;

    /// Clone with new display parts attached; `None` keeps the current part
    fn with_display(&self, name: Option<Component>, description: Option<Vec<Component>>) -> Self
    where
        Self: Sized;
}

/// Item-stack like display object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayStack {
    pub id: String,
    #[serde(default = "default_amount")]
    pub amount: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Component>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lore: Option<Vec<Component>>,
}

fn default_amount() -> u32 {
    1
}

impl DisplayStack {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            amount: 1,
            name: None,
            lore: None,
        }
    }

    pub fn amount(mut self, amount: u32) -> Self {
        self.amount = amount;
        self
    }

    pub fn named(mut self, name: impl Into<Component>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn lore<I, L>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Component>,
    {
        self.lore = Some(lines.into_iter().map(Into::into).collect());
        self
    }
}

impl Composite for DisplayStack {
    fn display_name(&self) -> Option<&Component> {
        self.name.as_ref()
    }

    fn description(&self) -> Option<&[Component]> {
        self.lore.as_deref()
    }

    fn with_display(&self, name: Option<Component>, description: Option<Vec<Component>>) -> Self {
        let mut next = self.clone();
        if let Some(name) = name {
            next.name = Some(name);
        }
        if let Some(lore) = description {
            next.lore = Some(lore);
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_display_only_replaces_given_parts() {
        let stack = DisplayStack::new("minecraft:diamond_sword")
            .named("Blade")
            .lore(["line 1", "line 2"]);

        let renamed = stack.with_display(Some(Component::text("Edge")), None);
        assert_eq!(renamed.display_name(), Some(&Component::text("Edge")));
        assert_eq!(renamed.description(), stack.description());
        assert_eq!(renamed.id, stack.id);
    }

    #[test]
    fn test_deserializes_with_defaults() {
        let stack: DisplayStack = serde_json::from_str(
            r#"{"id": "minecraft:paper", "lore": [{"text": "%coins%"}]}"#,
        )
        .unwrap();
        assert_eq!(stack.amount, 1);
        assert!(stack.display_name().is_none());
        assert_eq!(stack.description().map(<[Component]>::len), Some(1));
    }
}
