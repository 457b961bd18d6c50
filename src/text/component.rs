//! Formatted text tree - chat-component shaped, immutable, serde-friendly
//!
//! JSON shape:
//! ```json
//! {"text": "Hi %name%", "color": "gold", "insertion": "%name%",
//!  "hoverEvent": {"action": "show_text", "contents": {"text": "%rank%"}},
//!  "extra": [{"text": "!"}]}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ReplaceError;

/// Node payload. Only `Text` is text-bearing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text {
        text: String,
    },
    Translatable {
        translate: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        with: Vec<Component>,
    },
    Keybind {
        keybind: String,
    },
}

/// Tooltip attached to a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "contents", rename_all = "snake_case")]
pub enum HoverEvent {
    /// Rich tooltip - itself a component tree
    ShowText(Box<Component>),
    /// Item tooltip, rendered by the client from the id
    ShowItem { id: String, count: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickAction {
    OpenUrl,
    RunCommand,
    SuggestCommand,
    CopyToClipboard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub action: ClickAction,
    pub value: String,
}

/// Node style. Every attribute is optional (unset = inherited from parent).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underlined: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obfuscated: Option<bool>,
    /// Plain string inserted into the chat box on shift-click, not displayed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insertion: Option<String>,
    #[serde(rename = "hoverEvent", skip_serializing_if = "Option::is_none")]
    pub hover: Option<HoverEvent>,
    #[serde(rename = "clickEvent", skip_serializing_if = "Option::is_none")]
    pub click: Option<ClickEvent>,
}

impl Style {
    /// Copy of this style with hover and insertion swapped out
    pub fn restyle(&self, hover: Option<HoverEvent>, insertion: Option<String>) -> Style {
        Style {
            color: self.color.clone(),
            font: self.font.clone(),
            bold: self.bold,
            italic: self.italic,
            underlined: self.underlined,
            strikethrough: self.strikethrough,
            obfuscated: self.obfuscated,
            insertion,
            hover,
            click: self.click.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Style::default()
    }

    /// Tooltip sub-tree, if the hover is a `show_text`
    pub fn hover_text(&self) -> Option<&Component> {
        match &self.hover {
            Some(HoverEvent::ShowText(tooltip)) => Some(tooltip),
            _ => None,
        }
    }
}

/// A formatted text node with ordered children
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    #[serde(flatten)]
    pub content: Content,
    #[serde(flatten)]
    pub style: Style,
    #[serde(default, rename = "extra", skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Component>,
}

impl Component {
    pub fn text(text: impl Into<String>) -> Self {
        Self::from_content(Content::Text { text: text.into() })
    }

    pub fn empty() -> Self {
        Self::text("")
    }

    pub fn translatable(key: impl Into<String>) -> Self {
        Self::from_content(Content::Translatable {
            translate: key.into(),
            with: Vec::new(),
        })
    }

    pub fn keybind(key: impl Into<String>) -> Self {
        Self::from_content(Content::Keybind {
            keybind: key.into(),
        })
    }

    fn from_content(content: Content) -> Self {
        Self {
            content,
            style: Style::default(),
            children: Vec::new(),
        }
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.style.color = Some(color.into());
        self
    }

    pub fn font(mut self, font: impl Into<String>) -> Self {
        self.style.font = Some(font.into());
        self
    }

    pub fn bold(mut self, bold: bool) -> Self {
        self.style.bold = Some(bold);
        self
    }

    pub fn italic(mut self, italic: bool) -> Self {
        self.style.italic = Some(italic);
        self
    }

    pub fn underlined(mut self, underlined: bool) -> Self {
        self.style.underlined = Some(underlined);
        self
    }

    pub fn hover_text(mut self, tooltip: Component) -> Self {
        self.style.hover = Some(HoverEvent::ShowText(Box::new(tooltip)));
        self
    }

    pub fn hover_item(mut self, id: impl Into<String>, count: u32) -> Self {
        self.style.hover = Some(HoverEvent::ShowItem {
            id: id.into(),
            count,
        });
        self
    }

    pub fn insertion(mut self, insertion: impl Into<String>) -> Self {
        self.style.insertion = Some(insertion.into());
        self
    }

    pub fn click(mut self, action: ClickAction, value: impl Into<String>) -> Self {
        self.style.click = Some(ClickEvent {
            action,
            value: value.into(),
        });
        self
    }

    pub fn append(mut self, child: Component) -> Self {
        self.children.push(child);
        self
    }

    /// Text of this node alone, when it is text-bearing
    pub fn text_content(&self) -> Option<&str> {
        match &self.content {
            Content::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.content, Content::Text { .. })
    }

    /// Flatten the visible text of the tree (tooltips and insertions excluded)
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.push_plain(&mut out);
        out
    }

    fn push_plain(&self, out: &mut String) {
        match &self.content {
            Content::Text { text } => out.push_str(text),
            Content::Translatable { translate, .. } => out.push_str(translate),
            Content::Keybind { keybind } => out.push_str(keybind),
        }
        for child in &self.children {
            child.push_plain(out);
        }
    }

    /// Total node count, tooltip sub-trees included
    pub fn node_count(&self) -> usize {
        let tooltip = self.style.hover_text().map_or(0, Component::node_count);
        1 + tooltip + self.children.iter().map(Component::node_count).sum::<usize>()
    }

    pub fn from_json(json: &str) -> Result<Self, ReplaceError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ReplaceError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<&str> for Component {
    fn from(text: &str) -> Self {
        Component::text(text)
    }
}

impl From<String> for Component {
    fn from(text: String) -> Self {
        Component::text(text)
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.plain_text())
    }
}
