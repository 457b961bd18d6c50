//! Text Module - formatted text trees and their rewrites
//!
//! - `component`: the immutable tree (content, style, children)
//! - `rewrite`: discovery, substitution (by fn / by map) and splicing
//!
//! ```text
//! Component ──find_placeholders──▶ {tokens}
//!     │                               │ PlaceholderContext::generate_result
//!     │                               ▼
//!     └──replace_placeholders(values)──▶ Component'
//! ```

mod component;
mod rewrite;

pub use component::{ClickAction, ClickEvent, Component, Content, HoverEvent, Style};
pub use rewrite::{
    contains_placeholder, find_placeholders, map_text, replace_placeholders,
    replace_placeholders_with, replace_with, token_updater, Splice, SpliceBuilder, TextMapper,
};
