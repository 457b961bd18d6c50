//! Replace - cached `%placeholder%` resolution
//!
//! Resolves `%name%` / `%name_arg1_arg2%` tokens in plain strings, formatted
//! text trees and composite display objects against a binding value, and
//! keeps the result cheap to re-evaluate on every refresh tick.
//!
//! ```text
//! PlaceholderRegistry ──context::<T>()──▶ PlaceholderContext<T>
//!                                              │ create_literal / create_tree / create_composite
//!                                              ▼
//!                                        LiteralItem / TreeItem / CompositeItem
//!                                              │ try_update(binding) every tick
//!                                              ▼
//!                                        Rendered { value, was_updated }
//! ```
//!
//! ```rust
//! use replace::{Item, Placeholder, PlaceholderRegistry};
//!
//! struct Player { name: String }
//!
//! let registry = PlaceholderRegistry::new();
//! registry.register_one(Placeholder::new("name", |p: &Player, _: &str| p.name.clone()));
//!
//! let ctx = registry.resolver_for::<Player>(5);
//! let steve = Player { name: "Steve".into() };
//! let mut item = ctx.create_literal(&steve, "Hello %name%!");
//! assert_eq!(item.try_update(&steve).value, "Hello Steve!");
//! ```

pub mod clock;
pub mod config;
pub mod context;
pub mod display;
pub mod error;
pub mod item;
pub mod placeholder;
pub mod registry;
pub mod sheet;
pub mod text;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ContextConfig;
pub use context::{PlaceholderContext, Resolution};
pub use display::{Composite, DisplayStack};
pub use error::{FixSuggestion, ReplaceError};
pub use item::{CompositeItem, Item, LiteralItem, Rendered, TreeItem};
pub use placeholder::{Placeholder, Resolve};
pub use registry::{Adapter, ContextBuilder, PlaceholderRegistry, Transform, TypeTag};
pub use text::{Component, Splice};
