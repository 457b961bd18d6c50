//! Tracked item behavior over refresh ticks
//!
//! All timing runs on a ManualClock with the default 5 x 50ms TTL.

use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use replace::text::HoverEvent;
use replace::{
    Component, DisplayStack, Item, ManualClock, Placeholder, PlaceholderContext, PlaceholderRegistry,
};

#[derive(Debug, Clone)]
struct Player {
    name: String,
    coins: u32,
}

fn player(name: &str, coins: u32) -> Player {
    Player {
        name: name.to_string(),
        coins,
    }
}

fn player_context(registry: &PlaceholderRegistry) -> (Arc<PlaceholderContext<Player>>, Arc<ManualClock>) {
    registry.register(vec![
        Placeholder::new("name", |p: &Player, _: &str| p.name.clone()),
        Placeholder::new("coins", |p: &Player, _: &str| p.coins.to_string()),
    ]);
    let clock = Arc::new(ManualClock::new());
    let ctx = registry.context::<Player>().clock(clock.clone()).build();
    (ctx, clock)
}

// ============================================================================
// Literal items
// ============================================================================

#[test]
fn test_unknown_identifier_passes_through() {
    let registry = PlaceholderRegistry::new();
    let (ctx, _) = player_context(&registry);
    let steve = player("Steve", 0);

    let mut item = ctx.create_literal(&steve, "Hello %unknown%!");
    assert!(item.is_static());
    assert_eq!(item.try_update(&steve).value, "Hello %unknown%!");
    assert!(!item.latest().was_updated);
}

#[test]
fn test_literal_mixes_known_and_unknown_tokens() {
    let registry = PlaceholderRegistry::new();
    let (ctx, _) = player_context(&registry);
    let steve = player("Steve", 7);

    let item = ctx.create_literal(&steve, "%name% has %coins% coins, %rank%");
    assert_eq!(item.latest().value, "Steve has 7 coins, %rank%");
    assert_eq!(item.tokens(), ["name".to_string(), "coins".to_string()]);
}

#[test]
fn test_no_op_update_is_idempotent() {
    let registry = PlaceholderRegistry::new();
    let (ctx, clock) = player_context(&registry);
    let steve = player("Steve", 3);

    let mut item = ctx.create_literal(&steve, "%name%: %coins%");
    let first = item.latest().value.clone();

    clock.advance_millis(40);
    let second = item.try_update(&steve);
    assert!(!second.was_updated);
    assert_eq!(second.value, first);

    // Past the TTL, recomputed values are identical: still no update
    clock.advance_millis(300);
    assert!(!item.try_update(&steve).was_updated);
}

#[test]
fn test_ttl_gating() {
    let registry = PlaceholderRegistry::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    registry.register_one(Placeholder::new("letter", move |_: &Player, _: &str| {
        match counter.fetch_add(1, Ordering::SeqCst) {
            0 => "A".to_string(),
            _ => "B".to_string(),
        }
    }));
    let clock = Arc::new(ManualClock::new());
    let ctx = registry.context::<Player>().ttl_ticks(5).clock(clock.clone()).build();
    let steve = player("Steve", 0);

    let mut item = ctx.create_literal(&steve, "%letter%");
    assert_eq!(item.latest().value, "A");

    clock.advance_millis(100);
    let rendered = item.try_update(&steve);
    assert_eq!(rendered.value, "A");
    assert!(!rendered.was_updated);

    clock.advance_millis(160);
    let rendered = item.try_update(&steve);
    assert_eq!(rendered.value, "B");
    assert!(rendered.was_updated);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_const_placeholder_invoked_once() {
    let registry = PlaceholderRegistry::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    registry.register_one(Placeholder::constant("uuid", move |p: &Player, _: &str| {
        counter.fetch_add(1, Ordering::SeqCst);
        format!("uuid-of-{}", p.name)
    }));
    let clock = Arc::new(ManualClock::new());
    let ctx = registry.context::<Player>().clock(clock.clone()).build();
    let steve = player("Steve", 0);

    let mut item = ctx.create_literal(&steve, "%uuid%");
    for _ in 0..100 {
        clock.advance_millis(10_000);
        item.try_update(&steve);
    }
    assert_eq!(item.latest().value, "uuid-of-Steve");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_any_binding_instance_can_be_passed() {
    let registry = PlaceholderRegistry::new();
    let (ctx, clock) = player_context(&registry);

    let mut item = ctx.create_literal(&player("Steve", 1), "%name%");
    clock.advance_millis(300);
    let rendered = item.try_update(&player("Alex", 1));
    assert_eq!(rendered.value, "Alex");
    assert!(rendered.was_updated);
}

#[test]
fn test_items_sharing_a_context_never_go_stale() {
    let registry = PlaceholderRegistry::new();
    let (ctx, clock) = player_context(&registry);

    let mut first = ctx.create_literal(&player("Steve", 1), "coins: %coins%");
    let mut second = ctx.create_literal(&player("Steve", 1), "you have %coins%");

    clock.advance_millis(300);
    let rich = player("Steve", 500);
    assert!(first.try_update(&rich).was_updated);

    // The cache already holds 500, so the batch reports no change here
    let rendered = second.try_update(&rich);
    assert!(rendered.was_updated);
    assert_eq!(rendered.value, "you have 500");
}

#[test]
fn test_failing_resolver_leaves_token_and_others_resolve() {
    let registry = PlaceholderRegistry::new();
    registry.register(vec![
        Placeholder::fallible("bank", |p: &Player, _: &str| {
            if p.coins == 0 {
                Err("bank offline")
            } else {
                Ok(format!("{} in bank", p.coins))
            }
        }),
        Placeholder::new("name", |p: &Player, _: &str| p.name.clone()),
    ]);
    let clock = Arc::new(ManualClock::new());
    let ctx = registry.context::<Player>().clock(clock.clone()).build();

    let mut item = ctx.create_literal(&player("Steve", 0), "%name%: %bank%");
    assert_eq!(item.latest().value, "Steve: %bank%");

    clock.advance_millis(300);
    assert_eq!(item.try_update(&player("Steve", 4)).value, "Steve: 4 in bank");

    // Last good value survives a later failure
    clock.advance_millis(300);
    let rendered = item.try_update(&player("Steve", 0));
    assert_eq!(rendered.value, "Steve: 4 in bank");
    assert!(!rendered.was_updated);
}

#[test]
fn test_broken_resolver_runs_once_per_ttl_window() {
    let registry = PlaceholderRegistry::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    registry.register_one(Placeholder::fallible("bank", move |_: &Player, _: &str| {
        counter.fetch_add(1, Ordering::SeqCst);
        Err::<String, _>("bank offline")
    }));
    let clock = Arc::new(ManualClock::new());
    let ctx = registry.context::<Player>().clock(clock.clone()).build();
    let steve = player("Steve", 0);

    let mut item = ctx.create_literal(&steve, "%bank%");
    for _ in 0..10 {
        clock.advance_millis(10);
        let rendered = item.try_update(&steve);
        assert_eq!(rendered.value, "%bank%");
        assert!(!rendered.was_updated);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    clock.advance_millis(150);
    item.try_update(&steve);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_arguments_reach_the_resolver() {
    let registry = PlaceholderRegistry::new();
    registry.register_one(Placeholder::new("coins", |p: &Player, token: &str| {
        match replace::token::arguments(token) {
            Some("double") => (p.coins * 2).to_string(),
            _ => p.coins.to_string(),
        }
    }));
    let ctx = registry.resolver_for::<Player>(5);
    let steve = player("Steve", 21);

    let item = ctx.create_literal(&steve, "%coins% / %coins_double%");
    assert_eq!(item.latest().value, "21 / 42");
}

// ============================================================================
// Tree items
// ============================================================================

fn nested_tree() -> Component {
    let level3 = Component::text("deep %coins%").italic(true);
    let level2 = Component::text("mid %name%").color("aqua").hover_text(level3);
    let level1 = Component::text("top %name%").underlined(true).hover_text(level2);

    Component::text("Hello %name%")
        .color("gold")
        .bold(true)
        .insertion("/msg %name%")
        .hover_text(level1)
        .append(Component::text(" | ").color("gray"))
        .append(Component::text("%coins% coins").color("yellow"))
        .append(Component::text("static"))
}

#[test]
fn test_tree_preserves_structure() {
    let registry = PlaceholderRegistry::new();
    let (ctx, _) = player_context(&registry);
    let steve = player("Steve", 12);

    let original = nested_tree();
    let item = ctx.create_tree(&steve, original.clone());
    let rendered = &item.latest().value;

    assert_eq!(rendered.children.len(), original.children.len());
    assert_eq!(rendered.text_content(), Some("Hello Steve"));
    assert_eq!(rendered.style.insertion.as_deref(), Some("/msg Steve"));
    assert_eq!(rendered.style.color, original.style.color);
    assert_eq!(rendered.style.bold, Some(true));
    assert_eq!(rendered.children[1].text_content(), Some("12 coins"));
    assert_eq!(rendered.children[1].style, original.children[1].style);
    assert_eq!(rendered.children[2], original.children[2]);

    let tooltip1 = rendered.style.hover_text().unwrap();
    assert_eq!(tooltip1.text_content(), Some("top Steve"));
    assert_eq!(tooltip1.style.underlined, Some(true));
    let tooltip2 = tooltip1.style.hover_text().unwrap();
    assert_eq!(tooltip2.text_content(), Some("mid Steve"));
    assert_eq!(tooltip2.style.color.as_deref(), Some("aqua"));
    let tooltip3 = tooltip2.style.hover_text().unwrap();
    assert_eq!(tooltip3.text_content(), Some("deep 12"));
    assert_eq!(tooltip3.style.italic, Some(true));

    assert_eq!(rendered.node_count(), original.node_count());
    assert!(!rendered.contains_placeholder());
}

#[test]
fn test_tree_update_within_ttl_returns_same_tree() {
    let registry = PlaceholderRegistry::new();
    let (ctx, clock) = player_context(&registry);
    let steve = player("Steve", 12);

    let mut item = ctx.create_tree(&steve, nested_tree());
    let before = Arc::clone(&item.latest().value);

    clock.advance_millis(50);
    let rendered = item.try_update(&player("Steve", 99));
    assert!(!rendered.was_updated);
    assert!(Arc::ptr_eq(&before, &rendered.value));
}

#[test]
fn test_tree_without_tokens_is_static() {
    let registry = PlaceholderRegistry::new();
    let (ctx, _) = player_context(&registry);
    let steve = player("Steve", 0);

    let tree = Component::text("plain").hover_item("minecraft:stone", 1);
    let mut item = ctx.create_tree(&steve, tree);
    assert!(item.is_static());
    let original = Arc::clone(item.original());
    assert!(Arc::ptr_eq(&original, &item.try_update(&steve).value));
    assert!(matches!(original.style.hover, Some(HoverEvent::ShowItem { .. })));
}

// ============================================================================
// Composite items
// ============================================================================

fn wallet() -> DisplayStack {
    DisplayStack::new("minecraft:gold_ingot")
        .named("Wallet of %name%")
        .lore(["%coins% coins", "Owner: %name%", "no tokens"])
}

#[test]
fn test_composite_renders_name_and_lore() {
    let registry = PlaceholderRegistry::new();
    let (ctx, _) = player_context(&registry);

    let item = ctx.create_composite(&player("Steve", 5), wallet());
    let stack = &item.latest().value;

    assert_eq!(stack.id, "minecraft:gold_ingot");
    assert_eq!(stack.name.as_ref().map(Component::plain_text).as_deref(), Some("Wallet of Steve"));
    let lore: Vec<String> = stack.lore.iter().flatten().map(Component::plain_text).collect();
    assert_eq!(lore, vec!["5 coins", "Owner: Steve", "no tokens"]);
    assert!(item.has_name_placeholders());
    assert!(item.has_description_placeholders());
}

#[test]
fn test_composite_rebuilds_when_only_name_changes() {
    let registry = PlaceholderRegistry::new();
    registry.register(vec![
        Placeholder::new("name", |p: &Player, _: &str| p.name.clone()),
        Placeholder::new("coins", |p: &Player, _: &str| p.coins.to_string()),
    ]);
    let clock = Arc::new(ManualClock::new());
    let ctx = registry.context::<Player>().clock(clock.clone()).build();

    let stack = DisplayStack::new("minecraft:paper")
        .named("%name%")
        .lore(["%coins% coins"]);
    let mut item = ctx.create_composite(&player("Steve", 5), stack);
    let before = Arc::clone(&item.latest().value);

    clock.advance_millis(300);
    let rendered = item.try_update(&player("Alex", 5));
    assert!(rendered.was_updated);
    assert!(!Arc::ptr_eq(&before, &rendered.value));
    assert_eq!(rendered.value.name, Some(Component::text("Alex")));
    assert_eq!(rendered.value.lore, Some(vec![Component::text("5 coins")]));
}

#[test]
fn test_composite_without_changes_returns_same_reference() {
    let registry = PlaceholderRegistry::new();
    let (ctx, clock) = player_context(&registry);
    let steve = player("Steve", 5);

    let mut item = ctx.create_composite(&steve, wallet());
    let before = Arc::clone(&item.latest().value);

    clock.advance_millis(300);
    let rendered = item.try_update(&steve);
    assert!(!rendered.was_updated);
    assert!(Arc::ptr_eq(&before, &rendered.value));
}

#[test]
fn test_composite_without_tokens_is_static() {
    let registry = PlaceholderRegistry::new();
    let (ctx, _) = player_context(&registry);
    let steve = player("Steve", 5);

    let stack = DisplayStack::new("minecraft:stone").named("Stone").lore(["Just a rock"]);
    let mut item = ctx.create_composite(&steve, stack);
    assert!(item.is_static());
    let original = Arc::clone(item.original());
    assert!(Arc::ptr_eq(&original, &item.try_update(&steve).value));
}

#[test]
fn test_composite_lore_only_update_keeps_name() {
    let registry = PlaceholderRegistry::new();
    let (ctx, clock) = player_context(&registry);

    let stack = DisplayStack::new("minecraft:paper")
        .named("Static name")
        .lore(["%coins%"]);
    let mut item = ctx.create_composite(&player("Steve", 1), stack);
    assert!(!item.has_name_placeholders());

    clock.advance_millis(300);
    let rendered = item.try_update(&player("Steve", 2));
    assert!(rendered.was_updated);
    assert_eq!(rendered.value.name, Some(Component::text("Static name")));
    assert_eq!(rendered.value.lore, Some(vec![Component::text("2")]));
}
