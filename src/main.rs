//! Replace CLI - scan and render placeholder components

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use replace::sheet::ValueSheet;
use replace::{
    Component, DisplayStack, FixSuggestion, Item, PlaceholderRegistry, ReplaceError, SystemClock,
};

#[derive(Parser)]
#[command(name = "replace")]
#[command(about = "Replace - cached %placeholder% resolution for text components")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the placeholder tokens found in a component JSON file
    Scan {
        /// Path to a component (or display stack with --stack) JSON file
        file: String,

        /// Treat the file as a display stack (name + lore)
        #[arg(long)]
        stack: bool,
    },

    /// Resolve a component against a YAML value sheet, tick by tick
    Render {
        /// Path to a component (or display stack with --stack) JSON file
        file: String,

        /// Path to the value sheet (.yaml)
        #[arg(short, long)]
        values: String,

        /// Number of refresh ticks to run
        #[arg(short, long, default_value_t = 1)]
        ticks: u64,

        /// Delay between ticks (defaults to the sheet's tick length)
        #[arg(short, long)]
        interval_ms: Option<u64>,

        /// Treat the file as a display stack (name + lore)
        #[arg(long)]
        stack: bool,

        /// Print rendered JSON instead of plain text
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    // Load .env file (ignore if not present)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Scan { file, stack } => scan(&file, stack),
        Commands::Render {
            file,
            values,
            ticks,
            interval_ms,
            stack,
            json,
        } => render(&file, &values, ticks, interval_ms, stack, json),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.downcast_ref::<ReplaceError>().and_then(|e| e.fix_suggestion()) {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

fn read(path: &str) -> Result<String> {
    fs::read_to_string(Path::new(path)).with_context(|| format!("reading {}", path))
}

fn parse_stack(json: &str) -> Result<DisplayStack, ReplaceError> {
    Ok(serde_json::from_str(json)?)
}

fn scan(file: &str, stack: bool) -> Result<()> {
    let json = read(file)?;
    let trees: Vec<Component> = if stack {
        let stack = parse_stack(&json)?;
        stack
            .name
            .into_iter()
            .chain(stack.lore.unwrap_or_default())
            .collect()
    } else {
        vec![Component::from_json(&json)?]
    };

    let mut found = std::collections::BTreeSet::new();
    for tree in &trees {
        found.extend(tree.find_placeholders());
    }

    if found.is_empty() {
        println!("{} No placeholders in '{}'", "✓".green(), file);
        return Ok(());
    }

    println!("{} {} placeholder(s) in '{}'", "→".cyan(), found.len(), file);
    for token in &found {
        let identifier = replace::token::identifier(token);
        match replace::token::arguments(token) {
            Some(args) => println!("  %{}% {} {}", token, identifier.cyan().bold(), args.dimmed()),
            None => println!("  %{}% {}", token, identifier.cyan().bold()),
        }
    }
    Ok(())
}

fn render(
    file: &str,
    values: &str,
    ticks: u64,
    interval_ms: Option<u64>,
    stack: bool,
    json: bool,
) -> Result<()> {
    let source = read(file)?;
    let (config, mut sheet) = ValueSheet::from_yaml_str(&read(values)?)?;
    let config = config.with_env_overrides()?;
    let interval = Duration::from_millis(interval_ms.unwrap_or(config.tick_millis));

    let registry = PlaceholderRegistry::new();
    sheet.register(&registry);
    let ctx = registry
        .context::<ValueSheet>()
        .config(config)
        .clock(Arc::new(SystemClock))
        .build();

    println!(
        "{} Rendering '{}' | ttl: {}ms | ticks: {}",
        "→".cyan(),
        file,
        ctx.config().ttl().as_millis(),
        ticks
    );

    if stack {
        let mut item = ctx.create_composite(&sheet, parse_stack(&source)?);
        print_stack(0, &item.latest().value, json)?;
        for tick in 1..ticks {
            std::thread::sleep(interval);
            sheet.set_tick(tick);
            let rendered = item.try_update(&sheet);
            if rendered.was_updated {
                print_stack(tick, &rendered.value, json)?;
            }
        }
    } else {
        let mut item = ctx.create_tree(&sheet, Component::from_json(&source)?);
        print_tree(0, &item.latest().value, json)?;
        for tick in 1..ticks {
            std::thread::sleep(interval);
            sheet.set_tick(tick);
            let rendered = item.try_update(&sheet);
            if rendered.was_updated {
                print_tree(tick, &rendered.value, json)?;
            }
        }
    }

    Ok(())
}

fn print_tree(tick: u64, tree: &Component, json: bool) -> Result<(), ReplaceError> {
    let label = format!("[{:>4}]", tick).dimmed();
    if json {
        println!("{} {}", label, tree.to_json()?);
    } else {
        println!("{} {}", label, tree.plain_text());
    }
    Ok(())
}

fn print_stack(tick: u64, stack: &DisplayStack, json: bool) -> Result<(), ReplaceError> {
    let label = format!("[{:>4}]", tick).dimmed();
    if json {
        println!("{} {}", label, serde_json::to_string(stack)?);
        return Ok(());
    }
    let name = stack.name.as_ref().map(Component::plain_text).unwrap_or_default();
    println!("{} {} x{} {}", label, stack.id, stack.amount, name.bold());
    for line in stack.lore.iter().flatten() {
        println!("       {}", line.plain_text());
    }
    Ok(())
}
