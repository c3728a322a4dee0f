//! Highlight a file with a YAML rule set and print the result.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p codeedit-dump -- <rules.yaml> <file_path> [design.yaml]
//! ```
//!
//! Every line is printed with its carried state, followed by the spans applied to it. Identity
//! events are printed as they are published. Set `RUST_LOG=codeedit_highlight=debug` to see
//! skipped rules and state resets.

use codeedit_highlight::{
    BlockDocument, FallbackStyle, Highlighter, IdentityEvent, LineSource, RuleSet, SpanRecorder,
};
use std::env;
use std::error::Error;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "codeedit_dump=info,codeedit_highlight=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 || args.contains(&"--help".to_string()) {
        eprintln!("usage: {} <rules.yaml> <file_path> [design.yaml]", args[0]);
        process::exit(1);
    }

    let rules_path = PathBuf::from(&args[1]);
    let file_path = PathBuf::from(&args[2]);

    let design = match args.get(3) {
        Some(path) => FallbackStyle::load_from_path(path)?,
        None => FallbackStyle::default(),
    };
    let rules = RuleSet::load_from_path(&rules_path, &design.font)?;
    tracing::info!(rules = rules.len(), path = %rules_path.display(), "loaded rule set");

    let text = std::fs::read_to_string(&file_path)?;
    let mut doc = BlockDocument::from_text(&text);
    let mut sink = SpanRecorder::new();

    let mut highlighter = Highlighter::new(rules, design);
    highlighter.subscribe(print_identity_event);
    let touched = highlighter.rehighlight(&mut doc, &mut sink);
    tracing::info!(blocks = touched.len(), "highlighted {}", file_path.display());

    for index in 0..doc.line_count() {
        let Some(block) = doc.block_ref(index) else {
            continue;
        };
        let line = doc.line(index).unwrap_or_default();
        println!("{:>5} {:>3} | {}", index + 1, doc.block_state(index).raw(), line);

        for span in sink.spans_for(block) {
            let end = span.start + span.length;
            let mut attrs = format!("fg={}", span.format.foreground);
            if !span.format.background.is_transparent() {
                attrs.push_str(&format!(" bg={}", span.format.background));
            }
            if span.format.font.bold {
                attrs.push_str(" bold");
            }
            if span.format.font.italic {
                attrs.push_str(" italic");
            }
            println!(
                "            {:>4}..{:<4} {:?} {}",
                span.start,
                end,
                line.get(span.start..end).unwrap_or_default(),
                attrs
            );
        }
    }

    Ok(())
}

fn print_identity_event(event: &IdentityEvent) {
    match event {
        IdentityEvent::Appeared {
            identity,
            rule_id,
            matched_text,
            block,
            ..
        } => println!(
            "+ {} {} {:?} (block {})",
            identity.token, rule_id, matched_text, block.0
        ),
        IdentityEvent::Disappeared { identity } => {
            println!("- {} (block {})", identity.token, identity.block.0)
        }
    }
}
