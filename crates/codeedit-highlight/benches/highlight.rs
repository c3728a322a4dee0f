use codeedit_highlight::{BlockDocument, FallbackStyle, Highlighter, RuleSet, SpanRecorder};
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

fn large_source(line_count: usize) -> String {
    let mut out = String::with_capacity(line_count * 48);
    for i in 0..line_count {
        match i % 8 {
            0 => out.push_str("/* block comment\n"),
            1 => out.push_str("   still inside */ int x = 1;\n"),
            2 => out.push_str(&format!("int value_{i} = {i}; // TODO tidy\n")),
            _ => out.push_str(&format!("    return \"line {i}\" + {i};\n")),
        }
    }
    out.pop();
    out
}

fn highlighter() -> Highlighter {
    let design = FallbackStyle::default();
    let rules = RuleSet::from_yaml_str(
        include_str!("../tests/fixtures/c-like.yaml"),
        &design.font,
    )
    .unwrap();
    Highlighter::new(rules, design)
}

fn bench_full_highlight(c: &mut Criterion) {
    let text = large_source(10_000);
    c.bench_function("full_highlight/10k_lines", |b| {
        b.iter_batched(
            || (highlighter(), BlockDocument::from_text(&text)),
            |(mut highlighter, mut doc)| {
                let mut sink = SpanRecorder::new();
                black_box(highlighter.rehighlight(&mut doc, &mut sink));
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_edit_single_line(c: &mut Criterion) {
    let text = large_source(10_000);
    let mut highlighter = highlighter();
    let mut doc = BlockDocument::from_text(&text);
    let mut sink = SpanRecorder::new();
    highlighter.rehighlight(&mut doc, &mut sink);

    c.bench_function("edit_line/state_unchanged", |b| {
        b.iter(|| {
            let touched = highlighter.edit_line(&mut doc, &mut sink, 5_002, "int y = 2;");
            black_box(touched);
        })
    });
}

fn bench_open_comment_near_end(c: &mut Criterion) {
    let text = large_source(10_000);
    let mut highlighter = highlighter();
    let mut doc = BlockDocument::from_text(&text);
    let mut sink = SpanRecorder::new();
    highlighter.rehighlight(&mut doc, &mut sink);

    // Opening then closing a comment re-highlights up to the next block comment.
    c.bench_function("edit_line/open_and_close_comment", |b| {
        b.iter(|| {
            black_box(highlighter.edit_line(&mut doc, &mut sink, 9_994, "/* int y;"));
            black_box(highlighter.edit_line(&mut doc, &mut sink, 9_994, "int y;"));
        })
    });
}

criterion_group!(
    benches,
    bench_full_highlight,
    bench_edit_single_line,
    bench_open_comment_near_end
);
criterion_main!(benches);
