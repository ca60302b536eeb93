//! Benchmarks for story preparation and chunking at varying story lengths.
//!
//! Run with: `cargo bench --bench text_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use storyreel::captions::{group_phrases, PhraseRules, TimedWord};
use storyreel::text::{chunk_speech, clean_display, prepare};

/// Generate a forum-style story of approximately `target_bytes`.
///
/// Mixes the markup the cleaner strips (links, emphasis, URLs, an edit
/// trailer) with the tokens the speech expander rewrites (ages, acronyms,
/// contractions).
fn generate_story(target_bytes: usize) -> String {
    let blocks = [
        "So I'm 24F and my roommate (26M) has been **really** weird lately. ",
        "I can't tell if it's me or him, but he won't talk about it. ",
        "My BF says I should ask, see [this thread](https://example.com/t/1) for context. ",
        "We've lived together for two years and it's never been like this, tbh. ",
        "Yesterday he left a note that said \"we need to talk\" and then didn't! ",
        "Anyway, AITA for reading his texts? https://example.com/screenshot ",
    ];

    let mut story = String::with_capacity(target_bytes + 256);
    let mut idx = 0;
    while story.len() < target_bytes {
        story.push_str(blocks[idx % blocks.len()]);
        idx += 1;
    }
    story.push_str("\n\nEdit: thanks for all the replies!");
    story
}

fn bench_prepare(c: &mut Criterion) {
    let mut group = c.benchmark_group("prepare");

    let sizes: &[(usize, &str)] = &[(500, "500B"), (2_000, "2KB"), (8_000, "8KB")];

    for &(size, label) in sizes {
        let story = generate_story(size);

        group.throughput(Throughput::Bytes(story.len() as u64));
        group.bench_with_input(BenchmarkId::new("clean", label), &story, |b, story| {
            b.iter(|| black_box(clean_display(black_box(story))));
        });
        group.bench_with_input(BenchmarkId::new("full", label), &story, |b, story| {
            b.iter(|| black_box(prepare("AITA for reading his texts?", black_box(story), true)));
        });
    }

    group.finish();
}

fn bench_chunk_and_group(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_and_group");

    let prepared = prepare("", &generate_story(4_000), false);
    group.bench_function("chunk_speech_4kb", |b| {
        b.iter(|| black_box(chunk_speech(black_box(&prepared.speech), 90)));
    });

    let words: Vec<TimedWord> = prepared
        .words
        .iter()
        .enumerate()
        .map(|(i, w)| TimedWord::new(w.display.clone(), i as f64 * 0.4, i as f64 * 0.4 + 0.35))
        .collect();
    let rules = PhraseRules::default();
    group.bench_function("group_phrases", |b| {
        b.iter(|| black_box(group_phrases(black_box(&words), &rules)));
    });

    group.finish();
}

criterion_group!(benches, bench_prepare, bench_chunk_and_group);
criterion_main!(benches);
