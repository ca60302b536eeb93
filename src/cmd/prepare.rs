use std::io::Read;

use anyhow::{Context, Result};

use storyreel::text;

use super::App;

pub fn cmd_prepare(app: &App, body: Option<String>, title: &str) -> Result<()> {
    let body = match body {
        Some(body) => body,
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("reading story from stdin")?;
            input
        }
    };

    let narration = &app.config.narration;
    let prepared = text::prepare(title, &body, true);
    let chunks = text::chunk_speech(&prepared.speech, narration.chunk_chars);

    println!("📝 Display ({} words):\n{}\n", prepared.display_word_count(), prepared.display);
    println!("🗣  Speech ({} words):\n{}\n", prepared.speech_word_count(), prepared.speech);
    println!("✂️  Chunks ({}):", chunks.len());
    for (i, chunk) in chunks.iter().enumerate() {
        println!("  {:>3}. {chunk}", i + 1);
    }

    let secs = text::estimate_narration_secs(prepared.speech_word_count(), narration.speaking_rate);
    println!(
        "\n⏱  ~{secs:.0}s narrated, ~{:.0}s at {}x",
        secs / narration.speed_multiplier,
        narration.speed_multiplier
    );
    Ok(())
}
