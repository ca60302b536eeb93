use anyhow::{bail, Result};

use storyreel::align::WhisperTranscriber;
use storyreel::video::Ffmpeg;

use super::App;

fn tool(label: &str, program: &str) -> bool {
    match which::which(program) {
        Ok(path) => {
            println!("✅ {label:<12} {}", path.display());
            true
        }
        Err(_) => {
            println!("❌ {label:<12} '{program}' not found in PATH");
            false
        }
    }
}

pub async fn cmd_check(app: &App) -> Result<()> {
    let config = &app.config;
    let mut ok = true;

    ok &= tool("ffmpeg", &config.encoder.ffmpeg_path);
    ok &= tool("ffprobe", &config.encoder.ffprobe_path);
    ok &= tool("whisper", &config.alignment.whisper_path);
    ok &= tool("synthesizer", &config.synthesis.program);
    ok &= tool("uploader", &config.publish.program);

    if !Ffmpeg::new(&config.encoder).check_available().await {
        println!("⚠️  ffmpeg did not answer -version");
        ok = false;
    }
    if !WhisperTranscriber::new(&config.alignment).check_available().await {
        println!("⚠️  whisper did not answer --help; captions will use uniform timing");
    }

    let background = &config.paths.background_clip;
    if background.exists() {
        println!("✅ {:<12} {}", "background", background.display());
    } else {
        println!("❌ {:<12} {} is missing", "background", background.display());
        ok = false;
    }
    println!("ℹ️  {:<12} {}", "store", config.paths.store.display());
    println!("ℹ️  {:<12} {}", "work dir", config.paths.work_dir.display());

    if !ok {
        bail!("some requirements are missing");
    }
    Ok(())
}
