use anyhow::{bail, Context, Result};

use storyreel::schedule;

use super::App;

pub async fn cmd_run(app: &App) -> Result<()> {
    let runtime = app.runtime().await?;
    let report = runtime
        .orchestrator(app)
        .run_batch()
        .await
        .context("batch aborted")?;

    eprintln!(
        "✅ Batch done: {} posted, {} failed",
        report.successful, report.failed
    );
    Ok(())
}

pub async fn cmd_schedule(app: &App) -> Result<()> {
    let times = app.config.batch.parsed_trigger_times()?;
    if times.is_empty() {
        eprintln!("⚠️  No trigger times configured; only SIGUSR1 will start a batch");
    } else {
        let list: Vec<String> = times.iter().map(|t| t.format("%H:%M").to_string()).collect();
        eprintln!("🕐 Scheduling daily batches at {}", list.join(", "));
    }
    eprintln!("   PID {} (kill -USR1 to trigger now, Ctrl-C to stop)", std::process::id());

    let runtime = app.runtime().await?;
    let orchestrator = runtime.orchestrator(app);
    let batches = schedule::run(&orchestrator, &times, schedule::manual_triggers()).await;
    eprintln!("👋 Stopped after {batches} batch(es)");
    Ok(())
}

/// Worker side of subprocess isolation. Returns whether the item was posted.
pub async fn cmd_process_item(app: &App, id: &str) -> Result<bool> {
    if !app.config.paths.background_clip.exists() {
        bail!(
            "background clip not found: {}",
            app.config.paths.background_clip.display()
        );
    }
    let runtime = app.runtime().await?;
    let outcome = runtime
        .orchestrator(app)
        .process_item(id)
        .await
        .with_context(|| format!("processing {id}"))?;
    tracing::info!("{id}: {outcome:?}");
    Ok(outcome.is_success())
}
