use anyhow::Result;

use super::App;

pub async fn cmd_select(app: &App) -> Result<()> {
    let runtime = app.runtime().await?;
    let candidates = runtime.orchestrator(app).select().await?;

    if candidates.is_empty() {
        println!("No eligible items.");
        return Ok(());
    }

    println!("{:<12} {:>7} {:>6} {:>8}  TITLE", "ID", "SCORE", "TRIES", "EST");
    for candidate in &candidates {
        let record = &candidate.record;
        let title: String = record.item.title.chars().take(60).collect();
        println!(
            "{:<12} {:>7} {:>6} {:>7.0}s  {title}",
            record.source_id(),
            record.item.score,
            record.attempts,
            candidate.estimated_secs
        );
    }
    Ok(())
}
