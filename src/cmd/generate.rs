use std::path::Path;

use anyhow::{Context, Result};

use storyreel::generate::{Engines, Generator};
use storyreel::job::Job;
use storyreel::store::{ContentItem, ContentStore};

use super::App;

/// Render one stored item to `output`. The record is left untouched.
pub async fn cmd_generate(app: &App, id: &str, output: &Path, seed: Option<u64>) -> Result<()> {
    let runtime = app.runtime().await?;
    let record = runtime
        .store
        .get(id)
        .await?
        .with_context(|| format!("no item with id {id} in {}", runtime.store.path().display()))?;

    eprintln!("🎬 Generating: {}", record.item.title);

    let mut generator = Generator::new(&app.config, &runtime.engines, &runtime.toolkit);
    if let Some(seed) = seed {
        generator = generator.with_seed(seed);
    }

    let job = Job::new(&app.config.paths.work_dir);
    let result = render(&generator, &runtime.engines, &record.item, &job, output).await;
    runtime.engines.release().await;
    job.purge();
    result.with_context(|| format!("generating {id}"))?;

    eprintln!("✅ Saved to {}", output.display());
    Ok(())
}

/// Warm the engines, generate, and move the artifact to `output`. The caller
/// releases the engines and purges the job whatever happens here.
async fn render(
    generator: &Generator<'_>,
    engines: &Engines,
    item: &ContentItem,
    job: &Job,
    output: &Path,
) -> Result<()> {
    engines.warm().await?;
    let artifact = generator.generate(item, job).await?;

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    // rename fails across filesystems; fall back to copy
    if tokio::fs::rename(&artifact, output).await.is_err() {
        tokio::fs::copy(&artifact, output)
            .await
            .with_context(|| format!("writing {}", output.display()))?;
    }
    Ok(())
}
