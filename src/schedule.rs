//! Daily batch scheduler.
//!
//! Fires at fixed local wall-clock times and on manual triggers (SIGUSR1 on
//! unix). Batches never overlap: triggers that arrive while one runs are
//! queued and handled after it.

use std::future::Future;
use std::time::Duration;

use chrono::{Local, NaiveDateTime, NaiveTime};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::batch::Orchestrator;

/// Why a batch started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Scheduled,
    Manual,
}

/// Earliest configured time strictly after `now`, today or tomorrow.
/// `None` when no times are configured.
#[must_use]
pub fn next_fire(now: NaiveDateTime, times: &[NaiveTime]) -> Option<NaiveDateTime> {
    let today = now.date();
    let later_today = times
        .iter()
        .map(|t| today.and_time(*t))
        .filter(|at| *at > now)
        .min();
    later_today.or_else(|| {
        let tomorrow = today.succ_opt()?;
        times.iter().min().map(|t| tomorrow.and_time(*t))
    })
}

/// Channel fed by SIGUSR1. Elsewhere the channel is closed at once and only
/// scheduled triggers fire.
pub fn manual_triggers() -> mpsc::Receiver<()> {
    let (tx, rx) = mpsc::channel(8);

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::user_defined1()) {
            Ok(mut usr1) => {
                tokio::spawn(async move {
                    while usr1.recv().await.is_some() {
                        info!("SIGUSR1 received, queueing a batch");
                        if tx.send(()).await.is_err() {
                            break;
                        }
                    }
                });
            }
            Err(e) => warn!("Manual trigger unavailable: {e}"),
        }
    }
    #[cfg(not(unix))]
    drop(tx);

    rx
}

/// Run batches until Ctrl-C.
pub async fn run(
    orchestrator: &Orchestrator<'_>,
    times: &[NaiveTime],
    manual: mpsc::Receiver<()>,
) -> usize {
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };
    run_until(orchestrator, times, manual, shutdown).await
}

/// Run batches until `shutdown` completes; it is only checked between
/// batches. Returns the number of batches started.
pub async fn run_until(
    orchestrator: &Orchestrator<'_>,
    times: &[NaiveTime],
    mut manual: mpsc::Receiver<()>,
    shutdown: impl Future<Output = ()>,
) -> usize {
    tokio::pin!(shutdown);
    let mut batches = 0;

    loop {
        let now = Local::now().naive_local();
        let wait = next_fire(now, times).map(|at| {
            info!("Next scheduled batch at {at}");
            (at - now).to_std().unwrap_or(Duration::ZERO)
        });
        let timer = async {
            match wait {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending().await,
            }
        };

        let trigger = tokio::select! {
            biased;
            Some(()) = manual.recv() => Trigger::Manual,
            () = timer => Trigger::Scheduled,
            () = &mut shutdown => {
                info!("Scheduler stopping after {batches} batch(es)");
                return batches;
            }
        };

        batches += 1;
        info!("Batch triggered ({trigger:?})");
        match orchestrator.run_batch().await {
            Ok(report) => info!(
                "Batch {batches}: {} successful, {} failed",
                report.successful, report.failed
            ),
            Err(e) if e.is_fatal() => error!("Batch {batches} aborted: {e}"),
            Err(e) => warn!("Batch {batches} failed: {e}"),
        }
    }
}
