use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::ingest::{CycleReport, IngestionCoordinator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Scheduled,
    Manual,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Scheduled => f.write_str("scheduled"),
            Trigger::Manual => f.write_str("manual"),
        }
    }
}

/// Drives the ingestion coordinator on a fixed interval.
///
/// Every cycle runs in its own task, so a panic inside a cycle is logged and
/// the loop carries on with the next tick. Overlap between scheduled and
/// manual runs is prevented by the coordinator's run-lock.
#[derive(Clone)]
pub struct Scheduler {
    coordinator: Arc<IngestionCoordinator>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(coordinator: Arc<IngestionCoordinator>, interval: Duration) -> Self {
        Self {
            coordinator,
            interval,
        }
    }

    /// Spawns the periodic loop: run a cycle, sleep the interval, repeat.
    /// Abort the returned handle to stop it.
    pub fn start(&self) -> JoinHandle<()> {
        let coordinator = Arc::clone(&self.coordinator);
        let interval = self.interval;

        tracing::info!(
            interval_secs = interval.as_secs(),
            feeds = coordinator.feeds().len(),
            "Scheduler started"
        );

        tokio::spawn(async move {
            loop {
                run_supervised(Arc::clone(&coordinator), Trigger::Scheduled).await;
                tokio::time::sleep(interval).await;
            }
        })
    }

    /// Schedules a one-off cycle outside the timer and returns immediately.
    /// If a cycle is already running the new one waits for it.
    pub fn trigger(&self) -> JoinHandle<Option<CycleReport>> {
        if self.coordinator.is_running() {
            tracing::info!("Manual fetch requested while a cycle is running; queued behind it");
        }
        tokio::spawn(run_supervised(
            Arc::clone(&self.coordinator),
            Trigger::Manual,
        ))
    }
}

async fn run_supervised(
    coordinator: Arc<IngestionCoordinator>,
    trigger: Trigger,
) -> Option<CycleReport> {
    let task = tokio::spawn(async move { coordinator.run_cycle().await });

    match task.await {
        Ok(report) => {
            tracing::info!(
                %trigger,
                "Ingestion cycle finished: {} items committed, {} feeds failed",
                report.committed,
                report.feeds_failed
            );
            Some(report)
        }
        Err(e) => {
            tracing::error!(%trigger, "Ingestion cycle aborted: {}", e);
            None
        }
    }
}
