use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::detector::{detect, CycleOutcome, SkipReason};
use crate::error::CycleError;
use crate::extractor::extract;
use crate::fetch::PageFetcher;
use crate::notifier::Notifier;
use crate::state::StateStore;

/// Runs one fetch → parse → diff → persist → notify pass per call.
pub struct Monitor {
    url: String,
    fetcher: Box<dyn PageFetcher>,
    store: StateStore,
    notifier: Box<dyn Notifier>,
}

impl Monitor {
    pub fn new(
        url: impl Into<String>,
        fetcher: Box<dyn PageFetcher>,
        store: StateStore,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            url: url.into(),
            fetcher,
            store,
            notifier,
        }
    }

    /// Run a cycle now and then every `every` until `shutdown` resolves
    /// with `Ok`. Cycles are awaited inline, so they never overlap. If the
    /// shutdown listener itself fails, polling carries on without it.
    /// Returns the number of cycles run.
    pub async fn run_until<S>(&self, every: Duration, shutdown: S) -> usize
    where
        S: Future<Output = std::io::Result<()>>,
    {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shutdown = std::pin::pin!(shutdown);
        let mut listening = true;
        let mut cycles = 0;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let outcome = self.run_cycle().await;
                    cycles += 1;
                    info!("cycle finished: {:?}", outcome);
                }
                signal = &mut shutdown, if listening => match signal {
                    Ok(()) => {
                        info!("interrupt received, shutting down");
                        break;
                    }
                    Err(e) => {
                        warn!("cannot listen for Ctrl+C, continuing without it: {}", e);
                        listening = false;
                    }
                },
            }
        }

        cycles
    }

    /// Never fails and never panics: any problem becomes `Skipped` and
    /// leaves the state file untouched.
    pub async fn run_cycle(&self) -> CycleOutcome {
        info!("checking {}", self.url);

        let result = AssertUnwindSafe(self.try_cycle()).catch_unwind().await;
        let outcome = match result {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                let reason = match &e {
                    CycleError::Fetch(_) => SkipReason::Fetch,
                    CycleError::Parse(_) => SkipReason::Parse,
                    CycleError::StateWrite(_) => SkipReason::StateWrite,
                };
                warn!("skipping cycle: {}", e);
                CycleOutcome::Skipped(reason)
            }
            Err(_) => {
                error!("cycle panicked, skipping");
                CycleOutcome::Skipped(SkipReason::Panicked)
            }
        };

        if let CycleOutcome::NewProjects(names) = &outcome {
            self.announce(names).await;
        }
        outcome
    }

    /// The seen set is saved before the outcome is returned, so nothing is
    /// announced that is not already on disk.
    async fn try_cycle(&self) -> Result<CycleOutcome, CycleError> {
        let markup = self.fetcher.fetch(&self.url).await?;
        let projects = extract(&markup)?;

        let prior = self.store.load();
        let (outcome, seen) = detect(&projects, prior);
        self.store.save(&seen)?;

        match &outcome {
            CycleOutcome::FirstRun => info!(
                "initialized: memorized {} existing projects, no alert sent",
                seen.len()
            ),
            CycleOutcome::NoChange => info!("no new projects ({} on page)", projects.len()),
            CycleOutcome::NewProjects(names) => {
                info!("found {} new projects", names.len());
                for name in names {
                    info!("  new: {}", name);
                }
            }
            CycleOutcome::Skipped(_) => {}
        }
        Ok(outcome)
    }

    async fn announce(&self, names: &[String]) {
        let result = AssertUnwindSafe(self.notifier.notify(names))
            .catch_unwind()
            .await;
        match result {
            Ok(Ok(())) => info!("alert sent for {} projects", names.len()),
            Ok(Err(e)) => error!("failed to send alert: {}", e),
            Err(_) => error!("notifier panicked"),
        }
    }
}
