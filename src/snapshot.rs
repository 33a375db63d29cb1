// src/snapshot.rs
//
// Holds the most recent good dataset. A failed refresh never replaces it;
// the snapshot is marked stale instead.

use std::future::Future;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, instrument, warn};

use crate::dataset::Dataset;
use crate::error::Result;
use crate::fetch::RetryPolicy;

/// Anything that can produce a complete dataset.
pub trait DatasetSource {
    fn load(&self) -> impl Future<Output = Result<Dataset>> + Send;
}

#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotStatus {
    /// No load has succeeded yet.
    Empty,
    Fresh,
    /// The last refresh failed; the previous dataset is still served.
    Stale {
        since: DateTime<Utc>,
        last_error: String,
    },
}

#[derive(Debug)]
struct State {
    current: Option<Arc<Dataset>>,
    status: SnapshotStatus,
}

pub struct DatasetSnapshot<S> {
    source: S,
    retry: RetryPolicy,
    state: RwLock<State>,
}

impl<S: DatasetSource> DatasetSnapshot<S> {
    pub fn new(source: S, retry: RetryPolicy) -> Self {
        Self {
            source,
            retry,
            state: RwLock::new(State {
                current: None,
                status: SnapshotStatus::Empty,
            }),
        }
    }

    /// The dataset currently served, if any load has succeeded.
    pub fn current(&self) -> Option<Arc<Dataset>> {
        self.read().current.clone()
    }

    pub fn status(&self) -> SnapshotStatus {
        self.read().status.clone()
    }

    /// Load a new dataset and swap it in. On failure the previous dataset is
    /// kept and the error returned.
    #[instrument(level = "info", skip(self))]
    pub async fn refresh(&self) -> Result<Arc<Dataset>> {
        match self.retry.run(|| self.source.load()).await {
            Ok(dataset) => {
                dataset.log_summary();
                let dataset = Arc::new(dataset);
                let mut state = self.write();
                state.current = Some(Arc::clone(&dataset));
                state.status = SnapshotStatus::Fresh;
                Ok(dataset)
            }
            Err(e) => {
                let mut state = self.write();
                if state.current.is_some() {
                    warn!(error = %e, "refresh failed; serving last good dataset");
                    let since = match &state.status {
                        SnapshotStatus::Stale { since, .. } => *since,
                        _ => Utc::now(),
                    };
                    state.status = SnapshotStatus::Stale {
                        since,
                        last_error: e.to_string(),
                    };
                } else {
                    error!(error = %e, "refresh failed with no dataset to fall back on");
                }
                Err(e)
            }
        }
    }

    /// Refresh every `every` until the future is dropped. The first tick
    /// fires after one full period.
    pub async fn run_refresh_loop<F>(&self, every: Duration, mut on_refresh: F)
    where
        F: FnMut(&Dataset),
    {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match self.refresh().await {
                Ok(dataset) => on_refresh(&dataset),
                Err(e) => warn!(error = %e, next_in_secs = every.as_secs(), "scheduled refresh failed"),
            }
            info!(status = ?self.status(), "refresh cycle complete");
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|p| p.into_inner())
    }
}
