use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::controller::{InfrastructureController, RefreshOutcome};

/// Periodic background refresh. Aborted when dropped.
///
/// The task only holds a weak reference, so it also ends on its own once the
/// controller is gone.
pub struct RefreshTask {
    handle: JoinHandle<()>,
}

impl RefreshTask {
    pub(crate) fn spawn(controller: Weak<InfrastructureController>, period: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                let Some(controller) = controller.upgrade() else {
                    break;
                };

                match controller.refresh().await {
                    Ok(RefreshOutcome::Skipped) => {
                        tracing::debug!("refresh still in flight, skipping tick");
                    }
                    Ok(outcome) => tracing::debug!(?outcome, "scheduled refresh finished"),
                    Err(e) => {
                        tracing::error!(error = %e, "scheduled refresh failed");
                        controller.note_refresh_error(&e).await;
                    }
                }
            }
        });

        tracing::debug!(period_secs = period.as_secs(), "refresh task started");
        Self { handle }
    }
}

impl Drop for RefreshTask {
    fn drop(&mut self) {
        self.handle.abort();
        tracing::debug!("refresh task stopped");
    }
}
