use std::time::Duration;

use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, error, info};

use crate::participants::PresenceManager;

/// Background task evicting idle participants every `interval`.
///
/// A failed tick is logged and the next one runs as usual.
pub struct SweepScheduler {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweepScheduler {
    pub fn start(presence: PresenceManager, interval: Duration, ttl: Duration) -> Self {
        let (shutdown, mut stop) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticks = tokio::time::interval(interval);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick fires immediately
            ticks.tick().await;

            loop {
                tokio::select! {
                    _ = ticks.tick() => {}
                    _ = stop.changed() => break,
                }

                match presence.sweep_now(ttl).await {
                    Ok(removed) if removed.is_empty() => debug!("sweep: nobody idle"),
                    Ok(removed) => info!(count = removed.len(), "sweep evicted idle participants"),
                    Err(e) => error!("sweep failed: {e}"),
                }
            }
        });

        info!(?interval, ?ttl, "sweep scheduler started");
        Self { shutdown, task }
    }

    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            error!("sweep task ended abnormally: {e}");
        }
        info!("sweep scheduler stopped");
    }
}
