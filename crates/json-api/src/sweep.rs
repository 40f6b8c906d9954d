//! Verification code sweep

use std::{sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time};
use tracing::{debug, info, warn};
use trusioo_app::verification::VerificationService;

/// Delete expired verification codes every `period` until the task is aborted.
pub(crate) fn spawn(
    verification: Arc<dyn VerificationService>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval(period);

        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            match verification.sweep().await {
                Ok(0) => debug!("no expired verification codes"),
                Ok(deleted) => info!(deleted, "swept expired verification codes"),
                Err(error) => warn!(error = %error, "verification sweep failed"),
            }
        }
    })
}
