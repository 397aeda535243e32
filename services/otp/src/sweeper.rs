//! Background maintenance loop.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error};

use crate::error::OtpServiceError;

/// Run `run` every `every`, starting one period after the call. A failed run
/// is logged and the loop carries on. `every` must be non-zero.
pub fn spawn_periodic<F, Fut>(job: &'static str, every: Duration, mut run: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<u64, OtpServiceError>> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match run().await {
                Ok(affected) => debug!(job, affected, "periodic job finished"),
                Err(e) => error!(job, kind = e.kind(), error = ?e, "periodic job failed"),
            }
        }
    })
}
