//! Waiting for the page to react

use std::future::Future;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::debug;

use crate::error::{ProbeError, ProbeResult};

/// How long to give the browser before reading its response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WaitPolicy {
    /// Sleep blindly, then read once
    Fixed { delay: Duration },

    /// Retry the read until it succeeds or the timeout elapses
    Poll { timeout: Duration, interval: Duration },
}

impl Default for WaitPolicy {
    fn default() -> Self {
        WaitPolicy::Poll {
            timeout: Duration::from_secs(5),
            interval: Duration::from_millis(100),
        }
    }
}

impl WaitPolicy {
    pub fn fixed(delay: Duration) -> Self {
        WaitPolicy::Fixed { delay }
    }

    /// Pause after an action. Polling policies don't pause, the next read waits instead.
    pub async fn settle(&self) {
        if let WaitPolicy::Fixed { delay } = self {
            sleep(*delay).await;
        }
    }

    /// Run `probe` under this policy.
    ///
    /// `retryable` decides which errors mean "not there yet". Any other error is
    /// returned immediately. With a fixed policy the probe runs exactly once.
    pub async fn until<T, F, Fut>(
        &self,
        what: &str,
        retryable: impl Fn(&ProbeError) -> bool,
        mut probe: F,
    ) -> ProbeResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ProbeResult<T>>,
    {
        match *self {
            WaitPolicy::Fixed { delay } => {
                sleep(delay).await;
                probe().await
            }
            WaitPolicy::Poll { timeout, interval } => {
                let start = Instant::now();
                let mut attempts = 0usize;
                loop {
                    attempts += 1;
                    match probe().await {
                        Ok(value) => return Ok(value),
                        Err(e) if retryable(&e) => {
                            if start.elapsed() >= timeout {
                                debug!("Gave up on {} after {} attempts", what, attempts);
                                return Err(e);
                            }
                        }
                        Err(e) => return Err(e),
                    }
                    sleep(interval).await;
                }
            }
        }
    }
}
