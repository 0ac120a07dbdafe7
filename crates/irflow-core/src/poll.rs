//! Bounded polling with a fixed delay.
//!
//! Every wait in the tracker goes through [`poll_until`], which gives up
//! with [`FlowError::Timeout`] after a fixed number of attempts instead of
//! polling forever.

use std::{future::Future, time::Duration};

use log::debug;

use crate::error::{FlowError, Result};

/// How often and how long to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Total number of probes, including the first
    pub max_attempts: u32,
    /// Pause between two probes
    pub delay: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            delay: Duration::from_secs(2),
        }
    }
}

impl PollPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

/// Runs `probe` until it yields `Some`, sleeping `policy.delay` between
/// attempts. Errors from the probe end the wait immediately.
///
/// # Errors
///
/// Returns `FlowError::Timeout` when every attempt came back empty.
pub async fn poll_until<T, F, Fut>(operation: &str, policy: PollPolicy, mut probe: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    for attempt in 1..=policy.max_attempts {
        if let Some(value) = probe().await? {
            return Ok(value);
        }
        debug!(
            "{operation}: attempt {attempt}/{} not ready",
            policy.max_attempts
        );
        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.delay).await;
        }
    }

    Err(FlowError::Timeout {
        operation: operation.to_string(),
        attempts: policy.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    };

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_returns_first_ready_value() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let value = poll_until("ready on third", PollPolicy::new(5, Duration::from_secs(1)), || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Ok((n == 3).then_some(n))
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_times_out() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let start = tokio::time::Instant::now();

        let err = poll_until::<(), _, _>("never", PollPolicy::new(4, Duration::from_secs(2)), || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, FlowError::Timeout { attempts: 4, ref operation } if operation == "never"));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // Three sleeps between four attempts
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_propagates_probe_error() {
        let err = poll_until::<(), _, _>("failing", PollPolicy::default(), || async {
            Err(FlowError::FlowNotFound { id: 12 })
        })
        .await
        .unwrap_err();

        assert!(matches!(err, FlowError::FlowNotFound { id: 12 }));
    }
}
