//! Polling engine turning one submitted job into a single awaited answer.
//!
//! Status queries for a job run strictly sequentially: the next query is
//! issued only after the previous one came back `NotDecoded` and the poll
//! interval elapsed. Every await inside the loop is a cancellation point, so
//! dropping the future stops all further network traffic for that job.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, timeout};

use crate::error::{Error, Result};

/// Default wait between status queries, per vendor guidance.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default resubmission budget for expired jobs.
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;

/// Tuning knobs of the `complete_*` convenience calls.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Wait between two status queries for the same job.
    pub interval: Duration,
    /// How many times an expired job is resubmitted before giving up.
    pub max_attempts: usize,
    /// Overall deadline for one `complete_*` call, submission included.
    /// `None` polls until a terminal outcome or the caller drops the future.
    pub solve_timeout: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            solve_timeout: None,
        }
    }
}

/// Drive a single-shot fetch until it reaches a terminal outcome.
///
/// `Err(NotDecoded)` waits out the interval and refetches; anything else is
/// final. Transport and submission errors propagate on first occurrence, so
/// retry-or-abandon stays a caller decision.
pub async fn poll_until_solved<F, Fut>(interval: Duration, mut fetch: F) -> Result<String>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String>>,
{
    loop {
        match fetch().await {
            Ok(answer) => return Ok(answer),
            Err(Error::NotDecoded) => sleep(interval).await,
            Err(err) => return Err(err),
        }
    }
}

/// Bound a solve future by the configured overall deadline.
///
/// Expiry aborts the future mid-poll and surfaces [`Error::SolveTimedOut`]
/// rather than a vendor error.
pub async fn with_solve_deadline<T, Fut>(limit: Option<Duration>, fut: Fut) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    match limit {
        Some(limit) => match timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(Error::SolveTimedOut(limit)),
        },
        None => fut.await,
    }
}
