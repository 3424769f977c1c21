//! Bounded retry for transient transport failures.
//!
//! Only connect and timeout classes are retried; a 4xx/5xx response is
//! a *successful* send and is classified by the caller. Retries back off
//! exponentially from 250ms and give up after three attempts.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(250);

/// Run `attempt` until it yields a response, a non-transient error, or
/// the attempt budget is exhausted.
pub(crate) async fn retry_send<F, Fut>(mut attempt: F) -> Result<reqwest::Response, reqwest::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let mut backoff = INITIAL_BACKOFF;
    let mut attempt_no = 0;
    loop {
        attempt_no += 1;
        match attempt().await {
            Ok(response) => return Ok(response),
            Err(err) if attempt_no < MAX_ATTEMPTS && (err.is_connect() || err.is_timeout()) => {
                debug!(attempt = attempt_no, backoff_ms = backoff.as_millis() as u64, %err, "transient send failure; retrying");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            Err(err) => return Err(err),
        }
    }
}
