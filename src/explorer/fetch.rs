//! Retrying HTTP GET against the explorer API.
//!
//! One bounded attempt loop with exponential backoff and jitter. The
//! backoff policy is a pure function of the attempt number so it can be
//! tested without real waits; jitter is applied only at the sleep site.

use rand::Rng;
use std::time::Duration;
use tracing::{debug, warn};

use super::types::Envelope;
use super::ExplorerError;

/// Upstream message fragment that marks a credential problem. Everything
/// else on the error path is treated as transient and retried.
const INVALID_KEY_SIGNAL: &str = "Invalid API Key";

/// How a decoded envelope should be handled by the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Disposition {
    /// `status == "1"` - hand the records back.
    Success,
    /// Credential rejected - fail now, don't burn the remaining attempts.
    InvalidKey,
    /// Transient error or ambiguous "no data" - retry; the last attempt
    /// returns the envelope as-is so the caller can interpret emptiness.
    Retry,
}

pub(crate) fn classify(envelope: &Envelope) -> Disposition {
    if envelope.is_ok() {
        return Disposition::Success;
    }
    if error_text(envelope).contains(INVALID_KEY_SIGNAL) {
        return Disposition::InvalidKey;
    }
    Disposition::Retry
}

/// The upstream sometimes reports the error in `message` ("NOTOK") and
/// sometimes in a string-valued `result`; check both.
fn error_text(envelope: &Envelope) -> String {
    match envelope.result.as_str() {
        Some(detail) => format!("{}: {}", envelope.message, detail),
        None => envelope.message.clone(),
    }
}

/// Delay before retry number `attempt` (0-based): `base * 2^attempt`.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * 2u32.saturating_pow(attempt)
}

fn jitter() -> Duration {
    Duration::from_millis(rand::thread_rng().gen_range(0..100))
}

/// Issue a GET and decode the explorer envelope, retrying transient
/// failures with exponential backoff.
///
/// Transport errors, non-2xx statuses, and undecodable bodies exhaust the
/// attempt budget and surface as [`ExplorerError::Exhausted`] carrying the
/// last observed cause. See [`classify`] for how decoded envelopes are
/// dispatched.
pub async fn fetch_with_retry(
    client: &reqwest::Client,
    url: &str,
    query: &[(&str, String)],
    max_attempts: u32,
    base_backoff: Duration,
) -> Result<Envelope, ExplorerError> {
    let attempts = max_attempts.max(1);
    let mut last_cause = String::new();

    for attempt in 0..attempts {
        if attempt > 0 {
            let delay = backoff_delay(base_backoff, attempt - 1) + jitter();
            debug!(
                attempt = attempt,
                delay_ms = delay.as_millis() as u64,
                "backing off before retry"
            );
            tokio::time::sleep(delay).await;
        }

        match client.get(url).query(query).send().await {
            Ok(resp) if resp.status().is_success() => {
                match resp.json::<Envelope>().await {
                    Ok(envelope) => match classify(&envelope) {
                        Disposition::Success => return Ok(envelope),
                        Disposition::InvalidKey => {
                            return Err(ExplorerError::InvalidKey(error_text(&envelope)));
                        }
                        Disposition::Retry => {
                            // "No transactions found" lands here too; the
                            // final attempt hands the envelope back for the
                            // caller to interpret.
                            if attempt + 1 == attempts {
                                return Ok(envelope);
                            }
                            last_cause = error_text(&envelope);
                            debug!(
                                attempt = attempt,
                                message = %envelope.message,
                                "retryable explorer status"
                            );
                        }
                    },
                    Err(e) => {
                        last_cause = format!("undecodable response: {}", e);
                        warn!(attempt = attempt, error = %e, "failed to decode explorer response");
                    }
                }
            }
            Ok(resp) => {
                last_cause = format!("HTTP {}", resp.status());
                warn!(attempt = attempt, status = %resp.status(), "explorer returned error status");
            }
            Err(e) => {
                last_cause = e.to_string();
                warn!(attempt = attempt, error = %e, "explorer request failed");
            }
        }
    }

    Err(ExplorerError::Exhausted {
        attempts,
        last: last_cause,
    })
}
