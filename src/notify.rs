//! Notification dispatcher: best-effort, at-most-once webhook delivery.
//!
//! Exactly one attempt is made per batch; no retry, no queuing, no backoff.
//! The call is time-bounded so a slow or unreachable sink cannot stall a
//! successful ingestion. The dispatcher reports failures as a typed error
//! and leaves the swallowing to its caller, so the behavior is test-visible.

use crate::error::NotificationError;
use log::debug;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use ureq::Agent;

/// Default bound on the whole webhook call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// The outcome of one batch, as carried in the notification payload.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    /// Rows processed (attempted) in the batch
    pub processed_count: usize,

    /// Object key of the ingested file
    pub source: String,

    /// Whether the batch committed
    pub succeeded: bool,
}

/// Sends a single summary event per batch to a configured webhook.
pub struct NotificationDispatcher {
    agent: Agent,
    webhook_url: Option<String>,
}

impl NotificationDispatcher {
    /// Builds a dispatcher for the given sink, bounded by `timeout`.
    ///
    /// `None` for the URL means notifications are disabled; dispatching is
    /// then a no-op, not an error.
    pub fn new(webhook_url: Option<String>, timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();

        NotificationDispatcher { agent, webhook_url }
    }

    /// Attempts to deliver one notification for the batch outcome.
    ///
    /// Fails with `NotificationError` on connect failure, timeout, or a
    /// non-2xx response. Callers log the error and carry on; delivery
    /// failure must never fail the pipeline.
    pub fn dispatch(&self, outcome: &BatchOutcome) -> Result<(), NotificationError> {
        let Some(url) = &self.webhook_url else {
            debug!("No webhook configured, skipping notification");
            return Ok(());
        };

        let payload = json!({
            "event": "ingestion_completed",
            "processed_count": outcome.processed_count,
            "source": outcome.source,
            "status": if outcome.succeeded { "success" } else { "failure" },
        });

        self.agent.post(url).send_json(&payload)?;

        debug!(
            "Notified {} of {} processed row(s) from '{}'",
            url, outcome.processed_count, outcome.source
        );
        Ok(())
    }
}
