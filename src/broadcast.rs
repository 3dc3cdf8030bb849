//! Background bulk email
//!
//! Admin broadcasts are sent off the request path. Every dispatch runs as a
//! task on a [`TaskTracker`] so shutdown can wait for in-flight broadcasts
//! to finish before the process exits.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use crate::mail::{Attachment, Mailer};
use crate::routes::metrics;

/// One broadcast request
#[derive(Debug, Clone)]
pub struct BroadcastJob {
    pub subject: String,
    pub body: String,
    pub recipients: Vec<String>,
    pub attachment: Option<Attachment>,
}

/// Outcome of a finished broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub sent: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct Broadcaster {
    mailer: Arc<dyn Mailer>,
    tracker: TaskTracker,
}

impl Broadcaster {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self {
            mailer,
            tracker: TaskTracker::new(),
        }
    }

    /// Start sending `job` in the background.
    ///
    /// Recipients are mailed one after another. A failed delivery is logged
    /// and counted, and the remaining recipients are still attempted.
    pub fn dispatch(&self, job: BroadcastJob) -> JoinHandle<BroadcastReport> {
        let mailer = self.mailer.clone();

        self.tracker.spawn(async move {
            let mut report = BroadcastReport::default();

            for recipient in &job.recipients {
                match mailer
                    .send(recipient, &job.subject, &job.body, job.attachment.as_ref())
                    .await
                {
                    Ok(()) => {
                        report.sent += 1;
                        metrics::record_broadcast_email("sent");
                    }
                    Err(e) => {
                        report.failed += 1;
                        metrics::record_broadcast_email("failed");
                        warn!(recipient = %recipient, error = %e, "Broadcast email failed");
                    }
                }
            }

            info!(
                subject = %job.subject,
                sent = report.sent,
                failed = report.failed,
                "Broadcast finished"
            );
            report
        })
    }

    /// Number of broadcasts still running
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for every dispatched broadcast to complete.
    pub async fn shutdown(&self) {
        self.tracker.close();
        info!(in_flight = self.tracker.len(), "Waiting for broadcasts to finish");
        self.tracker.wait().await;
    }
}
