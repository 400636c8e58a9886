//! Background delivery queue for transactional emails.
//!
//! Request handlers enqueue and return immediately; a single worker task
//! drains the queue and retries failed deliveries with exponential backoff.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::config::EmailConfig;
use crate::services::email::{EmailKind, MailError, Mailer, OutboundEmail};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn from_config(config: &EmailConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
        }
    }

    /// Delay before attempt `attempt + 1`, doubling each time.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

/// Sends `email`, retrying retryable failures. Returns the number of
/// attempts used on success.
pub async fn deliver_with_retry(
    mailer: &dyn Mailer,
    email: &OutboundEmail,
    policy: RetryPolicy,
) -> Result<u32, MailError> {
    let mut attempt = 1;
    loop {
        match mailer.send(email).await {
            Ok(()) => return Ok(attempt),
            Err(e) if e.is_retryable() && attempt < policy.max_attempts => {
                let delay = policy.backoff(attempt);
                warn!(
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %e,
                    "Email delivery failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[derive(Debug)]
struct OutboxJob {
    kind: &'static str,
    email: OutboundEmail,
}

const fn kind_label(kind: &EmailKind) -> &'static str {
    match kind {
        EmailKind::Welcome { .. } => "welcome",
        EmailKind::Newsletter { .. } => "newsletter",
        EmailKind::UnsubscribeConfirmation => "unsubscribe_confirmation",
    }
}

#[derive(Clone)]
pub struct Outbox {
    tx: mpsc::Sender<OutboxJob>,
}

impl Outbox {
    /// Starts the worker. The worker exits once every `Outbox` clone is dropped
    /// and the queue is drained.
    #[must_use]
    pub fn spawn(
        mailer: Arc<dyn Mailer>,
        policy: RetryPolicy,
        capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<OutboxJob>(capacity.max(1));

        let handle = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                match deliver_with_retry(mailer.as_ref(), &job.email, policy).await {
                    Ok(attempts) => {
                        metrics::counter!("emails_sent_total", "kind" => job.kind).increment(1);
                        debug!(kind = job.kind, attempts, "Queued email delivered");
                    }
                    Err(e) => {
                        metrics::counter!("emails_failed_total", "kind" => job.kind).increment(1);
                        error!(kind = job.kind, error = %e, "Queued email dropped");
                    }
                }
            }
            debug!("Email outbox worker stopped");
        });

        (Self { tx }, handle)
    }

    /// Queues a templated email. Returns false when the queue is full or the
    /// worker is gone; the caller's request is not affected either way.
    pub fn enqueue(&self, kind: &EmailKind, to: &str) -> bool {
        let job = OutboxJob {
            kind: kind_label(kind),
            email: kind.to_email(to),
        };

        match self.tx.try_send(job) {
            Ok(()) => true,
            Err(e) => {
                warn!(kind = kind_label(kind), error = %e, "Could not queue email");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` calls with a retryable error.
    struct FlakyMailer {
        failures: u32,
        calls: AtomicU32,
        delivered: Mutex<Vec<String>>,
    }

    impl FlakyMailer {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
                delivered: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl Mailer for FlakyMailer {
        async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                return Err(MailError::Transport("connection reset".to_string()));
            }
            self.delivered.lock().unwrap().push(email.to.clone());
            Ok(())
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(4), Duration::from_millis(800));
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let mailer = FlakyMailer::new(2);
        let email = EmailKind::UnsubscribeConfirmation.to_email("a@college.example");

        let attempts = deliver_with_retry(&mailer, &email, fast_policy(3))
            .await
            .unwrap();
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let mailer = FlakyMailer::new(10);
        let email = EmailKind::UnsubscribeConfirmation.to_email("a@college.example");

        let result = deliver_with_retry(&mailer, &email, fast_policy(2)).await;
        assert!(result.is_err());
        assert_eq!(mailer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_worker_drains_queue() {
        let mailer = Arc::new(FlakyMailer::new(1));
        let (outbox, handle) = Outbox::spawn(mailer.clone(), fast_policy(3), 8);

        assert!(outbox.enqueue(&EmailKind::Welcome { name: None }, "a@college.example"));
        assert!(outbox.enqueue(&EmailKind::UnsubscribeConfirmation, "b@college.example"));
        drop(outbox);
        handle.await.unwrap();

        let delivered = mailer.delivered.lock().unwrap().clone();
        assert_eq!(delivered, ["a@college.example", "b@college.example"]);
    }
}
