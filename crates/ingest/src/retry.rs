//! Deferred retry scheduling
//!
//! Failed paths re-enter the pipeline through a deadline heap instead of a
//! suspended task per pending retry. A single scheduler task owns a
//! `DelayQueue`; workers hand it (path, attempt, delay) tickets and it
//! re-submits them when the deadline fires.

use futures::StreamExt;
use recvault_watcher::CandidateFile;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::time::DelayQueue;
use tracing::{debug, info};

/// A scheduled re-submission of a failed path
#[derive(Debug)]
pub(crate) struct RetryTicket {
    pub candidate: CandidateFile,
    /// Attempt number the re-submission will run as (1-based)
    pub attempt: u32,
}

/// Handle for scheduling retries from worker tasks
#[derive(Clone)]
pub(crate) struct RetryScheduler {
    tx: mpsc::UnboundedSender<(RetryTicket, Duration)>,
}

impl RetryScheduler {
    /// Spawn the scheduler task
    ///
    /// Due tickets are sent on `due_tx`. The task exits when the token is
    /// cancelled; pending retries are dropped at that point, matching the
    /// in-process-only retry policy.
    pub fn spawn(
        due_tx: mpsc::Sender<RetryTicket>,
        cancel: CancellationToken,
    ) -> (Self, tokio::task::JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<(RetryTicket, Duration)>();

        let handle = tokio::spawn(async move {
            let mut queue: DelayQueue<RetryTicket> = DelayQueue::new();

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        if !queue.is_empty() {
                            debug!(pending = queue.len(), "dropping pending retries on shutdown");
                        }
                        break;
                    }
                    scheduled = rx.recv() => {
                        match scheduled {
                            Some((ticket, delay)) => {
                                debug!(
                                    path = ?ticket.candidate.path,
                                    attempt = ticket.attempt,
                                    delay_ms = delay.as_millis() as u64,
                                    "retry scheduled"
                                );
                                queue.insert(ticket, delay);
                            }
                            None => break,
                        }
                    }
                    Some(expired) = queue.next(), if !queue.is_empty() => {
                        let ticket = expired.into_inner();
                        info!(path = ?ticket.candidate.path, attempt = ticket.attempt, "retrying");
                        if due_tx.send(ticket).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        (Self { tx }, handle)
    }

    /// Queue `candidate` to run again as `attempt` after `delay`
    pub fn schedule(&self, candidate: CandidateFile, attempt: u32, delay: Duration) {
        let _ = self.tx.send((RetryTicket { candidate, attempt }, delay));
    }
}
