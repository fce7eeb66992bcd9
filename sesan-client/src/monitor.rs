//! Dual-channel progress monitor
//!
//! Watches one analysis job over two redundant channels keyed by the same
//! correlation token: a server-sent-events subscription (push) and a
//! fixed-interval poll (pull). Push delivery is not guaranteed through every
//! proxy and buffer, so both channels run for the life of the job and are
//! merged through one [`ProgressTracker`]; whichever channel is ahead wins,
//! and polls that merely re-read the state already on display are dropped.
//!
//! Teardown happens exactly once, on the first of: a terminal snapshot from
//! either channel, the consumer dropping its receiver, or explicit
//! cancellation. Neither channel retries after a terminal status.

use crate::ApiClient;
use futures::{Stream, StreamExt};
use sesan_common::{CorrelationToken, ProgressSnapshot, ProgressSource, ProgressTracker};
use std::pin::Pin;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Handle to a running progress monitor task
pub struct ProgressMonitor {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl ProgressMonitor {
    /// Spawn the monitor for one job
    ///
    /// Returns the handle and the receiver of merged display snapshots. The
    /// receiver only ever sees a non-decreasing `current_step`; stale
    /// snapshots are dropped inside the monitor. The channel closes when the
    /// job reaches a terminal status.
    pub fn start(
        client: ApiClient,
        token: CorrelationToken,
    ) -> (Self, mpsc::Receiver<ProgressSnapshot>) {
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(16);
        let handle = tokio::spawn(run(client, token, tx, cancel.clone()));
        (Self { cancel, handle }, rx)
    }

    /// Cancel the monitor and wait for its task to finish
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.handle.await;
    }

    /// Wait for the monitor to finish on its own (terminal status)
    pub async fn join(self) {
        let _ = self.handle.await;
    }
}

async fn run(
    client: ApiClient,
    token: CorrelationToken,
    tx: mpsc::Sender<ProgressSnapshot>,
    cancel: CancellationToken,
) {
    let mut tracker = ProgressTracker::new();
    let mut interval = tokio::time::interval(client.poll_interval());
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    // One subscription attempt; a failed connect leaves polling to carry the
    // job on its own
    let mut push: Pin<Box<dyn Stream<Item = ProgressSnapshot> + Send>> = tokio::select! {
        _ = cancel.cancelled() => return,
        opened = client.observe_progress(&token) => match opened {
            Ok(stream) => Box::pin(stream),
            Err(e) => {
                debug!(token = %token, "SSE subscription failed, polling only: {}", e);
                Box::pin(futures::stream::pending())
            }
        },
    };
    let mut push_open = true;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,

            _ = tx.closed() => {
                debug!(token = %token, "Progress receiver dropped, monitor stopping");
                return;
            }

            maybe = push.next(), if push_open => match maybe {
                Some(snapshot) => {
                    if !forward(&mut tracker, &tx, snapshot, ProgressSource::Push).await {
                        return;
                    }
                }
                None => {
                    debug!(token = %token, "SSE stream ended, polling continues");
                    push_open = false;
                }
            },

            _ = interval.tick() => {
                match client.poll_progress(&token).await {
                    Ok(snapshot) => {
                        if !forward(&mut tracker, &tx, snapshot, ProgressSource::Poll).await {
                            return;
                        }
                    }
                    // Failed polls are retried on the next tick, no backoff
                    Err(e) => debug!(token = %token, "Progress poll failed: {}", e),
                }
            }
        }

        if tracker.is_finished() {
            debug!(token = %token, "Terminal status observed, monitor stopping");
            return;
        }
    }
}

/// Merge one observed snapshot; returns false when the consumer is gone
async fn forward(
    tracker: &mut ProgressTracker,
    tx: &mpsc::Sender<ProgressSnapshot>,
    snapshot: ProgressSnapshot,
    source: ProgressSource,
) -> bool {
    if let Some(display) = tracker.apply(snapshot, source) {
        if tx.send(display.clone()).await.is_err() {
            debug!("Progress receiver dropped, monitor stopping");
            return false;
        }
    }
    true
}
