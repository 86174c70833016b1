//! Update worker pool
//!
//! Webhook updates land on an unbounded queue. A scheduler task spawns one
//! task per update; a semaphore caps how many run at once. Updates of the
//! same chat are not serialized.

use std::sync::Arc;

use kbchat_telegram::Update;
use tokio::sync::{mpsc, oneshot, Semaphore};
use tokio::task::{JoinHandle, JoinSet};

use crate::dispatcher::Dispatcher;
use crate::domain::events::InboundEvent;

/// Sending half handed to the webhook handler
#[derive(Clone)]
pub struct UpdateQueue {
    tx: mpsc::UnboundedSender<Update>,
}

impl UpdateQueue {
    pub fn enqueue(&self, update: Update) -> Result<(), kbchat_common::Error> {
        let update_id = update.update_id;
        self.tx.send(update).map_err(|_| {
            kbchat_common::Error::Unavailable("Update queue is shut down".to_string())
        })?;
        tracing::debug!(update_id, "Update queued");
        Ok(())
    }
}

/// Handle on the scheduler task
pub struct UpdateWorker {
    shutdown: oneshot::Sender<()>,
    scheduler: JoinHandle<()>,
}

impl UpdateWorker {
    /// Start the scheduler with at most `concurrency` updates in flight
    pub fn spawn(dispatcher: Arc<Dispatcher>, concurrency: usize) -> (UpdateQueue, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let permits = Arc::new(Semaphore::new(concurrency.max(1)));

        let scheduler = tokio::spawn(schedule(dispatcher, rx, shutdown_rx, permits));

        tracing::info!(concurrency, "Update worker started");
        (
            UpdateQueue { tx },
            Self {
                shutdown: shutdown_tx,
                scheduler,
            },
        )
    }

    /// Stop accepting updates, then wait for queued and running ones
    pub async fn drain(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.scheduler.await {
            tracing::error!(error = %e, "Update scheduler terminated abnormally");
        }
        tracing::info!("Update worker drained");
    }
}

async fn schedule(
    dispatcher: Arc<Dispatcher>,
    mut rx: mpsc::UnboundedReceiver<Update>,
    mut shutdown: oneshot::Receiver<()>,
    permits: Arc<Semaphore>,
) {
    let mut tasks = JoinSet::new();

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Some(update) => {
                    tasks.spawn(process(dispatcher.clone(), permits.clone(), update));
                }
                None => break,
            },
            _ = &mut shutdown => {
                rx.close();
                while let Some(update) = rx.recv().await {
                    tasks.spawn(process(dispatcher.clone(), permits.clone(), update));
                }
                break;
            }
            Some(finished) = tasks.join_next(), if !tasks.is_empty() => {
                log_join(finished);
            }
        }
    }

    tracing::info!(in_flight = tasks.len(), "Draining in-flight updates");
    while let Some(finished) = tasks.join_next().await {
        log_join(finished);
    }
}

async fn process(dispatcher: Arc<Dispatcher>, permits: Arc<Semaphore>, update: Update) {
    let _permit = match permits.acquire_owned().await {
        Ok(permit) => permit,
        Err(e) => {
            tracing::error!(update_id = update.update_id, error = %e, "Worker semaphore closed");
            return;
        }
    };

    let Some(event) = InboundEvent::from_update(&update, dispatcher.bot_name()) else {
        tracing::debug!(update_id = update.update_id, "Ignoring unsupported or foreign update");
        return;
    };

    let chat_id = event.sender().chat_id;
    match dispatcher.dispatch(event).await {
        Ok(state) => {
            tracing::debug!(update_id = update.update_id, id = chat_id, state = %state, "Update handled");
        }
        Err(e) => {
            tracing::error!(update_id = update.update_id, id = chat_id, error = %e, "Update handling failed");
        }
    }
}

fn log_join(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        tracing::error!(error = %e, "Update task panicked");
    }
}
