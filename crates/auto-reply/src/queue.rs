//! Per-conversation FIFO dispatch.
//!
//! Each active conversation key gets one worker task that handles its
//! messages strictly in arrival order, while different keys run in parallel.
//! The dispatcher is single-owner (`&mut self`), so a worker with no pending
//! messages can be dropped without racing a concurrent send.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use {
    async_trait::async_trait,
    talapker_common::ConversationKey,
    tokio::{sync::mpsc, task::JoinHandle},
    tracing::{debug, warn},
};

/// Work done for one queued message.
#[async_trait]
pub trait QueueHandler<M>: Send + Sync + 'static {
    async fn handle(&self, key: ConversationKey, message: M);
}

struct Worker<M> {
    tx: mpsc::UnboundedSender<M>,
    pending: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl<M: Send + 'static> Worker<M> {
    fn spawn(key: ConversationKey, handler: Arc<dyn QueueHandler<M>>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<M>();
        let pending = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&pending);
        let task = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                handler.handle(key.clone(), message).await;
                counter.fetch_sub(1, Ordering::AcqRel);
            }
            debug!(conversation = %key, "conversation worker stopped");
        });
        Self { tx, pending, task }
    }

    fn is_idle(&self) -> bool {
        self.pending.load(Ordering::Acquire) == 0 || self.task.is_finished()
    }
}

pub struct ConversationQueue<M> {
    handler: Arc<dyn QueueHandler<M>>,
    workers: HashMap<ConversationKey, Worker<M>>,
}

impl<M: Send + 'static> ConversationQueue<M> {
    pub fn new(handler: Arc<dyn QueueHandler<M>>) -> Self {
        Self {
            handler,
            workers: HashMap::new(),
        }
    }

    /// Queue `message` behind any earlier messages for `key`.
    pub fn dispatch(&mut self, key: ConversationKey, message: M) {
        self.reap_idle();

        let handler = &self.handler;
        let worker = self
            .workers
            .entry(key.clone())
            .or_insert_with(|| Worker::spawn(key.clone(), Arc::clone(handler)));
        worker.pending.fetch_add(1, Ordering::AcqRel);

        if let Err(mpsc::error::SendError(message)) = worker.tx.send(message) {
            // Worker died mid-message (handler panic); start a fresh one.
            warn!(conversation = %key, "conversation worker gone, respawning");
            let fresh = Worker::spawn(key.clone(), Arc::clone(handler));
            fresh.pending.fetch_add(1, Ordering::AcqRel);
            if fresh.tx.send(message).is_err() {
                warn!(conversation = %key, "dropping message, worker unavailable");
            }
            self.workers.insert(key, fresh);
        }
    }

    /// Drop workers with nothing left to do. Their tasks exit once the
    /// channel closes.
    fn reap_idle(&mut self) {
        let before = self.workers.len();
        self.workers.retain(|_, w| !w.is_idle());
        let reaped = before - self.workers.len();
        if reaped > 0 {
            debug!(reaped, active = self.workers.len(), "reaped idle conversation workers");
        }
    }

    /// Number of conversations with a live worker.
    #[must_use]
    pub fn active(&self) -> usize {
        self.workers.len()
    }

    /// Stop accepting messages and wait for queued ones to finish.
    pub async fn shutdown(self) {
        for (key, worker) in self.workers {
            drop(worker.tx);
            if let Err(e) = worker.task.await {
                warn!(conversation = %key, error = %e, "conversation worker failed");
            }
        }
    }
}
