//! Fixed-size worker pool.
//!
//! `size` long-lived tasks pull jobs from one shared queue. Each worker runs a
//! job to completion before taking the next one, so at most `size` jobs are in
//! flight. What happens when jobs arrive faster than they drain is decided by
//! the [`QueuePolicy`].

use std::future::Future;

use async_std::channel::{self, Receiver, Sender};
use async_std::task::{self, JoinHandle};
use thiserror::Error;

/// Reference worker count.
pub const DEFAULT_POOL_SIZE: usize = 64;

/// Backlog policy for jobs waiting on a free worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuePolicy {
    /// Jobs queue without limit; submitting never waits.
    Unbounded,
    /// At most `n` jobs wait; submitting waits for room.
    Bounded(usize),
}

impl From<Option<usize>> for QueuePolicy {
    fn from(capacity: Option<usize>) -> Self {
        match capacity {
            Some(n) => QueuePolicy::Bounded(n.max(1)),
            None => QueuePolicy::Unbounded,
        }
    }
}

/// The pool was shut down and no longer takes jobs.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("worker pool is closed")]
pub struct PoolClosed;

pub struct WorkerPool<T> {
    sender: Sender<T>,
    workers: Vec<JoinHandle<()>>,
}

impl<T> WorkerPool<T>
where
    T: Send + 'static,
{
    /// Spawns `size` workers (at least one), each calling `job` for every
    /// item it takes off the queue.
    pub fn new<F, Fut>(size: usize, policy: QueuePolicy, job: F) -> Self
    where
        F: Fn(T) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (sender, receiver) = match policy {
            QueuePolicy::Unbounded => channel::unbounded(),
            QueuePolicy::Bounded(n) => channel::bounded(n),
        };

        let workers = (0..size.max(1))
            .map(|id| task::spawn(Self::worker(id, receiver.clone(), job.clone())))
            .collect();

        Self { sender, workers }
    }

    async fn worker<F, Fut>(id: usize, receiver: Receiver<T>, job: F)
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = ()>,
    {
        while let Ok(item) = receiver.recv().await {
            job(item).await;
        }
        tracing::trace!(worker = id, "worker stopped");
    }

    /// Queues a job for the next free worker.
    pub async fn submit(&self, item: T) -> Result<(), PoolClosed> {
        self.sender.send(item).await.map_err(|_| PoolClosed)
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Jobs waiting for a worker.
    pub fn queued(&self) -> usize {
        self.sender.len()
    }

    /// Stops taking jobs, lets the workers drain the queue, and waits for them.
    pub async fn shutdown(self) {
        self.sender.close();
        for worker in self.workers {
            worker.await;
        }
    }
}
