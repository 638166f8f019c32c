//! Worker Pool
//!
//! A resizable pool of OS threads consuming a FIFO task queue. The notification
//! center uses it to run async observer callbacks off the posting thread.
//!
//! # Lifecycle
//!
//! - `resize(n)` grows by spawning workers, or shrinks by queueing retire
//!   markers behind the work already queued, so nothing queued is lost
//! - `shutdown(StopMode::Drain)` runs everything queued, then joins workers
//! - `shutdown(StopMode::Discard)` drops queued tasks unrun, then joins workers
//!
//! ```
//! use notifly::pool::{StopMode, WorkerPool};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let pool = WorkerPool::new(2);
//! let counter = Arc::new(AtomicUsize::new(0));
//! for _ in 0..10 {
//!     let counter = Arc::clone(&counter);
//!     pool.submit(move || { counter.fetch_add(1, Ordering::SeqCst); }).unwrap();
//! }
//! pool.shutdown(StopMode::Drain);
//! assert_eq!(counter.load(Ordering::SeqCst), 10);
//! ```

pub mod error;
mod worker;


use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender};
use log::{debug, error, warn};
use parking_lot::Mutex;

pub use error::{PoolError, PoolResult};
use worker::Worker;

/// A unit of work for the pool
pub type Task = Box<dyn FnOnce() + Send + 'static>;

pub(crate) enum Job {
    Run(Task),
    Retire,
}

/// How queued tasks are treated on shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopMode {
    /// Run every queued task before the workers exit
    Drain,
    /// Drop queued tasks without running them; in-flight tasks still finish
    Discard,
}

/// Counters shared with the worker threads
#[derive(Debug, Default)]
pub(crate) struct PoolShared {
    pub idle: AtomicUsize,
    pub discarding: AtomicBool,
    pub executed: AtomicU64,
    pub panicked: AtomicU64,
    pub discarded: AtomicU64,
}

/// Point-in-time pool statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub workers: usize,
    pub idle: usize,
    pub queued: usize,
    pub executed: u64,
    pub panicked: u64,
    pub discarded: u64,
}

struct Workers {
    handles: Vec<Worker>,
    /// Workers not asked to retire
    active: usize,
    next_index: usize,
}

pub struct WorkerPool {
    sender: Mutex<Option<Sender<Job>>>,
    receiver: Receiver<Job>,
    workers: Mutex<Workers>,
    shared: Arc<PoolShared>,
}

impl WorkerPool {
    /// Create a pool with `threads` workers
    pub fn new(threads: usize) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let pool = Self {
            sender: Mutex::new(Some(sender)),
            receiver,
            workers: Mutex::new(Workers {
                handles: Vec::new(),
                active: 0,
                next_index: 0,
            }),
            shared: Arc::new(PoolShared::default()),
        };
        pool.resize(threads);
        pool
    }

    /// Queue a task. Fails once the pool has been shut down.
    pub fn submit<F>(&self, task: F) -> PoolResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender.lock();
        let sender = sender.as_ref().ok_or(PoolError::Stopped)?;
        sender
            .send(Job::Run(Box::new(task)))
            .map_err(|_| PoolError::Stopped)
    }

    /// Change the number of workers. A stopped pool ignores this.
    pub fn resize(&self, threads: usize) {
        let sender = self.sender.lock();
        let Some(sender) = sender.as_ref() else {
            warn!("Ignoring resize of a stopped worker pool");
            return;
        };

        let mut workers = self.workers.lock();
        workers.handles.retain(|w| !w.is_finished());

        if threads > workers.active {
            for _ in workers.active..threads {
                let index = workers.next_index;
                match Worker::spawn(index, self.receiver.clone(), Arc::clone(&self.shared)) {
                    Ok(worker) => {
                        workers.handles.push(worker);
                        workers.next_index += 1;
                        workers.active += 1;
                    }
                    Err(e) => {
                        error!("Failed to spawn worker {}: {}", index, e);
                        break;
                    }
                }
            }
        } else {
            for _ in threads..workers.active {
                // cannot fail: the pool holds the receiver
                let _ = sender.send(Job::Retire);
            }
            workers.active = threads;
        }

        debug!("Worker pool resized to {} threads", workers.active);
    }

    /// Number of workers not asked to retire
    pub fn size(&self) -> usize {
        self.workers.lock().active
    }

    /// Number of workers waiting for a task
    pub fn idle(&self) -> usize {
        self.shared.idle.load(Ordering::SeqCst)
    }

    /// Tasks (and retire markers) waiting in the queue
    pub fn queued(&self) -> usize {
        self.receiver.len()
    }

    /// Whether the calling thread is one of this pool's workers
    pub fn is_worker_thread(&self) -> bool {
        let current = thread::current().id();
        self.workers
            .lock()
            .handles
            .iter()
            .any(|w| w.handle.thread().id() == current)
    }

    pub fn is_stopped(&self) -> bool {
        self.sender.lock().is_none()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            workers: self.size(),
            idle: self.idle(),
            queued: self.queued(),
            executed: self.shared.executed.load(Ordering::Relaxed),
            panicked: self.shared.panicked.load(Ordering::Relaxed),
            discarded: self.shared.discarded.load(Ordering::Relaxed),
        }
    }

    /// Stop accepting tasks, settle the queue per `mode` and join every worker.
    /// Calling it again is a no-op.
    pub fn shutdown(&self, mode: StopMode) {
        let Some(sender) = self.sender.lock().take() else {
            return;
        };

        if mode == StopMode::Discard {
            self.shared.discarding.store(true, Ordering::SeqCst);
        }
        drop(sender);

        let handles = {
            let mut workers = self.workers.lock();
            workers.active = 0;
            std::mem::take(&mut workers.handles)
        };

        let current = thread::current().id();
        let mut on_worker = false;
        for worker in handles {
            if worker.handle.thread().id() == current {
                // last reference dropped from inside a task; this worker drains the
                // rest of the queue and exits once its task returns
                on_worker = true;
                continue;
            }
            if worker.handle.join().is_err() {
                error!("Worker {} terminated abnormally", worker.index);
            }
        }

        // only left behind when every worker had already retired
        if !on_worker {
            let leftover = self.receiver.try_iter().filter(|job| matches!(job, Job::Run(_))).count();
            if leftover > 0 {
                warn!("Worker pool stopped with {} queued tasks and no workers; dropped", leftover);
            }
        }

        debug!("Worker pool stopped ({:?})", mode);
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown(StopMode::Drain);
    }
}
