//! Worker Thread Implementation
//!
//! Each worker pulls jobs off the shared channel until it receives a retire
//! marker or the channel is closed and empty.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Receiver;
use log::{debug, error, trace};

use crate::pool::{Job, PoolShared};

/// A spawned worker and its join handle
pub(crate) struct Worker {
    pub index: usize,
    pub handle: JoinHandle<()>,
}

impl Worker {
    pub fn spawn(index: usize, receiver: Receiver<Job>, shared: Arc<PoolShared>) -> std::io::Result<Self> {
        let handle = thread::Builder::new()
            .name(format!("notifly-worker-{}", index))
            .spawn(move || worker_loop(index, receiver, shared))?;
        Ok(Self { index, handle })
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

fn worker_loop(index: usize, receiver: Receiver<Job>, shared: Arc<PoolShared>) {
    debug!("Worker {} started", index);

    loop {
        shared.idle.fetch_add(1, Ordering::SeqCst);
        let job = receiver.recv();
        shared.idle.fetch_sub(1, Ordering::SeqCst);

        match job {
            Ok(Job::Run(task)) => {
                if shared.discarding.load(Ordering::SeqCst) {
                    shared.discarded.fetch_add(1, Ordering::Relaxed);
                    drop(task);
                    continue;
                }

                trace!("Worker {} running task", index);
                if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                    shared.panicked.fetch_add(1, Ordering::Relaxed);
                    error!("Worker {}: observer callback panicked", index);
                } else {
                    shared.executed.fetch_add(1, Ordering::Relaxed);
                }
            }
            Ok(Job::Retire) => {
                debug!("Worker {} retired", index);
                break;
            }
            Err(_) => {
                // all senders gone and the queue is empty
                debug!("Worker {} stopping", index);
                break;
            }
        }
    }
}
