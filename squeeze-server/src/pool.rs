//! Shared FIFO work queue and the fixed worker pool that drains it
//!
//! The queue mutex is held only to push or pop; jobs run unlocked. Closing
//! the queue wakes every idle worker. Workers keep popping until the queue
//! is both closed and empty, so connections accepted before shutdown are
//! still served.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error};

struct QueueState<T> {
    items: VecDeque<T>,
    open: bool,
}

/// Blocking multi-producer multi-consumer FIFO
pub struct WorkQueue<T> {
    state: Mutex<QueueState<T>>,
    ready: Condvar,
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                open: true,
            }),
            ready: Condvar::new(),
        }
    }

    /// Enqueue an item and wake one worker
    ///
    /// Returns the item back if the queue has been closed.
    pub fn push(&self, item: T) -> Result<(), T> {
        {
            let mut state = self.state.lock();
            if !state.open {
                return Err(item);
            }
            state.items.push_back(item);
        }
        self.ready.notify_one();
        Ok(())
    }

    /// Block until an item is available
    ///
    /// Returns `None` once the queue is closed and empty.
    pub fn pop(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                return Some(item);
            }
            if !state.open {
                return None;
            }
            self.ready.wait(&mut state);
        }
    }

    /// Stop accepting items and wake all waiting workers
    pub fn close(&self) {
        self.state.lock().open = false;
        self.ready.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        !self.state.lock().open
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fixed set of named worker threads
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `size` workers, each running `job` on items popped from `queue`
    ///
    /// `job` receives the worker index and the item.
    pub fn spawn<T, F>(size: usize, queue: Arc<WorkQueue<T>>, job: F) -> io::Result<Self>
    where
        T: Send + 'static,
        F: Fn(usize, T) + Send + Sync + 'static,
    {
        let job = Arc::new(job);
        let mut handles = Vec::with_capacity(size);

        for id in 0..size {
            let worker_queue = Arc::clone(&queue);
            let job = Arc::clone(&job);
            let handle = thread::Builder::new()
                .name(format!("squeeze-worker-{}", id))
                .spawn(move || {
                    debug!("Worker {} started", id);
                    while let Some(item) = worker_queue.pop() {
                        job(id, item);
                    }
                    debug!("Worker {} exiting", id);
                });

            match handle {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Release the workers already started before reporting
                    queue.close();
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(e);
                }
            }
        }

        Ok(Self { handles })
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Wait for every worker to exit; the queue must already be closed
    pub fn join(self) {
        for handle in self.handles {
            if handle.join().is_err() {
                error!("Worker thread panicked");
            }
        }
    }
}
