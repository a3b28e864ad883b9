//! Fixed-size worker pool with a finish barrier
//!
//! Workers drain a FIFO of boxed tasks. A pending-task counter is
//! incremented on submit and decremented after each run (panic included),
//! which makes `finish` correct even when tasks enqueue further tasks: the
//! barrier releases only once the counter reaches zero.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, warn};

type Task = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct QueueState {
    tasks: VecDeque<Task>,
    pending: usize,
    closed: bool,
}

struct Shared {
    state: Mutex<QueueState>,
    work_available: Condvar,
    all_idle: Condvar,
}

pub struct WorkQueue {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkQueue {
    /// Spawn a pool of `threads` workers. Failing to spawn is a startup
    /// error; no partially started pool is returned.
    pub fn new(threads: usize) -> io::Result<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(QueueState::default()),
            work_available: Condvar::new(),
            all_idle: Condvar::new(),
        });

        let mut workers = Vec::with_capacity(threads);
        for id in 0..threads {
            let shared = Arc::clone(&shared);
            let handle = thread::Builder::new()
                .name(format!("webdex-worker-{id}"))
                .spawn(move || worker_loop(shared))?;
            workers.push(handle);
        }

        Ok(Self {
            shared,
            workers: Mutex::new(workers),
        })
    }

    /// Append a task and wake one worker. Never blocks beyond queue-mutex
    /// contention. Tasks submitted after `shutdown` are dropped.
    pub fn execute(&self, task: impl FnOnce() + Send + 'static) {
        let mut state = self.shared.state.lock();
        if state.closed {
            warn!("task submitted after shutdown; dropping");
            return;
        }
        state.tasks.push_back(Box::new(task));
        state.pending += 1;
        drop(state);
        self.shared.work_available.notify_one();
    }

    /// Block until every submitted task has completed, including tasks
    /// enqueued by other tasks during the drain.
    pub fn finish(&self) {
        let mut state = self.shared.state.lock();
        while state.pending > 0 {
            self.shared.all_idle.wait(&mut state);
        }
    }

    /// Close the queue; workers exit once it drains. Idempotent.
    pub fn shutdown(&self) {
        let mut state = self.shared.state.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        drop(state);
        self.shared.work_available.notify_all();
        debug!("work queue shut down");
    }

    /// Submitted tasks not yet completed (queued or running).
    pub fn pending(&self) -> usize {
        self.shared.state.lock().pending
    }
}

impl Drop for WorkQueue {
    fn drop(&mut self) {
        self.shutdown();
        for handle in self.workers.lock().drain(..) {
            if handle.join().is_err() {
                error!("worker thread panicked");
            }
        }
    }
}

fn worker_loop(shared: Arc<Shared>) {
    loop {
        let task = {
            let mut state = shared.state.lock();
            loop {
                if let Some(task) = state.tasks.pop_front() {
                    break task;
                }
                if state.closed {
                    return;
                }
                shared.work_available.wait(&mut state);
            }
        };

        // A panicking task must not take the worker down or leak its
        // pending count.
        if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
            error!("queued task panicked; pool continues");
        }

        let mut state = shared.state.lock();
        state.pending -= 1;
        if state.pending == 0 {
            shared.all_idle.notify_all();
        }
    }
}
