use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;

use crate::errors::{ScanError, ScanResult};

type Task = Box<dyn FnOnce() + Send + 'static>;

struct PoolState {
    queue: VecDeque<Task>,
    /// True while the pool is running and the queue has not been closed.
    accepting: bool,
    /// First panic captured from a task body, if any.
    panic: Option<String>,
}

struct PoolShared {
    state: Mutex<PoolState>,
    available: Condvar,
}

impl PoolShared {
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        // a poisoning panic inside a task is already caught; tolerate the flag
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Fixed-size pool of worker threads consuming a FIFO queue of closures.
///
/// Lifecycle is idle → running: [`run`](Self::run) spawns the workers,
/// [`wait`](Self::wait) closes the queue and joins them once it is drained,
/// [`stop`](Self::stop) discards tasks that have not started. Tasks
/// submitted while idle are silently discarded. Scheduling is FIFO per the
/// queue, with no ordering guarantee across concurrently running tasks.
pub struct TaskPool {
    shared: Arc<PoolShared>,
    workers: Vec<thread::JoinHandle<()>>,
    worker_count: usize,
}

impl TaskPool {
    /// A pool with `workers` threads (at least one).
    pub fn new(workers: usize) -> Self {
        Self {
            shared: Arc::new(PoolShared {
                state: Mutex::new(PoolState {
                    queue: VecDeque::new(),
                    accepting: false,
                    panic: None,
                }),
                available: Condvar::new(),
            }),
            workers: Vec::new(),
            worker_count: workers.max(1),
        }
    }

    /// A pool sized to the hardware parallelism.
    pub fn with_default_workers() -> Self {
        Self::new(num_cpus::get())
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Spawns the workers; no-op when already running.
    pub fn run(&mut self) {
        if !self.workers.is_empty() {
            return;
        }
        {
            let mut state = self.shared.lock();
            state.accepting = true;
            state.panic = None;
        }
        for _ in 0..self.worker_count {
            let shared = Arc::clone(&self.shared);
            self.workers.push(thread::spawn(move || worker_loop(&shared)));
        }
    }

    /// Enqueues a task. Discarded silently while the pool is idle.
    pub fn submit(&self, task: impl FnOnce() + Send + 'static) {
        let mut state = self.shared.lock();
        if !state.accepting {
            return;
        }
        state.queue.push_back(Box::new(task));
        drop(state);
        self.shared.available.notify_one();
    }

    /// Closes the queue and joins every worker once it is drained.
    ///
    /// Returns the first captured task panic as a worker failure.
    pub fn wait(&mut self) -> ScanResult<()> {
        self.shared.lock().accepting = false;
        self.shared.available.notify_all();
        self.join_workers()
    }

    /// Discards tasks that have not started, lets running tasks finish and
    /// joins every worker.
    pub fn stop(&mut self) -> ScanResult<()> {
        {
            let mut state = self.shared.lock();
            state.accepting = false;
            state.queue.clear();
        }
        self.shared.available.notify_all();
        self.join_workers()
    }

    fn join_workers(&mut self) -> ScanResult<()> {
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
        match self.shared.lock().panic.take() {
            Some(message) => Err(ScanError::worker(message)),
            None => Ok(()),
        }
    }
}

impl Drop for TaskPool {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn worker_loop(shared: &PoolShared) {
    loop {
        let task = {
            let mut state = shared.lock();
            loop {
                if let Some(task) = state.queue.pop_front() {
                    break Some(task);
                }
                if !state.accepting {
                    break None;
                }
                state = shared
                    .available
                    .wait(state)
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
            }
        };

        let task = match task {
            Some(task) => task,
            None => return,
        };

        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(move || task())) {
            let message = super::panic_message(payload.as_ref());
            let mut state = shared.lock();
            state.panic.get_or_insert(message);
        }
    }
}
