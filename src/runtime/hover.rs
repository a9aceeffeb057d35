use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use log::debug;

/// Runs hover updates on one dedicated worker fed by a single-slot queue:
/// a newly submitted position supersedes any still-pending one, so the most
/// recent hover wins and updates never interleave.
#[derive(Debug)]
pub struct HoverService {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

#[derive(Debug)]
struct Shared {
    slot: Mutex<Slot>,
    available: Condvar,
}

#[derive(Debug, Default)]
struct Slot {
    pending: Option<Vec<usize>>,
    shutdown: bool,
}

impl HoverService {
    pub fn new(handler: impl Fn(Vec<usize>) + Send + 'static) -> Self {
        let shared = Arc::new(Shared {
            slot: Mutex::new(Slot::default()),
            available: Condvar::new(),
        });
        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("labeledit-hover".into())
            .spawn(move || worker_loop(&worker_shared, handler))
            .expect("spawn hover worker");
        Self {
            shared,
            worker: Some(worker),
        }
    }

    /// Schedules a hover update, replacing any still-pending one.
    pub fn submit(&self, position: Vec<usize>) {
        let mut slot = lock(&self.shared.slot);
        if slot.pending.replace(position).is_some() {
            debug!("superseded pending hover update");
        }
        self.shared.available.notify_one();
    }
}

fn worker_loop(shared: &Shared, handler: impl Fn(Vec<usize>)) {
    loop {
        let position = {
            let mut slot = lock(&shared.slot);
            loop {
                // drain the slot before honoring shutdown
                if let Some(position) = slot.pending.take() {
                    break position;
                }
                if slot.shutdown {
                    return;
                }
                slot = shared
                    .available
                    .wait(slot)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };
        handler(position);
    }
}

impl Drop for HoverService {
    fn drop(&mut self) {
        lock(&self.shared.slot).shutdown = true;
        self.shared.available.notify_one();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn lock(mutex: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
