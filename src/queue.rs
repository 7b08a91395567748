use crate::rule::Candidate;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

/// What a worker gets back from [`WorkQueue::dequeue`].
pub enum Dequeued {
    Candidate(Candidate),
    /// Quiescence has been proven: no candidate will ever arrive again.
    Terminated,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct QueueStats {
    pub total_enqueued: u64,
    pub total_dequeued: u64,
    pub peak_depth: usize,
}

struct QueueState {
    items: VecDeque<Candidate>,
    active_workers: usize,
    waiting_workers: usize,
    terminated: bool,
    stats: QueueStats,
}

/// The shared work queue (§4.1). Quiescence is detected with the
/// `active_workers`/`waiting_workers` two-counter protocol rather than any
/// "join when empty" idiom, because workers both consume and produce
/// (§9): a worker that dequeues `Terminated` must call
/// [`WorkQueue::decrement_active_workers`] itself once it has actually
/// exited its loop.
pub struct WorkQueue {
    state: Mutex<QueueState>,
    not_empty: Condvar,
}

impl WorkQueue {
    pub fn new(pool_size: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                active_workers: pool_size,
                waiting_workers: 0,
                terminated: false,
                stats: QueueStats::default(),
            }),
            not_empty: Condvar::new(),
        }
    }

    /// Atomically appends a batch and wakes waiters. A programming error to
    /// call after quiescence has been reached (§4.1).
    pub fn enqueue_all(&self, rules: Vec<Candidate>) {
        if rules.is_empty() {
            return;
        }
        let mut state = self.state.lock().unwrap();
        if state.terminated {
            log::error!("enqueue_all called after quiescence; this is a programming error");
            drop(state);
            std::process::abort();
        }
        state.stats.total_enqueued += rules.len() as u64;
        state.items.extend(rules);
        state.stats.peak_depth = state.stats.peak_depth.max(state.items.len());
        drop(state);
        self.not_empty.notify_all();
    }

    /// Blocks while the queue is empty and at least one worker is still
    /// active. Returns `Terminated` once quiescence is proven: every worker
    /// is both idle and blocked here.
    pub fn dequeue(&self) -> Dequeued {
        let mut state = self.state.lock().unwrap();
        loop {
            if let Some(item) = state.items.pop_front() {
                state.stats.total_dequeued += 1;
                return Dequeued::Candidate(item);
            }
            if state.terminated {
                return Dequeued::Terminated;
            }
            state.waiting_workers += 1;
            if state.waiting_workers == state.active_workers {
                state.terminated = true;
                state.waiting_workers -= 1;
                self.not_empty.notify_all();
                return Dequeued::Terminated;
            }
            state = self.not_empty.wait(state).unwrap();
            state.waiting_workers -= 1;
        }
    }

    /// Called exactly once by a worker after it observes `Terminated` and
    /// is about to exit its loop.
    pub fn decrement_active_workers(&self) {
        let mut state = self.state.lock().unwrap();
        state.active_workers -= 1;
    }

    pub fn stats(&self) -> QueueStats {
        self.state.lock().unwrap().stats
    }
}
