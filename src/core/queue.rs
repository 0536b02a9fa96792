use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

use super::media::MediaItem;

/// FIFO of pending thumbnail jobs, shared between the UI side and the
/// worker thread.
///
/// `total_count` tracks jobs submitted since the last clear and only feeds
/// "N of M" progress labels; it is not decremented as jobs complete.
pub struct JobQueue {
    state: Mutex<QueueState>,
    not_empty: Condvar,
}

struct QueueState {
    items: VecDeque<MediaItem>,
    total_count: usize,
    closed: bool,
}

impl JobQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                total_count: 0,
                closed: false,
            }),
            not_empty: Condvar::new(),
        }
    }

    /// Append a job and wake one waiting worker. Safe from any thread,
    /// never fails. Duplicate paths are queued again.
    pub fn add_job(&self, item: MediaItem) {
        let mut state = self.state.lock().unwrap();
        state.items.push_back(item);
        state.total_count += 1;
        self.not_empty.notify_one();
        log::debug!("job added, {} pending", state.items.len());
    }

    /// Drop every pending job and start a new progress epoch. A job already
    /// handed to the worker is not affected.
    pub fn clear_jobs(&self) {
        let mut state = self.state.lock().unwrap();
        state.items.clear();
        state.total_count = 0;
    }

    /// Number of jobs currently waiting.
    pub fn pending(&self) -> usize {
        self.state.lock().unwrap().items.len()
    }

    /// Wake any blocked worker and make further pops return `None`.
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        self.not_empty.notify_all();
    }

    /// Blocking pop for the worker thread.
    ///
    /// `on_idle` runs each time the queue is found empty, before blocking on
    /// the condition variable; emptiness is re-checked after every wakeup.
    /// Returns the head job together with the current `total_count`
    /// snapshot, or `None` once the queue is closed. The closed flag is
    /// checked before `on_idle`, so a close observed on wakeup produces no
    /// further idle callbacks.
    pub fn pop_blocking(&self, mut on_idle: impl FnMut()) -> Option<(MediaItem, usize)> {
        let mut state = self.state.lock().unwrap();
        loop {
            if state.closed {
                return None;
            }
            if !state.items.is_empty() {
                break;
            }
            on_idle();
            state = self.not_empty.wait(state).unwrap();
        }
        let total = state.total_count;
        state.items.pop_front().map(|item| (item, total))
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}
