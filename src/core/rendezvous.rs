use std::sync::{Condvar, Mutex};
use thiserror::Error;

/// Error returned when the barrier is broken while a party is waiting on it,
/// or when arriving at an already-broken barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("rendezvous barrier broken")]
pub struct RendezvousBroken;

/// Two-party rendezvous point.
///
/// Both sides must [`arrive`](Rendezvous::arrive) before either returns, and
/// the barrier can be reused round after round. Breaking it unblocks the
/// peer with [`RendezvousBroken`] and fails every later arrival.
pub struct Rendezvous {
    state: Mutex<RendezvousState>,
    cond: Condvar,
}

struct RendezvousState {
    arrived: usize,
    generation: u64,
    broken: bool,
}

impl Rendezvous {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RendezvousState {
                arrived: 0,
                generation: 0,
                broken: false,
            }),
            cond: Condvar::new(),
        }
    }

    /// Block until the other party arrives in the current round.
    pub fn arrive(&self) -> Result<(), RendezvousBroken> {
        let mut state = self.state.lock().unwrap();
        if state.broken {
            return Err(RendezvousBroken);
        }
        let generation = state.generation;
        state.arrived += 1;
        if state.arrived == 2 {
            state.arrived = 0;
            state.generation = state.generation.wrapping_add(1);
            self.cond.notify_all();
            return Ok(());
        }
        while state.generation == generation && !state.broken {
            state = self.cond.wait(state).unwrap();
        }
        if state.broken {
            Err(RendezvousBroken)
        } else {
            Ok(())
        }
    }

    /// Permanently break the barrier, releasing any waiter.
    pub fn break_barrier(&self) {
        let mut state = self.state.lock().unwrap();
        state.broken = true;
        self.cond.notify_all();
    }

    pub fn is_broken(&self) -> bool {
        self.state.lock().unwrap().broken
    }
}

impl Default for Rendezvous {
    fn default() -> Self {
        Self::new()
    }
}
