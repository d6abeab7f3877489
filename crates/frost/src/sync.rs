//! Cross-thread rendezvous for multi-threaded test bodies.
//!
//! Each worker thread of a unit calls [`synchronize`]; every caller
//! blocks until all of the unit's threads have arrived, then all are
//! released together. The barrier is reusable: release is keyed on a
//! generation counter, not on the arrival count, so a thread re-entering
//! for the next round can never be woken by a stale signal.

use std::cell::Cell;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock};

/// Reusable all-or-nothing rendezvous point for a fixed thread count.
pub struct Rendezvous {
    threads: u16,
    state: Mutex<Round>,
    cond: Condvar,
}

struct Round {
    waiting: u16,
    generation: u64,
}

impl Rendezvous {
    /// Barrier expecting `threads` arrivals per round.
    pub fn new(threads: u16) -> Self {
        Self {
            threads,
            state: Mutex::new(Round {
                waiting: 0,
                generation: 0,
            }),
            cond: Condvar::new(),
        }
    }

    /// Block until all threads of the current round have arrived.
    ///
    /// The completing arrival resets the count, advances the generation,
    /// and wakes everyone; the others wait until the generation changes.
    pub fn wait(&self) {
        let mut state = recover(self.state.lock());
        let generation = state.generation;

        state.waiting += 1;
        if state.waiting == self.threads {
            state.waiting = 0;
            state.generation = state.generation.wrapping_add(1);
            self.cond.notify_all();
        } else {
            while state.generation == generation {
                state = recover(self.cond.wait(state));
            }
        }
    }
}

// Keep synchronizing even if a sibling worker panicked mid-round; the
// unit process is torn down by the join anyway.
fn recover<'a>(
    result: Result<MutexGuard<'a, Round>, PoisonError<MutexGuard<'a, Round>>>,
) -> MutexGuard<'a, Round> {
    result.unwrap_or_else(PoisonError::into_inner)
}

// One barrier per unit execution, installed by the process entry before
// worker threads start; never shared across units.
static CURRENT: RwLock<Option<Arc<Rendezvous>>> = RwLock::new(None);

thread_local! {
    static THREAD_INDEX: Cell<u16> = Cell::new(0);
}

/// Install the barrier for the unit running in this process.
pub(crate) fn install(rendezvous: Arc<Rendezvous>) {
    let mut current = CURRENT.write().unwrap_or_else(PoisonError::into_inner);
    *current = Some(rendezvous);
}

pub(crate) fn set_thread_index(index: u16) {
    THREAD_INDEX.with(|cell| cell.set(index));
}

/// Index of the calling worker thread within its unit (0 for the first).
pub fn thread_index() -> u16 {
    THREAD_INDEX.with(|cell| cell.get())
}

/// Rendezvous with the other worker threads of the current unit.
///
/// # Panics
///
/// Panics when called outside a running test process.
pub fn synchronize() {
    let current = CURRENT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    match current {
        Some(rendezvous) => rendezvous.wait(),
        None => panic!("synchronize() called outside a running test"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_single_thread_never_blocks() {
        let barrier = Rendezvous::new(1);
        barrier.wait();
        barrier.wait();
    }

    #[test]
    fn test_all_arrivals_precede_release() {
        // Two rounds, repeated: no thread may be released from a round
        // before all four arrivals of that round happened.
        const THREADS: u16 = 4;
        for _ in 0..50 {
            let barrier = Arc::new(Rendezvous::new(THREADS));
            let first = Arc::new(AtomicUsize::new(0));
            let second = Arc::new(AtomicUsize::new(0));

            let mut workers = Vec::new();
            for _ in 0..THREADS {
                let barrier = Arc::clone(&barrier);
                let first = Arc::clone(&first);
                let second = Arc::clone(&second);
                workers.push(thread::spawn(move || {
                    first.fetch_add(1, Ordering::SeqCst);
                    barrier.wait();
                    assert_eq!(first.load(Ordering::SeqCst), THREADS as usize);

                    second.fetch_add(1, Ordering::SeqCst);
                    barrier.wait();
                    assert_eq!(second.load(Ordering::SeqCst), THREADS as usize);
                }));
            }
            for worker in workers {
                worker.join().unwrap();
            }
        }
    }

    #[test]
    fn test_generation_advances_per_round() {
        let barrier = Arc::new(Rendezvous::new(2));
        let partner = Arc::clone(&barrier);
        let worker = thread::spawn(move || {
            for _ in 0..100 {
                partner.wait();
            }
        });
        for _ in 0..100 {
            barrier.wait();
        }
        worker.join().unwrap();

        let state = barrier.state.lock().unwrap();
        assert_eq!(state.waiting, 0);
        assert_eq!(state.generation, 100);
    }

    #[test]
    fn test_thread_index_is_thread_local() {
        set_thread_index(3);
        let from_worker = thread::spawn(thread_index).join().unwrap();
        assert_eq!(from_worker, 0);
        assert_eq!(thread_index(), 3);
        set_thread_index(0);
    }
}
