//! Demonstration test binary.
//!
//! Registers a handful of suites covering the harness surface: plain
//! passing tests, per-test hooks, multi-threaded bodies, every failure
//! mode, and a timeout. The integration tests drive this binary and
//! assert on its output and exit codes.

use frost::{Dispatch, Harness, TestDef};
use std::cell::RefCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn math(dispatch: Dispatch<'_>) {
    match dispatch {
        Dispatch::Discover(tests) => {
            tests.push(TestDef::new(1, "add_small"));
            tests.push(TestDef::new(2, "add_overflow"));
            tests.push(TestDef::new(3, "mul_identity"));
        }
        Dispatch::Run(1) => frost::require_eq!(2 + 2, 4),
        Dispatch::Run(2) => {
            let sum = u32::MAX.wrapping_add(1);
            frost::require_eq!(sum, 0);
        }
        Dispatch::Run(3) => {
            for value in [0i64, 1, -5, 1 << 40] {
                frost::require_eq!(value.wrapping_mul(1), value);
            }
        }
        _ => {}
    }
}

thread_local! {
    static SCRATCH: RefCell<String> = RefCell::new(String::new());
}

fn text(dispatch: Dispatch<'_>) {
    match dispatch {
        Dispatch::Discover(tests) => {
            tests.push(TestDef::new(1, "scratch_seeded"));
            tests.push(TestDef::new(2, "join_words"));
        }
        // runs in the test process before the body, on the same thread
        Dispatch::BeforeEach => SCRATCH.with(|s| s.borrow_mut().push_str("seeded")),
        Dispatch::Run(1) => {
            SCRATCH.with(|s| frost::require_eq!(s.borrow().as_str(), "seeded"));
        }
        Dispatch::Run(2) => {
            let joined = ["ice", "wind", "snow"].join("-");
            frost::require_eq!(joined.as_str(), "ice-wind-snow");
        }
        _ => {}
    }
}

// Fresh per test because every test gets its own process.
static FIRST_ROUND: AtomicUsize = AtomicUsize::new(0);
static SECOND_ROUND: AtomicUsize = AtomicUsize::new(0);
static SEEN_INDICES: AtomicUsize = AtomicUsize::new(0);

fn concurrency(dispatch: Dispatch<'_>) {
    match dispatch {
        Dispatch::Discover(tests) => {
            tests.push(TestDef::new(1, "barrier_rounds").threads(4));
            tests.push(TestDef::new(2, "thread_indices").threads(4));
        }
        Dispatch::Run(1) => {
            // one counter per round: a released thread may already be
            // incrementing for the next round while a sibling still
            // checks the previous one
            FIRST_ROUND.fetch_add(1, Ordering::SeqCst);
            frost::synchronize();
            frost::require_eq!(FIRST_ROUND.load(Ordering::SeqCst), 4);

            SECOND_ROUND.fetch_add(1, Ordering::SeqCst);
            frost::synchronize();
            frost::require_eq!(SECOND_ROUND.load(Ordering::SeqCst), 4);
        }
        Dispatch::Run(2) => {
            SEEN_INDICES.fetch_or(1 << frost::thread_index(), Ordering::SeqCst);
            frost::synchronize();
            frost::require_eq!(SEEN_INDICES.load(Ordering::SeqCst), 0b1111);
        }
        _ => {}
    }
}

fn flux_capacitor() -> Result<(), i32> {
    frost::trace_error!(42, "flux capacitor offline");
    Err(42)
}

fn failing(dispatch: Dispatch<'_>) {
    match dispatch {
        Dispatch::Discover(tests) => {
            tests.push(TestDef::new(1, "assert_small"));
            tests.push(TestDef::new(2, "trace_code"));
            tests.push(TestDef::new(3, "exit_code"));
            tests.push(TestDef::new(4, "exit_sentinel"));
            tests.push(TestDef::new(5, "panic"));
        }
        Dispatch::Run(1) => frost::require_eq!(1 + 1, 3),
        Dispatch::Run(2) => frost::require_ok!(flux_capacitor()),
        Dispatch::Run(3) => std::process::exit(3),
        Dispatch::Run(4) => std::process::exit(frost::FAILURE_EXIT_CODE),
        Dispatch::Run(5) => panic!("boom"),
        _ => {}
    }
}

fn slow(dispatch: Dispatch<'_>) {
    match dispatch {
        Dispatch::Discover(tests) => {
            tests.push(TestDef::new(1, "quick_nap").timeout(Duration::from_millis(50)));
        }
        Dispatch::Run(1) => std::thread::sleep(Duration::from_millis(300)),
        _ => {}
    }
}

fn main() {
    Harness::new()
        .suite("math", math)
        .suite("text", text)
        .suite("sync", concurrency)
        .suite("failing", failing)
        .suite("slow", slow)
        .run();
}
