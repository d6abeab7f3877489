//! Debugger attach controller.
//!
//! Spawns the unit's process stopped (the child raises SIGSTOP before
//! touching any test code), prints its pid, and waits while the user
//! attaches a debugger. The stopped process holds still until the
//! debugger resumes it; the controller just watches for the child to
//! finish or for the user to press ctrl-c.

use crate::error::HarnessError;
use crate::exec::{self, Unit, POLL_INTERVAL};
use crate::report::{Reporter, INDENT};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

// Set by the SIGINT handler; polled by the attach loop. A signal-safe
// flag is all the handler is allowed to touch.
static ABORT: AtomicBool = AtomicBool::new(false);

extern "C" fn on_interrupt(_signal: libc::c_int) {
    ABORT.store(true, Ordering::SeqCst);
}

/// Run one unit under the attach protocol. Returns `true` when the user
/// aborted the wait (the caller should stop re-running the unit).
pub fn attach(unit: &Unit<'_>, reporter: &Reporter) -> Result<bool, HarnessError> {
    let mut child = exec::spawn_unit(unit, true)?;

    ABORT.store(false, Ordering::SeqCst);
    let handler = on_interrupt as *const () as libc::sighandler_t;
    let previous = unsafe { libc::signal(libc::SIGINT, handler) };

    reporter.note(&format!(
        "Waiting for debugger to attach, press ctrl-c to abort... (pid {})",
        child.id()
    ));

    let aborted = loop {
        match child.try_wait() {
            Ok(Some(_)) => {
                reporter.note("Test process exited. Restarting test.");
                break false;
            }
            Ok(None) => {
                if ABORT.load(Ordering::SeqCst) {
                    exec::kill_child(&mut child, reporter);
                    // \r overwrites the shell's ^C echo
                    eprintln!("\r{INDENT}Waiting aborted by user.");
                    break true;
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                reporter.note(&format!("Waiting for debug process failed ({err})."));
                break false;
            }
        }
    };

    unsafe { libc::signal(libc::SIGINT, previous) };
    Ok(aborted)
}
