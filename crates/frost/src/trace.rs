//! Bounded per-thread error trace.
//!
//! Test code records failure context here; the harness reads it back
//! only when printing a failure diagnostic. Both bounds are fixed:
//! at most [`MAX_FRAMES`] frames per thread, at most [`MAX_MESSAGE`]
//! bytes of message per frame, and growth past either bound is silently
//! truncated.

use std::cell::RefCell;
use std::fmt;
use std::fmt::Write;

/// Maximum number of frames retained per thread.
pub const MAX_FRAMES: usize = 32;

/// Maximum message length per frame, in bytes.
pub const MAX_MESSAGE: usize = 128;

/// One recorded error: source location, numeric code, and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub file: &'static str,
    pub line: u32,
    pub code: i32,
    pub message: String,
}

struct State {
    frames: Vec<Frame>,
    code: i32,
}

thread_local! {
    // full capacity up front so recording frames never reallocates
    static TRACE: RefCell<State> = RefCell::new(State {
        frames: Vec::with_capacity(MAX_FRAMES),
        code: 0,
    });
}

/// Start a new frame and set the thread's current error code.
///
/// `code` must be nonzero (zero means "no error"). Frames past the
/// capacity are dropped, but the current code is still updated.
pub fn push(file: &'static str, line: u32, code: i32) {
    debug_assert!(code != 0);
    TRACE.with(|trace| {
        let mut state = trace.borrow_mut();
        state.code = code;
        if state.frames.len() >= MAX_FRAMES {
            return;
        }
        state.frames.push(Frame {
            file,
            line,
            code,
            message: String::new(),
        });
    });
}

/// Append formatted text to the newest frame's message.
///
/// Does nothing without a frame; truncates silently at the message
/// capacity, on a character boundary.
pub fn append_message(args: fmt::Arguments<'_>) {
    TRACE.with(|trace| {
        let mut state = trace.borrow_mut();
        let Some(frame) = state.frames.last_mut() else {
            return;
        };

        let mut text = String::new();
        let _ = write!(text, "{args}");

        let room = MAX_MESSAGE.saturating_sub(frame.message.len());
        let mut cut = text.len().min(room);
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        frame.message.push_str(&text[..cut]);
    });
}

/// The thread's current error code (0 = none).
pub fn code() -> i32 {
    TRACE.with(|trace| trace.borrow().code)
}

/// Number of recorded frames for this thread.
pub fn len() -> usize {
    TRACE.with(|trace| trace.borrow().frames.len())
}

#[cfg(test)]
fn capacity() -> usize {
    TRACE.with(|trace| trace.borrow().frames.capacity())
}

/// The nth frame, oldest first.
pub fn nth(n: usize) -> Option<Frame> {
    TRACE.with(|trace| trace.borrow().frames.get(n).cloned())
}

/// All frames, oldest first.
pub fn frames() -> Vec<Frame> {
    TRACE.with(|trace| trace.borrow().frames.clone())
}

/// Reset the thread's code and stack.
pub fn clear() {
    TRACE.with(|trace| {
        let mut state = trace.borrow_mut();
        state.code = 0;
        state.frames.clear();
    });
}

/// Record an error frame at the call site, with an optional message.
#[macro_export]
macro_rules! trace_error {
    ($code:expr $(,)?) => {
        $crate::trace::push(::std::file!(), ::std::line!(), $code)
    };
    ($code:expr, $($arg:tt)*) => {{
        $crate::trace::push(::std::file!(), ::std::line!(), $code);
        $crate::trace::append_message(::std::format_args!($($arg)*));
    }};
}
