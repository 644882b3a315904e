// SPDX-License-Identifier: GPL-2.0

//! Assertion/abort hook for caller-bug conditions (null handle, misaligned
//! pointer, out-of-range deallocation) that the typed API can't rule out
//! statically. In debug builds, a configurable hook reports file/line/
//! expression text to a sink before the process aborts via `panic!`; in
//! release builds this degrades to plain `debug_assert!` and compiles
//! out entirely. Modeled on the teacher's panic handler (diagnostics
//! printed before halting) and on `xdebug.c`/`xdebug.h`'s `X_ASSERT` from
//! the original sources.

use core::fmt;

use crate::sync::Mutex;

/// Receives a rendered assertion-failure report before the process aborts.
pub trait AssertSink: Send + Sync {
	fn report(&self, file: &str, line: u32, expr: &str);
}

struct NullSink;
impl AssertSink for NullSink {
	fn report(&self, _file: &str, _line: u32, _expr: &str) {}
}

static SINK: Mutex<&'static dyn AssertSink> = Mutex::new(&NullSink);

/// Install the hook that runs before every assertion-triggered abort.
pub fn set_assert_sink(sink: &'static dyn AssertSink) {
	*SINK.lock() = sink;
}

/// Report a failed assertion and abort. Not meant to be called directly —
/// use [`debug_assert_or_abort`].
#[cold]
pub fn assert_failed(file: &str, line: u32, expr: &str) -> ! {
	SINK.lock().report(file, line, expr);
	panic!("assertion failed at {file}:{line}: {expr}");
}

/// Like `debug_assert!`, but routes through the configurable [`AssertSink`]
/// before aborting instead of the bare panic machinery.
#[macro_export]
macro_rules! debug_assert_or_abort {
	($cond:expr) => {
		if cfg!(debug_assertions) && !($cond) {
			$crate::debug::assert_failed(file!(), line!(), stringify!($cond));
		}
	};
	($cond:expr, $($arg:tt)+) => {
		if cfg!(debug_assertions) && !($cond) {
			$crate::debug::assert_failed(file!(), line!(), core::concat!(stringify!($cond), ": ", core::stringify!($($arg)+)));
		}
	};
}

/// A sink that renders reports through any `core::fmt::Write` target
/// (a UART, a `Stream`, ...) behind a lock — the debug-facility
/// equivalent of the stream layer's formatted-write path.
pub struct WriteSink<W> {
	target: Mutex<W>,
}

impl<W: fmt::Write + Send> WriteSink<W> {
	pub fn new(target: W) -> Self {
		Self {
			target: Mutex::new(target),
		}
	}
}

impl<W: fmt::Write + Send> AssertSink for WriteSink<W> {
	fn report(&self, file: &str, line: u32, expr: &str) {
		let _ = writeln!(self.target.lock(), "assertion failed at {file}:{line}: {expr}");
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloc::string::String;
	use core::sync::atomic::{AtomicBool, Ordering};

	#[test]
	fn write_sink_formats_report() {
		let sink = WriteSink::new(String::new());
		sink.report("foo.rs", 42, "x > 0");
		assert!(sink.target.lock().contains("foo.rs:42"));
	}

	#[test]
	fn installed_sink_is_invoked() {
		static FIRED: AtomicBool = AtomicBool::new(false);
		struct StaticFlagSink;
		impl AssertSink for StaticFlagSink {
			fn report(&self, _file: &str, _line: u32, _expr: &str) {
				FIRED.store(true, Ordering::SeqCst);
			}
		}
		set_assert_sink(&StaticFlagSink);
		SINK.lock().report("f", 1, "e");
		assert!(FIRED.load(Ordering::SeqCst));
	}
}
