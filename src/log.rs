// SPDX-License-Identifier: GPL-2.0

//! Minimal `log`-facade-style logging: a pluggable [`Logger`] sink plus
//! `trace!`/`debug!`/`info!`/`warn!`/`error!` macros, playing the role the
//! teacher's `console::_print` plays — "the one place text leaves the
//! crate" — except the sink is swappable rather than hardwired to a VGA
//! console: a host build can wire it to `log`/`env_logger`, a firmware
//! build to a UART write function.

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

use crate::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Level {
	Error = 0,
	Warn = 1,
	Info = 2,
	Debug = 3,
	Trace = 4,
}

impl fmt::Display for Level {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			Level::Error => "ERROR",
			Level::Warn => "WARN",
			Level::Info => "INFO",
			Level::Debug => "DEBUG",
			Level::Trace => "TRACE",
		};
		f.write_str(s)
	}
}

/// Receives every log record that passes the current max level.
pub trait Logger: Send + Sync {
	fn log(&self, level: Level, args: fmt::Arguments<'_>);
}

struct NullLogger;
impl Logger for NullLogger {
	fn log(&self, _level: Level, _args: fmt::Arguments<'_>) {}
}

static LOGGER: Mutex<&'static dyn Logger> = Mutex::new(&NullLogger);
static MAX_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);

/// Install the process-wide logger sink.
pub fn set_logger(logger: &'static dyn Logger) {
	*LOGGER.lock() = logger;
}

/// Set the maximum level that reaches the sink; records above this level
/// (i.e. more verbose) are dropped before formatting runs.
pub fn set_max_level(level: Level) {
	MAX_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn max_level() -> Level {
	match MAX_LEVEL.load(Ordering::Relaxed) {
		0 => Level::Error,
		1 => Level::Warn,
		2 => Level::Info,
		3 => Level::Debug,
		_ => Level::Trace,
	}
}

#[doc(hidden)]
pub fn log(level: Level, args: fmt::Arguments<'_>) {
	if (level as u8) > MAX_LEVEL.load(Ordering::Relaxed) {
		return;
	}
	LOGGER.lock().log(level, args);
}

#[macro_export]
macro_rules! error {
	($($arg:tt)*) => {
		$crate::log::log($crate::log::Level::Error, core::format_args!($($arg)*))
	};
}

#[macro_export]
macro_rules! warn {
	($($arg:tt)*) => {
		$crate::log::log($crate::log::Level::Warn, core::format_args!($($arg)*))
	};
}

#[macro_export]
macro_rules! info {
	($($arg:tt)*) => {
		$crate::log::log($crate::log::Level::Info, core::format_args!($($arg)*))
	};
}

#[macro_export]
macro_rules! debug {
	($($arg:tt)*) => {
		$crate::log::log($crate::log::Level::Debug, core::format_args!($($arg)*))
	};
}

#[macro_export]
macro_rules! trace {
	($($arg:tt)*) => {
		$crate::log::log($crate::log::Level::Trace, core::format_args!($($arg)*))
	};
}

#[cfg(test)]
mod tests {
	use super::*;
	use core::sync::atomic::AtomicUsize;

	struct CountingLogger {
		count: AtomicUsize,
	}
	impl Logger for CountingLogger {
		fn log(&self, _level: Level, _args: fmt::Arguments<'_>) {
			self.count.fetch_add(1, Ordering::SeqCst);
		}
	}

	#[test]
	fn records_above_max_level_are_dropped() {
		static COUNTER: CountingLogger = CountingLogger { count: AtomicUsize::new(0) };
		set_logger(&COUNTER);
		set_max_level(Level::Warn);

		crate::info!("should be dropped: {}", 1);
		crate::error!("should pass: {}", 2);

		assert_eq!(COUNTER.count.load(Ordering::SeqCst), 1);
		set_max_level(Level::Info);
	}
}
