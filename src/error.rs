// SPDX-License-Identifier: GPL-2.0

//! Crate-wide error type and result alias

use core::fmt;

/// The single error type returned by every fallible picox operation.
///
/// Caller-bug conditions (null handle, misaligned pointer, out-of-range
/// index) are never represented here — they are asserted on and abort,
/// per the crate's failure-semantics policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
	/// No error occurred (rarely constructed directly; most call sites use `Ok`)
	None,
	/// Low-level I/O failure from a backend device
	Io,
	/// Argument or state was invalid for the requested operation
	Invalid,
	/// Operation did not complete within its deadline
	TimedOut,
	/// Resource is in use and cannot be acted on right now
	Busy,
	/// Operation would block; retry later
	Again,
	/// Operation was canceled
	Canceled,
	/// Allocator or backend ran out of memory
	NoMemory,
	/// Target already exists
	Exist,
	/// Backend is not ready to service the request
	NotReady,
	/// Caller lacks permission, or the backend is read-only
	Access,
	/// Target does not exist
	NoEntry,
	/// The backend does not implement this operation
	NotSupported,
	/// The backing transport is disconnected
	Disconnected,
	/// Operation is already in progress
	InProgress,
	/// Malformed data violated the expected wire/image format
	Protocol,
	/// Too many open handles/mounts/entries
	Many,
	/// Internal invariant was violated
	Broken,
	/// A path component or resulting path exceeded its maximum length
	NameTooLong,
	/// A value or offset was out of the valid range
	Range,
	/// Internal error within picox itself
	Internal,
	/// Catch-all for backend-specific failures with no closer mapping
	Other,
	/// Error state could not be determined
	Unknown,
}

impl Error {
	/// Map to the nearest POSIX errno, for backends that need one.
	pub fn to_errno(self) -> i32 {
		match self {
			Error::None => 0,
			Error::Io => -5,           // EIO
			Error::Invalid => -22,     // EINVAL
			Error::TimedOut => -110,   // ETIMEDOUT
			Error::Busy => -16,        // EBUSY
			Error::Again => -11,       // EAGAIN
			Error::Canceled => -125,   // ECANCELED
			Error::NoMemory => -12,    // ENOMEM
			Error::Exist => -17,       // EEXIST
			Error::NotReady => -16,    // EBUSY (no single clean errno equivalent)
			Error::Access => -13,      // EACCES
			Error::NoEntry => -2,      // ENOENT
			Error::NotSupported => -38, // ENOSYS
			Error::Disconnected => -32, // EPIPE
			Error::InProgress => -115, // EINPROGRESS
			Error::Protocol => -71,   // EPROTO
			Error::Many => -24,       // EMFILE
			Error::Broken => -5,      // EIO
			Error::NameTooLong => -36, // ENAMETOOLONG
			Error::Range => -34,      // ERANGE
			Error::Internal => -1,    // EPERM
			Error::Other => -1,       // EPERM
			Error::Unknown => -1,     // EPERM
		}
	}
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Error::None => write!(f, "no error"),
			Error::Io => write!(f, "I/O error"),
			Error::Invalid => write!(f, "invalid argument"),
			Error::TimedOut => write!(f, "timed out"),
			Error::Busy => write!(f, "resource busy"),
			Error::Again => write!(f, "resource temporarily unavailable"),
			Error::Canceled => write!(f, "operation canceled"),
			Error::NoMemory => write!(f, "out of memory"),
			Error::Exist => write!(f, "already exists"),
			Error::NotReady => write!(f, "not ready"),
			Error::Access => write!(f, "permission denied"),
			Error::NoEntry => write!(f, "no such entry"),
			Error::NotSupported => write!(f, "operation not supported"),
			Error::Disconnected => write!(f, "disconnected"),
			Error::InProgress => write!(f, "operation already in progress"),
			Error::Protocol => write!(f, "protocol error"),
			Error::Many => write!(f, "too many resources"),
			Error::Broken => write!(f, "internal invariant broken"),
			Error::NameTooLong => write!(f, "name too long"),
			Error::Range => write!(f, "value out of range"),
			Error::Internal => write!(f, "internal error"),
			Error::Other => write!(f, "other error"),
			Error::Unknown => write!(f, "unknown error"),
		}
	}
}

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, Error>;

impl From<core::fmt::Error> for Error {
	fn from(_: core::fmt::Error) -> Self {
		Error::Io
	}
}

#[cfg(feature = "std")]
impl From<std::io::Error> for Error {
	fn from(e: std::io::Error) -> Self {
		use std::io::ErrorKind::*;
		match e.kind() {
			NotFound => Error::NoEntry,
			PermissionDenied => Error::Access,
			AlreadyExists => Error::Exist,
			WouldBlock => Error::Again,
			InvalidInput | InvalidData => Error::Invalid,
			TimedOut => Error::TimedOut,
			UnexpectedEof => Error::Io,
			other => {
				crate::warn!("lossy std::io::Error mapping: {other:?} has no direct picox variant, falling back to Io");
				Error::Io
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn display_is_nonempty_for_every_variant() {
		let variants = [
			Error::None,
			Error::Io,
			Error::Invalid,
			Error::TimedOut,
			Error::Busy,
			Error::Again,
			Error::Canceled,
			Error::NoMemory,
			Error::Exist,
			Error::NotReady,
			Error::Access,
			Error::NoEntry,
			Error::NotSupported,
			Error::Disconnected,
			Error::InProgress,
			Error::Protocol,
			Error::Many,
			Error::Broken,
			Error::NameTooLong,
			Error::Range,
			Error::Internal,
			Error::Other,
			Error::Unknown,
		];
		for v in variants {
			assert!(!alloc::format!("{v}").is_empty());
		}
	}
}
