// SPDX-License-Identifier: GPL-2.0

//! Polymorphic byte stream: a vtable-dispatched read/write/seek/tell/flush/
//! close object, plus the memory-backed and file-backed drivers built on
//! top of it.

pub mod file_stream;
pub mod mem_stream;

use core::fmt;

use crate::error::{Error, Result};

pub use mem_stream::MemStream;

/// Seek origin, mirroring `SEEK_SET`/`SEEK_CUR`/`SEEK_END`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
	Set,
	Cur,
	End,
}

/// The operations a concrete stream backend may implement. Any method a
/// driver doesn't override defaults to [`Error::NotSupported`], except
/// `flush`/`close` which default to success — matching the C vtable's
/// "missing slot" convention.
pub trait StreamDriver {
	fn read(&mut self, _dst: &mut [u8]) -> Result<usize> {
		Err(Error::NotSupported)
	}

	fn write(&mut self, _src: &[u8]) -> Result<usize> {
		Err(Error::NotSupported)
	}

	fn seek(&mut self, _offset: i64, _whence: Whence) -> Result<u64> {
		Err(Error::NotSupported)
	}

	fn tell(&mut self) -> Result<u64> {
		Err(Error::NotSupported)
	}

	fn flush(&mut self) -> Result<()> {
		Ok(())
	}

	fn close(&mut self) -> Result<()> {
		Ok(())
	}
}

/// A polymorphic byte stream over a boxed [`StreamDriver`].
///
/// `close` is exposed both as an explicit consuming call and via `Drop`
/// (idempotent — the driver's own `close` is expected to tolerate being
/// invoked twice only in the unwind path; ordinary code should call
/// [`Stream::close`] explicitly).
pub struct Stream {
	driver: alloc::boxed::Box<dyn StreamDriver>,
	closed: bool,
}

impl Stream {
	pub fn new(driver: alloc::boxed::Box<dyn StreamDriver>) -> Self {
		Self { driver, closed: false }
	}

	pub fn read(&mut self, dst: &mut [u8]) -> Result<usize> {
		self.driver.read(dst)
	}

	pub fn write(&mut self, src: &[u8]) -> Result<usize> {
		self.driver.write(src)
	}

	pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
		self.driver.seek(offset, whence)
	}

	pub fn tell(&mut self) -> Result<u64> {
		self.driver.tell()
	}

	pub fn flush(&mut self) -> Result<()> {
		self.driver.flush()
	}

	/// Flush then release backend resources. Idempotent.
	pub fn close(mut self) -> Result<()> {
		self.close_once()
	}

	fn close_once(&mut self) -> Result<()> {
		if self.closed {
			return Ok(());
		}
		self.closed = true;
		self.driver.flush()?;
		self.driver.close()
	}

	/// Write every byte of `src`, retrying short writes until the driver
	/// reports zero progress.
	pub fn write_all(&mut self, mut src: &[u8]) -> Result<()> {
		while !src.is_empty() {
			let n = self.write(src)?;
			if n == 0 {
				return Err(Error::Io);
			}
			src = &src[n..];
		}
		Ok(())
	}

	/// Read a line (delimited by `\n`, with `\r` stripped) into `dst`.
	///
	/// Returns `Ok(Some(line))` with the line's text (not including the
	/// terminator) on success, `Ok(None)` at EOF with nothing read, or
	/// `Err(Error::NameTooLong)` if the line doesn't fit `dst` — the
	/// unused tail of `dst` is always zeroed, matching the C `gets`
	/// behavior this is modeled on.
	pub fn read_line<'a>(&mut self, dst: &'a mut [u8]) -> Result<Option<&'a str>> {
		dst.fill(0);
		let mut len = 0usize;
		let mut saw_any = false;
		loop {
			let mut byte = [0u8; 1];
			let n = self.read(&mut byte)?;
			if n == 0 {
				break;
			}
			saw_any = true;
			let b = byte[0];
			if b == b'\n' {
				break;
			}
			if b == b'\r' {
				continue;
			}
			if len >= dst.len() {
				return Err(Error::NameTooLong);
			}
			dst[len] = b;
			len += 1;
		}
		if !saw_any {
			return Ok(None);
		}
		core::str::from_utf8(&dst[..len])
			.map(Some)
			.map_err(|_| Error::Invalid)
	}
}

impl Drop for Stream {
	fn drop(&mut self) {
		let _ = self.close_once();
	}
}

impl fmt::Write for Stream {
	fn write_str(&mut self, s: &str) -> fmt::Result {
		self.write_all(s.as_bytes()).map_err(|_| fmt::Error)
	}
}

/// A minimal read/write/seek/tell/flush interface that a VFS file handle
/// can implement so [`file_stream::FileStream`] can wrap it without the
/// stream layer depending on the VFS trait itself.
pub trait FileLike {
	fn read(&mut self, dst: &mut [u8]) -> Result<usize>;
	fn write(&mut self, src: &[u8]) -> Result<usize>;
	fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64>;
	fn tell(&mut self) -> Result<u64>;
	fn flush(&mut self) -> Result<()>;
	fn close(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
	use super::*;
	use core::fmt::Write as _;

	#[test]
	fn write_fmt_goes_through_write_all() {
		let mut stream = Stream::new(alloc::boxed::Box::new(MemStream::new(64)));
		write!(stream, "x={}", 42).unwrap();
		stream.seek(0, Whence::Set).unwrap();
		let mut buf = [0u8; 16];
		let n = stream.read(&mut buf).unwrap();
		assert_eq!(&buf[..n], b"x=42");
	}
}
