// SPDX-License-Identifier: GPL-2.0

//! In-memory stream backend: reads are bounded by the live size, writes
//! grow the live size up to capacity and then stop silently (zero
//! `nwritten`, not an error) — matching the C `x_memstream`.

use crate::container::ByteArray;
use crate::error::Result;
use crate::stream::{StreamDriver, Whence};

pub struct MemStream<'a> {
	buf: ByteArray<'a>,
	capacity: usize,
	pos: usize,
}

impl MemStream<'static> {
	/// A heap-owned memory stream bounded to `capacity` bytes.
	pub fn new(capacity: usize) -> Self {
		Self {
			buf: ByteArray::with_capacity(capacity),
			capacity,
			pos: 0,
		}
	}
}

impl<'a> MemStream<'a> {
	/// Wrap a caller-owned buffer; capacity is fixed at `backing.len()`.
	pub fn borrowed(backing: &'a mut [u8]) -> Self {
		let capacity = backing.len();
		Self {
			buf: ByteArray::borrowed(backing),
			capacity,
			pos: 0,
		}
	}

	pub fn as_slice(&self) -> &[u8] {
		self.buf.as_slice()
	}
}

impl StreamDriver for MemStream<'_> {
	fn read(&mut self, dst: &mut [u8]) -> Result<usize> {
		let avail = self.buf.len().saturating_sub(self.pos);
		let n = dst.len().min(avail);
		dst[..n].copy_from_slice(&self.buf.as_slice()[self.pos..self.pos + n]);
		self.pos += n;
		Ok(n)
	}

	fn write(&mut self, src: &[u8]) -> Result<usize> {
		let room = self.capacity.saturating_sub(self.pos);
		let n = src.len().min(room);
		if n == 0 {
			return Ok(0);
		}
		let end = self.pos + n;
		if end > self.buf.len() {
			let gap = end - self.buf.len();
			// Materialize any gap left by a prior seek-past-end as zeros.
			self.buf.push_back_n(&alloc::vec![0u8; gap]).map_err(|_| crate::error::Error::NoMemory)?;
		}
		self.buf.as_mut_slice()[self.pos..end].copy_from_slice(&src[..n]);
		self.pos = end;
		Ok(n)
	}

	fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
		let base = match whence {
			Whence::Set => 0i64,
			Whence::Cur => self.pos as i64,
			Whence::End => self.buf.len() as i64,
		};
		let target = base + offset;
		if target < 0 || target as usize > self.capacity {
			return Err(crate::error::Error::Range);
		}
		self.pos = target as usize;
		Ok(self.pos as u64)
	}

	fn tell(&mut self) -> Result<u64> {
		Ok(self.pos as u64)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn write_stops_silently_at_capacity() {
		let mut ms = MemStream::new(4);
		let n = ms.write(b"abcdef").unwrap();
		assert_eq!(n, 4);
		let n2 = ms.write(b"x").unwrap();
		assert_eq!(n2, 0);
	}

	#[test]
	fn read_bounded_by_size_not_capacity() {
		let mut ms = MemStream::new(16);
		ms.write(b"hi").unwrap();
		ms.seek(0, Whence::Set).unwrap();
		let mut buf = [0u8; 16];
		let n = ms.read(&mut buf).unwrap();
		assert_eq!(&buf[..n], b"hi");
	}

	#[test]
	fn seek_past_end_then_write_zero_fills_gap() {
		let mut ms = MemStream::new(8);
		ms.write(b"ab").unwrap();
		ms.seek(4, Whence::Set).unwrap();
		ms.write(b"z").unwrap();
		assert_eq!(ms.as_slice(), b"ab\0\0z");
	}
}
