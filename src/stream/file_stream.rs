// SPDX-License-Identifier: GPL-2.0

//! Stream adapter over an open VFS file handle — the "printf/gets over a
//! file" path: any type implementing [`FileLike`] gets `Stream` semantics
//! (`write_fmt`, `read_line`, ...) for free.

use crate::error::Result;
use crate::stream::{FileLike, StreamDriver, Whence};

pub struct FileStream<F: FileLike> {
	file: F,
}

impl<F: FileLike> FileStream<F> {
	pub fn new(file: F) -> Self {
		Self { file }
	}

	pub fn into_inner(self) -> F {
		self.file
	}
}

impl<F: FileLike> StreamDriver for FileStream<F> {
	fn read(&mut self, dst: &mut [u8]) -> Result<usize> {
		self.file.read(dst)
	}

	fn write(&mut self, src: &[u8]) -> Result<usize> {
		self.file.write(src)
	}

	fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
		self.file.seek(offset, whence)
	}

	fn tell(&mut self) -> Result<u64> {
		self.file.tell()
	}

	fn flush(&mut self) -> Result<()> {
		self.file.flush()
	}

	fn close(&mut self) -> Result<()> {
		self.file.close()
	}
}
