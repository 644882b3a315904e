// SPDX-License-Identifier: GPL-2.0

//! Host POSIX filesystem backend — wraps `std::fs`/`std::io` under the
//! same [`Vfs`] trait the embedded backends implement, so host tooling
//! and this crate's own test suite can exercise the identical trait
//! object machinery without an embedded RAM or ROM image. Grounded in
//! `xposixfs.h` from the original sources; gated behind the `std` cargo
//! feature since it shells out to the host filesystem.

use std::boxed::Box;
use std::fs;
use std::io::{Read as _, Seek as _, SeekFrom, Write as _};
use std::path::PathBuf;
use std::string::String;
use std::time::UNIX_EPOCH;
use std::vec::Vec;

use crate::error::{Error, Result};
use crate::stream::{FileLike, Whence};
use crate::vfs::{DirEnt, FileType, OpenMode, Stat, Vfs, VfsDir, VfsFile};

/// A filesystem rooted at a host directory; every path given to its
/// `Vfs` methods is resolved relative to that root, so a sandboxed
/// subtree of the host filesystem can be exposed without leaking the
/// rest of the host tree.
pub struct PosixFs {
	root: PathBuf,
}

impl PosixFs {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	fn host_path(&self, path: &str) -> PathBuf {
		let relative = path.strip_prefix('/').unwrap_or(path);
		self.root.join(relative)
	}
}

fn whence_to_seekfrom(offset: i64, whence: Whence) -> SeekFrom {
	match whence {
		Whence::Set => SeekFrom::Start(offset as u64),
		Whence::Cur => SeekFrom::Current(offset),
		Whence::End => SeekFrom::End(offset),
	}
}

pub struct PosixFile {
	file: fs::File,
}

impl VfsFile for PosixFile {}

impl FileLike for PosixFile {
	fn read(&mut self, dst: &mut [u8]) -> Result<usize> {
		self.file.read(dst).map_err(Error::from)
	}

	fn write(&mut self, src: &[u8]) -> Result<usize> {
		self.file.write(src).map_err(Error::from)
	}

	fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
		self.file.seek(whence_to_seekfrom(offset, whence)).map_err(Error::from)
	}

	fn tell(&mut self) -> Result<u64> {
		self.file.stream_position().map_err(Error::from)
	}

	fn flush(&mut self) -> Result<()> {
		self.file.flush().map_err(Error::from)
	}

	fn close(&mut self) -> Result<()> {
		self.file.flush().map_err(Error::from)
	}
}

pub struct PosixDir {
	entries: Vec<DirEnt>,
	pos: usize,
}

impl VfsDir for PosixDir {
	fn read_dir(&mut self) -> Result<Option<DirEnt>> {
		if self.pos >= self.entries.len() {
			return Ok(None);
		}
		let entry = self.entries[self.pos].clone();
		self.pos += 1;
		Ok(Some(entry))
	}
}

fn stat_from_metadata(meta: &fs::Metadata) -> Stat {
	let mtime = meta
		.modified()
		.ok()
		.and_then(|t| t.duration_since(UNIX_EPOCH).ok())
		.map(|d| d.as_secs())
		.unwrap_or(0);
	Stat {
		mtime,
		size: meta.len(),
		file_type: if meta.is_dir() { FileType::Directory } else { FileType::Regular },
	}
}

impl Vfs for PosixFs {
	fn open(&mut self, path: &str, mode: OpenMode) -> Result<Box<dyn VfsFile>> {
		let mut options = fs::OpenOptions::new();
		options.read(mode.contains(OpenMode::READ));
		options.write(mode.intersects(OpenMode::WRITE | OpenMode::APPEND));
		options.append(mode.contains(OpenMode::APPEND));
		options.truncate(mode.contains(OpenMode::TRUNCATE));
		options.create(mode.contains(OpenMode::CREATE));
		let file = options.open(self.host_path(path)).map_err(Error::from)?;
		Ok(Box::new(PosixFile { file }))
	}

	fn mkdir(&mut self, path: &str) -> Result<()> {
		fs::create_dir(self.host_path(path)).map_err(Error::from)
	}

	fn opendir(&mut self, path: &str) -> Result<Box<dyn VfsDir>> {
		let mut entries = Vec::new();
		for entry in fs::read_dir(self.host_path(path)).map_err(Error::from)? {
			let entry = entry.map_err(Error::from)?;
			let name = entry.file_name().to_string_lossy().into_owned();
			let file_type = if entry.file_type().map_err(Error::from)?.is_dir() {
				FileType::Directory
			} else {
				FileType::Regular
			};
			entries.push(DirEnt { name, file_type });
		}
		Ok(Box::new(PosixDir { entries, pos: 0 }))
	}

	fn chdir(&mut self, path: &str) -> Result<()> {
		if !self.host_path(path).is_dir() {
			return Err(Error::NoEntry);
		}
		Ok(())
	}

	fn getcwd(&self) -> Result<String> {
		Ok(self.root.to_string_lossy().into_owned())
	}

	fn remove(&mut self, path: &str) -> Result<()> {
		let p = self.host_path(path);
		if p.is_dir() {
			fs::remove_dir(p).map_err(Error::from)
		} else {
			fs::remove_file(p).map_err(Error::from)
		}
	}

	fn rename(&mut self, from: &str, to: &str) -> Result<()> {
		fs::rename(self.host_path(from), self.host_path(to)).map_err(Error::from)
	}

	fn stat(&mut self, path: &str) -> Result<Stat> {
		let meta = fs::metadata(self.host_path(path)).map_err(Error::from)?;
		Ok(stat_from_metadata(&meta))
	}

	fn utime(&mut self, _path: &str, _mtime: u64) -> Result<()> {
		Err(Error::NotSupported)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::vfs::path::resolve;

	#[test]
	fn round_trip_through_tempdir() {
		let dir = tempfile::tempdir().unwrap();
		let mut fs = PosixFs::new(dir.path());

		let mut f = fs.open("/scratch.bin", OpenMode::READ | OpenMode::WRITE | OpenMode::CREATE).unwrap();
		f.write(b"payload").unwrap();
		f.seek(0, Whence::Set).unwrap();
		let mut buf = [0u8; 16];
		let n = f.read(&mut buf).unwrap();
		assert_eq!(&buf[..n], b"payload");

		let st = fs.stat("/scratch.bin").unwrap();
		assert_eq!(st.size, 7);
	}

	#[test]
	fn resolve_still_works_for_posix_paths() {
		assert_eq!(resolve("/", "a/b").unwrap(), "/a/b");
	}
}
