// SPDX-License-Identifier: GPL-2.0

//! Virtual filesystem: a polymorphic file/directory interface with
//! pluggable backends, built around the [`Vfs`] trait (the Rust
//! counterpart of the source's per-backend vtable struct).

pub mod path;
pub mod ramfs;
pub mod romfs;
pub mod union;

#[cfg(feature = "std")]
pub mod posix;

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

use bitflags::bitflags;

use crate::error::{Error, Result};
use crate::stream::{FileLike, Whence};

bitflags! {
	/// Flags parsed from a POSIX-style mode string (`r`, `r+`, `w`, `w+`,
	/// `a`, `a+`; a trailing `b` is accepted and ignored).
	#[derive(Debug, Clone, Copy, PartialEq, Eq)]
	pub struct OpenMode: u8 {
		const READ      = 0b0000_0001;
		const WRITE     = 0b0000_0010;
		const APPEND    = 0b0000_0100;
		const TRUNCATE  = 0b0000_1000;
		const CREATE    = 0b0001_0000;
	}
}

impl core::str::FromStr for OpenMode {
	type Err = Error;

	fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
		let s = s.strip_suffix('b').unwrap_or(s);
		match s {
			"r" => Ok(OpenMode::READ),
			"r+" => Ok(OpenMode::READ | OpenMode::WRITE),
			"w" => Ok(OpenMode::WRITE | OpenMode::TRUNCATE | OpenMode::CREATE),
			"w+" => Ok(OpenMode::READ | OpenMode::WRITE | OpenMode::TRUNCATE | OpenMode::CREATE),
			"a" => Ok(OpenMode::WRITE | OpenMode::APPEND | OpenMode::CREATE),
			"a+" => Ok(OpenMode::READ | OpenMode::WRITE | OpenMode::APPEND | OpenMode::CREATE),
			_ => Err(Error::Invalid),
		}
	}
}

/// Entry type recorded in [`Stat::mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
	Regular,
	Directory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
	pub mtime: u64,
	pub size: u64,
	pub file_type: FileType,
}

/// One entry returned by directory iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEnt {
	pub name: String,
	pub file_type: FileType,
}

/// Per-open-file operations. A backend's `open` returns one of these
/// boxed; [`File`] wraps it with idempotent-close semantics.
pub trait VfsFile: FileLike {}

/// Per-open-directory operations.
pub trait VfsDir {
	fn read_dir(&mut self) -> Result<Option<DirEnt>>;
	fn close(&mut self) -> Result<()> {
		Ok(())
	}
}

/// The sixteen operations a VFS backend implements, matching the C
/// source's per-backend vtable one for one.
pub trait Vfs {
	fn open(&mut self, path: &str, mode: OpenMode) -> Result<Box<dyn VfsFile>>;
	fn mkdir(&mut self, _path: &str) -> Result<()> {
		Err(Error::NotSupported)
	}
	fn opendir(&mut self, _path: &str) -> Result<Box<dyn VfsDir>> {
		Err(Error::NotSupported)
	}
	fn chdir(&mut self, _path: &str) -> Result<()> {
		Err(Error::NotSupported)
	}
	fn getcwd(&self) -> Result<String> {
		Err(Error::NotSupported)
	}
	fn remove(&mut self, _path: &str) -> Result<()> {
		Err(Error::NotSupported)
	}
	fn rename(&mut self, _from: &str, _to: &str) -> Result<()> {
		Err(Error::NotSupported)
	}
	fn stat(&mut self, path: &str) -> Result<Stat>;
	fn utime(&mut self, _path: &str, _mtime: u64) -> Result<()> {
		Err(Error::NotSupported)
	}
}

/// An open file handle. `close` is explicit and consuming; `Drop` closes
/// idempotently as a fallback for the unwind path.
pub struct File {
	inner: Option<Box<dyn VfsFile>>,
}

impl File {
	pub fn new(inner: Box<dyn VfsFile>) -> Self {
		Self { inner: Some(inner) }
	}

	pub fn close(mut self) -> Result<()> {
		self.close_inner()
	}

	fn close_inner(&mut self) -> Result<()> {
		match self.inner.take() {
			Some(mut f) => f.close(),
			None => Ok(()),
		}
	}

	fn get_mut(&mut self) -> &mut dyn VfsFile {
		self.inner.as_deref_mut().expect("use of File after close")
	}
}

impl Drop for File {
	fn drop(&mut self) {
		let _ = self.close_inner();
	}
}

impl FileLike for File {
	fn read(&mut self, dst: &mut [u8]) -> Result<usize> {
		self.get_mut().read(dst)
	}
	fn write(&mut self, src: &[u8]) -> Result<usize> {
		self.get_mut().write(src)
	}
	fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
		self.get_mut().seek(offset, whence)
	}
	fn tell(&mut self) -> Result<u64> {
		self.get_mut().tell()
	}
	fn flush(&mut self) -> Result<()> {
		self.get_mut().flush()
	}
	fn close(&mut self) -> Result<()> {
		self.close_inner()
	}
}

/// An open directory handle.
pub struct Dir {
	inner: Option<Box<dyn VfsDir>>,
}

impl Dir {
	pub fn new(inner: Box<dyn VfsDir>) -> Self {
		Self { inner: Some(inner) }
	}

	pub fn read_dir(&mut self) -> Result<Option<DirEnt>> {
		match &mut self.inner {
			Some(d) => d.read_dir(),
			None => Err(Error::Invalid),
		}
	}

	pub fn close(mut self) -> Result<()> {
		self.close_inner()
	}

	fn close_inner(&mut self) -> Result<()> {
		match self.inner.take() {
			Some(mut d) => d.close(),
			None => Ok(()),
		}
	}
}

impl Drop for Dir {
	fn drop(&mut self) {
		let _ = self.close_inner();
	}
}

impl fmt::Debug for File {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("File").finish_non_exhaustive()
	}
}

// --- Composite operations built generically atop the trait above ---

pub fn exists(vfs: &mut dyn Vfs, path: &str) -> bool {
	vfs.stat(path).is_ok()
}

pub fn is_directory(vfs: &mut dyn Vfs, path: &str) -> bool {
	matches!(vfs.stat(path), Ok(s) if s.file_type == FileType::Directory)
}

pub fn is_regular(vfs: &mut dyn Vfs, path: &str) -> bool {
	matches!(vfs.stat(path), Ok(s) if s.file_type == FileType::Regular)
}

/// Copy `src` to `dst` within the same backend through a scratch buffer.
/// On error the partial destination remains.
pub fn copyfile(vfs: &mut dyn Vfs, src: &str, dst: &str) -> Result<()> {
	let mut src_file = File::new(vfs.open(src, OpenMode::READ)?);
	let mut dst_file = File::new(vfs.open(dst, OpenMode::WRITE)?);
	copyfile2(&mut src_file, &mut dst_file)
}

/// Copy between two already-open handles (possibly on different backends).
pub fn copyfile2(src: &mut File, dst: &mut File) -> Result<()> {
	let mut buf = [0u8; 512];
	loop {
		let n = src.read(&mut buf)?;
		if n == 0 {
			break;
		}
		let mut written = 0;
		while written < n {
			let w = dst.write(&buf[written..n])?;
			if w == 0 {
				return Err(Error::Io);
			}
			written += w;
		}
	}
	Ok(())
}

/// `dst` must not already exist. Creates it and recurses over `src`'s tree.
pub fn copytree(vfs: &mut dyn Vfs, src: &str, dst: &str) -> Result<()> {
	if exists(vfs, dst) {
		return Err(Error::Exist);
	}
	vfs.mkdir(dst)?;
	let mut dir = Dir::new(vfs.opendir(src)?);
	while let Some(entry) = dir.read_dir()? {
		let src_child = join(src, &entry.name);
		let dst_child = join(dst, &entry.name);
		match entry.file_type {
			FileType::Directory => copytree(vfs, &src_child, &dst_child)?,
			FileType::Regular => copyfile(vfs, &src_child, &dst_child)?,
		}
	}
	Ok(())
}

/// Post-order removal of every entry under `path`, then `path` itself.
pub fn rmtree(vfs: &mut dyn Vfs, path: &str) -> Result<()> {
	if is_directory(vfs, path) {
		let mut dir = Dir::new(vfs.opendir(path)?);
		let mut children = alloc::vec::Vec::new();
		while let Some(entry) = dir.read_dir()? {
			children.push(entry);
		}
		dir.close()?;
		for entry in children {
			rmtree(vfs, &join(path, &entry.name))?;
		}
	}
	vfs.remove(path)
}

/// Create every missing directory component from root down to `path`. A
/// final component that already exists is tolerated iff `exist_ok`.
pub fn makedirs(vfs: &mut dyn Vfs, path: &str, exist_ok: bool) -> Result<()> {
	let mut built = String::from("");
	let components: alloc::vec::Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
	for (i, component) in components.iter().enumerate() {
		built.push('/');
		built.push_str(component);
		match vfs.mkdir(&built) {
			Ok(()) => {}
			Err(Error::Exist) if exist_ok || i + 1 < components.len() => {}
			Err(e) => return Err(e),
		}
	}
	Ok(())
}

/// Pre-order traversal; `walker` returning `false` aborts the walk and its
/// `Err` (if any) is not overridden — the current error from the failing
/// op is what propagates.
pub fn walktree(
	vfs: &mut dyn Vfs,
	path: &str,
	walker: &mut dyn FnMut(&str, &DirEnt) -> bool,
) -> Result<()> {
	let mut dir = Dir::new(vfs.opendir(path)?);
	while let Some(entry) = dir.read_dir()? {
		if !walker(path, &entry) {
			break;
		}
		if entry.file_type == FileType::Directory {
			walktree(vfs, &join(path, &entry.name), walker)?;
		}
	}
	Ok(())
}

fn join(dir: &str, name: &str) -> String {
	let mut s = String::from(dir);
	if !s.ends_with('/') {
		s.push('/');
	}
	s.push_str(name);
	s
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn open_mode_parses_textual_forms() {
		use core::str::FromStr;
		assert_eq!(OpenMode::from_str("r").unwrap(), OpenMode::READ);
		assert_eq!(
			OpenMode::from_str("w+b").unwrap(),
			OpenMode::READ | OpenMode::WRITE | OpenMode::TRUNCATE | OpenMode::CREATE
		);
		assert!(OpenMode::from_str("x").is_err());
	}
}
