// SPDX-License-Identifier: GPL-2.0

//! Union (mount) filesystem: composes multiple backends under one tree by
//! longest-prefix dispatch against a mount table.
//!
//! The process-wide instance lives behind [`global`], a `once_cell`-backed
//! `spin::Mutex` singleton — the same pattern other picox consumers use
//! for shared state that genuinely has to be global. [`UnionFs::new`]
//! remains available for an owned, explicitly-passed instance when a
//! caller wants one without touching the singleton (better testability,
//! multiple independent trees in the same process).

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::sync::atomic::{AtomicUsize, Ordering};

use once_cell::sync::Lazy;

use crate::error::{Error, Result};
use crate::stream::{FileLike, Whence};
use crate::sync::Mutex;
use crate::vfs::{self, path, OpenMode, Stat, Vfs, VfsDir, VfsFile};

struct MountEntry {
	path: String,
	realpath: String,
	backend: Box<dyn Vfs>,
	open_handles: Rc<AtomicUsize>,
}

/// A filesystem assembled from multiple mounted backends.
pub struct UnionFs {
	mounts: Vec<MountEntry>,
	cwd: String,
}

impl UnionFs {
	pub fn new() -> Self {
		Self {
			mounts: Vec::new(),
			cwd: String::from("/"),
		}
	}

	/// Mount `backend` at `path`, exposing `realpath` inside it as that
	/// mount's root. `path` must be `/` for the first mount, or an
	/// existing directory in the tree assembled so far.
	pub fn mount(&mut self, backend: Box<dyn Vfs>, path: &str, realpath: &str) -> Result<()> {
		if self.mounts.is_empty() {
			if path != "/" {
				return Err(Error::Invalid);
			}
		} else if !vfs::is_directory(self, path) {
			return Err(Error::NoEntry);
		}
		self.mounts.push(MountEntry {
			path: path.to_string(),
			realpath: realpath.to_string(),
			backend,
			open_handles: Rc::new(AtomicUsize::new(0)),
		});
		Ok(())
	}

	/// Unmount the backend mounted exactly at `path`. Fails with
	/// [`Error::Busy`] if a descendant mount still exists or if the mount
	/// has open handles.
	pub fn umount(&mut self, path: &str) -> Result<()> {
		let idx = self.mounts.iter().position(|m| m.path == path).ok_or(Error::NoEntry)?;
		for (i, m) in self.mounts.iter().enumerate() {
			if i != idx && m.path != path && crate::vfs::path::starts_with_mount(&m.path, path) {
				crate::warn!("umount {path} blocked: descendant mount at {} still present", m.path);
				return Err(Error::Busy);
			}
		}
		if self.mounts[idx].open_handles.load(Ordering::Acquire) > 0 {
			crate::warn!("umount {path} blocked: open handles outstanding");
			return Err(Error::Busy);
		}
		self.mounts.remove(idx);
		Ok(())
	}

	fn find_mount(&self, path: &str) -> Result<usize> {
		self.mounts
			.iter()
			.enumerate()
			.filter(|(_, m)| path::starts_with_mount(path, &m.path))
			.max_by_key(|(_, m)| m.path.len())
			.map(|(i, _)| i)
			.ok_or(Error::NoEntry)
	}

	fn dispatch_path(&self, idx: usize, path: &str) -> String {
		let m = &self.mounts[idx];
		let stripped = if m.path == "/" {
			path.to_string()
		} else {
			let rest = &path[m.path.len()..];
			if rest.is_empty() {
				String::from("/")
			} else {
				rest.to_string()
			}
		};
		if m.realpath == "/" {
			stripped
		} else {
			alloc::format!("{}{}", m.realpath, stripped)
		}
	}

	fn resolve(&self, path: &str) -> Result<String> {
		path::resolve(&self.cwd, path)
	}
}

impl Default for UnionFs {
	fn default() -> Self {
		Self::new()
	}
}

/// A file handle whose close also decrements its mount's open-handle
/// count, so [`UnionFs::umount`] can observe outstanding handles.
struct CountedFile {
	inner: Box<dyn VfsFile>,
	count: Rc<AtomicUsize>,
	released: bool,
}

impl Drop for CountedFile {
	fn drop(&mut self) {
		if !self.released {
			self.count.fetch_sub(1, Ordering::AcqRel);
		}
	}
}

impl VfsFile for CountedFile {}

impl FileLike for CountedFile {
	fn read(&mut self, dst: &mut [u8]) -> Result<usize> {
		self.inner.read(dst)
	}
	fn write(&mut self, src: &[u8]) -> Result<usize> {
		self.inner.write(src)
	}
	fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
		self.inner.seek(offset, whence)
	}
	fn tell(&mut self) -> Result<u64> {
		self.inner.tell()
	}
	fn flush(&mut self) -> Result<()> {
		self.inner.flush()
	}
	fn close(&mut self) -> Result<()> {
		let r = self.inner.close();
		if !self.released {
			self.count.fetch_sub(1, Ordering::AcqRel);
			self.released = true;
		}
		r
	}
}

impl Vfs for UnionFs {
	fn open(&mut self, path: &str, mode: OpenMode) -> Result<Box<dyn VfsFile>> {
		let canon = self.resolve(path)?;
		let idx = self.find_mount(&canon)?;
		let inner_path = self.dispatch_path(idx, &canon);
		let mount = &mut self.mounts[idx];
		let file = mount.backend.open(&inner_path, mode)?;
		mount.open_handles.fetch_add(1, Ordering::AcqRel);
		Ok(Box::new(CountedFile {
			inner: file,
			count: mount.open_handles.clone(),
			released: false,
		}))
	}

	fn mkdir(&mut self, path: &str) -> Result<()> {
		let canon = self.resolve(path)?;
		let idx = self.find_mount(&canon)?;
		let inner_path = self.dispatch_path(idx, &canon);
		self.mounts[idx].backend.mkdir(&inner_path)
	}

	fn opendir(&mut self, path: &str) -> Result<Box<dyn VfsDir>> {
		let canon = self.resolve(path)?;
		let idx = self.find_mount(&canon)?;
		let inner_path = self.dispatch_path(idx, &canon);
		self.mounts[idx].backend.opendir(&inner_path)
	}

	fn chdir(&mut self, path: &str) -> Result<()> {
		let canon = self.resolve(path)?;
		if !vfs::is_directory(self, &canon) {
			return Err(Error::NoEntry);
		}
		self.cwd = canon;
		Ok(())
	}

	fn getcwd(&self) -> Result<String> {
		Ok(self.cwd.clone())
	}

	fn remove(&mut self, path: &str) -> Result<()> {
		let canon = self.resolve(path)?;
		let idx = self.find_mount(&canon)?;
		let inner_path = self.dispatch_path(idx, &canon);
		self.mounts[idx].backend.remove(&inner_path)
	}

	fn rename(&mut self, from: &str, to: &str) -> Result<()> {
		let from_canon = self.resolve(from)?;
		let to_canon = self.resolve(to)?;
		let from_idx = self.find_mount(&from_canon)?;
		let to_idx = self.find_mount(&to_canon)?;

		if from_idx == to_idx {
			let from_inner = self.dispatch_path(from_idx, &from_canon);
			let to_inner = self.dispatch_path(to_idx, &to_canon);
			return self.mounts[from_idx].backend.rename(&from_inner, &to_inner);
		}

		// Cross-backend: fall back to copy + remove, same partial-progress
		// contract as the generic `copytree`/`copyfile` composites.
		vfs::copyfile(self, &from_canon, &to_canon)?;
		self.remove(&from_canon)
	}

	fn stat(&mut self, path: &str) -> Result<Stat> {
		let canon = self.resolve(path)?;
		let idx = self.find_mount(&canon)?;
		let inner_path = self.dispatch_path(idx, &canon);
		self.mounts[idx].backend.stat(&inner_path)
	}

	fn utime(&mut self, path: &str, mtime: u64) -> Result<()> {
		let canon = self.resolve(path)?;
		let idx = self.find_mount(&canon)?;
		let inner_path = self.dispatch_path(idx, &canon);
		self.mounts[idx].backend.utime(&inner_path, mtime)
	}
}

// `UnionFs` holds `Box<dyn Vfs>`/`Rc<AtomicUsize>` and is neither `Send` nor
// `Sync` on its own — by design, per the crate's single-threaded cooperative
// execution model (§5: the caller serializes access, never the type
// system). The singleton below is the one place that access is
// process-wide rather than caller-owned, so it asserts the single-core
// invariant explicitly instead of inheriting it from the field types.
// `once_cell::sync::Lazy<T>` requires `T: Send` for `Lazy<T>` itself to be
// `Sync`, so both impls are needed even though nothing here actually moves
// across threads.
struct GlobalCell(Mutex<UnionFs>);
unsafe impl Send for GlobalCell {}
unsafe impl Sync for GlobalCell {}

static GLOBAL: Lazy<GlobalCell> = Lazy::new(|| GlobalCell(Mutex::new(UnionFs::new())));

/// The process-wide union FS singleton.
pub fn global() -> &'static Mutex<UnionFs> {
	&GLOBAL.0
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::vfs::ramfs::RamFs;
	use core::str::FromStr;

	#[test]
	fn longest_prefix_dispatch() {
		let mut u = UnionFs::new();
		u.mount(Box::new(RamFs::new()), "/", "/").unwrap();
		u.mkdir("/mnt").unwrap();
		u.mkdir("/mnt/ext").unwrap();
		u.mount(Box::new(RamFs::new()), "/mnt/ext", "/").unwrap();

		u.open("/mnt/ext/data.txt", OpenMode::from_str("w").unwrap()).unwrap();
		assert!(vfs::exists(&mut u, "/mnt/ext/data.txt"));

		// The root backend never saw this file; it must not exist there.
		let root_idx = u.find_mount("/mnt/foo").unwrap();
		assert_eq!(u.mounts[root_idx].path, "/");
	}

	#[test]
	fn umount_busy_with_open_handle() {
		let mut u = UnionFs::new();
		u.mount(Box::new(RamFs::new()), "/", "/").unwrap();
		u.mkdir("/mnt").unwrap();
		u.mount(Box::new(RamFs::new()), "/mnt", "/").unwrap();
		let f = u.open("/mnt/a", OpenMode::from_str("w").unwrap()).unwrap();
		assert_eq!(u.umount("/mnt"), Err(Error::Busy));
		drop(f);
		assert!(u.umount("/mnt").is_ok());
	}

	#[test]
	fn cross_backend_rename_falls_back_to_copy() {
		let mut u = UnionFs::new();
		u.mount(Box::new(RamFs::new()), "/", "/").unwrap();
		u.mkdir("/mnt").unwrap();
		u.mount(Box::new(RamFs::new()), "/mnt", "/").unwrap();

		let mut f = u.open("/src.txt", OpenMode::from_str("w+").unwrap()).unwrap();
		f.write(b"payload").unwrap();
		drop(f);

		u.rename("/src.txt", "/mnt/dst.txt").unwrap();
		assert!(!vfs::exists(&mut u, "/src.txt"));
		let mut f2 = u.open("/mnt/dst.txt", OpenMode::from_str("r").unwrap()).unwrap();
		let mut buf = [0u8; 16];
		let n = f2.read(&mut buf).unwrap();
		assert_eq!(&buf[..n], b"payload");
	}
}
