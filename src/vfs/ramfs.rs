// SPDX-License-Identifier: GPL-2.0

//! In-memory filesystem backend: a tree of directory and file nodes.
//!
//! Each node is reference-counted (`Rc<RefCell<_>>`) rather than linked
//! through the crate's own [`crate::container::intrusive_list`] — a
//! directory's children are naturally a growable owned collection here,
//! not a fixed-arity embedded link, so a plain `Vec` of child handles is
//! the idiomatic Rust shape (the intrusive list still does its job
//! verbatim in [`crate::vfs::union`], where a flat process-wide table is
//! exactly what it was designed for).
//!
//! File content is not a bare `Vec<u8>`: it is a list of fixed-size
//! chunks allocated from a [`VariableAllocator`] bundled once per
//! filesystem instance in [`Arena`], shared by every node through an
//! `Rc<RefCell<_>>` so the backing region outlives every handle into it.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::ptr::NonNull;

use crate::allocator::VariableAllocator;
use crate::error::{Error, Result};
use crate::stream::Whence;
use crate::vfs::{DirEnt, FileType, OpenMode, Stat, Vfs, VfsDir, VfsFile};

/// Size, in bytes, of one file-content chunk handed out by [`Arena`].
const CHUNK_SIZE: usize = 64;
/// Default backing region size for [`RamFs::new`]/[`RamFs::with_clock`].
const DEFAULT_ARENA_SIZE: usize = 64 * 1024;
const ARENA_ALIGNMENT: usize = core::mem::size_of::<usize>();

/// The per-filesystem-instance backing store every file's content chunks
/// are carved from. `storage` is never read again after construction —
/// it exists purely to keep the region `alloc` points into alive for as
/// long as any node shares this arena.
struct Arena {
	alloc: VariableAllocator<'static>,
	#[allow(dead_code)]
	storage: Box<[u8]>,
}

impl Arena {
	fn new(size: usize) -> Self {
		let mut storage = alloc::vec![0u8; size].into_boxed_slice();
		// SAFETY: `alloc` is only ever accessed through `Arena`'s own
		// methods, and `storage` lives in this same `Arena`, so the
		// region it points into outlives every access made through it.
		let region: &'static mut [u8] = unsafe { core::slice::from_raw_parts_mut(storage.as_mut_ptr(), storage.len()) };
		let alloc = VariableAllocator::new(region, ARENA_ALIGNMENT).expect("ramfs arena too small to initialize");
		Self { alloc, storage }
	}

	fn alloc_chunk(&mut self) -> Result<NonNull<u8>> {
		let p = self.alloc.allocate(CHUNK_SIZE)?;
		unsafe { core::ptr::write_bytes(p.as_ptr(), 0, CHUNK_SIZE) };
		Ok(p)
	}

	fn free_chunk(&mut self, p: NonNull<u8>) {
		self.alloc.deallocate(p);
	}
}

fn chunks_needed(len: usize) -> usize {
	(len + CHUNK_SIZE - 1) / CHUNK_SIZE
}

fn read_content(chunks: &[NonNull<u8>], len: usize, pos: usize, dst: &mut [u8]) -> usize {
	if pos >= len {
		return 0;
	}
	let n = dst.len().min(len - pos);
	let mut copied = 0;
	while copied < n {
		let abs = pos + copied;
		let chunk_idx = abs / CHUNK_SIZE;
		let chunk_off = abs % CHUNK_SIZE;
		let avail = (CHUNK_SIZE - chunk_off).min(n - copied);
		let chunk = unsafe { core::slice::from_raw_parts(chunks[chunk_idx].as_ptr(), CHUNK_SIZE) };
		dst[copied..copied + avail].copy_from_slice(&chunk[chunk_off..chunk_off + avail]);
		copied += avail;
	}
	n
}

/// Append/overwrite `src` at `pos`, growing `chunks`/`len` as needed.
/// Newly allocated chunks are zero-filled in full (not just up to `pos`),
/// so a gap left by a prior seek-past-end reads back as zero without any
/// separate gap-tracking.
fn write_content(arena: &Rc<RefCell<Arena>>, chunks: &mut Vec<NonNull<u8>>, len: &mut usize, pos: usize, src: &[u8]) -> Result<usize> {
	let end = pos + src.len();
	let needed = chunks_needed(end);
	while chunks.len() < needed {
		let p = arena.borrow_mut().alloc_chunk()?;
		chunks.push(p);
	}
	let mut written = 0;
	while written < src.len() {
		let abs = pos + written;
		let chunk_idx = abs / CHUNK_SIZE;
		let chunk_off = abs % CHUNK_SIZE;
		let avail = (CHUNK_SIZE - chunk_off).min(src.len() - written);
		let chunk = unsafe { core::slice::from_raw_parts_mut(chunks[chunk_idx].as_ptr(), CHUNK_SIZE) };
		chunk[chunk_off..chunk_off + avail].copy_from_slice(&src[written..written + avail]);
		written += avail;
	}
	if end > *len {
		*len = end;
	}
	Ok(src.len())
}

fn truncate_content(arena: &Rc<RefCell<Arena>>, chunks: &mut Vec<NonNull<u8>>, len: &mut usize) {
	let mut arena = arena.borrow_mut();
	for p in chunks.drain(..) {
		arena.free_chunk(p);
	}
	*len = 0;
}

enum Node {
	File {
		chunks: Vec<NonNull<u8>>,
		len: usize,
		mtime: u64,
		arena: Rc<RefCell<Arena>>,
	},
	Dir {
		children: Vec<(String, Rc<RefCell<Node>>)>,
		mtime: u64,
	},
}

impl Node {
	fn file_type(&self) -> FileType {
		match self {
			Node::File { .. } => FileType::Regular,
			Node::Dir { .. } => FileType::Directory,
		}
	}

	fn mtime(&self) -> u64 {
		match self {
			Node::File { mtime, .. } => *mtime,
			Node::Dir { mtime, .. } => *mtime,
		}
	}
}

impl Drop for Node {
	fn drop(&mut self) {
		if let Node::File { chunks, arena, .. } = self {
			let mut arena = arena.borrow_mut();
			for p in chunks.drain(..) {
				arena.free_chunk(p);
			}
		}
	}
}

/// A growable in-RAM filesystem. Construct with [`RamFs::new`]; `clock`
/// supplies the mtime stamped on creates/writes (the crate has no built-in
/// notion of wall-clock time, matching its ambient-stack scope in §1).
pub struct RamFs {
	root: Rc<RefCell<Node>>,
	cwd: String,
	clock: fn() -> u64,
	arena: Rc<RefCell<Arena>>,
}

fn default_clock() -> u64 {
	0
}

impl RamFs {
	pub fn new() -> Self {
		Self::with_clock(default_clock)
	}

	pub fn with_clock(clock: fn() -> u64) -> Self {
		let arena = Rc::new(RefCell::new(Arena::new(DEFAULT_ARENA_SIZE)));
		Self {
			root: Rc::new(RefCell::new(Node::Dir {
				children: Vec::new(),
				mtime: clock(),
			})),
			cwd: String::from("/"),
			clock,
			arena,
		}
	}

	fn lookup(&self, path: &str) -> Result<Rc<RefCell<Node>>> {
		if path == "/" {
			return Ok(self.root.clone());
		}
		let mut cur = self.root.clone();
		for component in path.split('/').filter(|c| !c.is_empty()) {
			let next = match &*cur.borrow() {
				Node::Dir { children, .. } => children
					.iter()
					.find(|(name, _)| name == component)
					.map(|(_, node)| node.clone()),
				Node::File { .. } => None,
			};
			cur = next.ok_or(Error::NoEntry)?;
		}
		Ok(cur)
	}

	fn lookup_parent<'a>(&self, path: &'a str) -> Result<(Rc<RefCell<Node>>, &'a str)> {
		let parent = crate::vfs::path::parent(path);
		let name = crate::vfs::path::name(path);
		Ok((self.lookup(parent)?, name))
	}
}

impl Default for RamFs {
	fn default() -> Self {
		Self::new()
	}
}

pub struct RamFile {
	node: Rc<RefCell<Node>>,
	pos: u64,
	writable: bool,
	clock: fn() -> u64,
}

impl VfsFile for RamFile {}

impl crate::stream::FileLike for RamFile {
	fn read(&mut self, dst: &mut [u8]) -> Result<usize> {
		let node = self.node.borrow();
		let (chunks, len) = match &*node {
			Node::File { chunks, len, .. } => (chunks, *len),
			Node::Dir { .. } => return Err(Error::Invalid),
		};
		let n = read_content(chunks, len, self.pos as usize, dst);
		self.pos += n as u64;
		Ok(n)
	}

	fn write(&mut self, src: &[u8]) -> Result<usize> {
		if !self.writable {
			return Err(Error::Access);
		}
		let mut node = self.node.borrow_mut();
		let (chunks, len, mtime, arena) = match &mut *node {
			Node::File { chunks, len, mtime, arena } => (chunks, len, mtime, arena),
			Node::Dir { .. } => return Err(Error::Invalid),
		};
		let pos = self.pos as usize;
		let n = write_content(arena, chunks, len, pos, src)?;
		self.pos = (pos + n) as u64;
		*mtime = (self.clock)();
		Ok(n)
	}

	fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
		let len = match &*self.node.borrow() {
			Node::File { len, .. } => *len as i64,
			Node::Dir { .. } => return Err(Error::Invalid),
		};
		let base = match whence {
			Whence::Set => 0,
			Whence::Cur => self.pos as i64,
			Whence::End => len,
		};
		let target = base + offset;
		if target < 0 {
			return Err(Error::Range);
		}
		self.pos = target as u64;
		Ok(self.pos)
	}

	fn tell(&mut self) -> Result<u64> {
		Ok(self.pos)
	}

	fn flush(&mut self) -> Result<()> {
		Ok(())
	}

	fn close(&mut self) -> Result<()> {
		Ok(())
	}
}

pub struct RamDir {
	entries: Vec<DirEnt>,
	pos: usize,
}

impl VfsDir for RamDir {
	fn read_dir(&mut self) -> Result<Option<DirEnt>> {
		if self.pos >= self.entries.len() {
			return Ok(None);
		}
		let entry = self.entries[self.pos].clone();
		self.pos += 1;
		Ok(Some(entry))
	}
}

impl Vfs for RamFs {
	fn open(&mut self, path: &str, mode: OpenMode) -> Result<Box<dyn VfsFile>> {
		let node = match self.lookup(path) {
			Ok(n) => {
				if mode.contains(OpenMode::TRUNCATE) {
					match &mut *n.borrow_mut() {
						Node::File { chunks, len, mtime, arena } => {
							truncate_content(arena, chunks, len);
							*mtime = (self.clock)();
						}
						Node::Dir { .. } => return Err(Error::Invalid),
					}
				}
				n
			}
			Err(Error::NoEntry) if mode.contains(OpenMode::CREATE) => {
				let (parent, name) = self.lookup_parent(path)?;
				let new_node = Rc::new(RefCell::new(Node::File {
					chunks: Vec::new(),
					len: 0,
					mtime: (self.clock)(),
					arena: self.arena.clone(),
				}));
				match &mut *parent.borrow_mut() {
					Node::Dir { children, .. } => children.push((name.to_string(), new_node.clone())),
					Node::File { .. } => return Err(Error::Invalid),
				}
				new_node
			}
			Err(e) => return Err(e),
		};

		if !matches!(&*node.borrow(), Node::File { .. }) {
			return Err(Error::Invalid);
		}
		let pos = if mode.contains(OpenMode::APPEND) {
			match &*node.borrow() {
				Node::File { len, .. } => *len as u64,
				Node::Dir { .. } => 0,
			}
		} else {
			0
		};
		Ok(Box::new(RamFile {
			node,
			pos,
			writable: mode.intersects(OpenMode::WRITE | OpenMode::APPEND),
			clock: self.clock,
		}))
	}

	fn mkdir(&mut self, path: &str) -> Result<()> {
		if self.lookup(path).is_ok() {
			return Err(Error::Exist);
		}
		let (parent, name) = self.lookup_parent(path)?;
		let new_node = Rc::new(RefCell::new(Node::Dir {
			children: Vec::new(),
			mtime: (self.clock)(),
		}));
		let mut parent_mut = parent.borrow_mut();
		let result = match &mut *parent_mut {
			Node::Dir { children, .. } => {
				children.push((name.to_string(), new_node));
				Ok(())
			}
			Node::File { .. } => Err(Error::Invalid),
		};
		result
	}

	fn opendir(&mut self, path: &str) -> Result<Box<dyn VfsDir>> {
		let node = self.lookup(path)?;
		let entries = match &*node.borrow() {
			Node::Dir { children, .. } => children
				.iter()
				.map(|(name, node)| DirEnt {
					name: name.clone(),
					file_type: node.borrow().file_type(),
				})
				.collect(),
			Node::File { .. } => return Err(Error::Invalid),
		};
		Ok(Box::new(RamDir { entries, pos: 0 }))
	}

	fn chdir(&mut self, path: &str) -> Result<()> {
		if !crate::vfs::is_directory(self, path) {
			return Err(Error::NoEntry);
		}
		self.cwd = crate::vfs::path::resolve(&self.cwd, path)?;
		Ok(())
	}

	fn getcwd(&self) -> Result<String> {
		Ok(self.cwd.clone())
	}

	fn remove(&mut self, path: &str) -> Result<()> {
		let node = self.lookup(path)?;
		if let Node::Dir { children, .. } = &*node.borrow() {
			if !children.is_empty() {
				return Err(Error::Exist);
			}
		}
		let (parent, name) = self.lookup_parent(path)?;
		let mut parent_mut = parent.borrow_mut();
		let result = match &mut *parent_mut {
			Node::Dir { children, .. } => {
				children.retain(|(n, _)| n != name);
				Ok(())
			}
			Node::File { .. } => Err(Error::Invalid),
		};
		result
	}

	fn rename(&mut self, from: &str, to: &str) -> Result<()> {
		let node = self.lookup(from)?;
		let (old_parent, old_name) = self.lookup_parent(from)?;
		let (new_parent, new_name) = self.lookup_parent(to)?;

		// Same parent and same name is a no-op rename: skip straight to Ok
		// rather than letting the remove-then-insert below race itself and
		// delete the entry (insert into new_parent, then the very next
		// retain on the same Vec removes what was just inserted).
		if Rc::ptr_eq(&old_parent, &new_parent) && old_name == new_name {
			return Ok(());
		}

		match &mut *new_parent.borrow_mut() {
			Node::Dir { children, .. } => {
				children.retain(|(n, _)| n != new_name);
				children.push((new_name.to_string(), node));
			}
			Node::File { .. } => return Err(Error::Invalid),
		}
		match &mut *old_parent.borrow_mut() {
			Node::Dir { children, .. } => children.retain(|(n, _)| n != old_name),
			Node::File { .. } => return Err(Error::Invalid),
		}
		Ok(())
	}

	fn stat(&mut self, path: &str) -> Result<Stat> {
		let node = self.lookup(path)?;
		let node = node.borrow();
		let size = match &*node {
			Node::File { len, .. } => *len as u64,
			Node::Dir { .. } => 0,
		};
		Ok(Stat {
			mtime: node.mtime(),
			size,
			file_type: node.file_type(),
		})
	}

	fn utime(&mut self, path: &str, mtime: u64) -> Result<()> {
		let node = self.lookup(path)?;
		match &mut *node.borrow_mut() {
			Node::File { mtime: m, .. } => *m = mtime,
			Node::Dir { mtime: m, .. } => *m = mtime,
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::stream::FileLike;
	use core::str::FromStr;

	#[test]
	fn write_then_read_round_trips() {
		let mut fs = RamFs::new();
		let mut f = fs.open("/a.txt", OpenMode::from_str("w+").unwrap()).unwrap();
		f.write(b"hello").unwrap();
		f.seek(0, Whence::Set).unwrap();
		let mut buf = [0u8; 16];
		let n = f.read(&mut buf).unwrap();
		assert_eq!(&buf[..n], b"hello");
	}

	#[test]
	fn remove_nonempty_dir_fails() {
		let mut fs = RamFs::new();
		fs.mkdir("/d").unwrap();
		fs.open("/d/x", OpenMode::from_str("w").unwrap()).unwrap();
		assert_eq!(fs.remove("/d"), Err(Error::Exist));
	}

	#[test]
	fn write_spans_multiple_chunks() {
		let mut fs = RamFs::new();
		let mut f = fs.open("/big", OpenMode::from_str("w+").unwrap()).unwrap();
		let payload: Vec<u8> = (0..CHUNK_SIZE * 3 + 7).map(|i| (i % 251) as u8).collect();
		f.write(&payload).unwrap();
		f.seek(0, Whence::Set).unwrap();
		let mut buf = alloc::vec![0u8; payload.len()];
		let n = f.read(&mut buf).unwrap();
		assert_eq!(n, payload.len());
		assert_eq!(buf, payload);
	}

	#[test]
	fn truncate_on_open_frees_chunks_and_resets_len() {
		let mut fs = RamFs::new();
		let mut f = fs.open("/t", OpenMode::from_str("w+").unwrap()).unwrap();
		f.write(&alloc::vec![7u8; CHUNK_SIZE * 2]).unwrap();
		drop(f);

		let mut f = fs.open("/t", OpenMode::from_str("w").unwrap()).unwrap();
		let st = fs.stat("/t").unwrap();
		assert_eq!(st.size, 0);
		f.write(b"new").unwrap();
		drop(f);
		let st = fs.stat("/t").unwrap();
		assert_eq!(st.size, 3);
	}

	#[test]
	fn seek_past_end_then_write_zero_fills() {
		let mut fs = RamFs::new();
		let mut f = fs.open("/a", OpenMode::from_str("w+").unwrap()).unwrap();
		f.write(b"ab").unwrap();
		f.seek(4, Whence::Set).unwrap();
		f.write(b"z").unwrap();
		f.seek(0, Whence::Set).unwrap();
		let mut buf = [0u8; 8];
		let n = f.read(&mut buf).unwrap();
		assert_eq!(&buf[..n], b"ab\0\0z");
	}
}
