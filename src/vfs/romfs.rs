// SPDX-License-Identifier: GPL-2.0

//! Read-only filesystem backend over an immutable, packed directory image
//! in linear memory — the Rust counterpart of `xromfs.h`. No mkdir,
//! remove, rename, utime, or write; seeking past end of a file returns
//! [`Error::Range`] since there is no storage to materialize a gap into.

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::error::{Error, Result};
use crate::stream::{FileLike, Whence};
use crate::vfs::{DirEnt, FileType, OpenMode, Stat, Vfs, VfsDir, VfsFile};

/// Magic bytes identifying a ROM FS image (`"ROMF"` read little-endian).
pub const MAGIC: u32 = 0x464D_4F52;
pub const NAME_MAX: usize = 32;
const ENTRY_SIZE: usize = 48;
const TYPE_FILE: u8 = 0;
const TYPE_DIR: u8 = 1;

fn read_u32(image: &[u8], offset: usize) -> u32 {
	u32::from_le_bytes(image[offset..offset + 4].try_into().unwrap())
}

struct Entry {
	name: String,
	is_dir: bool,
	size_or_child: u32,
	mtime: u32,
	content_offset: u32,
}

fn parse_entry(image: &[u8], offset: usize) -> Entry {
	let name_bytes = &image[offset..offset + NAME_MAX];
	let nul = name_bytes.iter().position(|&b| b == 0).unwrap_or(NAME_MAX);
	let name = core::str::from_utf8(&name_bytes[..nul]).unwrap_or("").to_string();
	let type_flag = image[offset + NAME_MAX];
	let size_or_child = read_u32(image, offset + NAME_MAX + 4);
	let mtime = read_u32(image, offset + NAME_MAX + 8);
	let content_offset = read_u32(image, offset + NAME_MAX + 12);
	Entry {
		name,
		is_dir: type_flag == TYPE_DIR,
		size_or_child,
		mtime,
		content_offset,
	}
}

fn dir_entries(image: &[u8], record_offset: u32) -> Vec<Entry> {
	let offset = record_offset as usize;
	let count = read_u32(image, offset) as usize;
	(0..count)
		.map(|i| parse_entry(image, offset + 4 + i * ENTRY_SIZE))
		.collect()
}

enum Located {
	File { content_offset: u32, size: u32, mtime: u32 },
	Dir { record_offset: u32, mtime: u32 },
}

/// A read-only filesystem backed by a `&'a [u8]` image built with
/// [`RomFsBuilder`] (or an equivalent packer).
pub struct RomFs<'a> {
	image: &'a [u8],
	root_offset: u32,
}

impl<'a> RomFs<'a> {
	pub fn mount(image: &'a [u8]) -> Result<Self> {
		if image.len() < 8 || read_u32(image, 0) != MAGIC {
			return Err(Error::Protocol);
		}
		Ok(Self {
			image,
			root_offset: read_u32(image, 4),
		})
	}

	fn locate(&self, path: &str) -> Result<Located> {
		if path == "/" {
			return Ok(Located::Dir {
				record_offset: self.root_offset,
				mtime: 0,
			});
		}
		let mut record_offset = self.root_offset;
		let mut components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
		let last = components.pop().ok_or(Error::NoEntry)?;
		for component in components {
			let entries = dir_entries(self.image, record_offset);
			let entry = entries
				.iter()
				.find(|e| e.name == component && e.is_dir)
				.ok_or(Error::NoEntry)?;
			record_offset = entry.size_or_child;
		}
		let entries = dir_entries(self.image, record_offset);
		let entry = entries.iter().find(|e| e.name == last).ok_or(Error::NoEntry)?;
		if entry.is_dir {
			Ok(Located::Dir {
				record_offset: entry.size_or_child,
				mtime: entry.mtime,
			})
		} else {
			Ok(Located::File {
				content_offset: entry.content_offset,
				size: entry.size_or_child,
				mtime: entry.mtime,
			})
		}
	}
}

pub struct RomFile<'a> {
	image: &'a [u8],
	content_offset: u32,
	size: u32,
	pos: u32,
}

impl VfsFile for RomFile<'_> {}

impl FileLike for RomFile<'_> {
	fn read(&mut self, dst: &mut [u8]) -> Result<usize> {
		let remaining = (self.size - self.pos) as usize;
		let n = dst.len().min(remaining);
		let start = (self.content_offset + self.pos) as usize;
		dst[..n].copy_from_slice(&self.image[start..start + n]);
		self.pos += n as u32;
		Ok(n)
	}

	fn write(&mut self, _src: &[u8]) -> Result<usize> {
		Err(Error::Access)
	}

	fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
		let base = match whence {
			Whence::Set => 0i64,
			Whence::Cur => self.pos as i64,
			Whence::End => self.size as i64,
		};
		let target = base + offset;
		if target < 0 || target as u32 > self.size {
			return Err(Error::Range);
		}
		self.pos = target as u32;
		Ok(self.pos as u64)
	}

	fn tell(&mut self) -> Result<u64> {
		Ok(self.pos as u64)
	}

	fn flush(&mut self) -> Result<()> {
		Ok(())
	}

	fn close(&mut self) -> Result<()> {
		Ok(())
	}
}

pub struct RomDir {
	entries: Vec<DirEnt>,
	pos: usize,
}

impl VfsDir for RomDir {
	fn read_dir(&mut self) -> Result<Option<DirEnt>> {
		if self.pos >= self.entries.len() {
			return Ok(None);
		}
		let e = self.entries[self.pos].clone();
		self.pos += 1;
		Ok(Some(e))
	}
}

impl<'a> Vfs for RomFs<'a> {
	fn open(&mut self, path: &str, mode: OpenMode) -> Result<Box<dyn VfsFile>> {
		if mode.intersects(OpenMode::WRITE | OpenMode::APPEND | OpenMode::TRUNCATE | OpenMode::CREATE) {
			return Err(Error::Access);
		}
		match self.locate(path)? {
			Located::File { content_offset, size, .. } => Ok(Box::new(RomFile {
				image: self.image,
				content_offset,
				size,
				pos: 0,
			})),
			Located::Dir { .. } => Err(Error::Invalid),
		}
	}

	fn opendir(&mut self, path: &str) -> Result<Box<dyn VfsDir>> {
		match self.locate(path)? {
			Located::Dir { record_offset, .. } => {
				let entries = dir_entries(self.image, record_offset)
					.into_iter()
					.map(|e| DirEnt {
						name: e.name,
						file_type: if e.is_dir { FileType::Directory } else { FileType::Regular },
					})
					.collect();
				Ok(Box::new(RomDir { entries, pos: 0 }))
			}
			Located::File { .. } => Err(Error::Invalid),
		}
	}

	fn stat(&mut self, path: &str) -> Result<Stat> {
		match self.locate(path)? {
			Located::File { size, mtime, .. } => Ok(Stat {
				mtime: mtime as u64,
				size: size as u64,
				file_type: FileType::Regular,
			}),
			Located::Dir { mtime, .. } => Ok(Stat {
				mtime: mtime as u64,
				size: 0,
				file_type: FileType::Directory,
			}),
		}
	}
}

/// Builds a ROM FS image in memory — used by tests and by host tooling
/// that prepares an image to flash. Mirrors the on-disk layout `mount`
/// parses: one flat root directory of files (sufficient for this port's
/// test fixtures; nested directories use the same entry shape recursively
/// if a caller builds them by hand).
#[cfg(any(test, feature = "std"))]
pub struct RomFsBuilder {
	files: Vec<(String, Vec<u8>, u32)>,
}

#[cfg(any(test, feature = "std"))]
impl RomFsBuilder {
	pub fn new() -> Self {
		Self { files: Vec::new() }
	}

	pub fn add_file(&mut self, name: &str, content: &[u8], mtime: u32) -> &mut Self {
		self.files.push((name.to_string(), content.to_vec(), mtime));
		self
	}

	pub fn build(&self) -> Vec<u8> {
		let mut out = Vec::new();
		out.extend_from_slice(&MAGIC.to_le_bytes());
		out.extend_from_slice(&8u32.to_le_bytes()); // root record starts at offset 8

		out.extend_from_slice(&(self.files.len() as u32).to_le_bytes());
		let header_end = 8 + 4 + self.files.len() * ENTRY_SIZE;
		let mut content_offset = header_end;
		let mut entries = Vec::new();
		for (name, content, mtime) in &self.files {
			entries.push((name.clone(), content.len() as u32, *mtime, content_offset as u32));
			content_offset += content.len();
		}
		for (name, size, mtime, content_off) in &entries {
			let mut name_field = [0u8; NAME_MAX];
			let bytes = name.as_bytes();
			name_field[..bytes.len()].copy_from_slice(bytes);
			out.extend_from_slice(&name_field);
			out.push(TYPE_FILE);
			out.extend_from_slice(&[0u8; 3]);
			out.extend_from_slice(&size.to_le_bytes());
			out.extend_from_slice(&mtime.to_le_bytes());
			out.extend_from_slice(&content_off.to_le_bytes());
		}
		for (_, content, _) in &self.files {
			out.extend_from_slice(content);
		}
		out
	}
}

#[cfg(any(test, feature = "std"))]
impl Default for RomFsBuilder {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reads_back_built_image() {
		let mut builder = RomFsBuilder::new();
		builder.add_file("a.txt", b"hello", 42);
		let image = builder.build();
		let mut fs = RomFs::mount(&image).unwrap();

		let mut f = fs.open("/a.txt", OpenMode::READ).unwrap();
		let mut buf = [0u8; 16];
		let n = f.read(&mut buf).unwrap();
		assert_eq!(&buf[..n], b"hello");

		let st = fs.stat("/a.txt").unwrap();
		assert_eq!(st.size, 5);
		assert_eq!(st.mtime, 42);
	}

	#[test]
	fn write_is_rejected() {
		let mut builder = RomFsBuilder::new();
		builder.add_file("a.txt", b"hi", 0);
		let image = builder.build();
		let mut fs = RomFs::mount(&image).unwrap();
		assert_eq!(fs.open("/a.txt", OpenMode::WRITE).err(), Some(Error::Access));
	}

	#[test]
	fn seek_past_end_is_range_error() {
		let mut builder = RomFsBuilder::new();
		builder.add_file("a.txt", b"hi", 0);
		let image = builder.build();
		let mut fs = RomFs::mount(&image).unwrap();
		let mut f = fs.open("/a.txt", OpenMode::READ).unwrap();
		assert_eq!(f.seek(100, Whence::Set).err(), Some(Error::Range));
	}
}
