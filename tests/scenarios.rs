// SPDX-License-Identifier: GPL-2.0

//! End-to-end scenarios exercising whole subsystems together, as opposed
//! to the per-module unit tests that live alongside each implementation.
//! Requires the `std` feature: `cargo test --features std`.

#![cfg(feature = "std")]

use std::boxed::Box;

use picox::allocator::{FixedBlockAllocator, VariableAllocator};
use picox::container::ByteArray;
use picox::error::Error;
use picox::stream::mem_stream::MemStream;
use picox::stream::{FileLike, Stream, Whence};
use picox::vfs::path::resolve;
use picox::vfs::posix::PosixFs;
use picox::vfs::ramfs::RamFs;
use picox::vfs::romfs::{RomFs, RomFsBuilder};
use picox::vfs::union::UnionFs;
use picox::vfs::{OpenMode, Vfs};

// Scenario 1: fixed-block exhaustion, LIFO reuse, clear.
#[test]
fn scenario_1_fixed_block_exhaustion() {
	let mut heap = [0u8; 256];
	let mut alloc = FixedBlockAllocator::new(&mut heap, 32, 8).unwrap();
	assert_eq!(alloc.num_blocks(), 8);

	let mut blocks = Vec::new();
	for _ in 0..8 {
		blocks.push(alloc.allocate().unwrap());
	}
	assert_eq!(alloc.remain_blocks(), 0);
	assert!(alloc.allocate().is_err());

	let freed = blocks[2];
	alloc.deallocate(freed);
	let reused = alloc.allocate().unwrap();
	assert_eq!(reused, freed);

	alloc.clear();
	assert_eq!(alloc.remain_blocks(), 8);
}

// Scenario 2: variable allocator full coalesce regardless of free order.
#[test]
fn scenario_2_variable_allocator_coalescing() {
	let mut heap = [0u8; 512];
	let mut alloc = VariableAllocator::new(&mut heap, 8).unwrap();
	let capacity = alloc.capacity();

	let a = alloc.allocate(100).unwrap();
	let b = alloc.allocate(100).unwrap();
	let c = alloc.allocate(100).unwrap();

	alloc.deallocate(a);
	alloc.deallocate(c);
	alloc.deallocate(b);

	let mut free_chunks = 0;
	alloc.walk_heap(|_size| free_chunks += 1);
	assert_eq!(free_chunks, 1);
	assert_eq!(alloc.reserve(), capacity);
}

// Scenario 3: path resolution — dot collapsing, root, past-root error.
#[test]
fn scenario_3_path_resolution() {
	assert_eq!(resolve("/foo/bar", "../baz/./qux/").unwrap(), "/foo/baz/qux");
	assert_eq!(resolve("/foo/bar", "/").unwrap(), "/");
	assert!(resolve("/foo/bar", "../../..").is_err());
}

// Scenario 4: union mount longest-prefix dispatch.
#[test]
fn scenario_4_union_longest_prefix() {
	let mut union = UnionFs::new();
	union.mount(Box::new(RamFs::new()), "/", "/").unwrap();
	union.mkdir("/mnt").unwrap();
	union.mkdir("/mnt/ext").unwrap();

	let mut ext = RamFs::new();
	ext.mkdir("/data").unwrap();
	{
		let mut f = ext.open("/data/x", OpenMode::WRITE | OpenMode::CREATE).unwrap();
		f.write(b"ext").unwrap();
	}
	union.mount(Box::new(ext), "/mnt/ext", "/").unwrap();

	{
		let mut f = union.open("/mnt/ext/data/x", OpenMode::READ).unwrap();
		let mut buf = [0u8; 8];
		let n = f.read(&mut buf).unwrap();
		assert_eq!(&buf[..n], b"ext");
	}

	// A sibling path under /mnt that isn't under the ext mount still
	// dispatches to the root mount with its full path intact.
	{
		let mut f = union.open("/mnt/foo", OpenMode::WRITE | OpenMode::CREATE).unwrap();
		f.write(b"root").unwrap();
	}
	let st = union.stat("/mnt/foo").unwrap();
	assert_eq!(st.size, 4);
}

// Scenario 5: read_line at a CRLF/LF boundary.
#[test]
fn scenario_5_read_line_boundary() {
	let mut backing = [0u8; 16];
	let mem = MemStream::borrowed(&mut backing);
	let mut stream = Stream::new(Box::new(mem));
	stream.write_all(b"ab\r\ncd\n").unwrap();
	stream.seek(0, Whence::Set).unwrap();

	let mut buf = [0u8; 8];
	assert_eq!(stream.read_line(&mut buf).unwrap(), Some("ab"));
	assert_eq!(stream.read_line(&mut buf).unwrap(), Some("cd"));
	assert_eq!(stream.read_line(&mut buf).unwrap(), None);
}

// Scenario 6: bounded byte-array insert/erase.
#[test]
fn scenario_6_bounded_byte_array_insert() {
	let mut arr = ByteArray::with_capacity(8);
	arr.push_back_n(b"ABC").unwrap();
	assert_eq!(arr.as_slice(), b"ABC");

	arr.insert_n(1, b"XY").unwrap();
	assert_eq!(arr.as_slice(), b"AXYBC");
	assert_eq!(arr.len(), 5);

	arr.erase_n(2, 2).unwrap();
	assert_eq!(arr.as_slice(), b"AXC");
	assert_eq!(arr.len(), 3);
}

// Scenario 7: host POSIX backend round-trip.
#[test]
fn scenario_7_posix_round_trip() {
	let dir = tempfile::tempdir().unwrap();
	let mut fs = PosixFs::new(dir.path());

	let mut f = fs
		.open("/scratch.bin", OpenMode::READ | OpenMode::WRITE | OpenMode::CREATE | OpenMode::TRUNCATE)
		.unwrap();
	f.write(b"hello picox").unwrap();
	f.seek(0, Whence::Set).unwrap();
	let mut buf = [0u8; 32];
	let n = f.read(&mut buf).unwrap();
	assert_eq!(&buf[..n], b"hello picox");

	let st = fs.stat("/scratch.bin").unwrap();
	assert_eq!(st.size, 11);
}

// Scenario 8: union FS cross-backend rename falls back to copy + remove,
// and a failing copy (destination is a read-only backend) leaves the
// source untouched.
#[test]
fn scenario_8_union_cross_backend_rename() {
	let mut union = UnionFs::new();
	let mut ram = RamFs::new();
	{
		let mut f = ram.open("/source.txt", OpenMode::WRITE | OpenMode::CREATE).unwrap();
		f.write(b"payload").unwrap();
	}
	union.mount(Box::new(ram), "/", "/").unwrap();
	union.mkdir("/rom").unwrap();

	let image = RomFsBuilder::new().build();
	let rom = RomFs::mount(Box::leak(image.into_boxed_slice())).unwrap();
	union.mount(Box::new(rom), "/rom", "/").unwrap();

	let err = union.rename("/source.txt", "/rom/dest.txt").unwrap_err();
	assert_eq!(err, Error::Access);
	assert!(union.open("/source.txt", OpenMode::READ).is_ok());
}
