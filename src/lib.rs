// SPDX-License-Identifier: GPL-2.0

//! picox: a portable allocator, container, VFS and stream substrate for
//! small-memory embedded systems.
//!
//! Built for cooperative or lightly preemptive execution on a single
//! address space with no MMU. Four allocator disciplines
//! ([`allocator::fixed_block`], [`allocator::stack`],
//! [`allocator::variable`], and the bounded [`container::byte_array`])
//! operate over caller-supplied memory rather than the global allocator;
//! a polymorphic [`stream`] abstraction and an intrusive
//! [`container::intrusive_list`] glue the allocators to a pluggable
//! [`vfs`] layer (in-RAM tree, ROM image, union mount, and — behind the
//! `std` feature — a host POSIX backend).

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod allocator;
pub mod container;
pub mod debug;
pub mod error;
pub mod log;
pub mod prelude;
pub mod stream;
pub mod sync;
pub mod vfs;

pub use error::{Error, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
