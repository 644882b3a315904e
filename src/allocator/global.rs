// SPDX-License-Identifier: GPL-2.0

//! Optional `#[global_allocator]` wiring, kept separate from the crate's own
//! region-based allocators. picox's four disciplines in
//! [`crate::allocator`] never touch the global allocator — they carve up a
//! caller-supplied `&mut [u8]` directly — but `Vec`/`Box`/`Rc` used
//! elsewhere in the crate (and by a consumer's own code) still need one
//! somewhere. This module exists for firmware consumers that have no
//! global allocator of their own and want to point one at a region of RAM
//! with a single `init` call, the way the teacher's memory subsystem wires
//! `linked_list_allocator::LockedHeap` as its kernel heap.
//!
//! Not compiled unless the `global-allocator` feature is enabled, since a
//! library has no business installing a global allocator the consumer
//! didn't ask for.

use linked_list_allocator::LockedHeap;

/// A global allocator backed by a single caller-initialized region.
///
/// ```ignore
/// #[global_allocator]
/// static ALLOCATOR: picox::allocator::global::GlobalHeap = picox::allocator::global::GlobalHeap::empty();
///
/// unsafe { ALLOCATOR.init(heap_start, heap_size); }
/// ```
pub struct GlobalHeap {
	inner: LockedHeap,
}

impl GlobalHeap {
	pub const fn empty() -> Self {
		Self {
			inner: LockedHeap::empty(),
		}
	}

	/// Give the allocator its backing region. Must be called exactly once,
	/// before the first allocation, with a region not otherwise in use.
	///
	/// # Safety
	/// `heap_start` must point to `heap_size` bytes that are valid for the
	/// lifetime of the allocator and not aliased by anything else.
	pub unsafe fn init(&self, heap_start: *mut u8, heap_size: usize) {
		self.inner.lock().init(heap_start, heap_size);
	}

	/// Bytes currently handed out and not yet freed.
	pub fn used(&self) -> usize {
		self.inner.lock().used()
	}

	/// Bytes still available for allocation.
	pub fn free(&self) -> usize {
		self.inner.lock().free()
	}
}

unsafe impl core::alloc::GlobalAlloc for GlobalHeap {
	unsafe fn alloc(&self, layout: core::alloc::Layout) -> *mut u8 {
		self.inner
			.lock()
			.allocate_first_fit(layout)
			.map(|p| p.as_ptr())
			.unwrap_or(core::ptr::null_mut())
	}

	unsafe fn dealloc(&self, ptr: *mut u8, layout: core::alloc::Layout) {
		if let Some(p) = core::ptr::NonNull::new(ptr) {
			self.inner.lock().deallocate(p, layout)
		}
	}
}
