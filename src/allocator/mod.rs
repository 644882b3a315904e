// SPDX-License-Identifier: GPL-2.0

//! Four allocation disciplines for small-memory targets, each operating
//! over a caller-supplied region rather than the global allocator:
//! fixed-block, stack/bump, variable free-list, and the bounded byte-array
//! in [`crate::container::byte_array`].

#[cfg(feature = "global-allocator")]
pub mod global;
pub mod fixed_block;
pub mod stack;
pub mod variable;

pub use fixed_block::FixedBlockAllocator;
pub use stack::{Direction, Mark, StackAllocator};
pub use variable::VariableAllocator;
