// SPDX-License-Identifier: GPL-2.0

//! Intrusive containers shared by the allocator and VFS layers.

pub mod byte_array;
pub mod intrusive_list;

pub use byte_array::ByteArray;
pub use intrusive_list::{Linked, List, Node};
