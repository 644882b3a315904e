// SPDX-License-Identifier: GPL-2.0

//! Convenience re-exports: `use picox::prelude::*;` pulls in the crate's
//! error type, synchronization primitives, core VFS types, and the
//! logging macros.

pub use alloc::boxed::Box;
pub use alloc::format;
pub use alloc::string::{String, ToString};
pub use alloc::vec::Vec;

pub use crate::error::{Error, Result};
pub use crate::sync::{Arc, Mutex, RwLock, Spinlock};

pub use crate::vfs::{Dir, File, FileType, OpenMode, Stat, Vfs};

pub use crate::{debug, error, info, trace, warn};
