// SPDX-License-Identifier: GPL-2.0

//! Path canonicalization and component helpers.
//!
//! The canonical form used everywhere else in the VFS layer: a leading
//! `/`, no `.`/`..` components, no doubled `/`, and no trailing `/` except
//! for the root path itself.

use alloc::string::String;
use alloc::vec::Vec;

use crate::error::{Error, Result};

/// Maximum length, in bytes, of a single path component.
pub const NAME_MAX: usize = 255;

/// Resolve `input` against `cwd` into canonical absolute form.
///
/// `cwd` is assumed already canonical. Relative `input` is joined onto
/// `cwd` first; `.` components are dropped and `..` pops the previous
/// component. Popping past root is an error.
pub fn resolve(cwd: &str, input: &str) -> Result<String> {
	crate::debug_assert_or_abort!(cwd.starts_with('/'));

	let joined: String = if input.starts_with('/') {
		String::from(input)
	} else {
		let mut s = String::from(cwd);
		if !s.ends_with('/') {
			s.push('/');
		}
		s.push_str(input);
		s
	};

	let mut stack: Vec<&str> = Vec::new();
	for component in joined.split('/') {
		match component {
			"" | "." => continue,
			".." => {
				if stack.pop().is_none() {
					return Err(Error::NoEntry);
				}
			}
			c => {
				if c.len() > NAME_MAX {
					return Err(Error::NameTooLong);
				}
				stack.push(c);
			}
		}
	}

	if stack.is_empty() {
		return Ok(String::from("/"));
	}
	let mut out = String::with_capacity(joined.len());
	for c in &stack {
		out.push('/');
		out.push_str(c);
	}
	Ok(out)
}

/// The final component of a canonical path (`"/foo/bar"` -> `"bar"`).
pub fn name(path: &str) -> &str {
	if path == "/" {
		return "/";
	}
	path.rsplit('/').next().unwrap_or(path)
}

/// Everything before the final component (`"/foo/bar"` -> `"/foo"`,
/// `"/foo"` -> `"/"`).
pub fn parent(path: &str) -> &str {
	if path == "/" {
		return "/";
	}
	match path.rfind('/') {
		Some(0) => "/",
		Some(idx) => &path[..idx],
		None => "/",
	}
}

/// Split off the first component of `path`, forward-walking toward the
/// leaf. Returns `(component, rest)` where `rest` starts with `/` and can
/// be fed back into `top` to continue the walk; `None` once no component
/// remains (`path` was `"/"` or `""`).
pub fn top(path: &str) -> Option<(&str, &str)> {
	let trimmed = path.trim_start_matches('/');
	if trimmed.is_empty() {
		return None;
	}
	match trimmed.find('/') {
		Some(idx) => Some((&trimmed[..idx], &trimmed[idx..])),
		None => Some((trimmed, "")),
	}
}

/// Split off the last component of `path`, backward-walking toward the
/// root. Returns `(component, rest)` where `rest` is the path with that
/// component and its trailing slash removed; `None` once no component
/// remains.
pub fn tail(path: &str) -> Option<(&str, &str)> {
	let trimmed = path.trim_end_matches('/');
	if trimmed.is_empty() {
		return None;
	}
	match trimmed.rfind('/') {
		Some(idx) => Some((&trimmed[idx + 1..], &trimmed[..idx])),
		None => Some((trimmed, "")),
	}
}

/// The part of the final component after the last `.`, or `""` if none.
pub fn suffix(path: &str) -> &str {
	let n = name(path);
	match n.rfind('.') {
		Some(0) | None => "",
		Some(idx) => &n[idx + 1..],
	}
}

/// The final component with any suffix stripped.
pub fn stem(path: &str) -> &str {
	let n = name(path);
	match n.rfind('.') {
		Some(0) | None => n,
		Some(idx) => &n[..idx],
	}
}

/// Whether `path` lies under `prefix` (or equals it), treating both as
/// canonical absolute paths. Used by the union FS's longest-prefix match.
pub fn starts_with_mount(path: &str, prefix: &str) -> bool {
	if prefix == "/" {
		return true;
	}
	path == prefix || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn resolve_collapses_dots_and_slashes() {
		assert_eq!(resolve("/foo/bar", "../baz/./qux/").unwrap(), "/foo/baz/qux");
		assert_eq!(resolve("/foo/bar", "/").unwrap(), "/");
		assert!(resolve("/foo/bar", "../../..").is_err());
	}

	#[test]
	fn resolve_is_idempotent() {
		let once = resolve("/", "/a/b/c").unwrap();
		let twice = resolve("/", &once).unwrap();
		assert_eq!(once, twice);
	}

	#[test]
	fn name_and_parent() {
		assert_eq!(name("/foo/bar"), "bar");
		assert_eq!(parent("/foo/bar"), "/foo");
		assert_eq!(parent("/foo"), "/");
		assert_eq!(parent("/"), "/");
	}

	#[test]
	fn top_walks_forward_component_by_component() {
		let (c1, rest1) = top("/foo/bar/baz").unwrap();
		assert_eq!(c1, "foo");
		let (c2, rest2) = top(rest1).unwrap();
		assert_eq!(c2, "bar");
		let (c3, rest3) = top(rest2).unwrap();
		assert_eq!(c3, "baz");
		assert_eq!(rest3, "");
		assert!(top(rest3).is_none());
		assert!(top("/").is_none());
	}

	#[test]
	fn tail_walks_backward_component_by_component() {
		let (c1, rest1) = tail("/foo/bar/baz").unwrap();
		assert_eq!(c1, "baz");
		let (c2, rest2) = tail(rest1).unwrap();
		assert_eq!(c2, "bar");
		let (c3, rest3) = tail(rest2).unwrap();
		assert_eq!(c3, "foo");
		assert_eq!(rest3, "");
		assert!(tail(rest3).is_none());
		assert!(tail("/").is_none());
	}

	#[test]
	fn suffix_and_stem() {
		assert_eq!(suffix("/foo/bar.txt"), "txt");
		assert_eq!(stem("/foo/bar.txt"), "bar");
		assert_eq!(suffix("/foo/.hidden"), "");
	}

	#[test]
	fn mount_prefix_match() {
		assert!(starts_with_mount("/mnt/ext/data/x", "/mnt/ext"));
		assert!(!starts_with_mount("/mnt/extra/x", "/mnt/ext"));
		assert!(starts_with_mount("/anything", "/"));
	}
}
