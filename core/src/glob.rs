//! Glob-style path pattern compiler.
//!
//! Supports `**` (any number of path segments, optionally swallowing one
//! following separator), `*` (any run of non-separator characters), `?` (one
//! non-separator character), and a trailing bare separator meaning "this
//! segment or end of string". Everything else is matched literally; matching
//! is case-insensitive so drive-letter-style paths compare equal regardless
//! of spelling.

use crate::error::{FsError, FsResult};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::sync::Arc;

/// Once the cache grows past this many distinct pattern sets it is cleared
/// outright. Not LRU on purpose: callers depend on the blunt cache-miss
/// behavior at the boundary.
const CACHE_CEILING: usize = 256;

static CACHE: Lazy<Mutex<HashMap<String, Arc<PathMatcher>>>> =
	Lazy::new(|| Mutex::new(HashMap::new()));

/// A compiled, shareable matching predicate over paths.
#[derive(Debug)]
pub struct PathMatcher {
	regex: Regex,
}

impl PathMatcher {
	pub fn is_match(&self, path: &str) -> bool {
		// Mount tables and native layers disagree on separator convention;
		// patterns are written in forward-slash terms only.
		let normalized = path.replace('\\', "/");
		self.regex.is_match(&normalized)
	}
}

/// Compiles a pattern set into a single matcher, cached keyed by the
/// order-independent set: permutations of the same patterns share one
/// compiled matcher (reference-equal via `Arc`).
pub fn compile(patterns: &[String]) -> FsResult<Arc<PathMatcher>> {
	let mut sorted: Vec<&str> =
		patterns.iter().map(|p| p.trim()).filter(|p| !p.is_empty()).collect();
	sorted.sort_unstable();
	let key = sorted.join("\u{0}");

	if let Some(matcher) = CACHE.lock().get(&key) {
		return Ok(Arc::clone(matcher));
	}

	let source = if sorted.is_empty() {
		// An empty or all-blank pattern list matches nothing.
		"[^\\s\\S]".to_string()
	} else {
		let alternatives: Vec<String> = sorted.iter().map(|p| translate(p)).collect();
		format!("^(?:{})$", alternatives.join("|"))
	};

	let regex = RegexBuilder::new(&source)
		.case_insensitive(true)
		.build()
		.map_err(|e| FsError::invalid_argument(format!("bad glob pattern set: {e}")))?;
	let matcher = Arc::new(PathMatcher { regex });

	let mut cache = CACHE.lock();
	if cache.len() >= CACHE_CEILING {
		cache.clear();
	}
	cache.insert(key, Arc::clone(&matcher));
	Ok(matcher)
}

/// Translates one glob pattern into regex source. The pattern grammar is
/// forward-slash only; backslashes are normalized first.
fn translate(pattern: &str) -> String {
	let normalized = pattern.replace('\\', "/");
	let chars: Vec<char> = normalized.chars().collect();
	let mut out = String::with_capacity(normalized.len() * 2);
	let mut i = 0;
	while i < chars.len() {
		match chars[i] {
			'*' if chars.get(i + 1) == Some(&'*') => {
				if chars.get(i + 2) == Some(&'/') {
					// `**/` spans whole segments including the separator that
					// follows, so `a/**/b` also matches `a/b`.
					out.push_str("(?:.*/)?");
					i += 3;
				} else {
					out.push_str(".*");
					i += 2;
				}
			}
			'*' => {
				out.push_str("[^/]*");
				i += 1;
			}
			'?' => {
				out.push_str("[^/]");
				i += 1;
			}
			'/' if i == chars.len() - 1 => {
				// Trailing bare separator: this segment or end of string.
				out.push_str("/?");
				i += 1;
			}
			c => {
				if regex_metachar(c) {
					out.push('\\');
				}
				out.push(c);
				i += 1;
			}
		}
	}
	out
}

fn regex_metachar(c: char) -> bool {
	matches!(
		c,
		'.' | '+' | '(' | ')' | '[' | ']' | '{' | '}' | '^' | '$' | '|' | '\\'
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn matcher(patterns: &[&str]) -> Arc<PathMatcher> {
		let owned: Vec<String> = patterns.iter().map(|s| s.to_string()).collect();
		compile(&owned).unwrap()
	}

	#[test]
	fn matching_is_case_insensitive() {
		let m = matcher(&["c:/windows/**"]);
		assert!(m.is_match("C:/Windows/System32"));
		assert!(m.is_match("c:\\windows\\temp"));
		assert!(!m.is_match("d:/windows/system32"));
	}

	#[test]
	fn globstar_spans_zero_or_more_segments() {
		let m = matcher(&["/var/**/docker"]);
		assert!(m.is_match("/var/docker"));
		assert!(m.is_match("/var/lib/docker"));
		assert!(m.is_match("/var/lib/containers/docker"));
		assert!(!m.is_match("/var/lib/dockerd"));
	}

	#[test]
	fn star_and_question_stay_within_a_segment() {
		let m = matcher(&["/run/user/*/doc"]);
		assert!(m.is_match("/run/user/1000/doc"));
		assert!(!m.is_match("/run/user/1000/extra/doc"));

		let m = matcher(&["?:/$Recycle.Bin"]);
		assert!(m.is_match("C:/$Recycle.Bin"));
		assert!(m.is_match("z:\\$Recycle.Bin"));
		assert!(!m.is_match("CD:/$Recycle.Bin"));
	}

	#[test]
	fn trailing_separator_means_segment_or_end() {
		let m = matcher(&["/boot/"]);
		assert!(m.is_match("/boot"));
		assert!(m.is_match("/boot/"));
		assert!(!m.is_match("/boot/efi"));
	}

	#[test]
	fn literal_dot_is_escaped() {
		let m = matcher(&["**/.snapshot"]);
		assert!(m.is_match("/srv/nfs/.snapshot"));
		assert!(!m.is_match("/srv/nfs/xsnapshot"));
	}

	#[test]
	fn blank_pattern_list_matches_nothing() {
		let m = matcher(&[]);
		assert!(!m.is_match("/"));
		assert!(!m.is_match(""));
		let m = matcher(&["  ", ""]);
		assert!(!m.is_match("/anything"));
	}

	#[test]
	fn permutations_share_one_compiled_matcher() {
		let a = matcher(&["/proc/**", "/sys/**", "/dev"]);
		let b = matcher(&["/sys/**", "/dev", "/proc/**"]);
		assert!(Arc::ptr_eq(&a, &b));
	}
}
