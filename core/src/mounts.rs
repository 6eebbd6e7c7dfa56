//! Mount table reading and parsing (Linux text source).
//!
//! The kernel escapes spaces and other special bytes in path-like fields as
//! backslash-octal sequences, so every field is decoded before use. Parsing
//! is pure and cross-platform; only the file I/O is Linux-specific in
//! practice.

use crate::error::{FsError, FsResult};
use crate::fstype;
use crate::remote;
use crate::types::RemoteInfo;
use std::path::PathBuf;
use tracing::debug;

/// One decoded mount-table line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
	/// Device or remote spec the volume is mounted from.
	pub device: String,
	pub mount_point: String,
	pub fstype: String,
	pub options: String,
	/// Populated when the filesystem type indicates a network backend and the
	/// device field parses as a remote spec.
	pub remote: Option<RemoteInfo>,
}

/// Decodes backslash-octal (`\NNN`, two or three digits, byte value in
/// 32..=255) and backslash-hex (`\xNN`) escapes to their literal bytes.
/// Anything else passes through unchanged.
pub fn decode_escapes(field: &str) -> String {
	let bytes = field.as_bytes();
	let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
	let mut i = 0;
	while i < bytes.len() {
		if bytes[i] == b'\\' && i + 1 < bytes.len() {
			if bytes[i + 1] == b'x' {
				if let Some(value) = parse_hex_pair(bytes.get(i + 2..i + 4)) {
					out.push(value);
					i += 4;
					continue;
				}
			} else if let Some((value, digits)) = parse_octal(&bytes[i + 1..]) {
				if (32..=255).contains(&value) {
					out.push(value as u8);
					i += 1 + digits;
					continue;
				}
			}
		}
		out.push(bytes[i]);
		i += 1;
	}
	String::from_utf8_lossy(&out).into_owned()
}

fn parse_hex_pair(slice: Option<&[u8]>) -> Option<u8> {
	let slice = slice?;
	let text = std::str::from_utf8(slice).ok()?;
	u8::from_str_radix(text, 16).ok()
}

fn parse_octal(bytes: &[u8]) -> Option<(u16, usize)> {
	let digits: Vec<u8> = bytes
		.iter()
		.take(3)
		.take_while(|b| (b'0'..=b'7').contains(b))
		.copied()
		.collect();
	if digits.len() < 2 {
		return None;
	}
	let text = std::str::from_utf8(&digits).ok()?;
	let value = u16::from_str_radix(text, 8).ok()?;
	Some((value, digits.len()))
}

/// Parses mount-table text: one entry per line, whitespace-delimited fields,
/// comments and short lines skipped.
pub fn parse_mount_table(text: &str) -> Vec<MountEntry> {
	text.lines()
		.filter(|line| !line.trim_start().starts_with('#'))
		.filter_map(|line| {
			let fields: Vec<&str> = line.split_whitespace().collect();
			if fields.len() < 3 {
				return None;
			}
			let device = decode_escapes(fields[0]);
			let mount_point = decode_escapes(fields[1]);
			let fstype = decode_escapes(fields[2]);
			let options = fields.get(3).map(|f| decode_escapes(f)).unwrap_or_default();
			let remote = fstype::is_remote_fstype(&fstype)
				.then(|| remote::extract_remote_info(&device))
				.flatten();
			Some(MountEntry { device, mount_point, fstype, options, remote })
		})
		.collect()
}

/// Reads the first successfully readable candidate path. Some candidates are
/// permission-gated or absent depending on container/sandbox context; failure
/// to read them all is non-fatal to the resolver, which degrades to
/// native-only data.
pub async fn read_mount_table(candidates: &[PathBuf]) -> FsResult<Vec<MountEntry>> {
	let mut last_error: Option<(PathBuf, std::io::Error)> = None;
	for path in candidates {
		match tokio::fs::read_to_string(path).await {
			Ok(text) => return Ok(parse_mount_table(&text)),
			Err(e) => {
				debug!(path = %path.display(), error = %e, "mount table candidate unreadable");
				last_error = Some((path.clone(), e));
			}
		}
	}
	match last_error {
		Some((path, e)) => Err(FsError::not_accessible(
			"read",
			path.display().to_string(),
			e,
		)),
		None => Err(FsError::invalid_argument("no mount table candidates given")),
	}
}

/// Finds the entry for `path`: exact mount-point match first, else the
/// longest mount-point prefix on a segment boundary.
pub fn find_entry<'a>(entries: &'a [MountEntry], path: &str) -> Option<&'a MountEntry> {
	let trimmed = trim_trailing_separator(path);
	if let Some(exact) = entries
		.iter()
		.rev()
		.find(|e| trim_trailing_separator(&e.mount_point) == trimmed)
	{
		return Some(exact);
	}
	entries
		.iter()
		.filter(|e| {
			let mount = trim_trailing_separator(&e.mount_point);
			mount == "/" || trimmed.starts_with(&format!("{mount}/"))
		})
		.max_by_key(|e| e.mount_point.len())
}

fn trim_trailing_separator(path: &str) -> &str {
	if path.len() > 1 {
		path.trim_end_matches('/')
	} else {
		path
	}
}
