//! Remote-mount spec parsing.
//!
//! Mount sources spell "where is this volume really" in several incompatible
//! forms: UNC/CIFS `//user@host/share`, ssh-backed `proto#user@host:share`,
//! NFS `host:/share`, and URI forms. Parsing is an ordered chain of explicit
//! patterns; the first candidate that yields a non-blank host and share wins.

use crate::fstype::{self, REMOTE_FS_TYPES};
use crate::types::RemoteInfo;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use url::Url;

// CIFS/SMB-style double-slash form, optionally prefixed by `user@`.
static DOUBLE_SLASH: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"^//(?:([^@/]+)@)?([^@/]+)/(.+)$").expect("static pattern"));

// ssh-backed mounts: `[protocol#]user@host:share`.
static SSH_STYLE: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"^(?:([A-Za-z0-9.+-]+)#)?([^@:/]+)@([^@:/]+):(.+)$").expect("static pattern")
});

// `host:/share` where the share does not begin with a second slash, so URI
// `scheme://` forms never collide with this branch.
static COLON_SLASH: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"^([^@:/]+):/([^/].*)$").expect("static pattern"));

/// Extracts host/share/user from a remote-mount spec using the default known
/// remote-type set. Returns `None` when the spec is unparseable.
pub fn extract_remote_info(spec: &str) -> Option<RemoteInfo> {
	extract_remote_info_with(spec, &REMOTE_FS_TYPES)
}

/// Ordered parse chain; first match short-circuits:
///
/// 1. a `file:` URI is local by definition;
/// 2. the three structural patterns, in fixed order;
/// 3. generic URI: a non-network scheme is reported but marked local, a
///    network scheme yields a fully populated remote spec.
pub fn extract_remote_info_with(spec: &str, known: &HashSet<&str>) -> Option<RemoteInfo> {
	let spec = spec.trim();
	if spec.is_empty() {
		return None;
	}

	if let Ok(url) = Url::parse(spec) {
		if url.scheme() == "file" {
			return Some(RemoteInfo::local_uri(spec));
		}
	}

	// The structural patterns are written in forward-slash terms only.
	let normalized = spec.replace('\\', "/");

	if let Some(caps) = DOUBLE_SLASH.captures(&normalized) {
		let host = caps.get(2).map_or("", |m| m.as_str());
		// `//?/Volume{...}` and `//./PhysicalDrive0` are local device paths,
		// not shares.
		if host != "?" && host != "." {
			let candidate = RemoteInfo {
				protocol: Some("cifs".to_string()),
				remote: true,
				remote_user: caps.get(1).map(|m| m.as_str().to_string()),
				remote_host: Some(host.to_string()),
				remote_share: caps.get(3).map(|m| m.as_str().to_string()),
				..Default::default()
			};
			if candidate.is_remote_spec() {
				return Some(candidate);
			}
		}
	}

	if let Some(caps) = SSH_STYLE.captures(&normalized) {
		let candidate = RemoteInfo {
			protocol: Some(
				caps.get(1).map_or_else(|| "ssh".to_string(), |m| m.as_str().to_lowercase()),
			),
			remote: true,
			remote_user: caps.get(2).map(|m| m.as_str().to_string()),
			remote_host: caps.get(3).map(|m| m.as_str().to_string()),
			remote_share: caps.get(4).map(|m| m.as_str().to_string()),
			..Default::default()
		};
		if candidate.is_remote_spec() {
			return Some(candidate);
		}
	}

	if let Some(caps) = COLON_SLASH.captures(&normalized) {
		let host = caps.get(1).map_or("", |m| m.as_str());
		// A single-character host is a drive letter (`C:/Users`), not an NFS
		// server.
		if host.chars().count() > 1 {
			let candidate = RemoteInfo {
				protocol: Some("nfs".to_string()),
				remote: true,
				remote_host: Some(host.to_string()),
				remote_share: caps.get(2).map(|m| m.as_str().to_string()),
				..Default::default()
			};
			if candidate.is_remote_spec() {
				return Some(candidate);
			}
		}
	}

	let url = Url::parse(spec).ok()?;
	let scheme = fstype::normalize_fs_type(url.scheme());
	if !fstype::is_remote_fs_type(&scheme, known) {
		// A URI whose scheme is not network-ish is still reported, just local.
		return Some(RemoteInfo::local_uri(spec));
	}
	let user = (!url.username().is_empty()).then(|| url.username().to_string());
	let host = url.host_str().map(|h| h.to_string());
	let share = url.path().trim_start_matches('/').to_string();
	let candidate = RemoteInfo {
		uri: Some(spec.to_string()),
		protocol: Some(scheme),
		remote: true,
		remote_user: user,
		remote_host: host,
		remote_share: (!share.is_empty()).then_some(share),
		..Default::default()
	};
	candidate.is_remote_spec().then_some(candidate)
}
