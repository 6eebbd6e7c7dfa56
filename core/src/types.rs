//! Public data model: mount points, volume metadata, remote specs, and the
//! hidden-attribute records.
//!
//! All records are created fresh per call and never mutated after being
//! returned; none hold native resources.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::PathBuf;

/// Result of the per-mount-point readability probe.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
	/// Directory listing succeeded within the deadline.
	Healthy,
	/// The probe exceeded its remaining time budget; the volume may merely be
	/// slow (sleeping network share), not broken.
	Timeout,
	/// Permission denied, path gone, or not a directory.
	Inaccessible,
	/// The transport under a network mount is gone.
	Disconnected,
	Unknown,
}

impl Display for HealthStatus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			Self::Healthy => "healthy",
			Self::Timeout => "timeout",
			Self::Inaccessible => "inaccessible",
			Self::Disconnected => "disconnected",
			Self::Unknown => "unknown",
		})
	}
}

/// One resolved mount point. `mount_point` is the natural key within a
/// resolved set; duplicates are collapsed last-wins by the resolver.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MountPoint {
	pub mount_point: String,
	pub fstype: Option<String>,
	pub status: Option<HealthStatus>,
	pub is_system_volume: Option<bool>,
	/// Populated when the health probe (or the per-item native query) failed;
	/// sibling entries are unaffected.
	pub error: Option<String>,
}

impl MountPoint {
	pub fn new(mount_point: impl Into<String>) -> Self {
		Self {
			mount_point: mount_point.into(),
			fstype: None,
			status: None,
			is_system_volume: None,
			error: None,
		}
	}
}

/// Host/share/user extracted from a remote-mount spec string.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteInfo {
	pub uri: Option<String>,
	pub protocol: Option<String>,
	pub remote: bool,
	pub remote_user: Option<String>,
	pub remote_host: Option<String>,
	pub remote_share: Option<String>,
}

impl RemoteInfo {
	/// The validity predicate used throughout: a spec only counts as remote
	/// when both host and share are non-blank.
	pub fn is_remote_spec(&self) -> bool {
		self.remote
			&& self.remote_host.as_deref().is_some_and(|h| !h.trim().is_empty())
			&& self.remote_share.as_deref().is_some_and(|s| !s.trim().is_empty())
	}

	pub fn local_uri(uri: impl Into<String>) -> Self {
		Self { uri: Some(uri.into()), remote: false, ..Default::default() }
	}
}

/// Full per-volume metadata: a superset of [`MountPoint`] merged from native
/// statistics, mount-table info, and remote classification.
///
/// `total_bytes` approximately equals `used_bytes + available_bytes`; reserved
/// blocks and concurrent mutation make exact equality impossible.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct VolumeMetadata {
	pub mount_point: String,
	pub fstype: Option<String>,
	pub label: Option<String>,
	pub uuid: Option<String>,
	/// The device or spec the volume is mounted from (`/dev/sda1`,
	/// `//host/share`, ...).
	pub mount_from: Option<String>,
	pub uri: Option<String>,
	pub status: Option<HealthStatus>,
	pub is_system_volume: Option<bool>,
	pub total_bytes: u64,
	pub used_bytes: u64,
	pub available_bytes: u64,
	pub remote: bool,
	pub remote_user: Option<String>,
	pub remote_host: Option<String>,
	pub remote_share: Option<String>,
}

/// Which hiding mechanism a caller selects.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum HideMethod {
	/// Rename to add/remove a leading dot (POSIX convention).
	DotPrefix,
	/// Toggle the platform hidden bit in filesystem metadata.
	SystemFlag,
	/// Attempt both, wherever each is supported.
	All,
	/// Prefer `DotPrefix` when supported, otherwise fall back to `SystemFlag`.
	Auto,
}

/// Which hiding mechanisms exist on this platform (or, in a
/// [`SetHiddenResult`], which were actually applied).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HideSupport {
	pub dot_prefix: bool,
	pub system_flag: bool,
}

impl HideSupport {
	pub fn any(&self) -> bool {
		self.dot_prefix || self.system_flag
	}
}

/// Both hidden booleans plus the capability record, so a caller can tell
/// "not hidden" apart from "cannot be hidden this way".
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HiddenMetadata {
	pub hidden: bool,
	pub dot_prefix: bool,
	pub system_flag: bool,
	pub supported: HideSupport,
}

/// Outcome of a hide/unhide request. Dot-prefix hiding renames the target, so
/// the final path may differ from the input.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SetHiddenResult {
	pub path: PathBuf,
	/// The methods that were actually applied.
	pub actions: HideSupport,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn remote_validity_requires_host_and_share() {
		let mut info = RemoteInfo { remote: true, ..Default::default() };
		assert!(!info.is_remote_spec());
		info.remote_host = Some("nas".into());
		assert!(!info.is_remote_spec());
		info.remote_share = Some("  ".into());
		assert!(!info.is_remote_spec());
		info.remote_share = Some("media".into());
		assert!(info.is_remote_spec());
	}

	#[test]
	fn health_status_serializes_lowercase() {
		assert_eq!(
			serde_json::to_string(&HealthStatus::Inaccessible).unwrap(),
			"\"inaccessible\""
		);
		assert_eq!(HealthStatus::Timeout.to_string(), "timeout");
	}
}
