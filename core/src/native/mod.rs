//! Native capability boundary.
//!
//! Raw volume enumeration, statistics retrieval, and hidden-flag access are
//! inherently fallible and platform-specific. This module exposes them behind
//! one trait, constructed at most once per process through a one-shot cell:
//! a construction failure is cached and re-surfaced to every dependent call
//! rather than retried silently or crashing the process.
//!
//! All blocking native work runs on the blocking pool; a caller that times
//! out drops its join handle and the late result is discarded.

use crate::error::{FsError, FsResult};
use crate::types::{HealthStatus, HideSupport};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(windows)]
mod windows;

/// One raw entry from native enumeration, before classification and merging.
#[derive(Debug, Clone, Default)]
pub(crate) struct RawMountPoint {
	pub mount_point: String,
	pub fstype: Option<String>,
	/// Native system-volume classification, where the platform has one.
	pub is_system_volume: Option<bool>,
}

/// Raw per-volume statistics and identifiers from the native layer.
#[derive(Debug, Clone, Default)]
pub(crate) struct RawVolumeStats {
	pub label: Option<String>,
	pub uuid: Option<String>,
	pub mount_from: Option<String>,
	pub uri: Option<String>,
	pub fstype: Option<String>,
	pub total_bytes: u64,
	pub used_bytes: u64,
	pub available_bytes: u64,
	/// Native remote/local signal, where the platform has one.
	pub remote: Option<bool>,
	pub status: Option<HealthStatus>,
}

pub(crate) trait NativeVolumes: Send + Sync {
	fn list_mount_points(&self) -> FsResult<Vec<RawMountPoint>>;

	fn volume_stats(
		&self,
		mount_point: &str,
		device_hint: Option<&str>,
		timeout_ms: u64,
	) -> FsResult<RawVolumeStats>;

	fn flag_hidden(&self, path: &std::path::Path) -> FsResult<bool>;

	fn set_flag_hidden(&self, path: &std::path::Path, hidden: bool) -> FsResult<()>;

	fn hide_support(&self) -> HideSupport;

	/// Whether individual native calls already honor the caller-supplied
	/// deadline. Where they do not, the timeout guard above this layer is the
	/// only enforcement.
	fn enforces_timeouts(&self) -> bool {
		false
	}

	/// Whether native system-volume classification is a real signal. Where it
	/// is, heuristics only fill gaps; where it is not, heuristics win.
	fn trusts_system_classification(&self) -> bool {
		false
	}
}

static HANDLE: OnceLock<Result<Arc<dyn NativeVolumes>, String>> = OnceLock::new();

fn build() -> Result<Arc<dyn NativeVolumes>, String> {
	#[cfg(target_os = "linux")]
	{
		Ok(Arc::new(linux::LinuxVolumes::new()?))
	}
	#[cfg(target_os = "macos")]
	{
		Ok(Arc::new(macos::MacosVolumes::new()?))
	}
	#[cfg(windows)]
	{
		Ok(Arc::new(windows::WindowsVolumes::new()?))
	}
	#[cfg(not(any(target_os = "linux", target_os = "macos", windows)))]
	{
		Err("no native volume support for this platform".to_string())
	}
}

/// The process-wide native handle: constructed at most once, first-call-wins,
/// read-only thereafter.
pub(crate) fn handle() -> FsResult<Arc<dyn NativeVolumes>> {
	match HANDLE.get_or_init(build) {
		Ok(native) => Ok(Arc::clone(native)),
		Err(message) => Err(FsError::Native(message.clone())),
	}
}

pub(crate) async fn list_mount_points() -> FsResult<Vec<RawMountPoint>> {
	let native = handle()?;
	tokio::task::spawn_blocking(move || native.list_mount_points())
		.await
		.map_err(|e| FsError::TaskJoin(e.to_string()))?
}

pub(crate) async fn volume_stats(
	mount_point: String,
	device_hint: Option<String>,
	timeout_ms: u64,
) -> FsResult<RawVolumeStats> {
	let native = handle()?;
	tokio::task::spawn_blocking(move || {
		native.volume_stats(&mount_point, device_hint.as_deref(), timeout_ms)
	})
	.await
	.map_err(|e| FsError::TaskJoin(e.to_string()))?
}

pub(crate) async fn flag_hidden(path: PathBuf) -> FsResult<bool> {
	let native = handle()?;
	tokio::task::spawn_blocking(move || native.flag_hidden(&path))
		.await
		.map_err(|e| FsError::TaskJoin(e.to_string()))?
}

pub(crate) async fn set_flag_hidden(path: PathBuf, hidden: bool) -> FsResult<()> {
	let native = handle()?;
	tokio::task::spawn_blocking(move || native.set_flag_hidden(&path, hidden))
		.await
		.map_err(|e| FsError::TaskJoin(e.to_string()))?
}
