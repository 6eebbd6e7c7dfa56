//! Linux native layer: mount-table enumeration, `fstatvfs` statistics, and
//! `/dev/disk/by-*` identifier lookup.
//!
//! Linux has no native hidden flag and no native system-volume signal; both
//! concerns are handled above this boundary.

use super::{NativeVolumes, RawMountPoint, RawVolumeStats};
use crate::error::{FsError, FsResult};
use crate::fstype;
use crate::mounts;
use crate::options::MOUNT_TABLE_PATHS;
use crate::types::{HealthStatus, HideSupport, RemoteInfo};
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use tracing::debug;

pub(super) struct LinuxVolumes;

impl LinuxVolumes {
	pub(super) fn new() -> Result<Self, String> {
		Ok(Self)
	}
}

/// Closes the descriptor on every exit path. The open descriptor also pins
/// the filesystem, so the statistics call cannot race an unmount of the same
/// path.
struct FdGuard(libc::c_int);

impl Drop for FdGuard {
	fn drop(&mut self) {
		if self.0 >= 0 {
			unsafe { libc::close(self.0) };
		}
	}
}

fn open_dir(path: &Path) -> FsResult<FdGuard> {
	let c_path = CString::new(path.as_os_str().as_bytes())
		.map_err(|_| FsError::invalid_argument("path contains a NUL byte"))?;
	let fd = unsafe {
		libc::open(c_path.as_ptr(), libc::O_DIRECTORY | libc::O_RDONLY | libc::O_CLOEXEC)
	};
	if fd < 0 {
		return Err(FsError::not_accessible(
			"open",
			path.display().to_string(),
			std::io::Error::last_os_error(),
		));
	}
	Ok(FdGuard(fd))
}

/// Scans a `/dev/disk/by-*` directory for the symlink resolving to `device`.
/// Link names escape special bytes the same way mount tables do.
fn lookup_by_link(dir: &str, device: &Path) -> Option<String> {
	let canonical_device = std::fs::canonicalize(device).ok()?;
	for entry in std::fs::read_dir(dir).ok()? {
		let entry = entry.ok()?;
		if let Ok(target) = std::fs::canonicalize(entry.path()) {
			if target == canonical_device {
				return Some(mounts::decode_escapes(&entry.file_name().to_string_lossy()));
			}
		}
	}
	None
}

fn checked_block_product(block_size: u64, blocks: u64, what: &str) -> FsResult<u64> {
	block_size
		.checked_mul(blocks)
		.ok_or_else(|| FsError::Native(format!("{what} calculation would overflow")))
}

fn read_table_entry(mount_point: &str) -> Option<mounts::MountEntry> {
	for candidate in MOUNT_TABLE_PATHS {
		if let Ok(text) = std::fs::read_to_string(candidate) {
			let entries = mounts::parse_mount_table(&text);
			return mounts::find_entry(&entries, mount_point).cloned();
		}
	}
	None
}

/// GVfs-style URI for a parsed remote spec (`smb://user@host/share`).
fn remote_uri(info: &RemoteInfo) -> Option<String> {
	if let Some(uri) = &info.uri {
		return Some(uri.clone());
	}
	let host = info.remote_host.as_deref()?;
	let share = info.remote_share.as_deref()?.trim_start_matches('/');
	let scheme = match info.protocol.as_deref()? {
		"cifs" => "smb",
		"ssh" | "sshfs" => "sftp",
		other => other,
	};
	let user = info.remote_user.as_deref().map(|u| format!("{u}@")).unwrap_or_default();
	Some(format!("{scheme}://{user}{host}/{share}"))
}

impl NativeVolumes for LinuxVolumes {
	fn list_mount_points(&self) -> FsResult<Vec<RawMountPoint>> {
		let mut last_error: Option<std::io::Error> = None;
		for candidate in MOUNT_TABLE_PATHS {
			match std::fs::read_to_string(candidate) {
				Ok(text) => {
					return Ok(mounts::parse_mount_table(&text)
						.into_iter()
						.map(|entry| RawMountPoint {
							mount_point: entry.mount_point,
							fstype: Some(entry.fstype),
							is_system_volume: None,
						})
						.collect());
				}
				Err(e) => {
					debug!(candidate = %candidate, error = %e, "mount table candidate unreadable");
					last_error = Some(e);
				}
			}
		}
		Err(FsError::not_accessible(
			"read",
			MOUNT_TABLE_PATHS.last().unwrap_or(&"").to_string(),
			last_error.unwrap_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound)),
		))
	}

	fn volume_stats(
		&self,
		mount_point: &str,
		device_hint: Option<&str>,
		_timeout_ms: u64,
	) -> FsResult<RawVolumeStats> {
		let path = Path::new(mount_point);
		let fd = open_dir(path)?;

		let mut vfs: libc::statvfs = unsafe { std::mem::zeroed() };
		if unsafe { libc::fstatvfs(fd.0, &mut vfs) } != 0 {
			return Err(FsError::not_accessible(
				"fstatvfs",
				mount_point.to_string(),
				std::io::Error::last_os_error(),
			));
		}

		let block_size =
			if vfs.f_frsize != 0 { vfs.f_frsize as u64 } else { vfs.f_bsize as u64 };
		let total_blocks = vfs.f_blocks as u64;
		let avail_blocks = vfs.f_bavail as u64;
		let free_blocks = vfs.f_bfree as u64;

		let total_bytes = checked_block_product(block_size, total_blocks, "total size")?;
		let available_bytes = checked_block_product(block_size, avail_blocks, "available space")?;
		let used_bytes = checked_block_product(
			block_size,
			total_blocks.saturating_sub(free_blocks),
			"used space",
		)?;

		let mut stats = RawVolumeStats {
			mount_from: device_hint.map(|d| d.to_string()),
			total_bytes,
			used_bytes,
			available_bytes,
			status: Some(HealthStatus::Healthy),
			..Default::default()
		};

		// Identifier lookup only makes sense for block devices.
		if let Some(device) = device_hint.filter(|d| d.starts_with("/dev/")) {
			let device = PathBuf::from(device);
			stats.uuid = lookup_by_link("/dev/disk/by-uuid", &device);
			stats.label = lookup_by_link("/dev/disk/by-label", &device);
		}

		// No GVfs here; network mounts get their uri and remote signal from
		// the mount table.
		if let Some(entry) = read_table_entry(mount_point) {
			stats.remote =
				Some(entry.remote.is_some() || fstype::is_remote_fstype(&entry.fstype));
			stats.uri = entry.remote.as_ref().and_then(remote_uri);
			stats.fstype = Some(entry.fstype);
		}

		Ok(stats)
	}

	fn flag_hidden(&self, _path: &Path) -> FsResult<bool> {
		Err(FsError::Unsupported(
			"Linux filesystems have no hidden flag".to_string(),
		))
	}

	fn set_flag_hidden(&self, _path: &Path, _hidden: bool) -> FsResult<()> {
		Err(FsError::Unsupported(
			"Linux filesystems have no hidden flag".to_string(),
		))
	}

	fn hide_support(&self) -> HideSupport {
		HideSupport { dot_prefix: true, system_flag: false }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn stats_for_root_are_consistent() {
		let native = LinuxVolumes::new().unwrap();
		let stats = native.volume_stats("/", Some("/dev/root"), 0).unwrap();
		assert!(stats.total_bytes > 0);
		assert!(stats.used_bytes <= stats.total_bytes);
		assert!(stats.available_bytes <= stats.total_bytes);
		// The mount table fills in what fstatvfs cannot report.
		assert!(stats.fstype.is_some());
		assert_eq!(stats.remote, Some(false));
	}

	#[test]
	fn remote_specs_become_gvfs_style_uris() {
		let info = crate::remote::extract_remote_info("//alice@nas/media").unwrap();
		assert_eq!(remote_uri(&info).as_deref(), Some("smb://alice@nas/media"));

		let info = crate::remote::extract_remote_info("filer:/export").unwrap();
		assert_eq!(remote_uri(&info).as_deref(), Some("nfs://filer/export"));

		let info = crate::remote::extract_remote_info("sshfs#bob@dev:/home/bob").unwrap();
		assert_eq!(remote_uri(&info).as_deref(), Some("sftp://bob@dev/home/bob"));
	}

	#[test]
	fn missing_directory_is_not_accessible() {
		let native = LinuxVolumes::new().unwrap();
		let err = native.volume_stats("/definitely/not/mounted", None, 0).unwrap_err();
		assert!(matches!(err, FsError::NotAccessible { syscall: "open", .. }));
	}

	#[test]
	fn enumeration_yields_the_root_filesystem() {
		let native = LinuxVolumes::new().unwrap();
		let points = native.list_mount_points().unwrap();
		assert!(points.iter().any(|p| p.mount_point == "/"));
		assert!(points.iter().all(|p| p.fstype.is_some()));
	}

	#[test]
	fn hidden_flag_is_unsupported() {
		let native = LinuxVolumes::new().unwrap();
		assert!(matches!(
			native.flag_hidden(Path::new("/tmp")),
			Err(FsError::Unsupported(_))
		));
		let support = native.hide_support();
		assert!(support.dot_prefix);
		assert!(!support.system_flag);
	}
}
