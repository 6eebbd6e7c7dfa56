//! Windows native layer: logical-drive enumeration, per-drive statistics,
//! and the `FILE_ATTRIBUTE_HIDDEN` bit.
//!
//! Individual statistics calls are raced against the caller's deadline on a
//! dedicated thread, so this layer reports `enforces_timeouts`. The system
//! drive gives a real system-volume signal, so native classification is
//! trusted and heuristics only fill gaps.

use super::{NativeVolumes, RawMountPoint, RawVolumeStats};
use crate::error::{FsError, FsResult};
use crate::fstype;
use crate::types::{HealthStatus, HideSupport};
use std::ffi::OsStr;
use std::os::windows::ffi::OsStrExt;
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;
use windows_sys::Win32::Storage::FileSystem::{
	GetDiskFreeSpaceExW, GetDriveTypeW, GetFileAttributesW, GetLogicalDrives,
	GetVolumeInformationW, GetVolumeNameForVolumeMountPointW, SetFileAttributesW,
	DRIVE_FIXED, DRIVE_RAMDISK, DRIVE_REMOTE, DRIVE_REMOVABLE, FILE_ATTRIBUTE_HIDDEN,
	INVALID_FILE_ATTRIBUTES,
};

pub(super) struct WindowsVolumes;

impl WindowsVolumes {
	pub(super) fn new() -> Result<Self, String> {
		Ok(Self)
	}
}

fn wide(value: impl AsRef<OsStr>) -> Vec<u16> {
	value.as_ref().encode_wide().chain(std::iter::once(0)).collect()
}

fn from_wide(buf: &[u16]) -> String {
	let end = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
	String::from_utf16_lossy(&buf[..end])
}

/// Runs one blocking Win32 query on its own thread and abandons it when the
/// deadline passes; the thread's late result is discarded.
fn with_deadline<T: Send + 'static>(
	label: &str,
	timeout_ms: u64,
	work: impl FnOnce() -> FsResult<T> + Send + 'static,
) -> FsResult<T> {
	if timeout_ms == 0 {
		return work();
	}
	let (tx, rx) = mpsc::channel();
	std::thread::spawn(move || {
		let _ = tx.send(work());
	});
	match rx.recv_timeout(Duration::from_millis(timeout_ms)) {
		Ok(outcome) => outcome,
		Err(_) => Err(FsError::Timeout { label: label.to_string(), elapsed_ms: timeout_ms }),
	}
}

fn drive_root(letter: u8) -> String {
	format!("{}:\\", letter as char)
}

fn volume_information(root: &str) -> Option<(String, String, u32)> {
	let wide_root = wide(root);
	let mut label_buf = [0u16; 256];
	let mut fs_buf = [0u16; 256];
	let mut serial: u32 = 0;
	let ok = unsafe {
		GetVolumeInformationW(
			wide_root.as_ptr(),
			label_buf.as_mut_ptr(),
			label_buf.len() as u32,
			&mut serial,
			std::ptr::null_mut(),
			std::ptr::null_mut(),
			fs_buf.as_mut_ptr(),
			fs_buf.len() as u32,
		)
	};
	(ok != 0).then(|| (from_wide(&label_buf), from_wide(&fs_buf), serial))
}

impl NativeVolumes for WindowsVolumes {
	fn list_mount_points(&self) -> FsResult<Vec<RawMountPoint>> {
		let mask = unsafe { GetLogicalDrives() };
		if mask == 0 {
			return Err(FsError::not_accessible(
				"GetLogicalDrives",
				"<drive list>",
				std::io::Error::last_os_error(),
			));
		}
		let mut points = Vec::new();
		for bit in 0..26u8 {
			if mask & (1 << bit) == 0 {
				continue;
			}
			let root = drive_root(b'A' + bit);
			let drive_type = unsafe { GetDriveTypeW(wide(&root).as_ptr()) };
			if !matches!(
				drive_type,
				DRIVE_FIXED | DRIVE_REMOVABLE | DRIVE_REMOTE | DRIVE_RAMDISK
			) {
				continue;
			}
			let fstype = volume_information(&root).map(|(_, fs, _)| fs).filter(|f| !f.is_empty());
			points.push(RawMountPoint {
				is_system_volume: Some(fstype::is_system_drive_root(&root)),
				mount_point: root,
				fstype,
			});
		}
		Ok(points)
	}

	fn volume_stats(
		&self,
		mount_point: &str,
		_device_hint: Option<&str>,
		timeout_ms: u64,
	) -> FsResult<RawVolumeStats> {
		let root = if mount_point.ends_with('\\') || mount_point.ends_with('/') {
			mount_point.to_string()
		} else {
			format!("{mount_point}\\")
		};
		let label = format!("volume_stats {root}");
		with_deadline(&label, timeout_ms, move || {
			let wide_root = wide(&root);
			let drive_type = unsafe { GetDriveTypeW(wide_root.as_ptr()) };

			let mut total: u64 = 0;
			let mut free: u64 = 0;
			let mut available: u64 = 0;
			let ok = unsafe {
				GetDiskFreeSpaceExW(wide_root.as_ptr(), &mut available, &mut total, &mut free)
			};
			if ok == 0 {
				let source = std::io::Error::last_os_error();
				// A mapped network drive whose server is gone still enumerates;
				// report it disconnected rather than failing the whole call.
				if drive_type == DRIVE_REMOTE {
					return Ok(RawVolumeStats {
						remote: Some(true),
						status: Some(HealthStatus::Disconnected),
						..Default::default()
					});
				}
				return Err(FsError::not_accessible("GetDiskFreeSpaceExW", root, source));
			}

			let info = volume_information(&root);
			let mut guid_buf = [0u16; 64];
			let guid_ok = unsafe {
				GetVolumeNameForVolumeMountPointW(
					wide_root.as_ptr(),
					guid_buf.as_mut_ptr(),
					guid_buf.len() as u32,
				)
			};

			Ok(RawVolumeStats {
				label: info.as_ref().map(|(l, _, _)| l.clone()).filter(|l| !l.is_empty()),
				uuid: info.as_ref().map(|(_, _, serial)| format!("{serial:08X}")),
				fstype: info.map(|(_, fs, _)| fs).filter(|f| !f.is_empty()),
				uri: (guid_ok != 0).then(|| from_wide(&guid_buf)),
				total_bytes: total,
				used_bytes: total.saturating_sub(free),
				available_bytes: available,
				remote: Some(drive_type == DRIVE_REMOTE),
				status: Some(HealthStatus::Healthy),
				..Default::default()
			})
		})
	}

	fn flag_hidden(&self, path: &Path) -> FsResult<bool> {
		let attributes = unsafe { GetFileAttributesW(wide(path).as_ptr()) };
		if attributes == INVALID_FILE_ATTRIBUTES {
			return Err(FsError::not_accessible(
				"GetFileAttributesW",
				path.display().to_string(),
				std::io::Error::last_os_error(),
			));
		}
		Ok(attributes & FILE_ATTRIBUTE_HIDDEN != 0)
	}

	fn set_flag_hidden(&self, path: &Path, hidden: bool) -> FsResult<()> {
		let wide_path = wide(path);
		let attributes = unsafe { GetFileAttributesW(wide_path.as_ptr()) };
		if attributes == INVALID_FILE_ATTRIBUTES {
			return Err(FsError::not_accessible(
				"GetFileAttributesW",
				path.display().to_string(),
				std::io::Error::last_os_error(),
			));
		}
		let updated = if hidden {
			attributes | FILE_ATTRIBUTE_HIDDEN
		} else {
			attributes & !FILE_ATTRIBUTE_HIDDEN
		};
		if updated != attributes
			&& unsafe { SetFileAttributesW(wide_path.as_ptr(), updated) } == 0
		{
			return Err(FsError::not_accessible(
				"SetFileAttributesW",
				path.display().to_string(),
				std::io::Error::last_os_error(),
			));
		}
		Ok(())
	}

	fn hide_support(&self) -> HideSupport {
		HideSupport { dot_prefix: false, system_flag: true }
	}

	fn enforces_timeouts(&self) -> bool {
		true
	}

	fn trusts_system_classification(&self) -> bool {
		true
	}
}
