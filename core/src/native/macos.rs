//! macOS native layer: `getmntinfo` enumeration, `statfs`/`statvfs`
//! statistics, and the `UF_HIDDEN` flag via `chflags`.
//!
//! `MNT_LOCAL` gives a real remote/local signal here, but there is no native
//! system-volume classification; heuristics above this boundary decide that.

use super::{NativeVolumes, RawMountPoint, RawVolumeStats};
use crate::error::{FsError, FsResult};
use crate::types::{HealthStatus, HideSupport};
use std::ffi::{CStr, CString};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

pub(super) struct MacosVolumes;

impl MacosVolumes {
	pub(super) fn new() -> Result<Self, String> {
		Ok(Self)
	}
}

fn c_path(path: &Path) -> FsResult<CString> {
	CString::new(path.as_os_str().as_bytes())
		.map_err(|_| FsError::invalid_argument("path contains a NUL byte"))
}

fn c_field(field: &[libc::c_char]) -> String {
	unsafe { CStr::from_ptr(field.as_ptr()) }.to_string_lossy().into_owned()
}

fn checked_block_product(block_size: u64, blocks: u64, what: &str) -> FsResult<u64> {
	block_size
		.checked_mul(blocks)
		.ok_or_else(|| FsError::Native(format!("{what} calculation would overflow")))
}

// getattrlist volume-attribute selectors, per <sys/attr.h>.
const ATTR_VOL_INFO: u32 = 0x8000_0000;
const ATTR_VOL_NAME: u32 = 0x0000_2000;
const ATTR_VOL_UUID: u32 = 0x0004_0000;

/// Volume name and UUID via `getattrlist`. Best-effort: unnamed volumes and
/// filesystems without UUIDs are normal, so failure never fails the caller.
fn volume_identity(path: &Path) -> (Option<String>, Option<String>) {
	let Ok(c_path) = c_path(path) else { return (None, None) };
	let mut request = libc::attrlist {
		bitmapcount: libc::ATTR_BIT_MAP_COUNT,
		reserved: 0,
		commonattr: 0,
		volattr: ATTR_VOL_INFO | ATTR_VOL_NAME | ATTR_VOL_UUID,
		dirattr: 0,
		fileattr: 0,
		forkattr: 0,
	};
	let mut buf = [0u8; 576];
	let rc = unsafe {
		libc::getattrlist(
			c_path.as_ptr(),
			&mut request as *mut libc::attrlist as *mut libc::c_void,
			buf.as_mut_ptr() as *mut libc::c_void,
			buf.len(),
			0,
		)
	};
	if rc != 0 {
		return (None, None);
	}
	// Buffer layout: u32 total length, an attrreference for the name, the raw
	// uuid bytes, then the name string the reference points at.
	let name = attr_string(&buf, 4);
	let uuid = buf.get(12..28).and_then(format_uuid);
	(name, uuid)
}

fn attr_string(buf: &[u8], at: usize) -> Option<String> {
	let offset = i32::from_ne_bytes(buf.get(at..at + 4)?.try_into().ok()?);
	let length = u32::from_ne_bytes(buf.get(at + 4..at + 8)?.try_into().ok()?) as usize;
	// The data offset is relative to the attrreference itself.
	let start = at.checked_add_signed(offset as isize)?;
	let bytes = buf.get(start..start.checked_add(length)?)?;
	let nul = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
	let text = String::from_utf8_lossy(&bytes[..nul]).into_owned();
	(!text.is_empty()).then_some(text)
}

/// Canonical 8-4-4-4-12 uppercase form; the all-zero uuid means "none".
fn format_uuid(bytes: &[u8]) -> Option<String> {
	if bytes.len() != 16 || bytes.iter().all(|&b| b == 0) {
		return None;
	}
	let hex: Vec<String> = bytes.iter().map(|b| format!("{b:02X}")).collect();
	Some(format!(
		"{}-{}-{}-{}-{}",
		hex[0..4].concat(),
		hex[4..6].concat(),
		hex[6..8].concat(),
		hex[8..10].concat(),
		hex[10..16].concat(),
	))
}

fn statfs_for(path: &Path) -> FsResult<libc::statfs> {
	let c_path = c_path(path)?;
	let mut fs: libc::statfs = unsafe { std::mem::zeroed() };
	if unsafe { libc::statfs(c_path.as_ptr(), &mut fs) } != 0 {
		return Err(FsError::not_accessible(
			"statfs",
			path.display().to_string(),
			std::io::Error::last_os_error(),
		));
	}
	Ok(fs)
}

impl NativeVolumes for MacosVolumes {
	fn list_mount_points(&self) -> FsResult<Vec<RawMountPoint>> {
		let mut mntbuf: *mut libc::statfs = std::ptr::null_mut();
		let count = unsafe { libc::getmntinfo(&mut mntbuf, libc::MNT_NOWAIT) };
		if count <= 0 {
			return Err(FsError::not_accessible(
				"getmntinfo",
				"<mount list>",
				std::io::Error::last_os_error(),
			));
		}
		let mounts = unsafe { std::slice::from_raw_parts(mntbuf, count as usize) };
		Ok(mounts
			.iter()
			.map(|fs| RawMountPoint {
				mount_point: c_field(&fs.f_mntonname),
				fstype: Some(c_field(&fs.f_fstypename)),
				is_system_volume: None,
			})
			.collect())
	}

	fn volume_stats(
		&self,
		mount_point: &str,
		device_hint: Option<&str>,
		_timeout_ms: u64,
	) -> FsResult<RawVolumeStats> {
		let path = Path::new(mount_point);
		let fs = statfs_for(path)?;

		let block_size = fs.f_bsize as u64;
		let total_bytes = checked_block_product(block_size, fs.f_blocks, "total size")?;
		let available_bytes = checked_block_product(block_size, fs.f_bavail, "available space")?;
		let used_bytes = checked_block_product(
			block_size,
			fs.f_blocks.saturating_sub(fs.f_bfree),
			"used space",
		)?;

		let mount_from = {
			let from = c_field(&fs.f_mntfromname);
			if from.is_empty() { device_hint.map(|d| d.to_string()) } else { Some(from) }
		};

		let (label, uuid) = volume_identity(path);
		Ok(RawVolumeStats {
			label,
			uuid,
			mount_from,
			fstype: Some(c_field(&fs.f_fstypename)),
			total_bytes,
			used_bytes,
			available_bytes,
			remote: Some(fs.f_flags & libc::MNT_LOCAL as u32 == 0),
			status: Some(HealthStatus::Healthy),
			..Default::default()
		})
	}

	fn flag_hidden(&self, path: &Path) -> FsResult<bool> {
		let c_path = c_path(path)?;
		let mut st: libc::stat = unsafe { std::mem::zeroed() };
		if unsafe { libc::lstat(c_path.as_ptr(), &mut st) } != 0 {
			return Err(FsError::not_accessible(
				"lstat",
				path.display().to_string(),
				std::io::Error::last_os_error(),
			));
		}
		Ok(st.st_flags & libc::UF_HIDDEN as u32 != 0)
	}

	fn set_flag_hidden(&self, path: &Path, hidden: bool) -> FsResult<()> {
		let c_path = c_path(path)?;
		let mut st: libc::stat = unsafe { std::mem::zeroed() };
		if unsafe { libc::lstat(c_path.as_ptr(), &mut st) } != 0 {
			return Err(FsError::not_accessible(
				"lstat",
				path.display().to_string(),
				std::io::Error::last_os_error(),
			));
		}
		let flags = if hidden {
			st.st_flags | libc::UF_HIDDEN as u32
		} else {
			st.st_flags & !(libc::UF_HIDDEN as u32)
		};
		if unsafe { libc::chflags(c_path.as_ptr(), flags as _) } != 0 {
			return Err(FsError::not_accessible(
				"chflags",
				path.display().to_string(),
				std::io::Error::last_os_error(),
			));
		}
		Ok(())
	}

	fn hide_support(&self) -> HideSupport {
		HideSupport { dot_prefix: true, system_flag: true }
	}
}
