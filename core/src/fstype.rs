//! Filesystem-type normalization and volume classification.
//!
//! Platform layers spell the same backend many ways (`nfs4`, `fuse.sshfs`,
//! `smbfs:`); everything upstream works on the canonical spelling produced
//! here.

use crate::error::FsResult;
use crate::glob::{self, PathMatcher};
use crate::options::Options;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::Arc;

/// Canonical names of network-backed filesystem types.
pub static REMOTE_FS_TYPES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
	[
		"9p", "afp", "afs", "beegfs", "ceph", "cifs", "curlftpfs", "davfs", "ftp", "ftpfs",
		"fuse.cephfs", "fuse.sshfs", "gdrive", "glusterfs", "lustre", "ncpfs", "nfs", "prl_fs",
		"smb", "smbfs", "sshfs", "vboxsf", "vmhgfs", "webdav",
	]
	.into_iter()
	.collect()
});

/// Lower-cases, strips a trailing protocol colon, and collapses known
/// spelling variants to one canonical name.
pub fn normalize_fs_type(raw: &str) -> String {
	let mut fstype = raw.trim().to_lowercase();
	if let Some(stripped) = fstype.strip_suffix(':') {
		fstype = stripped.to_string();
	}
	match fstype.as_str() {
		// Numbered NFS protocol versions are all just NFS.
		"nfs2" | "nfs3" | "nfs4" => "nfs".to_string(),
		// FUSE-prefixed and suffixed spellings of the same backend.
		"fuse.sshfs" | "sshfs.fuse" => "sshfs".to_string(),
		"fuse.cephfs" | "cephfs.fuse" | "cephfs" => "ceph".to_string(),
		"fuse.curlftpfs" | "curlftpfs.fuse" => "curlftpfs".to_string(),
		_ => fstype,
	}
}

/// Tests `fstype` against the canonical remote set: exact match, or a
/// `name.`-prefixed variant (`nfs.v4` matches `nfs`; `nfsd` does not — the
/// prefix match requires the separator).
pub fn is_remote_fs_type(fstype: &str, known_remote_types: &HashSet<&str>) -> bool {
	let normalized = normalize_fs_type(fstype);
	if normalized.is_empty() {
		return false;
	}
	known_remote_types.iter().any(|known| {
		normalized == *known || normalized.starts_with(&format!("{known}."))
	})
}

/// Convenience form over the default remote set.
pub fn is_remote_fstype(fstype: &str) -> bool {
	is_remote_fs_type(fstype, &REMOTE_FS_TYPES)
}

/// System-vs-user classifier, precompiled from one [`Options`] value so the
/// resolver can test entries in a tight loop.
#[derive(Debug, Clone)]
pub struct VolumeClassifier {
	system_fs_types: HashSet<String>,
	system_paths: Arc<PathMatcher>,
}

impl VolumeClassifier {
	pub fn new(options: &Options) -> FsResult<Self> {
		Ok(Self {
			system_fs_types: options
				.system_fs_types
				.iter()
				.map(|t| normalize_fs_type(t))
				.collect(),
			system_paths: glob::compile(&options.system_path_patterns)?,
		})
	}

	/// True when the filesystem type is in the configured system set, or the
	/// path matches the configured system-path globs. On Windows an exact
	/// match against the system drive overrides the heuristics
	/// unconditionally.
	pub fn is_system_volume(&self, path: &str, fstype: Option<&str>) -> bool {
		#[cfg(windows)]
		if is_system_drive_root(path) {
			return true;
		}
		if let Some(fstype) = fstype {
			if self.system_fs_types.contains(&normalize_fs_type(fstype)) {
				return true;
			}
		}
		self.system_paths.is_match(path)
	}
}

/// Exact match against the drive Windows booted from (`%SystemDrive%`,
/// typically `C:`), with or without the trailing separator.
#[cfg(windows)]
pub fn is_system_drive_root(path: &str) -> bool {
	let drive = std::env::var("SystemDrive").unwrap_or_else(|_| "C:".to_string());
	let normalized = path.replace('/', "\\");
	let trimmed = normalized.trim_end_matches('\\');
	trimmed.eq_ignore_ascii_case(drive.trim_end_matches('\\'))
}
