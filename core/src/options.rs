//! Per-call resolution options.
//!
//! There is no process-wide mutable configuration: callers clone
//! [`Options::default`], override any subset, and pass the value explicitly
//! through every call boundary.

use crate::error::{FsError, FsResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Default deadline for a single guarded operation.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Mount-table candidates, tried in order, first-readable-wins. Some are
/// permission-gated or absent inside containers and sandboxes.
pub const MOUNT_TABLE_PATHS: &[&str] = &["/proc/self/mounts", "/proc/mounts", "/etc/mtab"];

/// Glob patterns for paths that serve OS/runtime internals rather than user
/// data: boot partitions, pseudo-filesystems, container-runtime internals,
/// and volume-snapshot directories.
pub const SYSTEM_PATH_PATTERNS: &[&str] = &[
	"/boot",
	"/boot/**",
	"/dev",
	"/dev/**",
	"/proc/**",
	"/run",
	"/run/credentials/**",
	"/run/lock",
	"/run/snapd/**",
	"/run/user/*/doc",
	"/snap/**",
	"/sys/**",
	"/var/lib/docker/**",
	"/var/lib/kubelet/**",
	"/var/snap/**",
	// macOS APFS system containers and firmlink internals
	"/System/Volumes/Hardware",
	"/System/Volumes/Preboot",
	"/System/Volumes/Recovery",
	"/System/Volumes/Update*",
	"/System/Volumes/VM",
	"/System/Volumes/iSCPreboot",
	"/System/Volumes/xarts",
	"/private/var/vm",
	"/.vol/**",
	// Windows per-drive service directories
	"?:/$Recycle.Bin",
	"?:/$Recycle.Bin/**",
	"?:/Recovery",
	"**/System Volume Information",
	// Volume-snapshot directories
	"**/.snapshot",
	"**/.zfs/**",
];

/// Filesystem types that are always system volumes, regardless of path.
pub const SYSTEM_FS_TYPES: &[&str] = &[
	"autofs",
	"binfmt_misc",
	"bpf",
	"cgroup",
	"cgroup2",
	"configfs",
	"debugfs",
	"devpts",
	"devtmpfs",
	"efivarfs",
	"fuse.gvfsd-fuse",
	"fuse.portal",
	"fusectl",
	"hugetlbfs",
	"mqueue",
	"none",
	"nsfs",
	"overlay",
	"proc",
	"pstore",
	"ramfs",
	"securityfs",
	"selinuxfs",
	"squashfs",
	"sysfs",
	"tmpfs",
	"tracefs",
];

/// Immutable per-call configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Options {
	/// Deadline in milliseconds for guarded operations. `0` disables the
	/// deadline entirely.
	pub timeout_ms: u64,
	/// Ceiling on concurrent native calls. Must be positive.
	pub max_concurrency: usize,
	/// Glob patterns marking system volumes by path.
	pub system_path_patterns: Vec<String>,
	/// Filesystem types marking system volumes.
	pub system_fs_types: HashSet<String>,
	/// Mount-table candidates, tried in order (Linux).
	pub mount_table_paths: Vec<PathBuf>,
	/// Keep system volumes in resolver output.
	pub include_system_volumes: bool,
	/// Verify the target resolves to an existing directory before querying
	/// volume metadata.
	pub verify_directory: bool,
}

impl Default for Options {
	fn default() -> Self {
		Self {
			timeout_ms: DEFAULT_TIMEOUT_MS,
			max_concurrency: std::thread::available_parallelism()
				.map(|n| n.get())
				.unwrap_or(4),
			system_path_patterns: SYSTEM_PATH_PATTERNS.iter().map(|s| s.to_string()).collect(),
			system_fs_types: SYSTEM_FS_TYPES.iter().map(|s| s.to_string()).collect(),
			mount_table_paths: MOUNT_TABLE_PATHS.iter().map(PathBuf::from).collect(),
			include_system_volumes: false,
			verify_directory: false,
		}
	}
}

impl Options {
	/// Rejects programmer errors synchronously, before any I/O starts.
	pub fn validate(&self) -> FsResult<()> {
		if self.max_concurrency == 0 {
			return Err(FsError::invalid_argument(
				"max_concurrency must be a positive integer",
			));
		}
		if self.mount_table_paths.iter().any(|p| p.as_os_str().is_empty()) {
			return Err(FsError::invalid_argument(
				"mount_table_paths must not contain blank entries",
			));
		}
		Ok(())
	}
}
