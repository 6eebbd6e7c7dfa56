//! Per-volume metadata aggregation: native statistics, mount-table info,
//! remote classification, and identifier normalization merged into one
//! record.

use crate::concurrency::map_concurrent;
use crate::error::{FsError, FsResult};
use crate::fstype::{self, VolumeClassifier};
use crate::mounts::{self, MountEntry};
use crate::native;
use crate::options::Options;
use crate::remote::extract_remote_info;
use crate::resolver::resolve_mount_points;
use crate::timeout::with_timeout;
use crate::types::{RemoteInfo, VolumeMetadata};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Full metadata for the volume mounted at `mount_point`, timeout-guarded
/// where the native layer does not enforce deadlines itself.
pub async fn volume_metadata(mount_point: &str, options: &Options) -> FsResult<VolumeMetadata> {
	if mount_point.trim().is_empty() {
		return Err(FsError::invalid_argument("mount_point must not be blank"));
	}
	options.validate()?;
	let native = native::handle()?;
	let gather = gather(mount_point, options);
	if native.enforces_timeouts() {
		gather.await
	} else {
		let label = format!("volume_metadata {mount_point}");
		with_timeout(&label, options.timeout_ms, gather).await
	}
}

/// Metadata for every resolved mount point, per-item failures captured in
/// their own slots without aborting siblings.
pub async fn all_volume_metadata(
	options: &Options,
) -> FsResult<Vec<FsResult<VolumeMetadata>>> {
	let points = resolve_mount_points(options).await?;
	let paths: Vec<String> = points.into_iter().map(|p| p.mount_point).collect();
	map_concurrent(paths, options.max_concurrency, |path| async move {
		volume_metadata(&path, options).await
	})
	.await
}

async fn gather(mount_point: &str, options: &Options) -> FsResult<VolumeMetadata> {
	if options.verify_directory {
		let meta = tokio::fs::metadata(mount_point).await.map_err(|e| {
			FsError::not_accessible("stat", mount_point.to_string(), e)
		})?;
		if !meta.is_dir() {
			return Err(FsError::not_accessible(
				"stat",
				mount_point.to_string(),
				std::io::Error::new(std::io::ErrorKind::Other, "not a directory"),
			));
		}
	}

	// The mount table is a supplementary source: its failure degrades the
	// result, never the call.
	let table_entry: Option<MountEntry> = if cfg!(target_os = "linux") {
		match mounts::read_mount_table(&options.mount_table_paths).await {
			Ok(entries) => mounts::find_entry(&entries, mount_point).cloned(),
			Err(e) => {
				debug!(error = %e, "mount table unavailable for metadata");
				None
			}
		}
	} else {
		None
	};

	let device_hint = table_entry.as_ref().map(|e| e.device.clone());
	let stats = native::volume_stats(
		mount_point.to_string(),
		device_hint.clone(),
		options.timeout_ms,
	)
	.await?;

	// Remote classification precedence: mount-table-derived info first, then
	// whatever URI the native layer supplied, then the raw mount source, then
	// (on Windows) the query path itself as a UNC candidate.
	let remote_info: Option<RemoteInfo> = table_entry
		.as_ref()
		.and_then(|e| e.remote.clone())
		.filter(RemoteInfo::is_remote_spec)
		.or_else(|| {
			stats
				.uri
				.as_deref()
				.and_then(extract_remote_info)
				.filter(RemoteInfo::is_remote_spec)
		})
		.or_else(|| {
			stats
				.mount_from
				.as_deref()
				.or(device_hint.as_deref())
				.and_then(extract_remote_info)
				.filter(RemoteInfo::is_remote_spec)
		})
		.or_else(|| {
			cfg!(windows)
				.then(|| extract_remote_info(mount_point))
				.flatten()
				.filter(RemoteInfo::is_remote_spec)
		});

	// Merge: the mount table speaks first, native statistics override where
	// non-blank, remote classification fills its own fields.
	let fstype = pick(stats.fstype.clone(), table_entry.as_ref().map(|e| e.fstype.clone()));
	let mount_from = pick(stats.mount_from.clone(), device_hint);
	let uri = pick(
		stats.uri.clone(),
		remote_info.as_ref().and_then(|r| r.uri.clone()),
	);

	let remote = remote_info.is_some()
		|| stats.remote.unwrap_or(false)
		|| fstype.as_deref().is_some_and(fstype::is_remote_fstype);

	// Same classification rule as the resolver; the windows system-drive
	// override lives inside the classifier.
	let classifier = VolumeClassifier::new(options)?;
	let is_system_volume = Some(classifier.is_system_volume(mount_point, fstype.as_deref()));

	let mut metadata = VolumeMetadata {
		mount_point: mount_point.to_string(),
		fstype,
		label: stats.label,
		uuid: stats.uuid,
		mount_from,
		uri,
		status: stats.status,
		is_system_volume,
		total_bytes: stats.total_bytes,
		used_bytes: stats.used_bytes,
		available_bytes: stats.available_bytes,
		remote,
		remote_user: remote_info.as_ref().and_then(|r| r.remote_user.clone()),
		remote_host: remote_info.as_ref().and_then(|r| r.remote_host.clone()),
		remote_share: remote_info.and_then(|r| r.remote_share),
	};

	// Post-processing fixups applied regardless of which source won.
	metadata.uuid = metadata.uuid.as_deref().and_then(normalize_volume_id);
	metadata.remote_share = metadata
		.remote_share
		.map(|share| share.trim_end_matches(['/', '\\']).to_string())
		.filter(|share| !share.is_empty());

	Ok(metadata)
}

/// Later-wins-if-non-blank merge of one field.
fn pick(later: Option<String>, earlier: Option<String>) -> Option<String> {
	later.filter(|v| !v.trim().is_empty()).or(earlier).filter(|v| !v.trim().is_empty())
}

static VOLUME_ID_RUN: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"[A-Za-z0-9][A-Za-z0-9-]{7,}").expect("static pattern"));

/// Strips the wrapping noise platforms add around volume identifiers
/// (`\\?\Volume{...}\`, URI prefixes), keeping only the longest
/// identifier-shaped run: at least 8 alphanumeric-or-hyphen characters, not
/// starting with a hyphen.
pub fn normalize_volume_id(raw: &str) -> Option<String> {
	VOLUME_ID_RUN
		.find_iter(raw)
		.max_by_key(|m| m.len())
		.map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn volume_id_normalization_strips_wrapping_noise() {
		assert_eq!(
			normalize_volume_id(r"\\?\Volume{5ca45172-0e85-42a6-b8a7-7ff9c0d2c333}\").as_deref(),
			Some("5ca45172-0e85-42a6-b8a7-7ff9c0d2c333")
		);
		assert_eq!(
			normalize_volume_id("uuid:1A2B3C4D-0000").as_deref(),
			Some("1A2B3C4D-0000")
		);
		assert_eq!(normalize_volume_id("E4F9-1B2C1234").as_deref(), Some("E4F9-1B2C1234"));
		// Too short, or nothing identifier-shaped at all.
		assert_eq!(normalize_volume_id("abc-123"), None);
		assert_eq!(normalize_volume_id("{-}"), None);
	}

	#[test]
	fn pick_prefers_later_only_when_non_blank() {
		assert_eq!(
			pick(Some("ext4".into()), Some("vfat".into())).as_deref(),
			Some("ext4")
		);
		assert_eq!(pick(Some("  ".into()), Some("vfat".into())).as_deref(), Some("vfat"));
		assert_eq!(pick(None, Some("vfat".into())).as_deref(), Some("vfat"));
		assert_eq!(pick(None, None), None);
	}

	#[tokio::test]
	async fn blank_mount_point_fails_before_io() {
		let result = volume_metadata("  ", &Options::default()).await;
		assert!(matches!(result, Err(FsError::InvalidArgument(_))));
	}

	#[cfg(target_os = "linux")]
	#[tokio::test]
	async fn root_volume_reports_consistent_sizes() {
		let metadata = volume_metadata("/", &Options::default()).await.unwrap();
		assert_eq!(metadata.mount_point, "/");
		assert!(metadata.total_bytes > 0);
		// Approximate equality: reserved blocks make exact equality untestable.
		assert!(metadata.used_bytes <= metadata.total_bytes);
		assert!(metadata.available_bytes <= metadata.total_bytes);
		assert!(!metadata.remote);
		assert!(metadata.fstype.is_some());
	}

	#[cfg(target_os = "linux")]
	#[tokio::test]
	async fn metadata_classifies_system_volumes() {
		let options = Options::default();
		let metadata = volume_metadata("/proc", &options).await.unwrap();
		assert_eq!(metadata.is_system_volume, Some(true));

		let metadata = volume_metadata("/", &options).await.unwrap();
		assert_eq!(metadata.is_system_volume, Some(false));
	}

	#[cfg(target_os = "linux")]
	#[tokio::test]
	async fn missing_directory_is_wrapped_not_accessible() {
		let options = Options { verify_directory: true, ..Default::default() };
		let result = volume_metadata("/definitely/not/mounted", &options).await;
		match result {
			Err(FsError::NotAccessible { syscall, path, .. }) => {
				assert_eq!(syscall, "stat");
				assert_eq!(path, "/definitely/not/mounted");
			}
			other => panic!("expected NotAccessible, got {other:?}"),
		}
	}
}
