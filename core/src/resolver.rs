//! Mount point resolution: enumerate, supplement, classify, deduplicate,
//! sort, and health-probe — bounded in both time and concurrency.

use crate::concurrency::map_concurrent;
use crate::error::{FsError, FsResult};
use crate::fstype::VolumeClassifier;
use crate::mounts;
use crate::native::{self, RawMountPoint};
use crate::options::Options;
use crate::timeout::with_timeout;
use crate::types::{HealthStatus, MountPoint};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, trace};

/// Produces the final, deduplicated, sorted list of mount points with health
/// status. Idempotent modulo inherently time-varying fields: the same input
/// state yields the same path set and classification.
pub async fn resolve_mount_points(options: &Options) -> FsResult<Vec<MountPoint>> {
	options.validate()?;
	let classifier = VolumeClassifier::new(options)?;
	let native = native::handle()?;
	let started = Instant::now();

	// Where native calls are not themselves deadline-respecting, the guard
	// here is the only enforcement.
	let raw = if native.enforces_timeouts() {
		native::list_mount_points().await?
	} else {
		with_timeout(
			"resolve_mount_points",
			options.timeout_ms,
			native::list_mount_points(),
		)
		.await?
	};
	trace!(count = raw.len(), "native enumeration complete");

	// Compact away blank mount-point fields before anything else keys on them.
	let mut entries: Vec<RawMountPoint> =
		raw.into_iter().filter(|e| !e.mount_point.trim().is_empty()).collect();

	// Where the native layer is not authoritative for filesystem types, the
	// mount table fills the gaps. Its failure merely degrades to native-only
	// data.
	if !native.trusts_system_classification() {
		match mounts::read_mount_table(&options.mount_table_paths).await {
			Ok(table) => {
				for entry in &mut entries {
					if entry.fstype.is_none() {
						if let Some(found) = mounts::find_entry(&table, &entry.mount_point) {
							entry.fstype = Some(found.fstype.clone());
						}
					}
				}
			}
			Err(e) => debug!(error = %e, "mount table unavailable, using native data only"),
		}
	}

	let mut points: Vec<MountPoint> = entries
		.into_iter()
		.map(|entry| {
			let heuristic = classifier.is_system_volume(&entry.mount_point, entry.fstype.as_deref());
			// Trust asymmetry, intentional and platform-specific: where native
			// classification is a real signal it is kept and the heuristic only
			// fills gaps; elsewhere the heuristic unconditionally wins.
			let is_system_volume = if native.trusts_system_classification() {
				Some(entry.is_system_volume.unwrap_or(heuristic))
			} else {
				Some(heuristic)
			};
			MountPoint {
				mount_point: entry.mount_point,
				fstype: entry.fstype,
				status: None,
				is_system_volume,
				error: None,
			}
		})
		.collect();

	if !options.include_system_volumes {
		points.retain(|p| !p.is_system_volume.unwrap_or(false));
	}

	// Deduplicate by normalized path, last occurrence wins.
	let mut by_path: HashMap<String, MountPoint> = HashMap::with_capacity(points.len());
	for point in points {
		by_path.insert(dedup_key(&point.mount_point), point);
	}
	let mut points: Vec<MountPoint> = by_path.into_values().collect();
	points.sort_by(|a, b| sort_key(&a.mount_point).cmp(&sort_key(&b.mount_point)));

	// Probe each survivor's readability within the remaining budget. A slow
	// entry must not block its siblings, so probes share a bounded window.
	let budget = remaining_budget(options.timeout_ms, started);
	let probed = map_concurrent(points, options.max_concurrency, |mut point| async move {
		let (status, error) = probe_health(&point.mount_point, budget).await;
		point.status = Some(status);
		point.error = error;
		Ok::<_, FsError>(point)
	})
	.await?;

	// The probe maps its own failures into the entry, so every slot is Ok.
	Ok(probed.into_iter().filter_map(|r| r.ok()).collect())
}

fn remaining_budget(timeout_ms: u64, started: Instant) -> u64 {
	if timeout_ms == 0 {
		return 0;
	}
	timeout_ms
		.saturating_sub(started.elapsed().as_millis() as u64)
		.max(1)
}

fn dedup_key(path: &str) -> String {
	let normalized = path.replace('\\', "/");
	let trimmed = if normalized.len() > 1 {
		normalized.trim_end_matches('/')
	} else {
		&normalized
	};
	if cfg!(windows) {
		trimmed.to_lowercase()
	} else {
		trimmed.to_string()
	}
}

/// Deterministic, diffable ordering: case-insensitive comparison with the
/// raw string as tiebreak.
fn sort_key(path: &str) -> (String, String) {
	(path.to_lowercase(), path.to_string())
}

/// Distinguishes a mount point that is merely slow from one that is truly
/// broken: list the directory under the remaining deadline and map the
/// failure shape onto a health status.
async fn probe_health(path: &str, timeout_ms: u64) -> (HealthStatus, Option<String>) {
	let label = format!("probe {path}");
	let owned = path.to_string();
	let outcome = with_timeout(&label, timeout_ms, async move {
		let mut dir = tokio::fs::read_dir(&owned)
			.await
			.map_err(|e| FsError::not_accessible("readdir", owned.clone(), e))?;
		// Pull one entry so network mounts do real I/O, not just an open.
		dir.next_entry()
			.await
			.map_err(|e| FsError::not_accessible("readdir", owned.clone(), e))?;
		Ok(())
	})
	.await;

	match outcome {
		Ok(()) => (HealthStatus::Healthy, None),
		Err(e @ FsError::Timeout { .. }) => (HealthStatus::Timeout, Some(e.to_string())),
		Err(e @ FsError::NotAccessible { code, .. }) => {
			let status = match code {
				Some(code) if is_disconnected_errno(code) => HealthStatus::Disconnected,
				_ => HealthStatus::Inaccessible,
			};
			(status, Some(e.to_string()))
		}
		Err(e) => (HealthStatus::Unknown, Some(e.to_string())),
	}
}

/// Errno values that mean "the transport under this mount is gone" rather
/// than "you may not look at it".
fn is_disconnected_errno(code: i32) -> bool {
	#[cfg(unix)]
	{
		matches!(
			code,
			libc::ENOTCONN | libc::ENETDOWN | libc::ENETUNREACH | libc::EHOSTDOWN | libc::EHOSTUNREACH
		)
	}
	#[cfg(windows)]
	{
		// ERROR_NOT_READY, ERROR_BAD_NETPATH, ERROR_UNEXP_NET_ERR, ERROR_NETNAME_DELETED
		matches!(code, 21 | 53 | 59 | 64)
	}
	#[cfg(not(any(unix, windows)))]
	{
		let _ = code;
		false
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn dedup_key_normalizes_separators_and_trailing_slash() {
		assert_eq!(dedup_key("/mnt/data/"), "/mnt/data");
		assert_eq!(dedup_key("/"), "/");
		assert_eq!(dedup_key("C:\\"), if cfg!(windows) { "c:" } else { "C:" });
	}

	#[test]
	fn sort_is_case_insensitive_and_deterministic() {
		let mut paths = vec!["/Volumes/media", "/boot", "/Volumes/Backup", "/home"];
		paths.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
		assert_eq!(paths, vec!["/boot", "/home", "/Volumes/Backup", "/Volumes/media"]);
	}

	#[tokio::test]
	async fn probe_reports_missing_directory_as_inaccessible() {
		let (status, error) = probe_health("/definitely/not/a/mount", 1_000).await;
		assert_eq!(status, HealthStatus::Inaccessible);
		assert!(error.unwrap().contains("readdir"));
	}

	#[tokio::test]
	async fn probe_reports_readable_directory_as_healthy() {
		let dir = tempfile::tempdir().unwrap();
		let (status, error) = probe_health(&dir.path().to_string_lossy(), 1_000).await;
		assert_eq!(status, HealthStatus::Healthy);
		assert!(error.is_none());
	}

	#[cfg(target_os = "linux")]
	#[tokio::test]
	async fn resolver_is_idempotent_for_stable_fields() {
		let options = Options { include_system_volumes: true, ..Default::default() };
		let first = resolve_mount_points(&options).await.unwrap();
		let second = resolve_mount_points(&options).await.unwrap();

		let stable = |points: &[MountPoint]| -> Vec<(String, Option<bool>)> {
			points
				.iter()
				.map(|p| (p.mount_point.clone(), p.is_system_volume))
				.collect()
		};
		assert_eq!(stable(&first), stable(&second));
		assert!(first.iter().any(|p| p.mount_point == "/"));
	}

	#[cfg(target_os = "linux")]
	#[tokio::test]
	async fn system_volumes_are_filtered_unless_opted_in() {
		let all = resolve_mount_points(&Options {
			include_system_volumes: true,
			..Default::default()
		})
		.await
		.unwrap();
		let user_only = resolve_mount_points(&Options::default()).await.unwrap();

		assert!(user_only.len() <= all.len());
		assert!(user_only.iter().all(|p| !p.is_system_volume.unwrap_or(false)));
		// /proc is always present and always a system volume.
		assert!(all.iter().any(|p| p.mount_point == "/proc"));
		assert!(user_only.iter().all(|p| p.mount_point != "/proc"));
	}

	#[cfg(target_os = "linux")]
	#[tokio::test]
	async fn output_is_sorted_and_deduplicated() {
		let options = Options { include_system_volumes: true, ..Default::default() };
		let points = resolve_mount_points(&options).await.unwrap();

		let keys: Vec<String> = points.iter().map(|p| dedup_key(&p.mount_point)).collect();
		let mut deduped = keys.clone();
		deduped.dedup();
		assert_eq!(keys.len(), deduped.len(), "duplicate mount points survived");

		let mut by_sort = points.clone();
		by_sort.sort_by(|a, b| sort_key(&a.mount_point).cmp(&sort_key(&b.mount_point)));
		assert_eq!(points, by_sort, "output not sorted");
	}
}
