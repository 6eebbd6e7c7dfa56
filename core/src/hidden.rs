//! Hidden-attribute controller.
//!
//! Two independent, partially platform-exclusive hiding mechanisms exist:
//! the POSIX leading-dot naming convention and an explicit hidden bit in
//! filesystem metadata. This module reconciles them into get/set operations
//! with platform-aware fallback. Dispatch over the requested method is an
//! explicit match in one fixed order, never implicit fallthrough.

use crate::error::{FsError, FsResult};
use crate::native;
use crate::types::{HiddenMetadata, HideMethod, HideSupport, SetHiddenResult};
use std::path::{Path, PathBuf};

/// Which hiding mechanisms exist on this platform.
pub fn hide_support() -> FsResult<HideSupport> {
	Ok(native::handle()?.hide_support())
}

/// Pure string check: the basename starts with `.` and is not `.`/`..`.
/// Platform support is deliberately not consulted here; callers that need
/// platform semantics go through [`is_hidden`].
pub fn is_dot_prefix_hidden(path: &Path) -> bool {
	match path.file_name().and_then(|n| n.to_str()) {
		Some(name) => name.starts_with('.') && name != "." && name != "..",
		None => false,
	}
}

/// Queries the platform hidden flag, short-circuited to `false` without a
/// native round-trip when the target cannot possibly exist.
async fn flag_hidden(path: &Path, support: HideSupport) -> FsResult<bool> {
	if !support.system_flag {
		return Ok(false);
	}
	if tokio::fs::symlink_metadata(path).await.is_err() {
		return Ok(false);
	}
	native::flag_hidden(path.to_path_buf()).await
}

/// Boolean OR of the dot-prefix test and the system-flag query. The
/// dot-prefix branch is skipped entirely on platforms where it has no
/// meaning, so a dot-prefixed name is never reported hidden there.
pub async fn is_hidden(path: &Path) -> FsResult<bool> {
	validate_target(path)?;
	let support = native::handle()?.hide_support();
	if support.dot_prefix && is_dot_prefix_hidden(path) {
		return Ok(true);
	}
	flag_hidden(path, support).await
}

/// Walks from the target up to (but not including) the filesystem root,
/// returning true on the first hidden ancestor, the start path included.
pub async fn is_hidden_recursive(path: &Path) -> FsResult<bool> {
	validate_target(path)?;
	for ancestor in path.ancestors() {
		if ancestor.parent().is_none() {
			break;
		}
		if is_hidden(ancestor).await? {
			return Ok(true);
		}
	}
	Ok(false)
}

/// Both hidden booleans plus the capability record, so callers can tell
/// "not hidden" apart from "cannot be hidden this way".
pub async fn get_hidden_metadata(path: &Path) -> FsResult<HiddenMetadata> {
	validate_target(path)?;
	let support = native::handle()?.hide_support();
	let dot_prefix = support.dot_prefix && is_dot_prefix_hidden(path);
	let system_flag = flag_hidden(path, support).await?;
	Ok(HiddenMetadata {
		hidden: dot_prefix || system_flag,
		dot_prefix,
		system_flag,
		supported: support,
	})
}

/// Hides or reveals `path` using the selected method. Requesting a method
/// the platform lacks is a hard failure, never a silent no-op. Dot-prefix
/// hiding renames the target, so the returned path may differ.
pub async fn set_hidden(
	path: &Path,
	hidden: bool,
	method: HideMethod,
) -> FsResult<SetHiddenResult> {
	validate_target(path)?;
	tokio::fs::symlink_metadata(path)
		.await
		.map_err(|e| FsError::not_accessible("stat", path.display().to_string(), e))?;

	#[cfg(windows)]
	if crate::fstype::is_system_drive_root(&path.to_string_lossy()) {
		return Err(FsError::invalid_argument(
			"the root of the system drive can never be hidden",
		));
	}

	let support = native::handle()?.hide_support();
	let (use_dot, use_flag) = match method {
		HideMethod::DotPrefix if !support.dot_prefix => {
			return Err(FsError::Unsupported(
				"dot-prefix hiding has no meaning on this platform".to_string(),
			));
		}
		HideMethod::SystemFlag if !support.system_flag => {
			return Err(FsError::Unsupported(
				"this platform has no hidden flag".to_string(),
			));
		}
		HideMethod::DotPrefix => (true, false),
		HideMethod::SystemFlag => (false, true),
		HideMethod::All => {
			if !support.any() {
				return Err(FsError::Unsupported(
					"no hiding method is available on this platform".to_string(),
				));
			}
			(support.dot_prefix, support.system_flag)
		}
		HideMethod::Auto => {
			if support.dot_prefix {
				(true, false)
			} else if support.system_flag {
				(false, true)
			} else {
				return Err(FsError::Unsupported(
					"no hiding method is available on this platform".to_string(),
				));
			}
		}
	};

	let mut final_path = path.to_path_buf();
	let mut actions = HideSupport::default();

	if use_dot {
		final_path = apply_dot_prefix(path, hidden).await?;
		actions.dot_prefix = true;
	}
	if use_flag {
		native::set_flag_hidden(final_path.clone(), hidden).await?;
		actions.system_flag = true;
	}

	Ok(SetHiddenResult { path: final_path, actions })
}

/// Renames the target to add or strip exactly one leading dot. Already being
/// in the desired state is not an error; the rename is simply skipped, so
/// hiding then unhiding restores the original name exactly.
async fn apply_dot_prefix(path: &Path, hidden: bool) -> FsResult<PathBuf> {
	let name = path
		.file_name()
		.and_then(|n| n.to_str())
		.ok_or_else(|| FsError::invalid_argument("path has no basename to rename"))?;

	let renamed = if hidden {
		(!name.starts_with('.')).then(|| format!(".{name}"))
	} else {
		name.strip_prefix('.').filter(|rest| !rest.is_empty()).map(|rest| rest.to_string())
	};

	match renamed {
		Some(new_name) => {
			let target = path.parent().map_or_else(
				|| PathBuf::from(&new_name),
				|parent| parent.join(&new_name),
			);
			tokio::fs::rename(path, &target)
				.await
				.map_err(|e| FsError::not_accessible("rename", path.display().to_string(), e))?;
			Ok(target)
		}
		None => Ok(path.to_path_buf()),
	}
}

fn validate_target(path: &Path) -> FsResult<()> {
	if path.as_os_str().is_empty() {
		return Err(FsError::invalid_argument("path must not be blank"));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn dot_prefix_check_is_a_pure_string_test() {
		assert!(is_dot_prefix_hidden(Path::new("/tmp/.config")));
		assert!(is_dot_prefix_hidden(Path::new(".bashrc")));
		assert!(!is_dot_prefix_hidden(Path::new("/tmp/visible")));
		assert!(!is_dot_prefix_hidden(Path::new("/tmp/.")));
		assert!(!is_dot_prefix_hidden(Path::new("..")));
		assert!(!is_dot_prefix_hidden(Path::new("/")));
	}

	#[tokio::test]
	async fn blank_path_is_rejected_before_io() {
		assert!(matches!(
			is_hidden(Path::new("")).await,
			Err(FsError::InvalidArgument(_))
		));
		assert!(matches!(
			set_hidden(Path::new(""), true, HideMethod::Auto).await,
			Err(FsError::InvalidArgument(_))
		));
	}

	#[cfg(target_os = "linux")]
	mod linux_behavior {
		use super::*;
		use pretty_assertions::assert_eq;

		#[tokio::test]
		async fn system_flag_is_a_hard_unsupported_failure() {
			let dir = tempfile::tempdir().unwrap();
			let file = dir.path().join("report.txt");
			tokio::fs::write(&file, b"x").await.unwrap();

			let result = set_hidden(&file, true, HideMethod::SystemFlag).await;
			assert!(matches!(result, Err(FsError::Unsupported(_))));
			// Hard failure, not a silent no-op: the file is untouched.
			assert!(file.exists());
		}

		#[tokio::test]
		async fn auto_behaves_like_explicit_dot_prefix() {
			let dir = tempfile::tempdir().unwrap();
			for method in [HideMethod::Auto, HideMethod::DotPrefix] {
				let file = dir.path().join("notes.txt");
				tokio::fs::write(&file, b"x").await.unwrap();

				let hidden = set_hidden(&file, true, method).await.unwrap();
				assert_eq!(hidden.path, dir.path().join(".notes.txt"));
				assert!(hidden.actions.dot_prefix);
				assert!(!hidden.actions.system_flag);
				assert!(is_hidden(&hidden.path).await.unwrap());

				let restored = set_hidden(&hidden.path, false, method).await.unwrap();
				assert_eq!(restored.path, file);
				assert!(!is_hidden(&restored.path).await.unwrap());
			}
		}

		#[tokio::test]
		async fn hiding_an_already_hidden_name_is_idempotent() {
			let dir = tempfile::tempdir().unwrap();
			let file = dir.path().join(".already");
			tokio::fs::write(&file, b"x").await.unwrap();

			let result = set_hidden(&file, true, HideMethod::DotPrefix).await.unwrap();
			assert_eq!(result.path, file);
		}

		#[tokio::test]
		async fn recursive_check_sees_hidden_ancestors() {
			// The default tempdir prefix is `.tmp`, which is itself a hidden
			// ancestor; use a visible prefix so the walk is what is tested.
			let dir = tempfile::Builder::new().prefix("fsmeta-").tempdir().unwrap();
			let nested = dir.path().join(".vault/inner");
			tokio::fs::create_dir_all(&nested).await.unwrap();
			let file = nested.join("data.bin");
			tokio::fs::write(&file, b"x").await.unwrap();

			assert!(!is_hidden(&file).await.unwrap());
			assert!(is_hidden_recursive(&file).await.unwrap());
			assert!(!is_hidden_recursive(dir.path()).await.unwrap());
		}

		#[tokio::test]
		async fn metadata_reports_capability_alongside_state() {
			let dir = tempfile::tempdir().unwrap();
			let file = dir.path().join(".ghost");
			tokio::fs::write(&file, b"x").await.unwrap();

			let meta = get_hidden_metadata(&file).await.unwrap();
			assert!(meta.hidden);
			assert!(meta.dot_prefix);
			assert!(!meta.system_flag);
			assert!(meta.supported.dot_prefix);
			assert!(!meta.supported.system_flag);
		}
	}
}
