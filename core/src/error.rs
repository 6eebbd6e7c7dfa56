//! Error taxonomy for volume resolution.
//!
//! Every public entry point fails with exactly one [`FsError`] carrying
//! enough structured context (label, cause chain, syscall-style fields) to
//! diagnose without a debugger.

use thiserror::Error;

pub type FsResult<T> = Result<T, FsError>;

#[derive(Error, Debug)]
pub enum FsError {
	/// Blank, zero, or otherwise malformed caller input. Raised synchronously,
	/// before any I/O starts, and never retried.
	#[error("invalid argument: {0}")]
	InvalidArgument(String),

	/// A guarded operation exceeded its deadline. The abandoned operation's
	/// eventual outcome is discarded, never double-reported.
	#[error("{label} timed out after {elapsed_ms}ms")]
	Timeout { label: String, elapsed_ms: u64 },

	/// Wrapped underlying I/O failure, preserving the original cause plus
	/// syscall-style fields for programmatic matching.
	#[error("{syscall} failed for {path}: {source}")]
	NotAccessible {
		path: String,
		syscall: &'static str,
		code: Option<i32>,
		#[source]
		source: std::io::Error,
	},

	/// The requested method does not exist on this platform. Distinct from
	/// `NotAccessible`: retrying elsewhere will not help.
	#[error("unsupported on this platform: {0}")]
	Unsupported(String),

	/// Failure inside the native capability boundary (enumeration, statistics,
	/// hidden-flag access).
	#[error("native volume query failed: {0}")]
	Native(String),

	/// A detached worker task panicked or was cancelled out from under us.
	#[error("background task failed: {0}")]
	TaskJoin(String),
}

impl FsError {
	pub fn invalid_argument(msg: impl Into<String>) -> Self {
		Self::InvalidArgument(msg.into())
	}

	pub fn not_accessible(
		syscall: &'static str,
		path: impl Into<String>,
		source: std::io::Error,
	) -> Self {
		Self::NotAccessible {
			path: path.into(),
			syscall,
			code: source.raw_os_error(),
			source,
		}
	}

	/// True for deadline failures, used by callers that map timeouts to a
	/// health status rather than propagating them.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Timeout { .. })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn not_accessible_preserves_os_code() {
		let io = std::io::Error::from_raw_os_error(13);
		let err = FsError::not_accessible("opendir", "/root/secret", io);
		match &err {
			FsError::NotAccessible { code, syscall, path, .. } => {
				assert_eq!(*code, Some(13));
				assert_eq!(*syscall, "opendir");
				assert_eq!(path, "/root/secret");
			}
			other => panic!("unexpected variant: {other:?}"),
		}
		assert!(err.to_string().contains("/root/secret"));
	}

	#[test]
	fn timeout_message_carries_label_and_budget() {
		let err = FsError::Timeout { label: "volume_stats".into(), elapsed_ms: 250 };
		assert!(err.is_timeout());
		assert_eq!(err.to_string(), "volume_stats timed out after 250ms");
	}
}
