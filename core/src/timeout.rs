//! Cancellable deadline wrapper for fallible, possibly slow operations.

use crate::error::{FsError, FsResult};
use std::future::Future;
use std::time::Duration;

/// Races `operation` against a deadline. `timeout_ms == 0` disables the
/// deadline entirely and passes the operation's outcome through unchanged.
///
/// Exactly one of {operation outcome, timeout} wins. On timeout the operation
/// is dropped here; work already handed to the blocking pool keeps running
/// detached and its late result is discarded, not surfaced twice. The timer
/// is cleared on every exit path.
///
/// Guards nest: the guard with the smaller deadline fires first and its own
/// label is carried in the error.
pub async fn with_timeout<T, F>(label: &str, timeout_ms: u64, operation: F) -> FsResult<T>
where
	F: Future<Output = FsResult<T>>,
{
	if timeout_ms == 0 {
		return operation.await;
	}
	match tokio::time::timeout(Duration::from_millis(timeout_ms), operation).await {
		Ok(outcome) => outcome,
		Err(_) => Err(FsError::Timeout { label: label.to_string(), elapsed_ms: timeout_ms }),
	}
}
