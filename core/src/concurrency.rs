//! Order-preserving, bounded-concurrency batch mapper.

use crate::error::{FsError, FsResult};
use futures::stream::{self, StreamExt};
use std::future::Future;

/// Applies `f` to every item with at most `max_concurrency` operations in
/// flight, collecting per-item success/failure without aborting the batch.
///
/// Output slot `i` always corresponds to input `i` regardless of completion
/// order, and a failing item occupies exactly its own slot — callers need
/// partial results (9 of 10 volumes healthy), not fail-fast. The window is
/// continuously refilled as items settle, never chunked.
pub async fn map_concurrent<T, O, F, Fut>(
	items: Vec<T>,
	max_concurrency: usize,
	f: F,
) -> FsResult<Vec<FsResult<O>>>
where
	F: Fn(T) -> Fut,
	Fut: Future<Output = FsResult<O>>,
{
	if max_concurrency == 0 {
		return Err(FsError::invalid_argument(
			"max_concurrency must be a positive integer",
		));
	}
	Ok(stream::iter(items.into_iter().map(f))
		.buffered(max_concurrency)
		.collect()
		.await)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::time::Duration;

	#[tokio::test]
	async fn preserves_input_order() {
		let results = map_concurrent(vec![1u32, 2, 3, 4, 5], 2, |n| async move {
			// Later items finish first; slots must not shuffle.
			tokio::time::sleep(Duration::from_millis(50 / n as u64)).await;
			Ok::<_, FsError>(n * 2)
		})
		.await
		.unwrap();

		let values: Vec<u32> = results.into_iter().map(|r| r.unwrap()).collect();
		assert_eq!(values, vec![2, 4, 6, 8, 10]);
	}

	#[tokio::test]
	async fn in_flight_count_never_exceeds_the_ceiling() {
		static IN_FLIGHT: AtomicUsize = AtomicUsize::new(0);
		static PEAK: AtomicUsize = AtomicUsize::new(0);

		map_concurrent(vec![0u32; 16], 3, |_| async {
			let now = IN_FLIGHT.fetch_add(1, Ordering::SeqCst) + 1;
			PEAK.fetch_max(now, Ordering::SeqCst);
			tokio::time::sleep(Duration::from_millis(5)).await;
			IN_FLIGHT.fetch_sub(1, Ordering::SeqCst);
			Ok::<_, FsError>(())
		})
		.await
		.unwrap();

		assert!(PEAK.load(Ordering::SeqCst) <= 3);
		assert!(PEAK.load(Ordering::SeqCst) >= 2, "window was never refilled");
	}

	#[tokio::test]
	async fn one_failure_occupies_only_its_own_slot() {
		let results = map_concurrent(vec![1u32, 2, 3], 2, |n| async move {
			if n == 2 {
				Err(FsError::invalid_argument("boom"))
			} else {
				Ok(n)
			}
		})
		.await
		.unwrap();

		assert_eq!(results.len(), 3);
		assert_eq!(*results[0].as_ref().unwrap(), 1);
		assert!(results[1].is_err());
		assert_eq!(*results[2].as_ref().unwrap(), 3);
	}

	#[tokio::test]
	async fn zero_ceiling_fails_before_any_item_runs() {
		let result = map_concurrent(vec![1u32], 0, |n| async move {
			if n > 0 {
				panic!("must not run for item {n}");
			}
			Ok::<u32, FsError>(n)
		})
		.await;
		assert!(matches!(result, Err(FsError::InvalidArgument(_))));
	}
}
