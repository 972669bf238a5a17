use std::future::Future;
use std::time::Duration;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio::time::{Instant, timeout_at};

use crate::SdkError;

/// Result of a single item in a batch.
///
/// `Ok(true)` means the service confirmed the removal, `Ok(false)` that the call
/// succeeded without confirming anything.
#[derive(Debug)]
pub struct ItemOutcome<T> {
    pub item: T,
    pub result: Result<bool, SdkError>,
}

/// Per-item outcomes of a deadline-bounded batch
#[derive(Debug)]
pub struct BatchOutcome<T> {
    /// Items whose call finished before the deadline, in completion order
    pub completed: Vec<ItemOutcome<T>>,
    /// Items still in flight when the deadline elapsed
    pub abandoned: Vec<T>,
}

impl<T> BatchOutcome<T> {
    /// Items the service confirmed as removed
    pub fn confirmed(&self) -> impl Iterator<Item = &T> {
        self.completed
            .iter()
            .filter(|o| matches!(o.result, Ok(true)))
            .map(|o| &o.item)
    }
}

/// Issue one call per item concurrently and collect outcomes until `budget` elapses.
///
/// Calls still outstanding at the deadline are dropped; whatever completed before
/// that point is returned as final.
pub async fn run_batch<T, F, Fut>(items: &[T], budget: Duration, op: F) -> BatchOutcome<T>
where
    T: Clone,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<bool, SdkError>>,
{
    let deadline = Instant::now() + budget;
    let mut pending: FuturesUnordered<_> = items
        .iter()
        .cloned()
        .enumerate()
        .map(|(idx, item)| {
            let call = op(item);
            async move { (idx, call.await) }
        })
        .collect();

    let mut done = vec![false; items.len()];
    let mut completed = Vec::with_capacity(items.len());

    loop {
        match timeout_at(deadline, pending.next()).await {
            Ok(Some((idx, result))) => {
                done[idx] = true;
                completed.push(ItemOutcome {
                    item: items[idx].clone(),
                    result,
                });
            }
            Ok(None) => break,
            Err(_) => {
                log::warn!(
                    "Batch deadline of {budget:?} elapsed with {} of {} calls outstanding",
                    pending.len(),
                    items.len()
                );
                break;
            }
        }
    }

    let abandoned = items
        .iter()
        .zip(done)
        .filter(|(_, finished)| !finished)
        .map(|(item, _)| item.clone())
        .collect();

    BatchOutcome {
        completed,
        abandoned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_collects_all_outcomes_within_budget() {
        let items = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        let outcome = run_batch(&items, Duration::from_secs(5), |item| async move {
            if item == "b" {
                Err(SdkError::InvalidRequest("boom".into()))
            } else {
                Ok(true)
            }
        })
        .await;

        assert_eq!(outcome.completed.len(), 3);
        assert!(outcome.abandoned.is_empty());
        let mut confirmed: Vec<_> = outcome.confirmed().cloned().collect();
        confirmed.sort();
        assert_eq!(confirmed, vec!["a", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_keeps_partial_results() {
        let items: Vec<u64> = vec![1, 2, 30, 40, 3];

        let outcome = run_batch(&items, Duration::from_secs(10), |secs| async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            Ok(true)
        })
        .await;

        let mut confirmed: Vec<_> = outcome.confirmed().copied().collect();
        confirmed.sort();
        assert_eq!(confirmed, vec![1, 2, 3]);
        assert_eq!(outcome.abandoned, vec![30, 40]);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let items: Vec<String> = Vec::new();
        let outcome = run_batch(&items, Duration::from_secs(1), |_| async { Ok(true) }).await;
        assert!(outcome.completed.is_empty());
        assert!(outcome.abandoned.is_empty());
    }
}
