use std::fmt::Display;
use std::future::Future;

use futures::future::join_all;

/// Outcome of a batch where every item was allowed to finish
#[derive(Debug)]
pub struct Settled<T> {
    pub successes: Vec<T>,
    pub failures: usize,
}

impl<T> Settled<T> {
    pub fn total(&self) -> usize {
        self.successes.len() + self.failures
    }
}

/// Run every task concurrently and wait for all of them.
///
/// A failing task never cancels the others: its error is logged
///  against its key and it is left out of the successes. Successes
///  keep the order the tasks were given in.
pub async fn settle_all<K, F, T, E>(what: &str, tasks: impl IntoIterator<Item = (K, F)>) -> Settled<T>
where
    K: Display,
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    let results = join_all(
        tasks
            .into_iter()
            .map(|(key, task)| async move { (key, task.await) }),
    )
    .await;

    let mut successes = Vec::with_capacity(results.len());
    let mut failures = 0;
    for (key, result) in results {
        match result {
            Ok(value) => successes.push(value),
            Err(e) => {
                tracing::warn!("{} failed for {}: {}", what, key, e);
                failures += 1;
            }
        }
    }

    tracing::debug!(
        "{}: {}/{} succeeded",
        what,
        successes.len(),
        successes.len() + failures
    );
    Settled {
        successes,
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let tasks = (1..=5).map(|i| {
            (i, async move {
                if i % 2 == 0 {
                    Err(format!("item {} is even", i))
                } else {
                    Ok(i * 10)
                }
            })
        });

        let settled = settle_all("test", tasks).await;
        assert_eq!(settled.successes, vec![10, 30, 50]);
        assert_eq!(settled.failures, 2);
        assert_eq!(settled.total(), 5);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let tasks: Vec<(u8, std::future::Ready<Result<(), String>>)> = Vec::new();
        let settled = settle_all("nothing", tasks).await;
        assert!(settled.successes.is_empty());
        assert_eq!(settled.total(), 0);
    }
}
