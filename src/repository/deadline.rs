use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{MarketError, Result};

/// Absolute cut-off for one operation. Created once when the operation
/// starts and handed to every store call it makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline(Instant);

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Deadline(Instant::now() + budget)
    }

    /// This deadline or `now + budget`, whichever comes first.
    pub fn tightened(self, budget: Duration) -> Self {
        Deadline(self.0.min(Instant::now() + budget))
    }

    /// Drives `fut` until it finishes or the deadline passes.
    pub async fn run<T, F>(self, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout_at(self.0, fut).await {
            Ok(result) => result,
            Err(_) => Err(MarketError::Timeout { operation }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fast_future_completes() {
        let deadline = Deadline::after(Duration::from_secs(1));
        let value = deadline.run("noop", async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn slow_future_times_out() {
        let deadline = Deadline::after(Duration::from_millis(20));
        let result: Result<()> = deadline
            .run("sleepy", async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok(())
            })
            .await;
        assert!(matches!(
            result,
            Err(MarketError::Timeout {
                operation: "sleepy"
            })
        ));
    }

    #[tokio::test]
    async fn tightened_never_extends() {
        let outer = Deadline::after(Duration::from_millis(10));
        assert_eq!(outer.tightened(Duration::from_secs(5)), outer);
        assert!(outer.tightened(Duration::from_millis(1)) <= outer);
    }
}
