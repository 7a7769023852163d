//! Admission and deadline for calls to remote services.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Semaphore;

use libris_core::Error;

/// At most `max_concurrent` outstanding calls; each admitted call must finish
/// within `timeout`. Waiting for a slot is not part of the deadline.
///
/// The engine builds one gate per query, so concurrent queries never compete
/// for slots.
#[derive(Debug)]
pub struct CallGate {
    permits: Semaphore,
    timeout: Duration,
}

impl CallGate {
    pub fn new(max_concurrent: usize, timeout: Duration) -> Self {
        Self { permits: Semaphore::new(max_concurrent.max(1)), timeout }
    }

    pub async fn run<T, F>(&self, service: &'static str, call: F) -> Result<T, Error>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| Error::Upstream { service, message: e.to_string() })?;
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(|e| Error::Upstream { service, message: format!("{e:#}") }),
            Err(_) => Err(Error::Timeout { service, millis: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX) }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn slow_calls_time_out() {
        let gate = CallGate::new(2, Duration::from_millis(20));
        let res = gate
            .run("embedding", async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(1)
            })
            .await;
        assert!(matches!(res, Err(Error::Timeout { service: "embedding", .. })));
    }

    #[tokio::test]
    async fn failures_are_tagged_upstream() {
        let gate = CallGate::new(1, Duration::from_secs(1));
        let res: Result<(), Error> = gate.run("rerank", async { Err(anyhow::anyhow!("boom")) }).await;
        let err = res.expect_err("must fail");
        assert!(err.is_upstream());
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn concurrency_is_capped() {
        let gate = CallGate::new(2, Duration::from_secs(2));
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let call = || {
            let active = active.clone();
            let peak = peak.clone();
            async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        };
        let (a, b, c, d) = tokio::join!(gate.run("x", call()), gate.run("x", call()), gate.run("x", call()), gate.run("x", call()));
        assert!(a.is_ok() && b.is_ok() && c.is_ok() && d.is_ok());
        assert_eq!(peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn waiting_for_a_slot_does_not_count_against_the_deadline() {
        let gate = CallGate::new(1, Duration::from_millis(150));
        let call = || async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(())
        };
        let (first, second) = tokio::join!(gate.run("embedding", call()), gate.run("embedding", call()));
        assert!(first.is_ok());
        assert!(second.is_ok(), "{second:?}");
    }
}
