use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Run `task` every `period` until `cancel` fires.
///
/// The next tick is only awaited once the previous run has completed, so runs
/// never overlap. Ticks missed while a run was slow are skipped, not queued.
pub fn spawn_periodic<F, Fut>(period: Duration, cancel: CancellationToken, mut task: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => task().await,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_runs_until_cancelled() {
        let runs = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();

        let counter = runs.clone();
        let handle = spawn_periodic(Duration::from_millis(100), cancel.clone(), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(450)).await;
        cancel.cancel();
        handle.await.unwrap();

        // Ticks at 0, 100, 200, 300, 400
        assert_eq!(runs.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_runs_never_overlap() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let runs = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();

        let (flight, max, count) = (in_flight.clone(), peak.clone(), runs.clone());
        let handle = spawn_periodic(Duration::from_millis(50), cancel.clone(), move || {
            let (flight, max, count) = (flight.clone(), max.clone(), count.clone());
            async move {
                let now = flight.fetch_add(1, Ordering::SeqCst) + 1;
                max.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(175)).await;
                flight.fetch_sub(1, Ordering::SeqCst);
                count.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(1000)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(peak.load(Ordering::SeqCst), 1);
        // 1000ms of 175ms runs cannot fit more than six
        let completed = runs.load(Ordering::SeqCst);
        assert!((3..=6).contains(&completed), "completed {completed}");
    }
}
