// ── Poll scheduling ──
//
// The session never sleeps or spawns on its own. A `Scheduler` drives a
// tick callback at a fixed period until its token is cancelled.

use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// One scheduled unit of work, invoked once per period.
pub type Tick = Box<dyn FnMut() -> BoxFuture<'static, ()> + Send>;

/// Host-provided timer.
///
/// Implementations must not start a new tick while the previous one is
/// still running, and must stop invoking `tick` once `cancel` fires. A
/// tick that is already in flight is allowed to finish.
pub trait Scheduler: Send + Sync + 'static {
    fn schedule(&self, every: Duration, cancel: CancellationToken, tick: Tick) -> JoinHandle<()>;
}

/// [`Scheduler`] on the tokio timer.
///
/// The first tick fires one full period after scheduling. Late ticks are
/// skipped rather than bunched up.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule(
        &self,
        every: Duration,
        cancel: CancellationToken,
        mut tick: Tick,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval.tick().await; // consume the immediate first tick

            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = interval.tick() => {}
                }
                // Awaited outside select! so cancellation never interrupts it.
                tick().await;
            }

            debug!("poll schedule stopped");
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting_tick(count: &Arc<AtomicUsize>) -> Tick {
        let count = Arc::clone(count);
        Box::new(move || {
            let count = Arc::clone(&count);
            Box::pin(async move {
                count.fetch_add(1, Ordering::SeqCst);
            })
        })
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period_after_the_first() {
        let count = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        let handle = TokioScheduler.schedule(
            Duration::from_secs(2),
            cancel.clone(),
            counting_tick(&count),
        );

        tokio::time::sleep(Duration::from_millis(1900)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(4200)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_further_ticks() {
        let count = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        let handle = TokioScheduler.schedule(
            Duration::from_secs(1),
            cancel.clone(),
            counting_tick(&count),
        );

        tokio::time::sleep(Duration::from_millis(1500)).await;
        cancel.cancel();
        handle.await.unwrap();
        let seen = count.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(seen, 1);
        assert_eq!(count.load(Ordering::SeqCst), seen);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_tick_does_not_overlap() {
        let running = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();

        let tick: Tick = {
            let running = Arc::clone(&running);
            let max_seen = Arc::clone(&max_seen);
            Box::new(move || {
                let running = Arc::clone(&running);
                let max_seen = Arc::clone(&max_seen);
                Box::pin(async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(2500)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                })
            })
        };

        let handle = TokioScheduler.schedule(Duration::from_secs(1), cancel.clone(), tick);
        tokio::time::sleep(Duration::from_secs(10)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }
}
