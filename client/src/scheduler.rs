use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Fire `tick` every `period` on the current `LocalSet`.
///
/// Each firing spawns one iteration and moves on; iterations are not
/// awaited, so a slow one never delays the timer. Keeping iterations from
/// overlapping is the task's own job (see [`BusyLatch`](crate::BusyLatch)).
/// Must be called from inside a `tokio::task::LocalSet`.
pub fn spawn_every<F, Fut>(period: Duration, tick: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + 'static,
    Fut: Future<Output = ()> + 'static,
{
    tokio::task::spawn_local(run_every(period, tick))
}

async fn run_every<F, Fut>(period: Duration, mut tick: F)
where
    F: FnMut() -> Fut + 'static,
    Fut: Future<Output = ()> + 'static,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        tokio::task::spawn_local(tick());
    }
}
