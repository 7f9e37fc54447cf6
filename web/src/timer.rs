use std::future::Future;

use gloo_timers::callback::Interval;
use wasm_bindgen_futures::spawn_local;

/// Fire `tick` every `period_ms` for the lifetime of the page.
///
/// Each firing spawns one iteration without waiting for the previous one;
/// the loops keep themselves from overlapping with their busy latch.
pub fn every<F, Fut>(period_ms: u32, tick: F)
where
    F: Fn() -> Fut + 'static,
    Fut: Future<Output = ()> + 'static,
{
    Interval::new(period_ms, move || spawn_local(tick())).forget();
}
