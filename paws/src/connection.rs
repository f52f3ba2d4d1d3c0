//! Connection to the clipboard service
//!
//! The service may come up after the panel. Probe it on a fixed interval and
//! subscribe once it answers; the probing stops there.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::interface::ClipboardLoader;

/// Poll `loader` every `interval` until it is valid, then subscribe exactly once.
///
/// The first probe happens immediately.
pub(crate) async fn connect_when_ready(
    loader: Arc<dyn ClipboardLoader>,
    interval: Duration,
    subscribed: Arc<AtomicBool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut attempts: u64 = 0;

    loop {
        ticker.tick().await;
        attempts += 1;

        if subscribed.load(Ordering::SeqCst) {
            return;
        }

        if loader.is_valid() {
            if subscribed
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                loader.subscribe();
                info!(attempts, "Subscribed to clipboard service");
            }
            return;
        }

        debug!(attempts, "Clipboard service not ready");
    }
}
