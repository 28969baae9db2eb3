//! Integration tests for the game clock and timeout monitor.
//!
//! Every async test runs with Tokio's clock paused. Sleeping in the test
//! auto-advances time, so the monitor's polling runs deterministically.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use codeduel_clock::{GameClock, MonitorConfig, SharedClock, TimeoutMonitor};
use tokio::time;

// =========================================================================
// Helpers
// =========================================================================

fn short_ceiling(multiplayer: bool) -> MonitorConfig {
    MonitorConfig {
        ceiling: Duration::from_secs(1),
        poll_interval: Duration::from_millis(10),
        multiplayer,
    }
}

/// A monitor whose callback counts how often it fired.
fn counting_monitor(clock: &SharedClock, config: MonitorConfig) -> (TimeoutMonitor, Arc<AtomicUsize>) {
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    let monitor = TimeoutMonitor::spawn(clock.clone(), config, move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    (monitor, fired)
}

async fn settle() {
    tokio::task::yield_now().await;
}

// =========================================================================
// GameClock
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_clock_measures_play_time() {
    let mut clock = GameClock::new();
    clock.start();
    time::advance(Duration::from_millis(12_345)).await;

    assert_eq!(clock.elapsed(), Duration::from_millis(12_345));
    assert_eq!(clock.elapsed_ms(), 12_345);
    assert!(clock.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_clock_excludes_paused_time() {
    let mut clock = GameClock::new();
    clock.start();
    time::advance(Duration::from_secs(5)).await;

    clock.pause();
    assert!(clock.is_paused());
    time::advance(Duration::from_secs(10)).await;
    assert_eq!(clock.elapsed(), Duration::from_secs(5));

    clock.resume();
    time::advance(Duration::from_secs(2)).await;
    assert_eq!(clock.elapsed(), Duration::from_secs(7));
}

#[tokio::test(start_paused = true)]
async fn test_clock_stop_freezes_elapsed() {
    let mut clock = GameClock::new();
    clock.start();
    time::advance(Duration::from_secs(3)).await;

    assert_eq!(clock.stop(), Duration::from_secs(3));
    time::advance(Duration::from_secs(3)).await;

    assert_eq!(clock.elapsed(), Duration::from_secs(3));
    assert!(clock.is_stopped());
    assert!(!clock.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_clock_restart_resets() {
    let mut clock = GameClock::new();
    clock.start();
    time::advance(Duration::from_secs(3)).await;
    clock.stop();

    clock.start();
    time::advance(Duration::from_secs(1)).await;
    assert_eq!(clock.elapsed(), Duration::from_secs(1));
}

// =========================================================================
// TimeoutMonitor
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_monitor_fires_once_past_ceiling() {
    let clock = SharedClock::default();
    clock.start();
    let (monitor, fired) = counting_monitor(&clock, short_ceiling(true));

    time::sleep(Duration::from_secs(3)).await;
    settle().await;

    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert!(monitor.is_timed_out());
    assert!(monitor.is_finished());
}

#[tokio::test(start_paused = true)]
async fn test_monitor_quiet_before_ceiling() {
    let clock = SharedClock::default();
    clock.start();
    let (monitor, fired) = counting_monitor(&clock, short_ceiling(true));

    time::sleep(Duration::from_millis(900)).await;

    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert!(!monitor.is_timed_out());
}

#[tokio::test(start_paused = true)]
async fn test_monitor_never_fires_outside_multiplayer() {
    let clock = SharedClock::default();
    clock.start();
    let (monitor, fired) = counting_monitor(&clock, short_ceiling(false));

    time::sleep(Duration::from_secs(3)).await;

    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert!(!monitor.is_timed_out());
    assert!(*monitor.elapsed().borrow() >= Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_monitor_ignores_paused_time() {
    let clock = SharedClock::default();
    clock.start();
    clock.pause();
    let (monitor, fired) = counting_monitor(&clock, short_ceiling(true));

    time::sleep(Duration::from_secs(5)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    clock.resume();
    time::sleep(Duration::from_millis(1_100)).await;
    settle().await;

    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert!(monitor.is_timed_out());
}

#[tokio::test(start_paused = true)]
async fn test_monitor_ends_when_clock_stops() {
    let clock = SharedClock::default();
    clock.start();
    let (monitor, fired) = counting_monitor(&clock, short_ceiling(true));

    time::sleep(Duration::from_millis(500)).await;
    clock.stop();
    time::sleep(Duration::from_millis(50)).await;
    settle().await;

    assert!(monitor.is_finished());
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_monitor_publishes_elapsed() {
    let clock = SharedClock::default();
    clock.start();
    let (monitor, _fired) = counting_monitor(&clock, short_ceiling(false));
    let mut elapsed = monitor.elapsed();

    time::sleep(Duration::from_millis(250)).await;
    elapsed.changed().await.unwrap();

    let seen = *elapsed.borrow_and_update();
    assert!(seen > Duration::ZERO);
    assert!(seen <= Duration::from_millis(260));
}

#[tokio::test(start_paused = true)]
async fn test_stopped_monitor_never_fires() {
    let clock = SharedClock::default();
    clock.start();
    let (monitor, fired) = counting_monitor(&clock, short_ceiling(true));

    monitor.stop();
    time::sleep(Duration::from_secs(3)).await;

    assert_eq!(fired.load(Ordering::SeqCst), 0);
}
