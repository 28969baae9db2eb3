//! Game clock and local timeout monitor for codeduel clients.
//!
//! The [`GameClock`] measures how long a player has been playing, leaving
//! out any time spent paused. The [`TimeoutMonitor`] watches a shared clock
//! in the background, publishes the elapsed time for display, and in
//! multiplayer games gives up on the player's behalf once the time ceiling
//! is crossed.
//!
//! # Integration
//!
//! The client hands the monitor a callback that submits the forfeiture:
//!
//! ```ignore
//! let clock = SharedClock::default();
//! clock.start();
//! let monitor = TimeoutMonitor::spawn(clock.clone(), MonitorConfig::multiplayer(), move || {
//!     tokio::spawn(async move { client.send_timeout_forfeiture().await });
//! });
//! ```
//!
//! The monitor only fires that callback. It never touches the connection
//! itself.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// A stopwatch for one game that can be paused.
///
/// Uses Tokio's clock, so tests can drive it with `tokio::time::advance`.
#[derive(Debug, Default, Clone)]
pub struct GameClock {
    started_at: Option<Instant>,
    /// Set while paused.
    paused_at: Option<Instant>,
    /// Sum of every finished pause.
    paused_total: Duration,
    /// Elapsed time frozen by [`stop`](Self::stop).
    stopped: Option<Duration>,
}

impl GameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts (or restarts) the clock from zero.
    pub fn start(&mut self) {
        *self = Self {
            started_at: Some(Instant::now()),
            ..Self::default()
        };
    }

    /// Pauses the clock. Pausing twice, or before start, does nothing.
    pub fn pause(&mut self) {
        if self.is_running() {
            self.paused_at = Some(Instant::now());
        }
    }

    /// Resumes after a pause. The paused span does not count as play time.
    pub fn resume(&mut self) {
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += paused_at.elapsed();
        }
    }

    /// Freezes the clock at its current elapsed time and returns it.
    pub fn stop(&mut self) -> Duration {
        let elapsed = self.elapsed();
        if self.started_at.is_some() {
            self.stopped = Some(elapsed);
        }
        elapsed
    }

    /// Play time so far, excluding pauses. Zero before start.
    pub fn elapsed(&self) -> Duration {
        if let Some(frozen) = self.stopped {
            return frozen;
        }
        let Some(started_at) = self.started_at else {
            return Duration::ZERO;
        };
        let until = self.paused_at.unwrap_or_else(Instant::now);
        until
            .saturating_duration_since(started_at)
            .saturating_sub(self.paused_total)
    }

    /// Play time in whole milliseconds, as reported in a game result.
    pub fn elapsed_ms(&self) -> u64 {
        whole_millis(self.elapsed())
    }

    /// `true` once started and until stopped, while not paused.
    pub fn is_running(&self) -> bool {
        self.started_at.is_some() && self.paused_at.is_none() && self.stopped.is_none()
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.is_some()
    }
}

/// A [`GameClock`] shared between the game loop and the monitor.
///
/// Locks are only held for the duration of a single clock call.
#[derive(Debug, Default, Clone)]
pub struct SharedClock(Arc<Mutex<GameClock>>);

impl SharedClock {
    pub fn new(clock: GameClock) -> Self {
        Self(Arc::new(Mutex::new(clock)))
    }

    fn lock(&self) -> MutexGuard<'_, GameClock> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn start(&self) {
        self.lock().start();
    }

    pub fn pause(&self) {
        self.lock().pause();
    }

    pub fn resume(&self) {
        self.lock().resume();
    }

    pub fn stop(&self) -> Duration {
        self.lock().stop()
    }

    pub fn elapsed(&self) -> Duration {
        self.lock().elapsed()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.lock().elapsed_ms()
    }

    pub fn is_running(&self) -> bool {
        self.lock().is_running()
    }

    pub fn is_stopped(&self) -> bool {
        self.lock().is_stopped()
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Settings for the [`TimeoutMonitor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Play time after which a multiplayer game is forfeited.
    pub ceiling: Duration,
    /// How often the clock is sampled.
    pub poll_interval: Duration,
    /// The ceiling is only enforced in multiplayer games.
    pub multiplayer: bool,
}

impl MonitorConfig {
    /// Default ceiling for a multiplayer game.
    pub const DEFAULT_CEILING: Duration = Duration::from_secs(180);
    /// Default sampling interval.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

    /// Defaults with the ceiling enforced.
    pub fn multiplayer() -> Self {
        Self {
            multiplayer: true,
            ..Self::default()
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            ceiling: Self::DEFAULT_CEILING,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            multiplayer: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Monitor
// ---------------------------------------------------------------------------

/// Background task that samples a [`SharedClock`].
///
/// While the clock runs it publishes the elapsed time through a `watch`
/// channel. In multiplayer mode, the first sample at or past the ceiling
/// sets the timed-out flag and calls the forfeiture callback, exactly
/// once. The task ends after firing, or once the clock is stopped.
///
/// Dropping the monitor stops the task.
pub struct TimeoutMonitor {
    elapsed: watch::Receiver<Duration>,
    timed_out: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl TimeoutMonitor {
    /// Starts monitoring `clock`. Must be called inside a Tokio runtime.
    pub fn spawn<F>(clock: SharedClock, config: MonitorConfig, on_timeout: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let (elapsed_tx, elapsed_rx) = watch::channel(Duration::ZERO);
        let timed_out = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&timed_out);

        let task = tokio::spawn(async move {
            let mut interval = time::interval(config.poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut on_timeout = Some(on_timeout);

            debug!(
                ceiling_ms = whole_millis(config.ceiling),
                multiplayer = config.multiplayer,
                "timeout monitor started"
            );

            loop {
                interval.tick().await;
                if clock.is_stopped() {
                    break;
                }
                if !clock.is_running() {
                    continue;
                }

                let elapsed = clock.elapsed();
                elapsed_tx.send_replace(elapsed);

                if config.multiplayer
                    && elapsed >= config.ceiling
                    && !flag.swap(true, Ordering::SeqCst)
                {
                    info!(elapsed_ms = whole_millis(elapsed), "time ceiling reached");
                    if let Some(forfeit) = on_timeout.take() {
                        forfeit();
                    }
                    break;
                }
            }

            debug!("timeout monitor stopped");
        });

        Self {
            elapsed: elapsed_rx,
            timed_out,
            task,
        }
    }

    /// A receiver that sees every published elapsed time.
    pub fn elapsed(&self) -> watch::Receiver<Duration> {
        self.elapsed.clone()
    }

    /// `true` once the ceiling was crossed.
    pub fn is_timed_out(&self) -> bool {
        self.timed_out.load(Ordering::SeqCst)
    }

    /// `true` once the task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops monitoring without firing.
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for TimeoutMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
fn whole_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
