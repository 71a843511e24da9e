//! Fixed-interval poll scheduler for roomlink.
//!
//! Drives the lobby's reconciliation loop: while the lobby screen is
//! visible, a poll fires every `interval`; while it is hidden the
//! scheduler is paused and no background timer runs.
//!
//! # Manual mode
//!
//! When `interval` is zero the scheduler is in manual mode and
//! [`PollScheduler::wait_for_poll`] only resolves after
//! [`PollScheduler::trigger_now`]. This is the right setting for clients
//! that reconcile only after their own mutations and on user refresh.
//!
//! # Integration
//!
//! The scheduler is designed to sit inside a `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         _ = shutdown.changed() => break,
//!         info = scheduler.wait_for_poll() => {
//!             lobby.refresh().await;
//!         }
//!     }
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the poll scheduler.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Time between polls. Zero means manual mode (never fires on its own).
    pub interval: Duration,
    /// Random jitter (0–max) added to the *first* poll so clients that
    /// opened the lobby at the same instant don't hit the server together.
    pub initial_jitter: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            initial_jitter: Duration::from_millis(250),
        }
    }
}

impl PollConfig {
    /// Shortest non-zero interval accepted. Anything faster would be
    /// hammering a service that only promises poll-interval freshness.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(250);

    /// Create a config for a specific interval with default jitter.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Manual mode: polls happen only on [`PollScheduler::trigger_now`].
    pub fn manual() -> Self {
        Self::with_interval(Duration::ZERO)
    }

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`PollScheduler::new`]. A non-zero
    /// interval below [`Self::MIN_INTERVAL`] is raised to it, and the
    /// jitter is capped at one interval.
    pub fn validated(mut self) -> Self {
        if !self.interval.is_zero() && self.interval < Self::MIN_INTERVAL {
            warn!(
                interval_ms = self.interval.as_millis() as u64,
                min_ms = Self::MIN_INTERVAL.as_millis() as u64,
                "poll interval below minimum, clamping"
            );
            self.interval = Self::MIN_INTERVAL;
        }
        if !self.interval.is_zero() && self.initial_jitter > self.interval {
            self.initial_jitter = self.interval;
        }
        self
    }

    /// Returns `true` if the scheduler never fires on its own.
    pub fn is_manual(&self) -> bool {
        self.interval.is_zero()
    }
}

// ---------------------------------------------------------------------------
// Poll info (returned to caller each poll)
// ---------------------------------------------------------------------------

/// Why a poll fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollReason {
    /// The interval elapsed.
    Interval,
    /// Someone called [`PollScheduler::trigger_now`].
    Triggered,
}

/// Information about a poll, returned by [`PollScheduler::wait_for_poll`].
#[derive(Debug, Clone)]
pub struct PollInfo {
    /// Monotonically increasing poll number (starts at 1).
    pub poll: u64,
    /// What made this poll fire.
    pub reason: PollReason,
    /// `true` if the poll fired noticeably later than scheduled, e.g.
    /// because the previous reconciliation took longer than an interval.
    pub late: bool,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-interval poll scheduler. One per lobby.
pub struct PollScheduler {
    config: PollConfig,
    poll_count: u64,
    /// When the next interval poll is due. `None` in manual mode.
    next_poll: Option<Instant>,
    /// Set by `trigger_now`, consumed by the next `wait_for_poll`.
    triggered: bool,
    paused: bool,
}

impl PollScheduler {
    /// Create a new scheduler from config.
    ///
    /// The first poll is scheduled with optional jitter.
    pub fn new(config: PollConfig) -> Self {
        let config = config.validated();

        let next_poll = if config.is_manual() {
            debug!("poll scheduler created in manual mode");
            None
        } else {
            let max = config.initial_jitter.as_nanos() as u64;
            let jitter = if max == 0 {
                Duration::ZERO
            } else {
                Duration::from_nanos(rand::rng().random_range(0..=max))
            };
            debug!(
                interval_ms = config.interval.as_millis() as u64,
                jitter_us = jitter.as_micros() as u64,
                "poll scheduler created"
            );
            Some(Instant::now() + config.interval + jitter)
        };

        Self {
            config,
            poll_count: 0,
            next_poll,
            triggered: false,
            paused: false,
        }
    }

    /// Create a scheduler for a specific interval with default settings.
    pub fn with_interval(interval: Duration) -> Self {
        Self::new(PollConfig::with_interval(interval))
    }

    /// Wait until the next poll is due.
    ///
    /// A pending trigger resolves immediately, even while paused (a
    /// user-initiated refresh always runs). Otherwise, in manual mode or
    /// when paused, this future pends forever; `tokio::select!` will still
    /// process other branches.
    pub async fn wait_for_poll(&mut self) -> PollInfo {
        if self.triggered {
            return self.fire(PollReason::Triggered, false);
        }

        let next = match self.next_poll {
            Some(next) if !self.paused => next,
            _ => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        time::sleep_until(next).await;

        let late_by = Instant::now().saturating_duration_since(next);
        let late = late_by > self.config.interval / 10;
        if late {
            trace!(
                poll = self.poll_count + 1,
                late_ms = late_by.as_millis() as u64,
                "poll fired late"
            );
        }
        self.fire(PollReason::Interval, late)
    }

    fn fire(&mut self, reason: PollReason, late: bool) -> PollInfo {
        self.triggered = false;
        self.poll_count += 1;
        // Always schedule from now: a slow reconciliation delays the next
        // poll instead of causing a burst of catch-up polls.
        if !self.config.is_manual() {
            self.next_poll = Some(Instant::now() + self.config.interval);
        }
        trace!(poll = self.poll_count, ?reason, "poll fired");
        PollInfo {
            poll: self.poll_count,
            reason,
            late,
        }
    }

    /// Make the next `wait_for_poll` resolve immediately.
    ///
    /// Idempotent: several triggers before a poll collapse into one.
    pub fn trigger_now(&mut self) {
        self.triggered = true;
    }

    /// Pause interval polling (lobby hidden). Safe to call repeatedly.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(poll = self.poll_count, "poll scheduler paused");
        }
    }

    /// Resume interval polling (lobby visible again).
    ///
    /// Fires a poll right away: state may have drifted for a long time
    /// while the lobby was hidden.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.triggered = true;
            debug!(poll = self.poll_count, "poll scheduler resumed");
        }
    }

    /// Whether the scheduler is currently paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether this scheduler is in manual mode.
    pub fn is_manual(&self) -> bool {
        self.config.is_manual()
    }

    /// Number of polls fired so far.
    pub fn poll_count(&self) -> u64 {
        self.poll_count
    }

    /// The configured interval (zero in manual mode).
    pub fn interval(&self) -> Duration {
        self.config.interval
    }
}
