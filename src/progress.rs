//! Progress reporting and cooperative cancellation.
//!
//! Long computations report `{status, name, progress}` updates at coarse
//! points (once per distance-matrix row, once per merge, once per insertion).
//! Those points are also where a [`CancelToken`] is checked.
//!
//! A failing sink never affects the computation: errors and panics raised
//! while reporting are caught and logged.

use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Error type a [`ProgressSink`] may return.
pub type ProgressError = Box<dyn std::error::Error + Send + Sync>;

/// One progress message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Phase description, e.g. `"Computing distances"`.
    pub status: String,
    /// Free-form label; the clusterer puts its time-remaining estimate here.
    pub name: String,
    /// Overall completion in `0..=100`.
    pub progress: f32,
}

/// Receiver of progress messages.
pub trait ProgressSink {
    fn report(&mut self, update: &ProgressUpdate) -> std::result::Result<(), ProgressError>;
}

impl<F> ProgressSink for F
where
    F: FnMut(&ProgressUpdate) -> std::result::Result<(), ProgressError>,
{
    fn report(&mut self, update: &ProgressUpdate) -> std::result::Result<(), ProgressError> {
        self(update)
    }
}

/// Discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _update: &ProgressUpdate) -> std::result::Result<(), ProgressError> {
        Ok(())
    }
}

/// Emits every update as a `tracing` debug event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&mut self, update: &ProgressUpdate) -> std::result::Result<(), ProgressError> {
        tracing::debug!(
            status = %update.status,
            name = %update.name,
            progress = format_args!("{:.1}%", update.progress),
            "progress"
        );
        Ok(())
    }
}

/// Deliver an update, swallowing (and logging) sink errors and panics.
pub(crate) fn deliver(sink: &mut dyn ProgressSink, update: ProgressUpdate) {
    match catch_unwind(AssertUnwindSafe(|| sink.report(&update))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::warn!(status = %update.status, error = %e, "progress callback failed");
        }
        Err(_) => {
            tracing::warn!(status = %update.status, "progress callback panicked");
        }
    }
}

/// Shared cancellation flag.
///
/// Clones observe the same flag, so a caller keeps one clone and hands the
/// other to the computation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Takes effect at the next progress point.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// `Err(Cancelled)` once cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(IndexError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Tracks a computation split into equally weighted phases and estimates the
/// remaining time from the elapsed time.
#[derive(Debug)]
pub(crate) struct PhaseClock {
    started: Instant,
    phases: usize,
}

impl PhaseClock {
    pub(crate) fn start(phases: usize) -> Self {
        Self {
            started: Instant::now(),
            phases: phases.max(1),
        }
    }

    /// Overall fraction in `[0, 1]` for `step_fraction` of phase `phase`.
    pub(crate) fn fraction(&self, phase: usize, step_fraction: f64) -> f64 {
        let step_fraction = if step_fraction.is_finite() {
            step_fraction.clamp(0.0, 1.0)
        } else {
            1.0
        };
        ((phase as f64 + step_fraction) / self.phases as f64).clamp(0.0, 1.0)
    }

    /// Build an update whose `name` carries the `HH:MM:SS remaining` estimate.
    pub(crate) fn update(&self, status: &str, phase: usize, step_fraction: f64) -> ProgressUpdate {
        let fraction = self.fraction(phase, step_fraction);
        let remaining = estimate_remaining(self.started.elapsed(), fraction);
        ProgressUpdate {
            status: status.to_string(),
            name: format!("{} remaining", format_hms(remaining)),
            progress: (fraction * 100.0) as f32,
        }
    }
}

fn estimate_remaining(elapsed: Duration, fraction: f64) -> Duration {
    if fraction <= 0.0 {
        return Duration::ZERO;
    }
    let total = elapsed.as_secs_f64() / fraction;
    Duration::from_secs_f64((total - elapsed.as_secs_f64()).max(0.0))
}

/// Format a duration as zero-padded `HH:MM:SS`.
pub(crate) fn format_hms(d: Duration) -> String {
    let total = d.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hms_is_zero_padded() {
        assert_eq!(format_hms(Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_hms(Duration::from_secs(3_723)), "01:02:03");
    }

    #[test]
    fn phase_fraction_spans_both_phases() {
        let clock = PhaseClock::start(2);
        assert_eq!(clock.fraction(0, 0.0), 0.0);
        assert!((clock.fraction(0, 1.0) - 0.5).abs() < 1e-12);
        assert!((clock.fraction(1, 0.5) - 0.75).abs() < 1e-12);
        assert_eq!(clock.fraction(1, f64::NAN), 1.0);
        let update = clock.update("Clustering", 1, 1.0);
        assert_eq!(update.progress, 100.0);
        assert!(update.name.ends_with("remaining"));
    }

    #[test]
    fn failing_sink_is_contained() {
        let mut calls = 0;
        let mut sink = |_: &ProgressUpdate| -> std::result::Result<(), ProgressError> {
            calls += 1;
            Err("sink closed".into())
        };
        deliver(&mut sink, PhaseClock::start(1).update("x", 0, 0.5));
        assert_eq!(calls, 1);
    }

    #[test]
    fn panicking_sink_is_contained() {
        let mut sink = |_: &ProgressUpdate| -> std::result::Result<(), ProgressError> {
            panic!("boom");
        };
        deliver(&mut sink, PhaseClock::start(1).update("x", 0, 0.5));
    }

    #[test]
    fn cancel_token_is_shared_between_clones() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(other.check().is_ok());
        token.cancel();
        assert!(matches!(other.check(), Err(IndexError::Cancelled)));
    }
}
