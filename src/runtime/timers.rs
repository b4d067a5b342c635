//! Interval and one-shot timers
//!
//! Timers are keyed by [`TimerKind`]; scheduling a kind that is already
//! pending replaces it. Nothing here reads the clock, callers pass `now`.

use std::time::{Duration, Instant};

/// Timer purposes used by the pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Advance a slideshow to its next photo
    SlideshowAdvance,
    /// Hide a timed overlay
    OverlayExpire,
}

#[derive(Debug, Clone)]
struct ScheduledTimer {
    kind: TimerKind,
    deadline: Instant,
    /// `Some` for intervals
    period: Option<Duration>,
}

/// Pending timers for one page
#[derive(Debug, Default)]
pub struct TimerQueue {
    timers: Vec<ScheduledTimer>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `kind` every `period`, first at `now + period`
    pub fn set_interval(&mut self, kind: TimerKind, now: Instant, period: Duration) {
        let period = period.max(Duration::from_millis(1));
        self.insert(ScheduledTimer {
            kind,
            deadline: now + period,
            period: Some(period),
        });
        tracing::debug!(?kind, period_ms = period.as_millis() as u64, "Interval scheduled");
    }

    /// Fire `kind` once at `now + delay`
    pub fn set_timeout(&mut self, kind: TimerKind, now: Instant, delay: Duration) {
        self.insert(ScheduledTimer {
            kind,
            deadline: now + delay,
            period: None,
        });
        tracing::debug!(?kind, delay_ms = delay.as_millis() as u64, "Timeout scheduled");
    }

    fn insert(&mut self, timer: ScheduledTimer) {
        self.timers.retain(|t| t.kind != timer.kind);
        self.timers.push(timer);
    }

    pub fn is_scheduled(&self, kind: TimerKind) -> bool {
        self.timers.iter().any(|t| t.kind == kind)
    }

    /// Pop every timer due at `now`, earliest deadline first.
    ///
    /// An interval fires at most once per call even if several periods have
    /// elapsed; its next deadline is the first point on its period grid after
    /// `now`. One-shots are removed once they fire.
    pub fn due(&mut self, now: Instant) -> Vec<TimerKind> {
        let mut fired: Vec<(Instant, TimerKind)> = Vec::new();

        self.timers.retain_mut(|timer| {
            if timer.deadline > now {
                return true;
            }
            fired.push((timer.deadline, timer.kind));
            match timer.period {
                Some(period) => {
                    let behind = now.duration_since(timer.deadline);
                    let skipped = (behind.as_nanos() / period.as_nanos()) as u32;
                    timer.deadline += period * (skipped + 1);
                    true
                }
                None => false,
            }
        });

        fired.sort_by_key(|(deadline, _)| *deadline);
        fired.into_iter().map(|(_, kind)| kind).collect()
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}
