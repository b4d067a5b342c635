//! Debounced "show photo for a while" overlay

use std::time::Duration;

use super::cycler::SlideshowCycler;

/// Click-triggered overlay that shows the next photo for a fixed duration.
///
/// Clicks while a photo is on screen are dropped, not queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedOverlay {
    cursor: SlideshowCycler,
    showing: bool,
    duration: Duration,
}

impl TimedOverlay {
    /// Returns `None` when there is nothing to show
    pub fn new(len: usize, duration: Duration) -> Option<Self> {
        Some(Self {
            cursor: SlideshowCycler::new(len)?,
            showing: false,
            duration,
        })
    }

    /// Handle a qualifying click.
    ///
    /// Returns the index to display, or `None` when a display is already active.
    /// The caller schedules [`TimedOverlay::finish`] after [`TimedOverlay::duration`].
    pub fn trigger(&mut self) -> Option<usize> {
        if self.showing {
            return None;
        }
        self.showing = true;
        Some(self.cursor.advance())
    }

    /// The display timer elapsed; accept clicks again
    pub fn finish(&mut self) {
        self.showing = false;
    }

    pub fn is_showing(&self) -> bool {
        self.showing
    }

    /// Index of the photo shown most recently
    pub fn index(&self) -> usize {
        self.cursor.index()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_of_clicks_shows_once() {
        let mut overlay = TimedOverlay::new(7, Duration::from_millis(1800)).unwrap();
        let shown: Vec<usize> = (0..5).filter_map(|_| overlay.trigger()).collect();
        assert_eq!(shown, vec![1]);
        assert!(overlay.is_showing());
    }

    #[test]
    fn test_sequence_after_each_expiry() {
        let mut overlay = TimedOverlay::new(7, Duration::from_millis(1800)).unwrap();
        let mut shown = Vec::new();
        for _ in 0..8 {
            shown.push(overlay.trigger().unwrap());
            overlay.finish();
        }
        assert_eq!(shown, vec![1, 2, 3, 4, 5, 6, 0, 1]);
    }

    #[test]
    fn test_empty_overlay_rejected() {
        assert!(TimedOverlay::new(0, Duration::from_secs(1)).is_none());
    }
}
