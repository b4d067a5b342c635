//! Slideshow cursor over an ordered asset sequence
//!
//! Advances by one on every tick and wraps back to the first entry.

/// Cursor into an ordered sequence of assets.
///
/// Invariant: `index < len` whenever `len > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideshowCycler {
    index: usize,
    len: usize,
}

impl SlideshowCycler {
    /// Create a cycler over `len` entries, starting at the first one.
    ///
    /// Returns `None` for an empty sequence; cycling zero entries is undefined.
    pub fn new(len: usize) -> Option<Self> {
        (len > 0).then_some(Self { index: 0, len })
    }

    /// Create a cycler positioned at `index` (wrapped into range)
    pub fn starting_at(len: usize, index: usize) -> Option<Self> {
        (len > 0).then_some(Self { index: index % len, len })
    }

    /// The state after one tick, without mutating `self`
    pub fn next(self) -> Self {
        Self {
            index: (self.index + 1) % self.len,
            len: self.len,
        }
    }

    /// Advance one step and return the new index
    pub fn advance(&mut self) -> usize {
        *self = self.next();
        self.index
    }

    /// Current index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of entries being cycled
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false; an empty cycler cannot be constructed
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
