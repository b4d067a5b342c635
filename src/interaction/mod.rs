//! Interaction state machines shared by the pages
//!
//! Everything here is plain data with transition methods; none of it touches
//! the GPU or the window, so pages can be driven from tests.

pub mod cycler;
pub mod hotspot;
pub mod hover;
pub mod oscillator;
pub mod overlay;
pub mod spin;

pub use cycler::SlideshowCycler;
pub use hotspot::{Emphasis, HotspotSet};
pub use hover::{CursorStyle, HoverFlag, HoverTransition};
pub use oscillator::OpacityOscillator;
pub use overlay::TimedOverlay;
pub use spin::Spinner;
