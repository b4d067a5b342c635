//! Page hosting: timers and the per-frame driver

mod page_runtime;
mod timers;

pub use page_runtime::PageRuntime;
pub use timers::{TimerKind, TimerQueue};
