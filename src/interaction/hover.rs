//! Pointer hover state

/// Cursor appearance requested by a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorStyle {
    #[default]
    Default,
    /// Hand cursor signalling a clickable surface
    Pointer,
}

/// Edge produced when the hover state actually changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverTransition {
    Entered,
    Left,
}

/// True while the pointer ray intersects the tracked surface.
///
/// Only edges are reported; repeated updates with the same hit result are silent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HoverFlag {
    hovering: bool,
}

impl HoverFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the latest hit-test result
    pub fn update(&mut self, hit: bool) -> Option<HoverTransition> {
        match (self.hovering, hit) {
            (false, true) => {
                self.hovering = true;
                Some(HoverTransition::Entered)
            }
            (true, false) => {
                self.hovering = false;
                Some(HoverTransition::Left)
            }
            _ => None,
        }
    }

    pub fn is_hovering(&self) -> bool {
        self.hovering
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_and_leave() {
        let mut flag = HoverFlag::new();
        assert_eq!(flag.update(true), Some(HoverTransition::Entered));
        assert!(flag.is_hovering());
        assert_eq!(flag.update(false), Some(HoverTransition::Left));
        assert!(!flag.is_hovering());
    }

    #[test]
    fn test_repeated_updates_are_idempotent() {
        let mut flag = HoverFlag::new();
        assert_eq!(flag.update(false), None);
        flag.update(true);
        for _ in 0..10 {
            assert_eq!(flag.update(true), None);
        }
        assert!(flag.is_hovering());
    }
}
