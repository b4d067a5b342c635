//! Triangle-wave opacity oscillator used for blinking buttons

/// Tolerance for reaching a bound; accumulated float steps rarely land exactly.
const BOUND_EPSILON: f32 = 1e-5;

/// Bounded triangle-wave generator.
///
/// Each tick adds `direction * step` and reverses direction once either bound
/// is reached. When `min == max` the value stays fixed and the direction flips
/// on every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpacityOscillator {
    opacity: f32,
    direction: f32,
    step: f32,
    min: f32,
    max: f32,
}

impl OpacityOscillator {
    /// Create an oscillator. Bounds are ordered and the start value clamped into them.
    pub fn new(opacity: f32, direction: f32, step: f32, min: f32, max: f32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            opacity: opacity.clamp(min, max),
            direction: if direction < 0.0 { -1.0 } else { 1.0 },
            step: step.abs(),
            min,
            max,
        }
    }

    /// The state after one tick, without mutating `self`
    pub fn next(self) -> Self {
        let mut opacity = (self.opacity + self.direction * self.step).clamp(self.min, self.max);
        let mut direction = self.direction;

        let at_min = opacity <= self.min + BOUND_EPSILON;
        let at_max = opacity >= self.max - BOUND_EPSILON;
        if at_min {
            opacity = self.min;
        } else if at_max {
            opacity = self.max;
        }
        if at_min || at_max {
            direction = -direction;
        }

        Self {
            opacity,
            direction,
            ..self
        }
    }

    /// Advance one tick and return the new opacity
    pub fn tick(&mut self) -> f32 {
        *self = self.next();
        self.opacity
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Current direction sign, `1.0` or `-1.0`
    pub fn direction(&self) -> f32 {
        self.direction
    }

    pub fn bounds(&self) -> (f32, f32) {
        (self.min, self.max)
    }

    /// True when the bounds coincide and the oscillator can never change value
    pub fn is_degenerate(&self) -> bool {
        self.max - self.min <= BOUND_EPSILON
    }
}
