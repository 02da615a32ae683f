//! Tick-driven directional animations.
//!
//! An [`AnimationEngine`] owns one or more [`AnimationInstance`]s. Each tick
//! moves every running instance towards the end value of its direction by a
//! fixed increment. There is no internal timer: the window calls
//! [`AnimationEngine::tick`] once per animation frame and repaints while any
//! engine reports progress.

use smallvec::SmallVec;

use crate::Point;

const DONE_EPSILON: f32 = 1e-5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
}

impl Easing {
    pub fn interpolate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => t * (2.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    /// Towards 1.0.
    #[default]
    In,
    /// Towards 0.0.
    Out,
}

impl Direction {
    pub fn start_value(self) -> f32 {
        match self {
            Direction::In => 0.0,
            Direction::Out => 1.0,
        }
    }

    pub fn end_value(self) -> f32 {
        match self {
            Direction::In => 1.0,
            Direction::Out => 0.0,
        }
    }
}

/// Outcome of one [`AnimationEngine::tick`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationTick {
    /// Nothing was running.
    Idle,
    /// At least one instance is still running.
    Progressed,
    /// The last running instance reached its end value this tick.
    Finished,
}

impl AnimationTick {
    /// Progress and completion both need a repaint.
    pub fn needs_redraw(self) -> bool {
        !matches!(self, AnimationTick::Idle)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationInstance {
    pub direction: Direction,
    /// Linear progress in `[0, 1]`.
    pub value: f32,
    pub origin: Point,
    pub running: bool,
}

impl AnimationInstance {
    fn new(direction: Direction, origin: Point) -> Self {
        Self {
            direction,
            value: direction.start_value(),
            origin,
            running: true,
        }
    }

    fn step(&mut self, increment: f32) -> bool {
        let end = self.direction.end_value();
        match self.direction {
            Direction::In => self.value = (self.value + increment).min(1.0),
            Direction::Out => self.value = (self.value - increment).max(0.0),
        }
        if (self.value - end).abs() <= DONE_EPSILON {
            self.value = end;
            self.running = false;
            true
        } else {
            false
        }
    }
}

#[derive(Clone, Debug)]
pub struct AnimationEngine {
    pub increment: f32,
    pub easing: Easing,
    /// One reusable instance instead of a list of concurrent ones.
    pub singular: bool,
    /// Whether `start` may override an animation already in flight.
    pub interrupt: bool,
    instances: SmallVec<[AnimationInstance; 2]>,
}

impl Default for AnimationEngine {
    fn default() -> Self {
        Self::new(0.03, Easing::Linear)
    }
}

impl AnimationEngine {
    pub fn new(increment: f32, easing: Easing) -> Self {
        Self {
            increment: increment.max(f32::EPSILON),
            easing,
            singular: true,
            interrupt: true,
            instances: SmallVec::new(),
        }
    }

    /// Hover fade used by chrome boxes and buttons.
    pub fn hover() -> Self {
        Self::new(0.1, Easing::EaseInOut)
    }

    /// Selected-tab slide and page transition.
    pub fn page_transition() -> Self {
        Self::new(0.07, Easing::EaseOut)
    }

    /// Concurrent click ripples; every start adds an instance.
    pub fn ripple() -> Self {
        Self::new(0.04, Easing::EaseOut).singular(false)
    }

    pub fn singular(mut self, singular: bool) -> Self {
        self.singular = singular;
        self
    }

    pub fn interrupt(mut self, interrupt: bool) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn start(&mut self, direction: Direction) {
        self.start_at(direction, Point::ZERO);
    }

    /// Starts (or redirects) an animation originating at `origin`.
    pub fn start_at(&mut self, direction: Direction, origin: Point) {
        if self.is_running() && !self.interrupt {
            log::trace!("animation start ignored: running and not interruptible");
            return;
        }
        if !self.singular {
            self.instances.push(AnimationInstance::new(direction, origin));
            return;
        }
        match self.instances.first_mut() {
            Some(inst) if inst.running => {
                inst.direction = direction;
                inst.origin = origin;
            }
            Some(inst) => *inst = AnimationInstance::new(direction, origin),
            None => self
                .instances
                .push(AnimationInstance::new(direction, origin)),
        }
    }

    /// Advances every running instance by one increment.
    pub fn tick(&mut self) -> AnimationTick {
        if !self.is_running() {
            return AnimationTick::Idle;
        }
        let increment = self.increment;
        let mut finished = false;
        for inst in self.instances.iter_mut().filter(|i| i.running) {
            finished |= inst.step(increment);
        }
        if !self.singular {
            self.instances.retain(|i| i.running);
        }
        if self.is_running() {
            AnimationTick::Progressed
        } else if finished {
            AnimationTick::Finished
        } else {
            AnimationTick::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.instances.iter().any(|i| i.running)
    }

    pub fn count(&self) -> usize {
        self.instances.len()
    }

    /// Eased progress of the primary instance; 0 before the first start.
    pub fn progress(&self) -> f32 {
        self.progress_at(0)
    }

    pub fn progress_at(&self, index: usize) -> f32 {
        self.instances
            .get(index)
            .map(|i| self.easing.interpolate(i.value))
            .unwrap_or(0.0)
    }

    pub fn origin_at(&self, index: usize) -> Option<Point> {
        self.instances.get(index).map(|i| i.origin)
    }

    pub fn direction(&self) -> Option<Direction> {
        self.instances.first().map(|i| i.direction)
    }

    pub fn direction_at(&self, index: usize) -> Option<Direction> {
        self.instances.get(index).map(|i| i.direction)
    }

    /// Jumps the primary instance to `value` and stops it.
    pub fn set_progress(&mut self, value: f32) {
        let value = value.clamp(0.0, 1.0);
        match self.instances.first_mut() {
            Some(inst) => {
                inst.value = value;
                inst.running = false;
            }
            None => self.instances.push(AnimationInstance {
                direction: Direction::In,
                value,
                origin: Point::ZERO,
                running: false,
            }),
        }
        if !self.singular {
            self.instances.truncate(1);
        }
    }

    /// Stops and forgets every instance.
    pub fn reset(&mut self) {
        self.instances.clear();
    }
}
