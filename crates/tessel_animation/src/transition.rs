//! Expand/collapse transition
//!
//! Drives a disclosure's content between collapsed (0.0) and expanded (1.0).
//! The host calls [`ExpandTransition::step`] once per frame; styling layers
//! read [`ExpandTransition::progress`] to scale or clip the content.

use crate::spring::{Spring, SpringConfig};

/// Where a transition currently is
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionPhase {
    Collapsed,
    Expanding,
    Expanded,
    Collapsing,
}

/// Spring-driven expand/collapse progress
#[derive(Clone, Debug)]
pub struct ExpandTransition {
    spring: Spring,
    expanded: bool,
}

impl ExpandTransition {
    /// Create a transition resting in the given state
    pub fn new(expanded: bool) -> Self {
        Self::with_config(expanded, SpringConfig::snappy())
    }

    pub fn with_config(expanded: bool, config: SpringConfig) -> Self {
        let initial = if expanded { 1.0 } else { 0.0 };
        Self {
            spring: Spring::new(config, initial),
            expanded,
        }
    }

    /// Start moving toward expanded or collapsed
    ///
    /// Reversing mid-flight keeps the spring's velocity.
    pub fn set_expanded(&mut self, expanded: bool) {
        if self.expanded == expanded {
            return;
        }
        self.expanded = expanded;
        self.spring.set_target(if expanded { 1.0 } else { 0.0 });
        tracing::trace!(expanded, progress = self.spring.value(), "transition retargeted");
    }

    /// Jump to the resting state without animating
    pub fn finish(&mut self) {
        self.spring.snap_to(if self.expanded { 1.0 } else { 0.0 });
    }

    /// Advance by `dt` seconds; returns true while still moving
    pub fn step(&mut self, dt: f32) -> bool {
        self.spring.step(dt);
        if self.spring.is_settled() {
            self.finish();
            return false;
        }
        true
    }

    /// Progress clamped to 0..1 (the spring may overshoot slightly)
    pub fn progress(&self) -> f32 {
        self.spring.value().clamp(0.0, 1.0)
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn is_running(&self) -> bool {
        !self.spring.is_settled()
    }

    pub fn phase(&self) -> TransitionPhase {
        match (self.expanded, self.is_running()) {
            (true, true) => TransitionPhase::Expanding,
            (true, false) => TransitionPhase::Expanded,
            (false, true) => TransitionPhase::Collapsing,
            (false, false) => TransitionPhase::Collapsed,
        }
    }
}

impl Default for ExpandTransition {
    fn default() -> Self {
        Self::new(false)
    }
}
