//! Spring physics
//!
//! RK4-integrated spring for normalized (0..1) progress values. The settle
//! tolerance is part of the config because a disclosure's progress and a
//! pixel offset need very different thresholds.

/// Physical parameters and settle tolerances of a spring
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringConfig {
    pub stiffness: f32,
    pub damping: f32,
    pub mass: f32,
    /// Distance from target under which the spring may settle
    pub rest_delta: f32,
    /// Speed under which the spring may settle
    pub rest_speed: f32,
}

impl SpringConfig {
    pub fn new(stiffness: f32, damping: f32, mass: f32) -> Self {
        Self {
            stiffness,
            damping,
            mass,
            rest_delta: 0.001,
            rest_speed: 0.01,
        }
    }

    /// A gentle, slow spring
    pub fn gentle() -> Self {
        Self::new(120.0, 14.0, 1.0)
    }

    /// A very stiff spring with minimal oscillation (the disclosure default)
    pub fn snappy() -> Self {
        Self::new(600.0, 40.0, 1.0)
    }

    /// Override the settle tolerances
    pub fn with_rest(mut self, delta: f32, speed: f32) -> Self {
        self.rest_delta = delta;
        self.rest_speed = speed;
        self
    }

    /// Damping relative to critical damping; below 1.0 the spring overshoots
    pub fn damping_ratio(&self) -> f32 {
        self.damping / (2.0 * (self.stiffness * self.mass).sqrt())
    }
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self::snappy()
    }
}

/// Damped spring pulling `value` toward `target`
#[derive(Clone, Copy, Debug)]
pub struct Spring {
    config: SpringConfig,
    value: f32,
    velocity: f32,
    target: f32,
}

impl Spring {
    pub fn new(config: SpringConfig, initial: f32) -> Self {
        Self {
            config,
            value: initial,
            velocity: 0.0,
            target: initial,
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn config(&self) -> SpringConfig {
        self.config
    }

    /// Retarget without touching velocity, so interruptions stay continuous
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Jump straight to `value` and stop
    pub fn snap_to(&mut self, value: f32) {
        self.value = value;
        self.target = value;
        self.velocity = 0.0;
    }

    pub fn is_settled(&self) -> bool {
        (self.value - self.target).abs() < self.config.rest_delta
            && self.velocity.abs() < self.config.rest_speed
    }

    /// Advance the simulation by `dt` seconds (classic RK4)
    pub fn step(&mut self, dt: f32) {
        if self.is_settled() {
            self.snap_to(self.target);
            return;
        }

        let state = (self.value, self.velocity);
        let k1 = self.derivative(state);
        let k2 = self.derivative(nudge(state, k1, dt * 0.5));
        let k3 = self.derivative(nudge(state, k2, dt * 0.5));
        let k4 = self.derivative(nudge(state, k3, dt));

        self.value += dt / 6.0 * (k1.0 + 2.0 * (k2.0 + k3.0) + k4.0);
        self.velocity += dt / 6.0 * (k1.1 + 2.0 * (k2.1 + k3.1) + k4.1);
    }

    /// `(dx/dt, dv/dt)` of the damped spring at `(x, v)`
    fn derivative(&self, (x, v): (f32, f32)) -> (f32, f32) {
        let SpringConfig {
            stiffness,
            damping,
            mass,
            ..
        } = self.config;
        (v, (-stiffness * (x - self.target) - damping * v) / mass)
    }
}

fn nudge((x, v): (f32, f32), (dx, dv): (f32, f32), h: f32) -> (f32, f32) {
    (x + dx * h, v + dv * h)
}
