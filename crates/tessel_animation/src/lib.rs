//! Tessel Animation
//!
//! Spring physics and the expand/collapse transition used by disclosures.
//!
//! - **Spring Physics**: RK4-integrated springs with stiffness, damping, mass
//! - **Expand Transition**: a normalized 0..1 progress value driven by a
//!   spring, interruptible mid-flight (reversal keeps the current velocity)

pub mod spring;
pub mod transition;

pub use spring::{Spring, SpringConfig};
pub use transition::{ExpandTransition, TransitionPhase};
