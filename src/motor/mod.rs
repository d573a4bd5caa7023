// Motor control module for the mecanum base
//
// Provides:
// - Mecanum kinematics (robot velocity <-> wheel velocities) with acceleration limiting
// - The `Motor` interface the drive uses to sense and actuate each wheel
// - A simulated motor for running the drive without hardware

pub mod kinematics;
mod sim;

use std::fmt;
use std::time::Duration;

pub use kinematics::{Kinematics, RobotVelocity, Wheel, WheelSet, WheelSolution};
pub use sim::SimMotor;

/// A single wheel motor running its own velocity control.
///
/// Velocities are wheel surface velocities. `Display` gives a one-line diagnostic.
pub trait Motor: fmt::Display {
    /// Current measured velocity
    fn velocity(&self) -> f64;

    /// Last commanded target velocity (0.0 if none)
    fn target_velocity(&self) -> f64;

    fn is_target_velocity_set(&self) -> bool;

    fn set_target_velocity(&mut self, velocity: f64);

    /// Advance the motor's own control loop by one cycle
    fn update(&mut self, dt: Duration);
}
