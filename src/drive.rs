// Four-wheel mecanum drive
//
// Owns one motor per wheel and the kinematic model. Each control cycle the owner
// calls `set_target_velocities` with a robot-frame request and then `step` to let
// the motors run their own update.

use std::fmt;
use std::time::Duration;

use nalgebra::Vector2;
use tracing::debug;

use crate::config::{ConfigError, DriveConfig};
use crate::messages::DriveTelemetry;
use crate::motor::{Kinematics, Motor, RobotVelocity, Wheel, WheelSet, WheelSolution};

pub struct Drive<M: Motor> {
    kinematics: Kinematics,
    motors: [M; 4], // [front left, front right, back left, back right]
}

impl<M: Motor> Drive<M> {
    pub fn new(config: DriveConfig, motors: [M; 4]) -> Result<Self, ConfigError> {
        Ok(Self {
            kinematics: Kinematics::new(config)?,
            motors,
        })
    }

    pub fn kinematics(&self) -> &Kinematics {
        &self.kinematics
    }

    pub fn motor(&self, wheel: Wheel) -> &M {
        &self.motors[wheel.index()]
    }

    /// Measured wheel velocities
    pub fn wheel_velocities(&self) -> WheelSet {
        WheelSet::from_fn(|wheel| self.motor(wheel).velocity())
    }

    /// Last commanded wheel velocities
    pub fn wheel_target_velocities(&self) -> WheelSet {
        WheelSet::from_fn(|wheel| self.motor(wheel).target_velocity())
    }

    /// Measured robot-frame velocity and angular velocity (deg/s)
    pub fn velocity(&self) -> RobotVelocity {
        self.kinematics
            .wheels_to_robot_velocity(&self.wheel_velocities())
    }

    pub fn angular_velocity(&self) -> f64 {
        self.velocity().angular
    }

    /// Robot-frame motion the current wheel targets would produce
    pub fn target_velocity(&self) -> RobotVelocity {
        self.kinematics
            .wheels_to_robot_velocity(&self.wheel_target_velocities())
    }

    pub fn target_angular_velocity(&self) -> f64 {
        self.target_velocity().angular
    }

    pub fn are_target_velocities_set(&self) -> bool {
        self.motors.iter().all(|m| m.is_target_velocity_set())
    }

    /// Command a robot-frame velocity (x forward, y left) and angular velocity in deg/s.
    ///
    /// If the request is not reachable within `dt`, linear and angular velocity are
    /// scaled down together and the direction of travel is kept.
    pub fn set_target_velocities(
        &mut self,
        velocity: Vector2<f64>,
        angular_velocity: f64,
        dt: Duration,
    ) -> WheelSolution {
        let request = RobotVelocity {
            linear: velocity,
            angular: angular_velocity,
        };
        let solution =
            self.kinematics
                .solve(&request, &self.wheel_velocities(), dt.as_secs_f64());

        for (wheel, target) in solution.targets.iter() {
            self.motors[wheel.index()].set_target_velocity(target);
        }
        debug!(
            "Wheel targets: {:?} (scale {:.3})",
            solution.targets.as_array(),
            solution.scale
        );
        solution
    }

    /// Run one update cycle on every motor
    pub fn step(&mut self, dt: Duration) {
        for motor in &mut self.motors {
            motor.update(dt);
        }
    }

    pub fn telemetry(&self) -> DriveTelemetry {
        let target = self.target_velocity();
        let measured = self.velocity();
        DriveTelemetry {
            target_velocities_set: self.are_target_velocities_set(),
            target_velocity: [target.linear.x, target.linear.y],
            velocity: [measured.linear.x, measured.linear.y],
            target_angular_velocity: target.angular,
            angular_velocity: measured.angular,
            wheel_targets: self.wheel_target_velocities().as_array(),
            wheel_velocities: self.wheel_velocities().as_array(),
        }
    }
}

impl<M: Motor> fmt::Display for Drive<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = self.target_velocity();
        let measured = self.velocity();
        writeln!(f, "targetVelocitiesSet: {}", self.are_target_velocities_set())?;
        writeln!(
            f,
            "targetVelocity: ({:.2}, {:.2})/s",
            target.linear.x, target.linear.y
        )?;
        writeln!(
            f,
            "velocity: ({:.2}, {:.2})/s",
            measured.linear.x, measured.linear.y
        )?;
        writeln!(f, "targetAngularVelocity: {:.0}°/s", target.angular)?;
        writeln!(f, "angularVelocity: {:.0}°/s", measured.angular)?;
        for motor in &self.motors {
            writeln!(f, "{}", motor)?;
        }
        Ok(())
    }
}
