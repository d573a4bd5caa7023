// Define message types for the runtime

use serde::{Deserialize, Serialize};

use crate::motor::{RobotVelocity, WheelSolution};

// Command from teleop/scripts -> runtime
// x forward, y left (distance/s), theta counter-clockwise (deg/s)
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct BaseCommand {
    pub x_vel: f64,
    pub y_vel: f64,
    pub theta_vel: f64,
}

impl From<&BaseCommand> for RobotVelocity {
    fn from(cmd: &BaseCommand) -> Self {
        RobotVelocity::new(cmd.x_vel, cmd.y_vel, cmd.theta_vel)
    }
}

// Wheel targets from runtime -> motor hardware bridge
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct WheelActuation {
    pub front_left: f64,
    pub front_right: f64,
    pub back_left: f64,
    pub back_right: f64,
    /// Fraction of the requested motion that was commanded this cycle
    pub scale: f64,
}

impl From<&WheelSolution> for WheelActuation {
    fn from(solution: &WheelSolution) -> Self {
        let [front_left, front_right, back_left, back_right] = solution.targets.as_array();
        Self {
            front_left,
            front_right,
            back_left,
            back_right,
            scale: solution.scale,
        }
    }
}

/// Drive state published for telemetry
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DriveTelemetry {
    pub target_velocities_set: bool,
    pub target_velocity: [f64; 2],
    pub velocity: [f64; 2],
    pub target_angular_velocity: f64,
    pub angular_velocity: f64,
    pub wheel_targets: [f64; 4],
    pub wheel_velocities: [f64; 4],
}

/// Health status published by runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    CmdStale,
}
