// Mecanum kinematics for a 4-wheel base with wheels mounted at 45° on the corners.
// Converts robot-frame velocities (x, y, theta) to wheel surface velocities and back,
// and limits wheel targets to what the wheels can reach in one control cycle.
//
// Two frames are used:
// - robot frame: x forward, y left, angles counter-clockwise
// - wheel-axis frame: robot frame rotated by -45°. Its x axis runs along the
//   front right / back left wheels and its y axis along the front left / back right wheels.

use std::ops::Index;

use nalgebra::Vector2;
use tracing::debug;

use crate::config::{ConfigError, DriveConfig};
use crate::math::{cos_deg, direction_deg, from_radians, rotate_deg, to_radians};

/// Rotation from the wheel-axis frame to the robot frame
const WHEEL_AXIS_ROTATION_DEG: f64 = 45.0;

/// Requested wheel velocities below this fraction of max wheel speed are treated as zero.
/// Rotating a request onto a wheel axis leaves ~1e-15 of noise on the idle wheels.
const ZERO_WHEEL_VELOCITY_FRACTION: f64 = 1e-9;

/// Wheel positions on the base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wheel {
    FrontLeft,
    FrontRight,
    BackLeft,
    BackRight,
}

impl Wheel {
    pub const ALL: [Wheel; 4] = [
        Wheel::FrontLeft,
        Wheel::FrontRight,
        Wheel::BackLeft,
        Wheel::BackRight,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Wheel::FrontLeft => "front_left",
            Wheel::FrontRight => "front_right",
            Wheel::BackLeft => "back_left",
            Wheel::BackRight => "back_right",
        }
    }

    /// Sign with which the (x, y) components of a wheel-axis velocity reach this wheel.
    /// Every wheel receives the tangential (rotation) term with a positive sign.
    fn axis_signs(self) -> (f64, f64) {
        match self {
            Wheel::FrontLeft => (0.0, 1.0),
            Wheel::FrontRight => (1.0, 0.0),
            Wheel::BackLeft => (-1.0, 0.0),
            Wheel::BackRight => (0.0, -1.0),
        }
    }
}

/// One scalar per wheel, ordered [front left, front right, back left, back right].
/// Velocities are wheel surface velocities (distance per second).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WheelSet {
    values: [f64; 4],
}

impl WheelSet {
    pub fn new(front_left: f64, front_right: f64, back_left: f64, back_right: f64) -> Self {
        Self {
            values: [front_left, front_right, back_left, back_right],
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn splat(value: f64) -> Self {
        Self { values: [value; 4] }
    }

    pub fn from_fn(mut f: impl FnMut(Wheel) -> f64) -> Self {
        Self {
            values: Wheel::ALL.map(&mut f),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Wheel, f64)> + '_ {
        Wheel::ALL.into_iter().zip(self.values)
    }

    pub fn map(&self, mut f: impl FnMut(f64) -> f64) -> Self {
        Self {
            values: self.values.map(&mut f),
        }
    }

    /// Returns values as array [front left, front right, back left, back right]
    pub fn as_array(&self) -> [f64; 4] {
        self.values
    }
}

impl Index<Wheel> for WheelSet {
    type Output = f64;

    fn index(&self, wheel: Wheel) -> &f64 {
        &self.values[wheel.index()]
    }
}

/// Robot-frame motion: linear velocity plus angular velocity in deg/s (positive = counter-clockwise)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobotVelocity {
    pub linear: Vector2<f64>,
    pub angular: f64,
}

impl RobotVelocity {
    pub fn new(x: f64, y: f64, angular: f64) -> Self {
        Self {
            linear: Vector2::new(x, y),
            angular,
        }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

impl Default for RobotVelocity {
    fn default() -> Self {
        Self::zero()
    }
}

/// What a single wheel can do within one control cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelEnvelope {
    pub min_acceleration: f64,
    pub max_acceleration: f64,
    pub min_velocity: f64,
    pub max_velocity: f64,
}

impl WheelEnvelope {
    /// Range of fractions `f` for which `f * requested` lies inside the envelope.
    /// A zero request is reachable at any fraction.
    fn fraction_bounds(&self, requested: f64) -> (f64, f64) {
        if requested == 0.0 {
            return (f64::NEG_INFINITY, f64::INFINITY);
        }
        // Dividing by a negative request flips the bounds
        let a = self.min_velocity / requested;
        let b = self.max_velocity / requested;
        (a.min(b), a.max(b))
    }
}

/// Result of one pass of the acceleration-limiting solver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelSolution {
    /// Wheel velocities that would produce the request exactly
    pub requested: WheelSet,
    /// `requested * scale`, the velocities to send to the wheels
    pub targets: WheelSet,
    /// Shared factor applied to every requested wheel velocity
    pub scale: f64,
    /// False when no single scale keeps every wheel inside its envelope
    pub feasible: bool,
}

/// Kinematic model of the base built from a validated [`DriveConfig`]
#[derive(Debug, Clone)]
pub struct Kinematics {
    config: DriveConfig,
}

impl Kinematics {
    pub fn new(config: DriveConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Fraction of a wheel-axis velocity that reaches the ground.
    ///
    /// `rotation` is the direction (degrees) of the velocity in the wheel-axis frame.
    /// Motion along a wheel axis (0°, 90°, 180°, 270°) is driven by only two wheels and
    /// slips the most, giving `1 - slip_fraction`. Motion halfway between the axes
    /// (along the robot's own axes) does not slip, giving 1.0.
    pub fn transfer_fraction(&self, rotation: f64) -> f64 {
        let along_wheel_axis = 0.5 * cos_deg(rotation * 4.0) + 0.5;
        1.0 - along_wheel_axis * self.config.slip_fraction
    }

    /// Transfer fraction for a wheel-axis velocity vector; 1.0 when the vector is zero
    pub fn vector_transfer_fraction(&self, velocity_of_wheel_axes: Vector2<f64>) -> f64 {
        direction_deg(velocity_of_wheel_axes)
            .map(|rotation| self.transfer_fraction(rotation))
            .unwrap_or(1.0)
    }

    /// Convert wheel velocities (measured or targeted) to the robot-frame motion they produce
    pub fn wheels_to_robot_velocity(&self, wheels: &WheelSet) -> RobotVelocity {
        let mut velocity_of_wheel_axes = Vector2::zeros();
        for (wheel, velocity) in wheels.iter() {
            let (x_sign, y_sign) = wheel.axis_signs();
            velocity_of_wheel_axes += Vector2::new(x_sign, y_sign) * (velocity / 2.0);
        }

        // Wheels slip when driving along one of the wheel axes, so less reaches the ground
        velocity_of_wheel_axes *= self.vector_transfer_fraction(velocity_of_wheel_axes);

        let tangential = wheels.as_array().iter().sum::<f64>() / 4.0;

        RobotVelocity {
            linear: rotate_deg(velocity_of_wheel_axes, WHEEL_AXIS_ROTATION_DEG),
            angular: from_radians(tangential / self.config.wheel_base_radius),
        }
    }

    /// Wheel velocities that produce `request` exactly, ignoring acceleration limits.
    /// Idle wheels come out as exactly 0.0 so they never constrain the solver.
    pub fn robot_velocity_to_wheels(&self, request: &RobotVelocity) -> WheelSet {
        let mut velocity_of_wheel_axes = rotate_deg(request.linear, -WHEEL_AXIS_ROTATION_DEG);

        // Ask for more along the wheel axes to make up for the expected slip
        velocity_of_wheel_axes /= self.vector_transfer_fraction(velocity_of_wheel_axes);

        let tangential = to_radians(request.angular) * self.config.wheel_base_radius;

        let zero_below = ZERO_WHEEL_VELOCITY_FRACTION * self.config.max_wheel_speed;
        WheelSet::from_fn(|wheel| {
            let (x_sign, y_sign) = wheel.axis_signs();
            let v =
                tangential + x_sign * velocity_of_wheel_axes.x + y_sign * velocity_of_wheel_axes.y;
            if v.abs() < zero_below { 0.0 } else { v }
        })
    }

    /// Velocities a wheel currently moving at `velocity` can reach after `dt` seconds.
    ///
    /// Acceleration capacity falls off linearly with speed, so a wheel at max speed
    /// can only slow down.
    pub fn envelope(&self, velocity: f64, dt: f64) -> WheelEnvelope {
        let max_accel = self.config.max_wheel_acceleration_from_stop;
        let speed_fraction = velocity / self.config.max_wheel_speed;

        let min_acceleration = -max_accel * (1.0 + speed_fraction);
        let max_acceleration = max_accel * (1.0 - speed_fraction);

        WheelEnvelope {
            min_acceleration,
            max_acceleration,
            min_velocity: velocity + min_acceleration * dt,
            max_velocity: velocity + max_acceleration * dt,
        }
    }

    /// Compute wheel targets for `request`, scaled by a single factor so every wheel stays
    /// within what it can reach in `dt` seconds from `current`.
    ///
    /// One shared scale keeps the direction of travel and the ratio of linear to angular
    /// velocity. When no scale satisfies every wheel, the one closest to 1.0 is used.
    pub fn solve(&self, request: &RobotVelocity, current: &WheelSet, dt: f64) -> WheelSolution {
        let requested = self.robot_velocity_to_wheels(request);

        // Highest lower bound and lowest upper bound across the wheels are the binding ones
        let mut min_fraction = f64::NEG_INFINITY;
        let mut max_fraction = f64::INFINITY;
        for (wheel, requested_velocity) in requested.iter() {
            let envelope = self.envelope(current[wheel], dt);
            let (lo, hi) = envelope.fraction_bounds(requested_velocity);
            min_fraction = min_fraction.max(lo);
            max_fraction = max_fraction.min(hi);
        }

        let scale = resolve_scale(min_fraction, max_fraction);
        if scale != 1.0 {
            debug!(
                "Limiting wheel targets: scale={:.4}, bounds=[{:.4}, {:.4}]",
                scale, min_fraction, max_fraction
            );
        }

        WheelSolution {
            requested,
            targets: requested.map(|v| v * scale),
            scale,
            feasible: min_fraction <= max_fraction,
        }
    }
}

/// Pick the fraction of the request to command given the achievable bounds.
///
/// The bounds may be inverted when the request is infeasible; either way the value
/// closest to 1.0 between them is returned.
fn resolve_scale(min_fraction: f64, max_fraction: f64) -> f64 {
    if min_fraction < 1.0 && max_fraction < 1.0 {
        min_fraction.max(max_fraction)
    } else if min_fraction > 1.0 && max_fraction > 1.0 {
        min_fraction.min(max_fraction)
    } else {
        1.0
    }
}
