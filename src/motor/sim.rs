// Simulated wheel motor
//
// Tracks its target with the same speed-dependent acceleration limit the
// kinematics solver assumes, so a drive running on simulated motors behaves
// like one whose wheels never slip.

use std::f64::consts::PI;
use std::fmt;
use std::time::Duration;

use tracing::trace;

use super::Motor;
use super::kinematics::Wheel;
use crate::config::DriveConfig;

pub struct SimMotor {
    name: &'static str,
    circumference: f64,
    max_speed: f64,
    max_acceleration_from_stop: f64,
    velocity: f64,
    target: Option<f64>,
}

impl SimMotor {
    /// Create a motor at rest for one wheel of the base
    pub fn new(wheel: Wheel, config: &DriveConfig) -> Self {
        Self {
            name: wheel.name(),
            circumference: config.wheel_diameters[wheel.index()] * PI,
            max_speed: config.max_wheel_speed,
            max_acceleration_from_stop: config.max_wheel_acceleration_from_stop,
            velocity: 0.0,
            target: None,
        }
    }

    /// One motor per wheel, ordered like [`Wheel::ALL`]
    pub fn for_base(config: &DriveConfig) -> [Self; 4] {
        Wheel::ALL.map(|wheel| Self::new(wheel, config))
    }

    /// Start from a given velocity instead of rest
    pub fn with_velocity(mut self, velocity: f64) -> Self {
        self.velocity = velocity;
        self
    }

    /// Wheel revolutions per second at the current velocity
    pub fn revolutions_per_second(&self) -> f64 {
        self.velocity / self.circumference
    }
}

impl Motor for SimMotor {
    fn velocity(&self) -> f64 {
        self.velocity
    }

    fn target_velocity(&self) -> f64 {
        self.target.unwrap_or(0.0)
    }

    fn is_target_velocity_set(&self) -> bool {
        self.target.is_some()
    }

    fn set_target_velocity(&mut self, velocity: f64) {
        self.target = Some(velocity);
    }

    fn update(&mut self, dt: Duration) {
        let Some(target) = self.target else {
            return;
        };

        let dt = dt.as_secs_f64();
        let speed_fraction = self.velocity / self.max_speed;
        let min_velocity =
            self.velocity - self.max_acceleration_from_stop * (1.0 + speed_fraction) * dt;
        let max_velocity =
            self.velocity + self.max_acceleration_from_stop * (1.0 - speed_fraction) * dt;

        self.velocity = target
            .clamp(min_velocity.min(max_velocity), max_velocity.max(min_velocity))
            .clamp(-self.max_speed, self.max_speed);
        trace!("{}: velocity={:.3} target={:.3}", self.name, self.velocity, target);
    }
}

impl fmt::Display for SimMotor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[target_set={} target={:.2} velocity={:.2} rps={:.2}]",
            self.name,
            self.is_target_velocity_set(),
            self.target_velocity(),
            self.velocity,
            self.revolutions_per_second()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DT: Duration = Duration::from_millis(20);

    fn motor() -> SimMotor {
        SimMotor::new(Wheel::FrontRight, &DriveConfig::default())
    }

    #[test]
    fn test_idle_without_target() {
        let mut m = motor().with_velocity(5.0);
        m.update(DT);
        assert_eq!(m.velocity(), 5.0);
        assert!(!m.is_target_velocity_set());
        assert_eq!(m.target_velocity(), 0.0);
    }

    #[test]
    fn test_acceleration_is_limited() {
        let mut m = motor();
        m.set_target_velocity(30.0);
        m.update(DT);
        // 100 * 0.02 from rest
        assert_relative_eq!(m.velocity(), 2.0, epsilon = 1e-9);
        assert!(m.is_target_velocity_set());
        assert_eq!(m.target_velocity(), 30.0);
    }

    #[test]
    fn test_reaches_reachable_target() {
        let mut m = motor();
        m.set_target_velocity(-1.5);
        m.update(DT);
        assert_eq!(m.velocity(), -1.5);
    }

    #[test]
    fn test_never_exceeds_max_speed() {
        let mut m = motor().with_velocity(47.9);
        m.set_target_velocity(100.0);
        for _ in 0..100 {
            m.update(DT);
        }
        assert!(m.velocity() <= 48.0);
    }

    #[test]
    fn test_display() {
        let mut m = motor();
        m.set_target_velocity(1.0);
        m.update(DT);
        let text = m.to_string();
        assert!(text.starts_with("front_right[target_set=true"));
        assert!(text.contains("velocity=1.00"));
    }
}
