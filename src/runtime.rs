// Fixed-rate drive loop with watchdog
// Note: a watchdog is a safety mechanism that triggers a safe action if something goes wrong
// Eg. without it if teleop crashes and stops sending commands, the base would keep driving
// at the last requested velocity

use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::{info, warn};

use crate::config::{
    CMD_TIMEOUT, ConfigError, DriveConfig, TOPIC_CMD_BASE, TOPIC_DRIVE_STATE, TOPIC_HEALTH,
    TOPIC_RT_WHEELS,
};
use crate::drive::Drive;
use crate::messages::{BaseCommand, DriveTelemetry, RuntimeHealth, WheelActuation};
use crate::motor::{RobotVelocity, SimMotor};

pub struct Runtime {
    drive: Drive<SimMotor>,
    period: Duration,
    latest_cmd: Option<BaseCommand>,
    cmd_received_at: Instant,
    last_tick: Option<Instant>,
    health: RuntimeHealth,
}

impl Runtime {
    pub fn new(config: DriveConfig, loop_hz: u64) -> Result<Self, ConfigError> {
        let motors = SimMotor::for_base(&config);
        Ok(Self {
            drive: Drive::new(config, motors)?,
            period: Duration::from_secs_f64(1.0 / loop_hz.max(1) as f64),
            latest_cmd: None,
            cmd_received_at: Instant::now(),
            last_tick: None,
            health: RuntimeHealth::CmdStale, // Start stale until first cmd
        })
    }

    pub fn health(&self) -> RuntimeHealth {
        self.health
    }

    /// Process incoming command
    fn on_command(&mut self, cmd: BaseCommand) {
        info!("Received command: {:?}", &cmd);
        self.latest_cmd = Some(cmd);
        self.cmd_received_at = Instant::now();
    }

    /// Robot velocity to request this cycle, based on watchdog state
    fn compute_request(&mut self, now: Instant) -> RobotVelocity {
        let cmd_age = now.saturating_duration_since(self.cmd_received_at);

        if cmd_age > CMD_TIMEOUT {
            // Watchdog triggered - bring the robot to a stop
            if self.health != RuntimeHealth::CmdStale {
                warn!("Command stale ({:?} old), stopping robot", cmd_age);
            }
            self.health = RuntimeHealth::CmdStale;
            RobotVelocity::zero()
        } else if let Some(ref cmd) = self.latest_cmd {
            self.health = RuntimeHealth::Ok;
            RobotVelocity::from(cmd)
        } else {
            // No command ever received
            self.health = RuntimeHealth::CmdStale;
            RobotVelocity::zero()
        }
    }

    /// Run one control cycle: solve wheel targets for the current request and update the motors
    fn tick(&mut self, now: Instant) -> (WheelActuation, DriveTelemetry) {
        let dt = match self.last_tick {
            Some(last) if now > last => now - last,
            _ => self.period,
        };
        self.last_tick = Some(now);

        let request = self.compute_request(now);
        let solution = self
            .drive
            .set_target_velocities(request.linear, request.angular, dt);
        self.drive.step(dt);

        (WheelActuation::from(&solution), self.drive.telemetry())
    }
}

pub async fn run(
    config: DriveConfig,
    loop_hz: u64,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut runtime = Runtime::new(config, loop_hz)?;

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let subscriber = session.declare_subscriber(TOPIC_CMD_BASE).await?;
    let pub_wheels = session.declare_publisher(TOPIC_RT_WHEELS).await?;
    let pub_state = session.declare_publisher(TOPIC_DRIVE_STATE).await?;
    let pub_health = session.declare_publisher(TOPIC_HEALTH).await?;

    let mut tick = interval(runtime.period);

    info!(
        "Runtime started: {}Hz loop, {}ms watchdog timeout",
        loop_hz,
        CMD_TIMEOUT.as_millis()
    );
    info!("Subscribed to: {}", TOPIC_CMD_BASE);
    info!(
        "Publishing to: {}, {}, {}",
        TOPIC_RT_WHEELS, TOPIC_DRIVE_STATE, TOPIC_HEALTH
    );

    loop {
        tick.tick().await;

        // 1. Drain all pending commands (non-blocking), keep latest
        while let Ok(Some(sample)) = subscriber.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<BaseCommand>(&payload) {
                Ok(cmd) => {
                    runtime.on_command(cmd);
                }
                Err(e) => {
                    warn!("Failed to parse command: {}", e);
                }
            }
        }

        // 2. Solve wheel targets (includes watchdog logic) and advance the motors
        let (actuation, telemetry) = runtime.tick(Instant::now());

        // 3. Publish wheel targets and drive state
        pub_wheels.put(serde_json::to_string(&actuation)?).await?;
        pub_state.put(serde_json::to_string(&telemetry)?).await?;

        // 4. Publish health
        let health_json = serde_json::to_string(&runtime.health)?;
        pub_health.put(health_json).await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LOOP_HZ;
    use approx::assert_relative_eq;

    fn runtime() -> Runtime {
        Runtime::new(DriveConfig::default(), LOOP_HZ).unwrap()
    }

    fn forward(x_vel: f64) -> BaseCommand {
        BaseCommand {
            x_vel,
            y_vel: 0.0,
            theta_vel: 0.0,
        }
    }

    #[test]
    fn test_stale_until_first_command() {
        let mut rt = runtime();
        let request = rt.compute_request(Instant::now());
        assert_eq!(request, RobotVelocity::zero());
        assert_eq!(rt.health(), RuntimeHealth::CmdStale);
    }

    #[test]
    fn test_fresh_command_is_requested() {
        let mut rt = runtime();
        rt.on_command(forward(12.0));
        let request = rt.compute_request(Instant::now());
        assert_eq!(request, RobotVelocity::new(12.0, 0.0, 0.0));
        assert_eq!(rt.health(), RuntimeHealth::Ok);
    }

    #[test]
    fn test_watchdog_stops_robot() {
        let mut rt = runtime();
        rt.on_command(forward(12.0));
        let later = Instant::now() + CMD_TIMEOUT * 2;
        assert_eq!(rt.compute_request(later), RobotVelocity::zero());
        assert_eq!(rt.health(), RuntimeHealth::CmdStale);
    }

    #[test]
    fn test_tick_limits_first_cycle() {
        let mut rt = runtime();
        rt.on_command(forward(24.0));
        let (actuation, telemetry) = rt.tick(Instant::now());

        // First cycle uses the nominal 20ms period: wheels gain at most 2 from rest
        assert!(actuation.scale < 1.0);
        assert_relative_eq!(actuation.front_right, 2.0, epsilon = 1e-9);
        assert_relative_eq!(actuation.front_left, -2.0, epsilon = 1e-9);
        assert!(telemetry.target_velocities_set);
        assert_relative_eq!(telemetry.velocity[1], 0.0, epsilon = 1e-9);
        assert!(telemetry.velocity[0] > 0.0);
    }

    #[test]
    fn test_ticks_use_elapsed_time() {
        let mut rt = runtime();
        rt.on_command(forward(24.0));
        let start = Instant::now();
        rt.tick(start);
        let (actuation, _) = rt.tick(start + Duration::from_millis(10));

        // 2 from the first cycle plus 10ms of acceleration at ~96/s²
        let accel = 100.0 * (1.0 - 2.0 / 48.0);
        assert_relative_eq!(actuation.front_right, 2.0 + accel * 0.01, epsilon = 1e-9);
    }
}
