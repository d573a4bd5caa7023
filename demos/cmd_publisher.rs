// Scripted command publisher: drives the base through a fixed pattern of moves
// Usage: cargo run --example cmd_publisher -- [speed]
use serde_json::json;
use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::info;

use mecanum_zenoh_runtime::config::{LOOP_HZ, TOPIC_CMD_BASE};

const DEFAULT_SPEED: f64 = 12.0; // in/s
const TURN_RATE: f64 = 45.0; // deg/s
const SEGMENT: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let speed = match std::env::args().nth(1) {
        Some(arg) => arg.parse::<f64>()?,
        None => DEFAULT_SPEED,
    };

    // (x_vel, y_vel, theta_vel, label)
    let pattern = [
        (speed, 0.0, 0.0, "forward"),
        (0.0, speed, 0.0, "strafe left"),
        (-speed, 0.0, 0.0, "backward"),
        (0.0, -speed, 0.0, "strafe right"),
        (speed, speed, 0.0, "diagonal"),
        (0.0, 0.0, TURN_RATE, "turn in place"),
        (speed, 0.0, TURN_RATE, "arc"),
        (0.0, 0.0, 0.0, "stop"),
    ];

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_CMD_BASE).await?;

    let mut tick = interval(Duration::from_millis(1000 / LOOP_HZ));
    for (x_vel, y_vel, theta_vel, label) in pattern {
        info!("{}: x={} y={} theta={}", label, x_vel, y_vel, theta_vel);
        let started = Instant::now();

        // Publish at the loop rate so the runtime watchdog stays fed
        while started.elapsed() < SEGMENT {
            tick.tick().await;
            let cmd = json!({
                "x_vel": x_vel,
                "y_vel": y_vel,
                "theta_vel": theta_vel
            });
            publisher.put(cmd.to_string()).await?;
        }
    }

    info!("Pattern complete");
    Ok(())
}
