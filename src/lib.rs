pub mod config;
pub mod drive;
pub mod math;
pub mod messages;
pub mod motor;
pub mod runtime;

pub use config::DriveConfig;
pub use drive::Drive;
