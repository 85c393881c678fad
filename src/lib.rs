pub mod config;
pub mod device_client;
pub mod error;
pub mod http_client;
pub mod preset;
pub mod session;
pub mod shell;
pub mod types;

pub use crate::{
    device_client::{DeviceClient, HttpDeviceClient, apply_preset, check_connection},
    error::ServoError,
    preset::Preset,
    session::{Session, SessionView},
    types::{ActiveView, Angle, ConnectionState, DeviceAddress, ServoChannel},
};
