use crate::device_client::DEFAULT_DEVICE_PORT;
use anyhow::{Context, Result};
use std::{env, path::PathBuf};

/// Application configuration loaded and validated at startup
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Servo controller configuration
    pub device: DeviceConfig,

    /// Preset catalog configuration
    pub presets: PresetConfig,
}

#[derive(Clone, Debug)]
pub struct DeviceConfig {
    pub port: u16,
    /// Address text to prefill; still has to be confirmed with `connect`
    pub address: Option<String>,
}

#[derive(Clone, Debug)]
pub struct PresetConfig {
    pub file: Option<PathBuf>,
}

impl AppConfig {
    /// Load all configuration from environment variables
    pub fn load() -> Result<Self> {
        let device = DeviceConfig::load()?;
        let presets = PresetConfig::load()?;

        Ok(Self { device, presets })
    }
}

impl DeviceConfig {
    fn load() -> Result<Self> {
        let port = match env::var("SERVO_DEVICE_PORT") {
            Ok(port) => port
                .parse::<u16>()
                .context("failed to parse SERVO_DEVICE_PORT: invalid format")?,
            Err(_) => DEFAULT_DEVICE_PORT,
        };

        let address = env::var("SERVO_DEVICE_ADDRESS")
            .ok()
            .filter(|address| !address.is_empty());

        Ok(Self { port, address })
    }
}

impl PresetConfig {
    fn load() -> Result<Self> {
        let file = env::var("SERVO_PRESETS_FILE").ok().map(PathBuf::from);

        if let Some(file) = &file {
            anyhow::ensure!(
                file.try_exists().unwrap_or(false),
                "failed to find presets file: {}",
                file.display()
            );
        }

        Ok(Self { file })
    }
}
