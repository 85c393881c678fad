use crate::error::ServoError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::OnceLock};

/// Number of servo outputs on the controller
pub const CHANNEL_COUNT: usize = 6;

/// Angle every channel starts at
pub const DEFAULT_ANGLE: Angle = Angle(90);

/// Servo output identifier in `1..=6`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ServoChannel(u8);

impl ServoChannel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = CHANNEL_COUNT as u8;

    pub fn new(channel: u8) -> Result<Self, ServoError> {
        if (Self::MIN..=Self::MAX).contains(&channel) {
            Ok(Self(channel))
        } else {
            Err(ServoError::Validation(format!(
                "invalid servo channel {channel}: expected {}..={}",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    /// All channels in ascending order
    pub fn all() -> impl Iterator<Item = ServoChannel> {
        (Self::MIN..=Self::MAX).map(ServoChannel)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Zero-based position in per-channel arrays
    pub fn index(self) -> usize {
        usize::from(self.0 - 1)
    }
}

impl TryFrom<u8> for ServoChannel {
    type Error = ServoError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ServoChannel> for u8 {
    fn from(channel: ServoChannel) -> Self {
        channel.0
    }
}

impl fmt::Display for ServoChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Servo angle in degrees, always within `0..=180`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u8")]
pub struct Angle(u8);

impl Angle {
    pub const MAX: u8 = 180;

    pub fn new(degrees: u16) -> Result<Self, ServoError> {
        match u8::try_from(degrees) {
            Ok(degrees) if degrees <= Self::MAX => Ok(Self(degrees)),
            _ => Err(ServoError::Validation(format!(
                "invalid angle {degrees}: expected 0..={}",
                Self::MAX
            ))),
        }
    }

    /// Clamp arbitrary input into range, the way a slider does
    pub fn clamped(degrees: i64) -> Self {
        Self(degrees.clamp(0, i64::from(Self::MAX)) as u8)
    }

    pub fn degrees(self) -> u8 {
        self.0
    }
}

impl Default for Angle {
    fn default() -> Self {
        DEFAULT_ANGLE
    }
}

impl TryFrom<u16> for Angle {
    type Error = ServoError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Angle> for u8 {
    fn from(angle: Angle) -> Self {
        angle.0
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.0)
    }
}

/// Dotted-quad device address
///
/// Only the shape is checked: four groups of one to three digits. Octets above
/// 255 are accepted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct DeviceAddress(String);

impl DeviceAddress {
    const PATTERN: &str = r"^([0-9]{1,3}\.){3}[0-9]{1,3}$";

    fn pattern() -> &'static Regex {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        PATTERN.get_or_init(|| Regex::new(Self::PATTERN).expect("invalid address pattern"))
    }

    pub fn parse(text: &str) -> Result<Self, ServoError> {
        if text.is_empty() {
            return Err(ServoError::Validation(
                "please enter the device IP address".to_string(),
            ));
        }

        if !Self::pattern().is_match(text) {
            return Err(ServoError::Validation(format!(
                "invalid IP address format: {text}"
            )));
        }

        Ok(Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected(DeviceAddress),
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected(_))
    }
}

/// Screen the user currently looks at
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActiveView {
    #[default]
    Manual,
    Presets,
    Settings,
}

impl std::str::FromStr for ActiveView {
    type Err = ServoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "manual" => Ok(ActiveView::Manual),
            "presets" => Ok(ActiveView::Presets),
            "settings" => Ok(ActiveView::Settings),
            other => Err(ServoError::Validation(format!("unknown view: {other}"))),
        }
    }
}
