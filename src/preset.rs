use crate::{
    error::ServoError,
    types::{Angle, CHANNEL_COUNT, ServoChannel},
};
use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_valid::Validate;
use std::{fmt, fs, path::Path};

/// Named set of target angles for channels 1..=6
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize, Validate)]
pub struct Preset {
    #[validate(min_length = 1)]
    name: String,
    angles: [Angle; CHANNEL_COUNT],
}

impl Preset {
    pub fn new(name: impl Into<String>, angles: [Angle; CHANNEL_COUNT]) -> Self {
        Self {
            name: name.into(),
            angles,
        }
    }

    /// Build a preset from raw degrees, rejecting values above 180
    pub fn from_degrees(
        name: impl Into<String>,
        degrees: [u16; CHANNEL_COUNT],
    ) -> Result<Self, ServoError> {
        let mut angles = [Angle::default(); CHANNEL_COUNT];
        for (angle, degrees) in angles.iter_mut().zip(degrees) {
            *angle = Angle::new(degrees)?;
        }
        Ok(Self::new(name, angles))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn angles(&self) -> &[Angle; CHANNEL_COUNT] {
        &self.angles
    }

    pub fn angle(&self, channel: ServoChannel) -> Angle {
        self.angles[channel.index()]
    }

    /// Channel/angle pairs in the order they are sent
    pub fn steps(&self) -> impl Iterator<Item = (ServoChannel, Angle)> + '_ {
        ServoChannel::all().map(|channel| (channel, self.angle(channel)))
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (", self.name)?;
        for (i, (channel, angle)) in self.steps().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "S{channel}: {angle}")?;
        }
        write!(f, ")")
    }
}

/// Presets shipped with the application
pub fn builtin_presets() -> Vec<Preset> {
    const BUILTIN: [(&str, [u8; CHANNEL_COUNT]); 6] = [
        ("Home Position", [90, 90, 90, 90, 90, 90]),
        ("Arm Extended", [0, 45, 90, 90, 90, 90]),
        ("Arm Retracted", [180, 135, 90, 90, 90, 90]),
        ("Gripper Open", [90, 90, 90, 90, 90, 180]),
        ("Gripper Closed", [90, 90, 90, 90, 90, 0]),
        ("Wave", [90, 45, 45, 90, 90, 90]),
    ];

    BUILTIN
        .iter()
        .map(|(name, degrees)| Preset::new(*name, degrees.map(|d| Angle::clamped(i64::from(d)))))
        .collect()
}

/// Load additional presets from a JSON file
///
/// The file holds an array of `{"name": "...", "angles": [a1, .., a6]}`
/// objects. Every angle must be within `0..=180` and names must not be empty.
pub fn load_presets(path: &Path) -> Result<Vec<Preset>> {
    debug!("loading presets from {}", path.display());

    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read presets file {}", path.display()))?;

    let presets: Vec<Preset> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse presets file {}", path.display()))?;

    for preset in &presets {
        preset
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid preset in {}: {e}", path.display()))?;
    }

    info!("loaded {} presets from {}", presets.len(), path.display());

    Ok(presets)
}

/// Find a preset by 1-based position or case-insensitive name
pub fn find_preset<'a>(presets: &'a [Preset], key: &str) -> Option<&'a Preset> {
    if let Ok(position) = key.parse::<usize>() {
        return position.checked_sub(1).and_then(|i| presets.get(i));
    }

    presets
        .iter()
        .find(|preset| preset.name.eq_ignore_ascii_case(key))
}
