//! Bridge configuration
//!
//! Settings that shape an export pass: emitted format version, motor
//! defaults, id assignment, and extent handling.

mod manager;

pub use manager::{ConfigError, ConfigManager};

use serde::{Deserialize, Serialize};

/// Scene description format version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum FormatVersion {
    V0_1,
    #[default]
    V0_2,
}

impl FormatVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatVersion::V0_1 => "0.1",
            FormatVersion::V0_2 => "0.2",
        }
    }

    /// Parse a `<version>` value; anything below 0.2 reads as 0.1
    pub fn parse(text: &str) -> Option<Self> {
        let value: f32 = text.trim().parse().ok()?;
        if value < 0.15 {
            Some(FormatVersion::V0_1)
        } else {
            Some(FormatVersion::V0_2)
        }
    }

    /// Whether nodes carry an explicit `<pivot>` and sensors are emitted
    pub fn has_pivot(&self) -> bool {
        *self >= FormatVersion::V0_2
    }
}

impl std::fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default motor parameters for motorized joints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MotorDefaults {
    pub p: f32,
    pub i: f32,
    pub d: f32,
    pub max_velocity: f32,
    pub max_force: f32,
    pub min_value: f32,
    pub max_value: f32,
    /// Engine motor type (1 = PID)
    pub motor_type: u32,
}

impl Default for MotorDefaults {
    fn default() -> Self {
        Self {
            p: 13.0,
            i: 0.015,
            d: 0.0,
            max_velocity: 6.14,
            max_force: 200.0,
            min_value: -6.28,
            max_value: 6.28,
            motor_type: 1,
        }
    }
}

/// Export/import settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    /// Version written by export
    pub format_version: FormatVersion,
    pub motor: MotorDefaults,
    /// Density for bodies with neither mass nor density
    pub default_density: f32,
    /// Allocate missing ids and group ids during export
    pub auto_assign_ids: bool,
    /// Scale bounding-box extents by the object scale
    pub apply_object_scale: bool,
    /// Extension of per-body mesh files
    pub mesh_extension: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            format_version: FormatVersion::default(),
            motor: MotorDefaults::default(),
            default_density: 100.0,
            auto_assign_ids: true,
            apply_object_scale: true,
            mesh_extension: "bobj".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parse() {
        assert_eq!(FormatVersion::parse("0.2"), Some(FormatVersion::V0_2));
        assert_eq!(FormatVersion::parse(" 0.1 "), Some(FormatVersion::V0_1));
        assert_eq!(FormatVersion::parse("0.05"), Some(FormatVersion::V0_1));
        assert_eq!(FormatVersion::parse("0.3"), Some(FormatVersion::V0_2));
        assert_eq!(FormatVersion::parse("abc"), None);
        assert!(!FormatVersion::V0_1.has_pivot());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: BridgeConfig =
            ron::from_str("(format_version: V0_1, motor: (p: 5.0))").unwrap();
        assert_eq!(config.format_version, FormatVersion::V0_1);
        assert_eq!(config.motor.p, 5.0);
        assert_eq!(config.motor.max_force, 200.0);
        assert_eq!(config.default_density, 100.0);
        assert_eq!(config.mesh_extension, "bobj");
    }
}
