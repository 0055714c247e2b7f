use crate::{
    Result,
    constants::{
        DEFAULT_ENROLLMENT_MODELS, DEFAULT_FAR_VALUE, FAR_PRESET_ABOVE_NORMAL,
        FAR_PRESET_BELOW_NORMAL, FAR_PRESET_HIGH, FAR_PRESET_LOW, FAR_PRESET_MAX,
        FAR_PRESET_NORMAL,
    },
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Named false-acceptance-rate sensitivity level.
///
/// Six presets map to fixed raw values (see [`crate::constants`]); `Custom`
/// marks a raw value that matches no preset. `Custom` is a *derived* level:
/// it is reported when a raw value is set directly, never accepted as a
/// level to switch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FarLevel {
    Low,
    BelowNormal,
    Normal,
    AboveNormal,
    High,
    Max,
    Custom,
}

impl FarLevel {
    /// Raw FAR parameter this preset stands for, `None` for `Custom`.
    #[must_use]
    pub fn preset_value(self) -> Option<i32> {
        match self {
            FarLevel::Low => Some(FAR_PRESET_LOW),
            FarLevel::BelowNormal => Some(FAR_PRESET_BELOW_NORMAL),
            FarLevel::Normal => Some(FAR_PRESET_NORMAL),
            FarLevel::AboveNormal => Some(FAR_PRESET_ABOVE_NORMAL),
            FarLevel::High => Some(FAR_PRESET_HIGH),
            FarLevel::Max => Some(FAR_PRESET_MAX),
            FarLevel::Custom => None,
        }
    }

    /// Level a raw FAR value reads back as.
    ///
    /// Values equal to a preset snap to that preset; everything else is
    /// `Custom`. The raw value itself is not range-checked here.
    #[must_use]
    pub fn from_value(value: i32) -> Self {
        match value {
            FAR_PRESET_LOW => FarLevel::Low,
            FAR_PRESET_BELOW_NORMAL => FarLevel::BelowNormal,
            FAR_PRESET_NORMAL => FarLevel::Normal,
            FAR_PRESET_ABOVE_NORMAL => FarLevel::AboveNormal,
            FAR_PRESET_HIGH => FarLevel::High,
            FAR_PRESET_MAX => FarLevel::Max,
            _ => FarLevel::Custom,
        }
    }

    /// Returns `true` for the derived `Custom` marker.
    #[inline]
    #[must_use]
    pub fn is_custom(self) -> bool {
        matches!(self, FarLevel::Custom)
    }
}

impl Default for FarLevel {
    fn default() -> Self {
        FarLevel::Normal
    }
}

impl fmt::Display for FarLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FarLevel::Low => write!(f, "Low"),
            FarLevel::BelowNormal => write!(f, "BelowNormal"),
            FarLevel::Normal => write!(f, "Normal"),
            FarLevel::AboveNormal => write!(f, "AboveNormal"),
            FarLevel::High => write!(f, "High"),
            FarLevel::Max => write!(f, "Max"),
            FarLevel::Custom => write!(f, "Custom"),
        }
    }
}

/// Template format compatibility selector.
///
/// Controls which generation of the engine's template format new templates
/// are written in. `Current` is the default for fresh configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
#[serde(rename_all = "snake_case")]
pub enum VersionCompat {
    /// Previous template format, readable by older engine builds.
    Previous = 1,
    /// Both formats accepted on read, previous format on write.
    Compatible = 2,
    /// Current template format only.
    Current = 3,
}

impl VersionCompat {
    /// Create a version selector from its wire value.
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` if the value is not 1, 2 or 3.
    #[inline]
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            1 => Ok(VersionCompat::Previous),
            2 => Ok(VersionCompat::Compatible),
            3 => Ok(VersionCompat::Current),
            _ => Err(Error::invalid_argument(format!(
                "Invalid version compatibility value: {value}"
            ))),
        }
    }

    /// Wire value of this selector.
    #[inline]
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

impl Default for VersionCompat {
    fn default() -> Self {
        VersionCompat::Current
    }
}

impl fmt::Display for VersionCompat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VersionCompat::Previous => write!(f, "Previous"),
            VersionCompat::Compatible => write!(f, "Compatible"),
            VersionCompat::Current => write!(f, "Current"),
        }
    }
}

/// Frame source selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
#[serde(rename_all = "snake_case")]
pub enum FrameSource {
    /// No source selected; captures fail with `FrameSourceNotSet`.
    Undefined = 0,
    /// The attached USB fingerprint scanner.
    UsbDevice = 1,
}

impl FrameSource {
    /// Create a frame source selector from its wire value.
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` if the value is not 0 or 1.
    #[inline]
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(FrameSource::Undefined),
            1 => Ok(FrameSource::UsbDevice),
            _ => Err(Error::invalid_argument(format!(
                "Invalid frame source value: {value}"
            ))),
        }
    }

    /// Wire value of this selector.
    #[inline]
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

impl Default for FrameSource {
    fn default() -> Self {
        FrameSource::UsbDevice
    }
}

/// Per-operation capture configuration.
///
/// Plain data: range checks live in the session setters so invalid values
/// are rejected before they ever land here. Workers receive a frozen clone
/// of this struct for the duration of one engine call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Reject captures from non-live sources.
    pub fake_detection: bool,
    /// Forward fake-source events to the progress observer.
    ///
    /// Only consulted while `fake_detection` is on.
    pub fake_event_delivery: bool,
    /// Raw FAR parameter, `MIN_FAR_VALUE..=MAX_FAR_VALUE`.
    pub far_value: i32,
    /// Named level the raw FAR parameter corresponds to.
    pub far_level: FarLevel,
    /// Template format compatibility.
    pub version: VersionCompat,
    /// Trade capture fidelity for speed.
    pub fast_mode: bool,
    /// Finger models combined per enrollment, 1..=10.
    pub max_models: u8,
    /// Disable repeated-sample interleaving during enrollment.
    pub miot_control_off: bool,
    /// Where frames come from.
    pub frame_source: FrameSource,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        CaptureConfig {
            fake_detection: false,
            fake_event_delivery: true,
            far_value: DEFAULT_FAR_VALUE,
            far_level: FarLevel::Normal,
            version: VersionCompat::Current,
            fast_mode: false,
            max_models: DEFAULT_ENROLLMENT_MODELS,
            miot_control_off: false,
            frame_source: FrameSource::UsbDevice,
        }
    }
}

impl CaptureConfig {
    /// Returns `true` when fake-source events must reach the observer.
    #[must_use]
    pub fn delivers_fake_events(&self) -> bool {
        self.fake_detection && self.fake_event_delivery
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, FarLevel::Low)]
    #[case(95, FarLevel::BelowNormal)]
    #[case(166, FarLevel::Normal)]
    #[case(245, FarLevel::AboveNormal)]
    #[case(345, FarLevel::High)]
    #[case(405, FarLevel::Max)]
    fn test_far_level_snaps_to_preset(#[case] value: i32, #[case] expected: FarLevel) {
        let level = FarLevel::from_value(value);
        assert_eq!(level, expected);
        assert_eq!(level.preset_value(), Some(value));
    }

    #[rstest]
    #[case(7)]
    #[case(100)]
    #[case(1000)]
    fn test_far_level_off_preset_is_custom(#[case] value: i32) {
        let level = FarLevel::from_value(value);
        assert!(level.is_custom());
        assert_eq!(level.preset_value(), None);
    }

    #[test]
    fn test_version_compat_wire_values() {
        assert_eq!(VersionCompat::from_u8(1).unwrap(), VersionCompat::Previous);
        assert_eq!(
            VersionCompat::from_u8(2).unwrap(),
            VersionCompat::Compatible
        );
        assert_eq!(VersionCompat::from_u8(3).unwrap(), VersionCompat::Current);
        assert!(VersionCompat::from_u8(0).is_err());
        assert!(VersionCompat::from_u8(4).is_err());

        assert_eq!(VersionCompat::Current.to_u8(), 3);
        assert_eq!(VersionCompat::default(), VersionCompat::Current);
    }

    #[test]
    fn test_frame_source_wire_values() {
        assert_eq!(FrameSource::from_u8(0).unwrap(), FrameSource::Undefined);
        assert_eq!(FrameSource::from_u8(1).unwrap(), FrameSource::UsbDevice);
        assert!(FrameSource::from_u8(2).is_err());
        assert_eq!(FrameSource::default().to_u8(), 1);
    }

    #[test]
    fn test_capture_config_defaults() {
        let config = CaptureConfig::default();
        assert!(!config.fake_detection);
        assert!(config.fake_event_delivery);
        assert_eq!(config.far_value, 166);
        assert_eq!(config.far_level, FarLevel::Normal);
        assert_eq!(config.version, VersionCompat::Current);
        assert!(!config.fast_mode);
        assert_eq!(config.max_models, 5);
        assert!(!config.miot_control_off);
        assert_eq!(config.frame_source, FrameSource::UsbDevice);
    }

    #[test]
    fn test_fake_event_delivery_requires_detection() {
        let mut config = CaptureConfig::default();
        assert!(!config.delivers_fake_events());

        config.fake_detection = true;
        assert!(config.delivers_fake_events());

        config.fake_event_delivery = false;
        assert!(!config.delivers_fake_events());
    }
}
