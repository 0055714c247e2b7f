//! Core constants for the fingerprint capture coordination layer.
//!
//! This module defines the stable numeric values shared by every Ridgescan
//! crate: false-acceptance-rate (FAR) presets, enrollment limits, progress
//! wire values and lifecycle timeouts. They mirror the values the capture
//! engine itself uses, so changing them breaks interoperability with real
//! devices.
//!
//! # FAR presets
//!
//! The engine exposes six named sensitivity presets plus a custom escape
//! hatch. Each preset maps to a raw parameter in the `1..=1000` range:
//!
//! | Preset       | Raw value |
//! |--------------|-----------|
//! | Low          | 1         |
//! | Below normal | 95        |
//! | Normal       | 166       |
//! | Above normal | 245       |
//! | High         | 345       |
//! | Max          | 405       |
//!
//! Raw values that fall between presets are reported as the custom level.
//!
//! # Usage
//!
//! ```
//! use ridgescan_core::constants::*;
//!
//! assert_eq!(DEFAULT_FAR_VALUE, FAR_PRESET_NORMAL);
//!
//! fn far_value_is_valid(value: i32) -> bool {
//!     (MIN_FAR_VALUE..=MAX_FAR_VALUE).contains(&value)
//! }
//! assert!(far_value_is_valid(DEFAULT_FAR_VALUE));
//! assert!(!far_value_is_valid(0));
//! ```

// ============================================================================
// False acceptance rate (FAR)
// ============================================================================

/// Raw FAR parameter for the `Low` preset (most strict matching).
pub const FAR_PRESET_LOW: i32 = 1;

/// Raw FAR parameter for the `BelowNormal` preset.
pub const FAR_PRESET_BELOW_NORMAL: i32 = 95;

/// Raw FAR parameter for the `Normal` preset.
///
/// This is the factory default used by every fresh configuration.
pub const FAR_PRESET_NORMAL: i32 = 166;

/// Raw FAR parameter for the `AboveNormal` preset.
pub const FAR_PRESET_ABOVE_NORMAL: i32 = 245;

/// Raw FAR parameter for the `High` preset.
pub const FAR_PRESET_HIGH: i32 = 345;

/// Raw FAR parameter for the `Max` preset (most permissive matching).
pub const FAR_PRESET_MAX: i32 = 405;

/// Smallest raw FAR parameter the engine accepts.
pub const MIN_FAR_VALUE: i32 = 1;

/// Largest raw FAR parameter the engine accepts.
pub const MAX_FAR_VALUE: i32 = 1000;

/// Default raw FAR parameter (the `Normal` preset).
pub const DEFAULT_FAR_VALUE: i32 = FAR_PRESET_NORMAL;

// ============================================================================
// Enrollment
// ============================================================================

/// Minimum number of finger models combined into one enrollment template.
pub const MIN_ENROLLMENT_MODELS: u8 = 1;

/// Maximum number of finger models combined into one enrollment template.
pub const MAX_ENROLLMENT_MODELS: u8 = 10;

/// Default number of finger models per enrollment.
pub const DEFAULT_ENROLLMENT_MODELS: u8 = 5;

// ============================================================================
// Template quality
// ============================================================================

/// Lowest quality score a captured template can carry.
pub const MIN_TEMPLATE_QUALITY: u8 = 1;

/// Highest quality score a captured template can carry.
pub const MAX_TEMPLATE_QUALITY: u8 = 10;

/// Quality placeholder used when the engine reported no score.
pub const QUALITY_NOT_AVAILABLE: u8 = 0;

// ============================================================================
// Identification
// ============================================================================

/// Maximum length in bytes of a caller-supplied identification record key.
pub const MAX_IDENTIFY_KEY_BYTES: usize = 16;

/// Sentinel meaning "no identification limit" (non-trial engine builds).
pub const UNLIMITED_IDENTIFICATIONS: i32 = i32::MAX;

// ============================================================================
// Progress reporting
// ============================================================================

/// Bit set in the progress state mask when a preview frame is attached.
pub const STATE_MASK_FRAME: u8 = 0x01;

/// Bit set in the progress state mask when a scan signal is attached.
pub const STATE_MASK_SIGNAL: u8 = 0x02;

// ============================================================================
// Lifecycle
// ============================================================================

/// How long `dispose` waits for a running operation before abandoning its
/// worker thread, in milliseconds.
pub const DISPOSE_JOIN_TIMEOUT_MS: u64 = 3000;
