//! # bootsim-types: Core types for the secure boot simulator
//!
//! This crate contains the shared vocabulary used across the workspace:
//! - Stage positions ([`StageIndex`]) and timer identities ([`TimerId`])
//! - Simulation configuration inputs ([`BootMode`], [`Speed`])
//! - Outcome tags ([`BootStatus`], [`Severity`])
//! - Verification entities ([`EntityKind`], [`EntityStatus`])
//!
//! Every type here is a closed set. Consumers match exhaustively instead of
//! probing string keys.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

// ============================================================================
// Stage Index
// ============================================================================

/// Position in the ordered stage sequence.
///
/// Valid stage descriptors live at `0..N`. The value `N` itself (one past
/// the last descriptor) is the "complete" position, so a `StageIndex` on its
/// own does not imply that a descriptor exists at that index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct StageIndex(u32);

impl StageIndex {
    /// The first stage. Power is already applied here.
    pub const ZERO: StageIndex = StageIndex(0);

    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }

    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Returns the following stage, or `None` on overflow.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    /// Returns the preceding stage, or `None` at stage zero.
    pub fn previous(self) -> Option<Self> {
        self.0.checked_sub(1).map(Self)
    }
}

impl Display for StageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for StageIndex {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<StageIndex> for u32 {
    fn from(index: StageIndex) -> Self {
        index.0
    }
}

impl TryFrom<usize> for StageIndex {
    type Error = std::num::TryFromIntError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        u32::try_from(value).map(Self)
    }
}

// ============================================================================
// Timer ID
// ============================================================================

/// Identity of one auto-advance timer arming.
///
/// Allocated monotonically by the kernel. A firing whose ID does not match
/// the currently armed timer is stale and must be ignored.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct TimerId(u64);

impl TimerId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the ID that will be allocated after this one.
    #[must_use]
    pub fn successor(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

// ============================================================================
// Boot Mode
// ============================================================================

/// Whether the simulated firmware image is genuine or has been tampered with.
///
/// Supplied at construction and never mutated by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BootMode {
    #[default]
    Normal,
    Tampered,
}

impl BootMode {
    pub fn is_tampered(self) -> bool {
        matches!(self, BootMode::Tampered)
    }
}

impl Display for BootMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootMode::Normal => write!(f, "normal"),
            BootMode::Tampered => write!(f, "tampered"),
        }
    }
}

impl std::str::FromStr for BootMode {
    type Err = UnknownBootMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(BootMode::Normal),
            "tampered" => Ok(BootMode::Tampered),
            _ => Err(UnknownBootMode(s.to_string())),
        }
    }
}

/// Returned when parsing a [`BootMode`] from an unrecognised string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown boot mode '{0}' (expected 'normal' or 'tampered')")]
pub struct UnknownBootMode(pub String);

// ============================================================================
// Boot Status
// ============================================================================

/// Coarse outcome of a simulation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BootStatus {
    #[default]
    Idle,
    Booting,
    Success,
    Failed,
}

impl BootStatus {
    /// Returns true for the two terminal outcomes.
    pub fn is_terminal(self) -> bool {
        matches!(self, BootStatus::Success | BootStatus::Failed)
    }
}

impl Display for BootStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BootStatus::Idle => "idle",
            BootStatus::Booting => "booting",
            BootStatus::Success => "success",
            BootStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// How alarming a status label is. Drives color choice in front-ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Critical,
}

// ============================================================================
// Speed
// ============================================================================

/// Playback speed multiplier.
///
/// Bounded to `[MIN, MAX]` in increments of `STEP`. Anything else is
/// rejected, never clamped or rounded.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Speed(f64);

impl Speed {
    pub const MIN: f64 = 0.25;
    pub const MAX: f64 = 3.0;
    /// Granularity of the speed control.
    pub const STEP: f64 = 0.25;
    pub const NORMAL: Speed = Speed(1.0);

    pub fn new(multiplier: f64) -> Result<Self, InvalidSpeed> {
        let on_step = (multiplier / Self::STEP).fract().abs() < f64::EPSILON;
        if multiplier.is_finite() && (Self::MIN..=Self::MAX).contains(&multiplier) && on_step {
            Ok(Self(multiplier))
        } else {
            Err(InvalidSpeed(multiplier))
        }
    }

    pub fn as_f64(self) -> f64 {
        self.0
    }

    /// Scales a nominal duration by this multiplier.
    ///
    /// The result is rounded to the nearest millisecond and never zero, so
    /// an armed timer always lies strictly in the future.
    pub fn scale_ms(self, nominal_ms: u64) -> u64 {
        let scaled = (nominal_ms as f64 / self.0).round() as u64;
        scaled.max(1)
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.0)
    }
}

impl TryFrom<f64> for Speed {
    type Error = InvalidSpeed;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Speed::new(value)
    }
}

impl From<Speed> for f64 {
    fn from(speed: Speed) -> Self {
        speed.0
    }
}

/// Returned when a speed multiplier lies outside `[Speed::MIN, Speed::MAX]`
/// or off the `Speed::STEP` grid.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error(
    "speed multiplier {0} outside [{min}, {max}] in steps of {step}",
    min = Speed::MIN,
    max = Speed::MAX,
    step = Speed::STEP
)]
pub struct InvalidSpeed(pub f64);

// ============================================================================
// Verification Entities
// ============================================================================

/// The kind of component taking part in a verification sub-step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    BootRom,
    Bootloader1,
    Bootloader2,
    Firmware,
    Certificate,
    Signature,
    Hardware,
    Hsm,
    PublicKey,
    PrivateKey,
    Hash,
    Mmu,
    TrustZone,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::BootRom => "boot-rom",
            EntityKind::Bootloader1 => "bootloader1",
            EntityKind::Bootloader2 => "bootloader2",
            EntityKind::Firmware => "firmware",
            EntityKind::Certificate => "certificate",
            EntityKind::Signature => "signature",
            EntityKind::Hardware => "hardware",
            EntityKind::Hsm => "hsm",
            EntityKind::PublicKey => "public-key",
            EntityKind::PrivateKey => "private-key",
            EntityKind::Hash => "hash",
            EntityKind::Mmu => "mmu",
            EntityKind::TrustZone => "trust-zone",
        };
        f.write_str(s)
    }
}

/// Verification progress of a single entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EntityStatus {
    #[default]
    Idle,
    Verifying,
    Verified,
    Failed,
}

impl Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityStatus::Idle => "idle",
            EntityStatus::Verifying => "verifying",
            EntityStatus::Verified => "verified",
            EntityStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn stage_index_next_and_previous() {
        let stage = StageIndex::new(3);
        assert_eq!(stage.next(), Some(StageIndex::new(4)));
        assert_eq!(stage.previous(), Some(StageIndex::new(2)));
        assert_eq!(StageIndex::ZERO.previous(), None);
        assert_eq!(StageIndex::new(u32::MAX).next(), None);
    }

    #[test]
    fn boot_mode_parses_case_insensitively() {
        assert_eq!("Tampered".parse::<BootMode>(), Ok(BootMode::Tampered));
        assert_eq!("normal".parse::<BootMode>(), Ok(BootMode::Normal));
        assert!("evil".parse::<BootMode>().is_err());
    }

    #[test_case(0.25 ; "lower bound")]
    #[test_case(1.0 ; "normal")]
    #[test_case(3.0 ; "upper bound")]
    fn speed_accepts_in_range(value: f64) {
        assert_eq!(Speed::new(value).map(Speed::as_f64), Ok(value));
    }

    #[test_case(0.0 ; "zero")]
    #[test_case(-1.0 ; "negative")]
    #[test_case(0.2 ; "below minimum")]
    #[test_case(3.5 ; "above maximum")]
    #[test_case(f64::NAN ; "nan")]
    #[test_case(1.1 ; "off step")]
    #[test_case(2.9 ; "off step near maximum")]
    fn speed_rejects_out_of_range(value: f64) {
        assert!(Speed::new(value).is_err());
    }

    #[test_case(1.0, 2000 => 2000 ; "unity")]
    #[test_case(2.0, 3000 => 1500 ; "double")]
    #[test_case(0.25, 2000 => 8000 ; "quarter")]
    #[test_case(3.0, 1 => 1 ; "never zero")]
    fn speed_scales_durations(multiplier: f64, nominal: u64) -> u64 {
        Speed::new(multiplier).unwrap().scale_ms(nominal)
    }

    #[test]
    fn speed_deserialization_validates() {
        let ok: Speed = serde_json::from_str("1.5").unwrap();
        assert_eq!(ok.as_f64(), 1.5);
        assert!(serde_json::from_str::<Speed>("9.0").is_err());
    }

    #[test]
    fn enums_serialize_kebab_case() {
        assert_eq!(
            serde_json::to_string(&EntityKind::Bootloader1).unwrap(),
            "\"bootloader1\""
        );
        assert_eq!(
            serde_json::to_string(&BootMode::Tampered).unwrap(),
            "\"tampered\""
        );
        assert_eq!(
            serde_json::to_string(&EntityKind::TrustZone).unwrap(),
            "\"trust-zone\""
        );
    }

    #[test]
    fn entity_kind_display_matches_serialized_name() {
        let kinds = [
            EntityKind::BootRom,
            EntityKind::Bootloader1,
            EntityKind::Bootloader2,
            EntityKind::Firmware,
            EntityKind::Certificate,
            EntityKind::Signature,
            EntityKind::Hardware,
            EntityKind::Hsm,
            EntityKind::PublicKey,
            EntityKind::PrivateKey,
            EntityKind::Hash,
            EntityKind::Mmu,
            EntityKind::TrustZone,
        ];
        for kind in kinds {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn speed() -> impl Strategy<Value = Speed> {
            (1u32..=12).prop_map(|q| Speed::new(f64::from(q) * Speed::STEP).unwrap())
        }

        proptest! {
            #[test]
            fn every_step_in_range_is_accepted(q in 1u32..=12) {
                let multiplier = f64::from(q) * Speed::STEP;
                prop_assert_eq!(Speed::new(multiplier).map(Speed::as_f64), Ok(multiplier));
            }

            #[test]
            fn scaled_duration_is_positive_and_inverse_to_speed(
                speed in speed(),
                nominal in 1u64..100_000,
            ) {
                let scaled = speed.scale_ms(nominal);
                prop_assert!(scaled >= 1);
                // Faster never takes longer.
                if speed.as_f64() >= 1.0 {
                    prop_assert!(scaled <= nominal);
                } else {
                    prop_assert!(scaled >= nominal);
                }
            }
        }
    }
}
