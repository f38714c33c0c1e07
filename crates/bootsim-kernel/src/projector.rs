//! Derived state projection.
//!
//! Maps `(stage, mode)` to the closed flag set, a status label, and an
//! illustrative register/memory snapshot. Everything here is a pure function:
//! the same inputs always produce identical output, which is what lets a
//! scrubbed timeline re-display a previously seen frame exactly.

use bootsim_types::{BootMode, BootStatus, Severity, StageIndex};
use serde::Serialize;

/// Stage thresholds at which each module becomes active.
pub mod thresholds {
    use bootsim_types::StageIndex;

    pub const ROM_ACTIVE: StageIndex = StageIndex::new(1);
    pub const KEY_LOADED: StageIndex = StageIndex::new(2);
    pub const FLASH_ACTIVE: StageIndex = StageIndex::new(3);
    pub const CRYPTO_FIRST: StageIndex = StageIndex::new(4);
    pub const CRYPTO_LAST: StageIndex = StageIndex::new(5);
    /// First stage at which a tampered image is detected.
    pub const TAMPER_DETECTED: StageIndex = StageIndex::new(5);
    pub const CPU_ACTIVE: StageIndex = StageIndex::new(6);
    /// First stage at which a tampered boot falls back to safe mode.
    pub const SAFE_MODE: StageIndex = StageIndex::new(6);
}

// ============================================================================
// Flags
// ============================================================================

/// Closed set of boolean activation flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DerivedFlags {
    pub power_good: bool,
    pub rom_active: bool,
    pub key_loaded: bool,
    pub crypto_active: bool,
    pub flash_active: bool,
    pub cpu_active: bool,
    pub tamper_detected: bool,
    pub safe_mode: bool,
    pub boot_complete: bool,
}

impl DerivedFlags {
    /// Computes flags for `stage` under `mode`.
    ///
    /// `terminal` is the catalog's one-past-the-end position.
    pub fn derive(stage: StageIndex, mode: BootMode, terminal: StageIndex) -> Self {
        use thresholds as t;

        let tamper_detected = mode.is_tampered() && stage >= t::TAMPER_DETECTED;

        Self {
            // Stage 0 already implies power is applied.
            power_good: true,
            rom_active: stage >= t::ROM_ACTIVE,
            key_loaded: stage >= t::KEY_LOADED,
            crypto_active: (t::CRYPTO_FIRST..=t::CRYPTO_LAST).contains(&stage),
            flash_active: stage >= t::FLASH_ACTIVE,
            cpu_active: stage >= t::CPU_ACTIVE,
            tamper_detected,
            safe_mode: tamper_detected && stage >= t::SAFE_MODE,
            boot_complete: mode == BootMode::Normal && stage >= terminal,
        }
    }

    /// Named view over every flag, in display order.
    pub fn entries(&self) -> [(&'static str, bool); 9] {
        [
            ("powerGood", self.power_good),
            ("romActive", self.rom_active),
            ("keyLoaded", self.key_loaded),
            ("cryptoActive", self.crypto_active),
            ("flashActive", self.flash_active),
            ("cpuActive", self.cpu_active),
            ("tamperDetected", self.tamper_detected),
            ("safeMode", self.safe_mode),
            ("bootComplete", self.boot_complete),
        ]
    }

    /// Packs the flags into a bitmask, bit 0 = `power_good`.
    pub fn bits(&self) -> u32 {
        self.entries()
            .iter()
            .enumerate()
            .fold(0, |acc, (bit, (_, set))| acc | (u32::from(*set) << bit))
    }
}

// ============================================================================
// Status Label
// ============================================================================

/// Human-readable boot status derived from the flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusLabel {
    SafeMode,
    BootSuccess,
    BootFailed,
    Booting,
}

impl StatusLabel {
    /// Classifies `flags`.
    ///
    /// Safe mode is checked first because it overrides a simultaneous
    /// "failed" classification.
    pub fn classify(flags: &DerivedFlags, stage: StageIndex, mode: BootMode) -> Self {
        if flags.safe_mode || (mode.is_tampered() && stage >= thresholds::SAFE_MODE) {
            StatusLabel::SafeMode
        } else if flags.boot_complete {
            StatusLabel::BootSuccess
        } else if flags.tamper_detected {
            StatusLabel::BootFailed
        } else {
            StatusLabel::Booting
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            StatusLabel::SafeMode => "SAFE MODE",
            StatusLabel::BootSuccess => "BOOT SUCCESS",
            StatusLabel::BootFailed => "BOOT FAILED",
            StatusLabel::Booting => "BOOTING...",
        }
    }

    pub fn detail(self) -> &'static str {
        match self {
            StatusLabel::SafeMode => {
                "Tampered image detected - running in safe mode with limited functionality"
            }
            StatusLabel::BootSuccess => "All verification stages completed successfully",
            StatusLabel::BootFailed => "Signature mismatch - tampering detected",
            StatusLabel::Booting => "Secure boot process in progress",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            StatusLabel::SafeMode => Severity::Warning,
            StatusLabel::BootSuccess => Severity::Success,
            StatusLabel::BootFailed => Severity::Critical,
            StatusLabel::Booting => Severity::Info,
        }
    }

    pub fn boot_status(self) -> BootStatus {
        match self {
            StatusLabel::SafeMode | StatusLabel::BootFailed => BootStatus::Failed,
            StatusLabel::BootSuccess => BootStatus::Success,
            StatusLabel::Booting => BootStatus::Booting,
        }
    }
}

// ============================================================================
// Registers & Memory
// ============================================================================

/// Reset vector; the PC value before the Boot ROM starts.
pub const RESET_VECTOR: u32 = 0x0000_0000;
/// Where the Boot ROM jumps once safe mode is entered.
pub const RECOVERY_VECTOR: u32 = 0x0000_F000;
/// Entry point of the verified OS image.
pub const KERNEL_ENTRY: u32 = 0x8000_0000;

pub const HASH_NOT_RUN: u32 = 0x0;
pub const HASH_MATCH: u32 = 0x1;
pub const HASH_MISMATCH: u32 = 0x2;

const STAGE_PC: [u32; 7] = [
    RESET_VECTOR,
    0x0000_0100,
    0x0000_0420,
    0x0000_0A00,
    0x0000_1400,
    0x0000_1C00,
    KERNEL_ENTRY,
];

const SRAM_TOP: u32 = 0x2000_8000;
const KERNEL_STACK: u32 = 0x8080_0000;
const KEY_SLOT_ROOT: u32 = 0x0000_0001;

/// Illustrative CPU register file. Display only; no hardware semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Registers {
    pub pc: u32,
    pub sp: u32,
    /// Flag bitmask, see [`DerivedFlags::bits`].
    pub ctrl: u32,
    pub status: u32,
    pub key_slot: u32,
    pub hash_result: u32,
}

impl Registers {
    fn derive(stage: StageIndex, mode: BootMode, flags: &DerivedFlags, label: StatusLabel) -> Self {
        let pc = if flags.safe_mode {
            RECOVERY_VECTOR
        } else {
            let last = STAGE_PC.len() - 1;
            STAGE_PC[stage.as_usize().min(last)]
        };

        let sp = if !flags.rom_active {
            0
        } else if flags.cpu_active && !mode.is_tampered() {
            KERNEL_STACK
        } else {
            SRAM_TOP
        };

        let status = match label {
            StatusLabel::Booting => 0x0000_0001,
            StatusLabel::BootSuccess => 0x0000_0002,
            StatusLabel::BootFailed => 0xE000_0001,
            StatusLabel::SafeMode => 0xE000_0002,
        };

        let hash_result = if stage < thresholds::TAMPER_DETECTED {
            HASH_NOT_RUN
        } else if mode.is_tampered() {
            HASH_MISMATCH
        } else {
            HASH_MATCH
        };

        Self {
            pc,
            sp,
            ctrl: flags.bits(),
            status,
            key_slot: if flags.key_loaded { KEY_SLOT_ROOT } else { 0 },
            hash_result,
        }
    }

    /// Named view over every register, in display order.
    pub fn entries(&self) -> [(&'static str, u32); 6] {
        [
            ("PC", self.pc),
            ("SP", self.sp),
            ("CTRL", self.ctrl),
            ("STATUS", self.status),
            ("KEY_SLOT", self.key_slot),
            ("HASH_RESULT", self.hash_result),
        ]
    }
}

/// An illustrative memory region visible at the current stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MemoryRegion {
    pub address: u32,
    pub label: &'static str,
    pub bytes: Vec<u8>,
}

const ROM_HEADER: [u8; 8] = *b"BROM\x01\x00\x00\x00";
const OTP_KEY_HASH: [u8; 16] = [
    0x3a, 0x7f, 0x12, 0xc4, 0x9e, 0x55, 0x08, 0xd1, 0x6b, 0x22, 0xf0, 0x4e, 0x81, 0x9c, 0x37, 0xa5,
];
const FSBL_IMAGE: [u8; 16] = [
    0x46, 0x53, 0x42, 0x4c, 0x01, 0x00, 0x00, 0x00, 0x00, 0x40, 0x00, 0x20, 0xe5, 0x1f, 0xf0, 0x04,
];
const FSBL_SIGNATURE: [u8; 16] = [
    0x30, 0x45, 0x02, 0x21, 0x00, 0xb3, 0x8e, 0x71, 0x4d, 0x0c, 0x92, 0xaf, 0x16, 0x5e, 0xe8, 0x2b,
];
const KERNEL_HEADER: [u8; 8] = *b"\x7fOSK\x02\x01\x00\x00";
/// Byte offset flipped in the FSBL image when tampered.
const TAMPER_OFFSET: usize = 12;

fn derive_memory(stage: StageIndex, mode: BootMode, flags: &DerivedFlags) -> Vec<MemoryRegion> {
    let mut regions = Vec::new();

    if flags.rom_active {
        regions.push(MemoryRegion {
            address: 0x0000_0000,
            label: "boot-rom-header",
            bytes: ROM_HEADER.to_vec(),
        });
    }

    if flags.key_loaded {
        regions.push(MemoryRegion {
            address: 0x1000_0000,
            label: "otp-key-hash",
            bytes: OTP_KEY_HASH.to_vec(),
        });
    }

    if flags.flash_active {
        let mut image = FSBL_IMAGE.to_vec();
        if mode.is_tampered() {
            image[TAMPER_OFFSET] ^= 0xFF;
        }
        regions.push(MemoryRegion {
            address: 0x2000_0000,
            label: "fsbl-image",
            bytes: image,
        });
        regions.push(MemoryRegion {
            address: 0x2000_4000,
            label: "fsbl-signature",
            bytes: FSBL_SIGNATURE.to_vec(),
        });
    }

    // A tampered chain never loads the kernel.
    if stage >= thresholds::CPU_ACTIVE && !mode.is_tampered() {
        regions.push(MemoryRegion {
            address: KERNEL_ENTRY,
            label: "kernel-entry",
            bytes: KERNEL_HEADER.to_vec(),
        });
    }

    regions
}

/// Formats a register value as `0x` followed by eight upper-case hex digits.
pub fn format_hex(value: u32) -> String {
    format!("0x{value:08X}")
}

/// Formats up to 16 bytes as space-separated hex, with an ellipsis past that.
pub fn format_bytes(bytes: &[u8]) -> String {
    let shown: Vec<String> = bytes.iter().take(16).map(|b| format!("{b:02x}")).collect();
    let mut out = shown.join(" ");
    if bytes.len() > 16 {
        out.push_str("...");
    }
    out
}

// ============================================================================
// Projection
// ============================================================================

/// Everything the presentation layer derives from `(stage, mode)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Projection {
    pub stage: StageIndex,
    pub mode: BootMode,
    pub flags: DerivedFlags,
    pub label: StatusLabel,
    pub registers: Registers,
    pub memory: Vec<MemoryRegion>,
}

impl Projection {
    /// The boot status implied by the label.
    pub fn boot_status(&self) -> BootStatus {
        self.label.boot_status()
    }
}

/// Projects `(stage, mode)` onto flags, label, registers and memory.
pub fn project(stage: StageIndex, mode: BootMode, terminal: StageIndex) -> Projection {
    debug_assert!(stage <= terminal, "stage {stage} beyond terminal {terminal}");

    let flags = DerivedFlags::derive(stage, mode, terminal);
    let label = StatusLabel::classify(&flags, stage, mode);
    let registers = Registers::derive(stage, mode, &flags, label);
    let memory = derive_memory(stage, mode, &flags);

    Projection {
        stage,
        mode,
        flags,
        label,
        registers,
        memory,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const TERMINAL: StageIndex = StageIndex::new(7);

    fn flags(stage: u32, mode: BootMode) -> DerivedFlags {
        DerivedFlags::derive(StageIndex::new(stage), mode, TERMINAL)
    }

    #[test_case(0 => (true, false, false, false, false, false) ; "stage 0 power only")]
    #[test_case(1 => (true, true, false, false, false, false) ; "stage 1 rom")]
    #[test_case(2 => (true, true, true, false, false, false) ; "stage 2 key")]
    #[test_case(3 => (true, true, true, false, true, false) ; "stage 3 flash")]
    #[test_case(4 => (true, true, true, true, true, false) ; "stage 4 crypto")]
    #[test_case(5 => (true, true, true, true, true, false) ; "stage 5 crypto still active")]
    #[test_case(6 => (true, true, true, false, true, true) ; "stage 6 cpu")]
    #[test_case(7 => (true, true, true, false, true, true) ; "complete")]
    fn module_activation_thresholds(stage: u32) -> (bool, bool, bool, bool, bool, bool) {
        let f = flags(stage, BootMode::Normal);
        (
            f.power_good,
            f.rom_active,
            f.key_loaded,
            f.crypto_active,
            f.flash_active,
            f.cpu_active,
        )
    }

    #[test_case(4 => (false, false) ; "before detection")]
    #[test_case(5 => (true, false) ; "detected")]
    #[test_case(6 => (true, true) ; "safe mode")]
    #[test_case(7 => (true, true) ; "terminal stays safe")]
    fn tamper_thresholds(stage: u32) -> (bool, bool) {
        let f = flags(stage, BootMode::Tampered);
        (f.tamper_detected, f.safe_mode)
    }

    #[test]
    fn normal_mode_never_detects_tampering() {
        for stage in 0..=7 {
            let f = flags(stage, BootMode::Normal);
            assert!(!f.tamper_detected);
            assert!(!f.safe_mode);
        }
    }

    #[test]
    fn boot_complete_only_in_normal_mode_at_terminal() {
        assert!(!flags(6, BootMode::Normal).boot_complete);
        assert!(flags(7, BootMode::Normal).boot_complete);
        assert!(!flags(7, BootMode::Tampered).boot_complete);
    }

    #[test_case(BootMode::Normal, 0 => StatusLabel::Booting ; "normal start")]
    #[test_case(BootMode::Normal, 6 => StatusLabel::Booting ; "normal handoff")]
    #[test_case(BootMode::Normal, 7 => StatusLabel::BootSuccess ; "normal complete")]
    #[test_case(BootMode::Tampered, 4 => StatusLabel::Booting ; "tampered before detection")]
    #[test_case(BootMode::Tampered, 5 => StatusLabel::BootFailed ; "tampered detected")]
    #[test_case(BootMode::Tampered, 6 => StatusLabel::SafeMode ; "tampered safe mode")]
    #[test_case(BootMode::Tampered, 7 => StatusLabel::SafeMode ; "tampered complete")]
    fn status_label_priority(mode: BootMode, stage: u32) -> StatusLabel {
        project(StageIndex::new(stage), mode, TERMINAL).label
    }

    #[test]
    fn safe_mode_label_renders_text_and_maps_to_failed() {
        let p = project(StageIndex::new(6), BootMode::Tampered, TERMINAL);
        assert_eq!(p.label.text(), "SAFE MODE");
        assert_eq!(p.boot_status(), BootStatus::Failed);
        assert_eq!(p.label.severity(), Severity::Warning);
    }

    #[test]
    fn flag_bits_follow_entry_order() {
        let f = flags(0, BootMode::Normal);
        assert_eq!(f.bits(), 0b1);
        let f = flags(7, BootMode::Normal);
        // power, rom, key, flash, cpu, complete
        assert_eq!(f.bits(), 0b1_0011_0111);
    }

    #[test]
    fn safe_mode_moves_pc_to_recovery_vector() {
        let p = project(StageIndex::new(6), BootMode::Tampered, TERMINAL);
        assert_eq!(p.registers.pc, RECOVERY_VECTOR);
        assert_eq!(p.registers.hash_result, HASH_MISMATCH);

        let p = project(StageIndex::new(6), BootMode::Normal, TERMINAL);
        assert_eq!(p.registers.pc, KERNEL_ENTRY);
        assert_eq!(p.registers.hash_result, HASH_MATCH);
    }

    #[test]
    fn tampered_image_differs_from_genuine() {
        let normal = project(StageIndex::new(3), BootMode::Normal, TERMINAL);
        let tampered = project(StageIndex::new(3), BootMode::Tampered, TERMINAL);

        let image = |p: &Projection| {
            p.memory
                .iter()
                .find(|r| r.label == "fsbl-image")
                .map(|r| r.bytes.clone())
                .unwrap()
        };
        assert_ne!(image(&normal), image(&tampered));
    }

    #[test]
    fn kernel_region_only_loaded_on_genuine_boot() {
        let has_kernel = |mode| {
            project(StageIndex::new(6), mode, TERMINAL)
                .memory
                .iter()
                .any(|r| r.address == KERNEL_ENTRY)
        };
        assert!(has_kernel(BootMode::Normal));
        assert!(!has_kernel(BootMode::Tampered));
    }

    #[test]
    fn memory_grows_with_stage() {
        let counts: Vec<usize> = (0..=7)
            .map(|s| {
                project(StageIndex::new(s), BootMode::Normal, TERMINAL)
                    .memory
                    .len()
            })
            .collect();
        assert_eq!(counts, vec![0, 1, 2, 4, 4, 4, 5, 5]);
    }

    #[test]
    fn hex_formatting() {
        assert_eq!(format_hex(0x1C00), "0x00001C00");
        assert_eq!(format_bytes(&[0xde, 0xad]), "de ad");
        assert_eq!(format_bytes(&[0u8; 17]).matches("00").count(), 16);
        assert!(format_bytes(&[0u8; 17]).ends_with("..."));
    }
}
