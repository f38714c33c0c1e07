//! The stage catalog.
//!
//! An ordered, immutable list of boot stages. Each stage carries its nominal
//! duration at 1x speed, the instruction shown in debug views, and the
//! verification sub-steps that play out while it is active.
//!
//! The catalog is pure data. It is validated once at construction and never
//! mutated afterwards; sub-step statuses are derived elsewhere (see
//! [`crate::substeps`]).

use bootsim_types::{EntityKind, StageIndex};
use serde::{Deserialize, Serialize};

/// A component referenced by a verification sub-step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub name: String,
}

impl EntityRef {
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// Template for one verification sub-step within a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubStepTemplate {
    pub title: String,
    pub description: String,
    /// The component performing the check.
    pub verifier: EntityRef,
    /// The component being checked.
    pub target: EntityRef,
    /// Whether the target carries a digital signature.
    pub signed: bool,
    pub additional: Vec<EntityRef>,
    /// Whether a tampered image makes this sub-step's target fail.
    pub tamper_sensitive: bool,
}

impl SubStepTemplate {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        verifier: EntityRef,
        target: EntityRef,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            verifier,
            target,
            signed: false,
            additional: Vec::new(),
            tamper_sensitive: false,
        }
    }

    pub fn signed(mut self) -> Self {
        self.signed = true;
        self
    }

    pub fn tamper_sensitive(mut self) -> Self {
        self.tamper_sensitive = true;
        self
    }

    pub fn with_additional(mut self, entity: EntityRef) -> Self {
        self.additional.push(entity);
        self
    }
}

/// One entry in the ordered stage sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDescriptor {
    pub index: StageIndex,
    pub name: String,
    pub description: String,
    /// Instruction shown as "current instruction" in debug views.
    pub instruction: String,
    /// Nominal active time at 1x speed. Always positive.
    pub duration_ms: u64,
    pub sub_steps: Vec<SubStepTemplate>,
}

impl StageDescriptor {
    pub fn new(
        index: u32,
        name: impl Into<String>,
        description: impl Into<String>,
        instruction: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            index: StageIndex::new(index),
            name: name.into(),
            description: description.into(),
            instruction: instruction.into(),
            duration_ms,
            sub_steps: Vec::new(),
        }
    }

    pub fn with_sub_step(mut self, sub_step: SubStepTemplate) -> Self {
        self.sub_steps.push(sub_step);
        self
    }
}

/// Ordered, immutable list of stages.
///
/// Invariants (checked by [`StageCatalog::new`]):
/// - at least one stage
/// - indices are contiguous `0..N`
/// - every duration is positive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageCatalog {
    stages: Vec<StageDescriptor>,
}

impl StageCatalog {
    /// Builds a catalog from caller-supplied stages, validating invariants.
    pub fn new(stages: Vec<StageDescriptor>) -> Result<Self, CatalogError> {
        if stages.is_empty() {
            return Err(CatalogError::Empty);
        }
        if u32::try_from(stages.len()).is_err() {
            return Err(CatalogError::TooManyStages(stages.len()));
        }

        for (position, stage) in stages.iter().enumerate() {
            if stage.index.as_usize() != position {
                return Err(CatalogError::NonContiguousIndex {
                    position,
                    found: stage.index,
                });
            }
            if stage.duration_ms == 0 {
                return Err(CatalogError::ZeroDuration(stage.index));
            }
        }

        Ok(Self { stages })
    }

    /// The canonical secure boot sequence: power-on through OS handoff.
    ///
    /// Seven stages, so the terminal ("complete") position is stage 7.
    pub fn secure_boot() -> Self {
        use EntityKind as K;

        let stages = vec![
            StageDescriptor::new(
                0,
                "Power-On Reset & Root of Trust",
                "The PMU brings the supply rails up. The hardware anchor holds the \
                 immutable public key hash in eFuses; private keys never leave the HSM.",
                "RESET",
                2000,
            )
            .with_sub_step(
                SubStepTemplate::new(
                    "Root of Trust (RoT) Initialization",
                    "Hardware anchor establishes the foundation of trust from keys \
                     burned into OTP memory.",
                    EntityRef::new(K::Hardware, "Hardware Anchor"),
                    EntityRef::new(K::PublicKey, "Public Key"),
                )
                .with_additional(EntityRef::new(K::Hsm, "HSM"))
                .with_additional(EntityRef::new(K::PrivateKey, "Private Key"))
                .with_additional(EntityRef::new(K::Hash, "Key Hash")),
            ),
            StageDescriptor::new(
                1,
                "Boot ROM Execution",
                "Immutable Boot ROM code begins execution from the reset vector.",
                "LDR PC, =rom_entry",
                2000,
            )
            .with_sub_step(SubStepTemplate::new(
                "Boot ROM Self-Test",
                "Boot ROM checks its own integrity and configures the secure SRAM.",
                EntityRef::new(K::BootRom, "Boot ROM"),
                EntityRef::new(K::Hardware, "Secure SRAM"),
            )),
            StageDescriptor::new(
                2,
                "OTP/eFuse Key Load",
                "Boot ROM reads the public key hash from OTP memory into the key slot.",
                "LDR R0, [OTP_KEY_HASH]",
                2000,
            )
            .with_sub_step(
                SubStepTemplate::new(
                    "Public Key Retrieval",
                    "Public key hash is loaded from the hardware anchor into secure registers.",
                    EntityRef::new(K::BootRom, "Boot ROM"),
                    EntityRef::new(K::PublicKey, "OTP Public Key"),
                )
                .with_additional(EntityRef::new(K::Hash, "Key Hash")),
            ),
            StageDescriptor::new(
                3,
                "Bootloader Load from Flash",
                "The first-stage bootloader image and its signature are read from \
                 external flash. The image is untrusted until verified.",
                "BL flash_read",
                3000,
            )
            .with_sub_step(SubStepTemplate::new(
                "Flash Controller Initialization",
                "Flash interface and memory mapping are configured.",
                EntityRef::new(K::BootRom, "Boot ROM"),
                EntityRef::new(K::Hardware, "Flash Controller"),
            ))
            .with_sub_step(SubStepTemplate::new(
                "FSBL Image Read",
                "First-stage bootloader sectors are copied into SRAM.",
                EntityRef::new(K::Hardware, "Flash Controller"),
                EntityRef::new(K::Bootloader1, "1st Stage Bootloader"),
            )),
            StageDescriptor::new(
                4,
                "FSBL Signature Verification",
                "The crypto engine verifies the FSBL signature against the \
                 pre-programmed public key using RSA/ECDSA.",
                "BL crypto_verify",
                3500,
            )
            .with_sub_step(
                SubStepTemplate::new(
                    "Boot ROM Execution & FSBL Verification",
                    "The FSBL digital signature is checked and its hash compared to \
                     ensure integrity and authenticity.",
                    EntityRef::new(K::BootRom, "Boot ROM"),
                    EntityRef::new(K::Bootloader1, "1st Stage Bootloader"),
                )
                .signed()
                .tamper_sensitive()
                .with_additional(EntityRef::new(K::PublicKey, "Public Key"))
                .with_additional(EntityRef::new(K::Hash, "Hash Verify")),
            ),
            StageDescriptor::new(
                5,
                "Chain of Trust Extension",
                "The authenticated FSBL initializes clocks and memory controllers, \
                 then verifies the second-stage bootloader.",
                "BL verify_next_stage",
                3000,
            )
            .with_sub_step(
                SubStepTemplate::new(
                    "FSBL Hardware Initialization & Next-Stage Verification",
                    "FSBL extends the chain of trust to the second-stage bootloader \
                     using its embedded public key.",
                    EntityRef::new(K::Bootloader1, "1st Stage Bootloader"),
                    EntityRef::new(K::Bootloader2, "2nd Stage Bootloader"),
                )
                .signed()
                .tamper_sensitive()
                .with_additional(EntityRef::new(K::Hardware, "Hardware Init"))
                .with_additional(EntityRef::new(K::PublicKey, "FSBL Pub Key")),
            ),
            StageDescriptor::new(
                6,
                "OS Handoff",
                "The OS kernel is verified, MMU and TrustZone are configured, and \
                 control transfers to the verified image.",
                "BX R4",
                4000,
            )
            .with_sub_step(
                SubStepTemplate::new(
                    "Operating System / Application Verification",
                    "The second-stage bootloader verifies the OS image and enables \
                     runtime protection before handoff.",
                    EntityRef::new(K::Bootloader2, "2nd Stage Bootloader"),
                    EntityRef::new(K::Firmware, "Application Firmware"),
                )
                .signed()
                .tamper_sensitive()
                .with_additional(EntityRef::new(K::Mmu, "MMU"))
                .with_additional(EntityRef::new(K::TrustZone, "TrustZone")),
            ),
        ];

        match Self::new(stages) {
            Ok(catalog) => catalog,
            Err(e) => unreachable!("built-in catalog is invalid: {e}"),
        }
    }

    /// Returns the descriptor at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside `0..count()`. Callers must guard with
    /// [`StageCatalog::count`] or use [`StageCatalog::get`].
    pub fn stage_at(&self, index: StageIndex) -> &StageDescriptor {
        assert!(
            index.as_usize() < self.stages.len(),
            "stage index {index} out of range (catalog has {} stages)",
            self.stages.len()
        );
        &self.stages[index.as_usize()]
    }

    /// Returns the descriptor at `index`, if one exists.
    pub fn get(&self, index: StageIndex) -> Option<&StageDescriptor> {
        self.stages.get(index.as_usize())
    }

    /// Number of stages.
    pub fn count(&self) -> u32 {
        // Fits: checked in `new`.
        self.stages.len() as u32
    }

    /// The one-past-the-end position that represents "complete".
    pub fn terminal(&self) -> StageIndex {
        StageIndex::new(self.count())
    }

    /// Index of the last real stage.
    pub fn last(&self) -> StageIndex {
        StageIndex::new(self.count() - 1)
    }

    /// Sum of nominal durations at 1x speed.
    pub fn total_duration_ms(&self) -> u64 {
        self.stages.iter().map(|s| s.duration_ms).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StageDescriptor> {
        self.stages.iter()
    }
}

impl Default for StageCatalog {
    fn default() -> Self {
        Self::secure_boot()
    }
}

/// Errors produced while validating a catalog.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog must contain at least one stage")]
    Empty,

    #[error("catalog has {0} stages, more than a stage index can address")]
    TooManyStages(usize),

    #[error("stage at position {position} has index {found}; indices must be contiguous from 0")]
    NonContiguousIndex { position: usize, found: StageIndex },

    #[error("stage {0} has zero duration")]
    ZeroDuration(StageIndex),
}
