//! Sub-step status derivation.
//!
//! Sub-step statuses are never stored. They are recomputed from the current
//! stage and how far playback has progressed within it, so a scrub or reset
//! can never leave a sub-step showing a stale status.
//!
//! Within the active stage the effective span is divided into equal windows,
//! one per sub-step. Each window opens with a short lead-in during which the
//! sub-step is still idle, then verifies, then is verified at the window end.

use bootsim_types::{BootMode, EntityKind, EntityStatus, StageIndex};
use serde::Serialize;

use crate::catalog::{EntityRef, StageCatalog, StageDescriptor, SubStepTemplate};

/// Delay between a sub-step window opening and verification starting.
pub const VERIFY_LEAD_MS: u64 = 100;

/// How far playback has progressed within the active stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct StageProgress {
    /// Time spent in the stage since its timer was armed.
    pub elapsed_ms: u64,
    /// Effective length of the stage at the speed it was armed with.
    pub span_ms: u64,
}

impl StageProgress {
    /// Progress for a stage that is not being timed (paused or scrubbed).
    pub const STILL: StageProgress = StageProgress {
        elapsed_ms: 0,
        span_ms: 0,
    };
}

/// An entity with its derived status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EntityView {
    pub kind: EntityKind,
    pub name: String,
    pub status: EntityStatus,
}

impl EntityView {
    fn of(entity: &EntityRef, status: EntityStatus) -> Self {
        Self {
            kind: entity.kind,
            name: entity.name.clone(),
            status,
        }
    }
}

/// A sub-step with every entity's derived status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SubStepView {
    pub stage: StageIndex,
    pub title: String,
    pub description: String,
    pub verifier: EntityView,
    pub target: EntityView,
    pub signature: Option<EntityStatus>,
    pub additional: Vec<EntityView>,
}

/// Status a sub-step would have if nothing were tampered with.
fn base_status(
    stage: StageIndex,
    position: usize,
    of: usize,
    current: StageIndex,
    progress: StageProgress,
) -> EntityStatus {
    if stage < current {
        return EntityStatus::Verified;
    }
    if stage > current {
        return EntityStatus::Idle;
    }

    let of = of.max(1) as u64;
    let position = position as u64;
    let window_start = progress.span_ms * position / of;
    let window_end = progress.span_ms * (position + 1) / of;

    if progress.elapsed_ms < window_start + VERIFY_LEAD_MS {
        EntityStatus::Idle
    } else if progress.elapsed_ms < window_end {
        EntityStatus::Verifying
    } else {
        EntityStatus::Verified
    }
}

fn view(
    descriptor: &StageDescriptor,
    template: &SubStepTemplate,
    position: usize,
    current: StageIndex,
    progress: StageProgress,
    mode: BootMode,
) -> SubStepView {
    let base = base_status(
        descriptor.index,
        position,
        descriptor.sub_steps.len(),
        current,
        progress,
    );

    // A tampered image passes through the pipeline but fails its check.
    let checked = if mode.is_tampered() && template.tamper_sensitive && base == EntityStatus::Verified
    {
        EntityStatus::Failed
    } else {
        base
    };

    SubStepView {
        stage: descriptor.index,
        title: template.title.clone(),
        description: template.description.clone(),
        verifier: EntityView::of(&template.verifier, base),
        target: EntityView::of(&template.target, checked),
        signature: template.signed.then_some(checked),
        additional: template
            .additional
            .iter()
            .map(|e| EntityView::of(e, base))
            .collect(),
    }
}

/// Derives the sub-step views of one stage.
pub fn stage_sub_steps(
    descriptor: &StageDescriptor,
    current: StageIndex,
    progress: StageProgress,
    mode: BootMode,
) -> Vec<SubStepView> {
    descriptor
        .sub_steps
        .iter()
        .enumerate()
        .map(|(position, template)| view(descriptor, template, position, current, progress, mode))
        .collect()
}

/// Derives the sub-step views of every stage in the catalog.
///
/// `progress` applies to the stage at `current` only.
pub fn all_sub_steps(
    catalog: &StageCatalog,
    current: StageIndex,
    progress: StageProgress,
    mode: BootMode,
) -> Vec<SubStepView> {
    catalog
        .iter()
        .flat_map(|descriptor| stage_sub_steps(descriptor, current, progress, mode))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> StageCatalog {
        StageCatalog::secure_boot()
    }

    fn progress(elapsed_ms: u64, span_ms: u64) -> StageProgress {
        StageProgress {
            elapsed_ms,
            span_ms,
        }
    }

    #[test]
    fn earlier_stages_verified_later_idle() {
        let views = all_sub_steps(
            &catalog(),
            StageIndex::new(3),
            StageProgress::STILL,
            BootMode::Normal,
        );

        for v in &views {
            let expected = match v.stage.as_u32() {
                0..=2 => EntityStatus::Verified,
                _ => EntityStatus::Idle,
            };
            assert_eq!(v.target.status, expected, "stage {}", v.stage);
        }
    }

    #[test]
    fn current_stage_walks_through_lead_in_verifying_verified() {
        let catalog = catalog();
        let stage = catalog.stage_at(StageIndex::new(4));
        let span = 3500;

        let at = |elapsed| {
            stage_sub_steps(stage, stage.index, progress(elapsed, span), BootMode::Normal)[0]
                .target
                .status
        };

        assert_eq!(at(0), EntityStatus::Idle);
        assert_eq!(at(VERIFY_LEAD_MS - 1), EntityStatus::Idle);
        assert_eq!(at(VERIFY_LEAD_MS), EntityStatus::Verifying);
        assert_eq!(at(span - 1), EntityStatus::Verifying);
        assert_eq!(at(span), EntityStatus::Verified);
    }

    #[test]
    fn multiple_sub_steps_take_turns() {
        let catalog = catalog();
        let stage = catalog.stage_at(StageIndex::new(3));
        assert_eq!(stage.sub_steps.len(), 2);

        let views = stage_sub_steps(stage, stage.index, progress(1600, 3000), BootMode::Normal);
        assert_eq!(views[0].target.status, EntityStatus::Verified);
        assert_eq!(views[1].target.status, EntityStatus::Verifying);

        let views = stage_sub_steps(stage, stage.index, progress(700, 3000), BootMode::Normal);
        assert_eq!(views[0].target.status, EntityStatus::Verifying);
        assert_eq!(views[1].target.status, EntityStatus::Idle);
    }

    #[test]
    fn tampered_signature_fails_once_checked() {
        let views = all_sub_steps(
            &catalog(),
            StageIndex::new(5),
            StageProgress::STILL,
            BootMode::Tampered,
        );
        let fsbl = views
            .iter()
            .find(|v| v.stage == StageIndex::new(4))
            .unwrap();

        assert_eq!(fsbl.verifier.status, EntityStatus::Verified);
        assert_eq!(fsbl.target.status, EntityStatus::Failed);
        assert_eq!(fsbl.signature, Some(EntityStatus::Failed));
        assert!(
            fsbl.additional
                .iter()
                .all(|e| e.status == EntityStatus::Verified)
        );
    }

    #[test]
    fn unsigned_sub_steps_have_no_signature() {
        let views = all_sub_steps(
            &catalog(),
            StageIndex::ZERO,
            StageProgress::STILL,
            BootMode::Normal,
        );
        assert_eq!(views[0].signature, None);
    }

    #[test]
    fn terminal_position_verifies_everything() {
        let catalog = catalog();
        let views = all_sub_steps(
            &catalog,
            catalog.terminal(),
            StageProgress::STILL,
            BootMode::Normal,
        );
        assert!(views.iter().all(|v| v.target.status == EntityStatus::Verified));
    }

    #[test]
    fn derivation_is_pure() {
        let catalog = catalog();
        let p = progress(1234, 3000);
        let a = all_sub_steps(&catalog, StageIndex::new(3), p, BootMode::Tampered);
        let b = all_sub_steps(&catalog, StageIndex::new(3), p, BootMode::Tampered);
        assert_eq!(a, b);
    }
}
