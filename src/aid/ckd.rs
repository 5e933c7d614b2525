use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{AidError, ValidationErrors};
use crate::labs::helpers::{egfr, stage_from_egfr};
use crate::models::ckd::CkdDetail;
use crate::models::enums::{DialysisDuration, DialysisType, Gender, Stage};
use crate::models::lab::validate_baseline_creatinine;

use super::messages::Messages;

/// Caller-supplied answers for a CKD detail create/update. `dialysis: None`
/// means the question was never answered, which is distinct from an explicit
/// "no".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CkdDetailInput {
    pub dialysis: Option<bool>,
    pub dialysis_type: Option<DialysisType>,
    pub dialysis_duration: Option<DialysisDuration>,
    pub stage: Option<Stage>,
    pub baseline_creatinine: Option<Decimal>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
}

/// The persisted state the input is reconciled against. Used both for
/// change detection (untouched inputs are a no-op, avoiding spurious
/// history entries) and for restoring a baseline value before deletion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CkdSnapshot {
    pub detail: Option<CkdDetail>,
    pub baseline_creatinine: Option<Decimal>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DetailAction {
    Create(CkdDetail),
    Update(CkdDetail),
    Delete,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BaselineAction {
    Create(Decimal),
    Update(Decimal),
    /// The stored value must be reset to its original snapshot before the
    /// row is deleted, or the storage layer's non-null constraint trips on
    /// the intermediate state.
    Delete { restore_value: Decimal },
    Unchanged,
}

/// What the persistence collaborator should do with the detail record and
/// its baseline creatinine, as one atomic batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CkdResolution {
    pub detail: DetailAction,
    pub baseline: BaselineAction,
}

impl CkdResolution {
    pub fn is_noop(&self) -> bool {
        self.detail == DetailAction::Unchanged && self.baseline == BaselineAction::Unchanged
    }
}

/// Reconciles dialysis answers, an asserted stage, and a baseline creatinine
/// (with the age/gender needed to interpret it) into one consistent detail
/// record, or a field-scoped error map when they contradict each other.
#[derive(Debug, Clone)]
pub struct CkdDetailReconciler {
    input: CkdDetailInput,
    snapshot: CkdSnapshot,
    /// Whether the detail questions are optional in the calling flow. When
    /// they are not, an unanswered dialysis question is itself an error.
    optional: bool,
}

impl CkdDetailReconciler {
    pub fn new(input: CkdDetailInput, snapshot: CkdSnapshot, optional: bool) -> Self {
        Self {
            input,
            snapshot,
            optional,
        }
    }

    /// Stage computed from baseline creatinine, age, and gender, when all
    /// three are present.
    pub fn calculated_stage(&self) -> Option<Stage> {
        match (
            self.input.baseline_creatinine,
            self.input.age,
            self.input.gender,
        ) {
            (Some(baseline), Some(age), Some(gender)) => {
                Some(stage_from_egfr(egfr(baseline, age, gender)))
            }
            _ => None,
        }
    }

    /// Whether a detail record should exist at all. When nothing asserts a
    /// stage, dialysis, or a computable stage, an existing record is
    /// scheduled for deletion.
    fn detail_needed(&self) -> bool {
        self.input.stage.is_some()
            || self.input.dialysis == Some(true)
            || self.calculated_stage().is_some()
    }

    /// Whether any reconciled field differs from the persisted snapshot.
    fn changed(&self) -> bool {
        let stored = self.snapshot.detail.as_ref();
        self.input.dialysis != stored.map(|d| d.dialysis)
            || self.input.dialysis_type != stored.and_then(|d| d.dialysis_type)
            || self.input.dialysis_duration != stored.and_then(|d| d.dialysis_duration)
            || self.input.stage != stored.and_then(|d| d.stage)
            || self.input.baseline_creatinine != self.snapshot.baseline_creatinine
            || self.input.age != self.snapshot.age
            || self.input.gender != self.snapshot.gender
    }

    /// The single stage the record will carry. Dialysis hard-overrides to V;
    /// a given/calculated disagreement is caught by validation before this
    /// runs and is a caller error here.
    pub fn resolve_stage(&self) -> Result<Option<Stage>, AidError> {
        if self.input.dialysis == Some(true) {
            return Ok(Some(Stage::Five));
        }
        if self.input.dialysis.is_none() && self.input.stage.is_none() {
            return Ok(None);
        }
        match (self.input.stage, self.calculated_stage()) {
            (Some(given), Some(calculated)) if given != calculated => {
                Err(AidError::ConflictingStage { given, calculated })
            }
            (Some(given), _) => Ok(Some(given)),
            (None, Some(calculated)) => Ok(Some(calculated)),
            (None, None) => Ok(None),
        }
    }

    /// Collect every contradiction at once, field-scoped, so the caller can
    /// surface all of them together.
    pub fn check_for_errors(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        match self.input.dialysis {
            None => {
                if !self.optional || self.input.baseline_creatinine.is_some() {
                    errors.add("dialysis", Messages::DIALYSIS_REQUIRED);
                }
                if self.input.baseline_creatinine.is_some() {
                    errors.add("value", Messages::BASELINE_NEEDS_DIALYSIS_ANSWER);
                }
            }
            Some(false) => {
                if self.input.baseline_creatinine.is_some() {
                    let age_missing = self.input.age.is_none();
                    let gender_missing = self.input.gender.is_none();
                    if age_missing || gender_missing {
                        let message = Messages::age_gender_required(age_missing, gender_missing);
                        errors.add("value", message.clone());
                        if age_missing {
                            errors.add("age", message.clone());
                        }
                        if gender_missing {
                            errors.add("gender", message);
                        }
                    } else if let (Some(given), Some(calculated)) =
                        (self.input.stage, self.calculated_stage())
                    {
                        if given != calculated {
                            errors.add(
                                "value",
                                Messages::stage_mismatch_baseline(calculated, given),
                            );
                            errors.add("stage", Messages::stage_mismatch_stage(given, calculated));
                        }
                    }
                }
            }
            Some(true) => {
                if self.input.dialysis_type.is_none() {
                    errors.add("dialysis_type", Messages::DIALYSIS_TYPE_REQUIRED);
                }
                if self.input.dialysis_duration.is_none() {
                    errors.add("dialysis_duration", Messages::DIALYSIS_DURATION_REQUIRED);
                }
            }
        }
        errors
    }

    /// Validate, detect change, and produce the create/update/delete
    /// resolution. Nothing is written here; the caller applies the
    /// resolution atomically only when this returns `Ok`.
    pub fn resolve(&self) -> Result<CkdResolution, AidError> {
        if let Some(baseline) = self.input.baseline_creatinine {
            validate_baseline_creatinine(baseline)?;
        }
        let errors = self.check_for_errors();
        if !errors.is_empty() {
            tracing::warn!(%errors, "CKD detail input contradicts itself");
        }
        errors.into_result()?;

        if !self.detail_needed() {
            return Ok(CkdResolution {
                detail: if self.snapshot.detail.is_some() {
                    DetailAction::Delete
                } else {
                    DetailAction::Unchanged
                },
                baseline: self.baseline_delete_or_unchanged(),
            });
        }

        if !self.changed() {
            return Ok(CkdResolution {
                detail: DetailAction::Unchanged,
                baseline: BaselineAction::Unchanged,
            });
        }

        let on_dialysis = self.input.dialysis == Some(true);
        let detail = CkdDetail {
            dialysis: self.input.dialysis.unwrap_or(false),
            dialysis_type: if on_dialysis {
                self.input.dialysis_type
            } else {
                None
            },
            dialysis_duration: if on_dialysis {
                self.input.dialysis_duration
            } else {
                None
            },
            stage: self.resolve_stage()?,
        };
        debug_assert!(detail.invariant_holds());

        let detail_action = match &self.snapshot.detail {
            None => DetailAction::Create(detail),
            Some(current) if *current == detail => DetailAction::Unchanged,
            Some(_) => DetailAction::Update(detail),
        };

        let baseline_action = if on_dialysis {
            // Baseline comparisons are undefined on dialysis; the record goes.
            self.baseline_delete_or_unchanged()
        } else {
            match (self.snapshot.baseline_creatinine, self.input.baseline_creatinine) {
                (None, None) => BaselineAction::Unchanged,
                (None, Some(value)) => BaselineAction::Create(value),
                (Some(current), Some(value)) if current == value => BaselineAction::Unchanged,
                (Some(_), Some(value)) => BaselineAction::Update(value),
                (Some(current), None) => BaselineAction::Delete {
                    restore_value: current,
                },
            }
        };

        Ok(CkdResolution {
            detail: detail_action,
            baseline: baseline_action,
        })
    }

    fn baseline_delete_or_unchanged(&self) -> BaselineAction {
        match self.snapshot.baseline_creatinine {
            Some(current) => BaselineAction::Delete {
                restore_value: current,
            },
            None => BaselineAction::Unchanged,
        }
    }
}
