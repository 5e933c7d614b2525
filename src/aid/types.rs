use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AidError;
use crate::labs::OrderedLabSeries;
use crate::models::enums::{Gender, GoalUrate, Indication};
use crate::models::{AkiEpisode, CkdDetail, GoutHistory, LabReading};

use super::aki::{AkiContext, AkiOutcome};
use super::ckd::CkdResolution;
use super::ppx::{PpxContext, PpxOutcome};

/// Pre-fetched patient data for a decision-aid evaluation.
///
/// The repository collaborator fetches everything relevant to a subject in
/// one read, builds this snapshot, and passes it in. This keeps the engines
/// pure and testable; nothing mid-computation touches storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientSnapshot {
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    /// Orderable, not necessarily ordered; flows sort before evaluating.
    pub creatinines: Vec<LabReading>,
    pub urates: Vec<LabReading>,
    pub baseline_creatinine: Option<Decimal>,
    pub ckd_detail: Option<CkdDetail>,
    pub aki: Option<AkiEpisode>,
    pub gout: Option<GoutHistory>,
}

impl PatientSnapshot {
    pub fn on_dialysis(&self) -> bool {
        self.ckd_detail
            .as_ref()
            .map(|detail| detail.dialysis)
            .unwrap_or(false)
    }

    /// Kidney-function context for the AKI trajectory engine.
    pub fn aki_context(&self) -> AkiContext {
        AkiContext {
            baseline_creatinine: self.baseline_creatinine,
            on_dialysis: self.on_dialysis(),
            stage: self.ckd_detail.as_ref().and_then(|detail| detail.stage),
            age: self.age,
            gender: self.gender,
        }
    }

    /// The urate series, sorted newest-first. Subject-owned urates always
    /// carry their own draw date; there is no episode fallback here.
    pub fn urate_series(&self) -> Result<OrderedLabSeries, AidError> {
        Ok(OrderedLabSeries::sorted_newest_first(
            self.urates.clone(),
            None,
        )?)
    }

    /// Prophylaxis context over a pre-built urate series.
    pub fn ppx_context<'a>(
        &'a self,
        urates: &'a OrderedLabSeries,
        goal: GoalUrate,
        as_of: NaiveDate,
        stored_indication: Option<Indication>,
    ) -> PpxContext<'a> {
        PpxContext {
            gout: self.gout.as_ref(),
            urates,
            goal,
            as_of,
            stored_indication,
        }
    }
}

/// Read side of the persistence boundary.
pub trait PatientRepository {
    fn snapshot(&self, subject: Uuid, as_of: NaiveDate) -> Result<PatientSnapshot, AidError>;
}

/// Write side of the persistence boundary. Each outcome is applied
/// atomically: every create/update/delete in it succeeds or none do, and
/// implementations report a single success/failure for the batch.
pub trait AidWriter {
    fn apply_aki(&mut self, outcome: &AkiOutcome) -> Result<(), AidError>;
    fn apply_ppx(&mut self, outcome: &PpxOutcome) -> Result<(), AidError>;
    fn apply_ckd(&mut self, resolution: &CkdResolution) -> Result<(), AidError>;
}
