use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;
use crate::error::LabError;

/// What a lab reading hangs off: a subject (user) or a single episode object
/// (an AKI, a flare). Never both. Call sites that receive "an id or an
/// object" resolve to one of these at the boundary before any classification
/// logic runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OwnerRef {
    Subject(Uuid),
    Episode(Uuid),
}

/// A single serum creatinine or urate draw, mg/dL.
///
/// `id` is present on persisted readings and absent on caller-supplied new
/// ones; the reconciler keys off this. `date_drawn` may be absent when the
/// owning episode supplies a fallback date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabReading {
    pub id: Option<Uuid>,
    pub value: Decimal,
    pub date_drawn: Option<NaiveDate>,
    pub owner: OwnerRef,
}

impl LabReading {
    /// Readings cannot be drawn in the future.
    pub fn validate_date_drawn(&self, today: NaiveDate) -> Result<(), LabError> {
        match self.date_drawn {
            Some(date) if date > today => Err(LabError::DateDrawnInFuture(date)),
            _ => Ok(()),
        }
    }

    pub fn is_high(&self, upper_limit: Decimal) -> bool {
        self.value > upper_limit
    }

    pub fn is_low(&self, lower_limit: Decimal) -> bool {
        self.value < lower_limit
    }
}

/// Reject urate values beyond clinical plausibility.
pub fn validate_urate_value(value: Decimal) -> Result<(), LabError> {
    if value > config::URATE_MAX {
        Err(LabError::ImplausibleUrate(value))
    } else {
        Ok(())
    }
}

/// Reject baseline creatinines beyond clinical plausibility.
pub fn validate_baseline_creatinine(value: Decimal) -> Result<(), LabError> {
    if value > config::BASELINE_CREATININE_MAX {
        Err(LabError::ImplausibleBaselineCreatinine(value))
    } else {
        Ok(())
    }
}
