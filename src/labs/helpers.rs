use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::error::LabError;
use crate::models::enums::{Gender, Stage};

/// Round half-away-from-zero to `places` decimal places.
pub fn round_places(value: Decimal, places: u32) -> Decimal {
    value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
}

/// Estimated glomerular filtration rate from the CKD-EPI creatinine
/// equation (2021, race-free):
///
/// `142 * min(cr/k, 1)^alpha * max(cr/k, 1)^-1.200 * 0.9938^age * sex`
///
/// <https://www.kidney.org/professionals/kdoqi/gfr_calculator/formula>
///
/// Creatinine must be a positive mg/dL value. Rounded to 0 decimal places.
pub fn egfr(creatinine: Decimal, age: u32, gender: Gender) -> Decimal {
    debug_assert!(creatinine > Decimal::ZERO);
    let (sex_modifier, alpha, kappa) = match gender {
        Gender::Male => (dec!(1.000), dec!(-0.302), dec!(0.9)),
        Gender::Female => (dec!(1.012), dec!(-0.241), dec!(0.7)),
    };
    let ratio = creatinine / kappa;
    let value = dec!(142)
        * ratio.min(Decimal::ONE).powd(alpha)
        * ratio.max(Decimal::ONE).powd(dec!(-1.200))
        * dec!(0.9938).powi(i64::from(age))
        * sex_modifier;
    round_places(value, 0)
}

/// Banded CKD stage for an eGFR.
pub fn stage_from_egfr(egfr: Decimal) -> Stage {
    if egfr >= dec!(90) {
        Stage::One
    } else if egfr >= dec!(60) {
        Stage::Two
    } else if egfr >= dec!(30) {
        Stage::Three
    } else if egfr >= dec!(15) {
        Stage::Four
    } else {
        Stage::Five
    }
}

pub fn is_within_normal_limits(value: Decimal, upper_limit: Decimal) -> bool {
    value <= upper_limit
}

/// Whether a creatinine has returned to the patient's known baseline, within
/// a tolerance factor. The comparison is undefined without a baseline and
/// undefined on dialysis; both raise.
pub fn is_at_baseline(
    value: Decimal,
    baseline: Option<Decimal>,
    on_dialysis: bool,
    variance: Decimal,
) -> Result<bool, LabError> {
    if on_dialysis {
        return Err(LabError::BaselineOnDialysis);
    }
    let baseline = baseline.ok_or(LabError::MissingBaseline)?;
    Ok(value <= baseline * variance)
}

/// Whether a creatinine is no worse than a patient's chronic CKD stage would
/// predict: the stage computed from the reading's eGFR is at or below the
/// given stage.
pub fn within_range_for_stage(value: Decimal, stage: Stage, age: u32, gender: Gender) -> bool {
    stage_from_egfr(egfr(value, age, gender)) <= stage
}
