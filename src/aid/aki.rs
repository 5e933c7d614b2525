use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::config;
use crate::error::{AidError, LabError, ValidationErrors};
use crate::labs::helpers::{is_at_baseline, is_within_normal_limits, within_range_for_stage};
use crate::labs::{reconcile_readings, OrderedLabSeries, ReadingDelta};
use crate::models::enums::{AkiStatus, Gender, Stage};
use crate::models::{AkiEpisode, LabReading, OwnerRef};

use super::messages::Messages;

/// Kidney-function context the trajectory engine resolves a creatinine
/// against: the known baseline if there is one, otherwise the chronic stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AkiContext {
    pub baseline_creatinine: Option<Decimal>,
    pub on_dialysis: bool,
    pub stage: Option<Stage>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
}

/// Caller-supplied target state for an AKI create or update: an asserted
/// status (or none, to have it computed) and the full target creatinine
/// list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AkiCommand {
    pub status: Option<AkiStatus>,
    pub creatinines: Vec<LabReading>,
}

/// What the persistence collaborator should do with the episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AkiOutcome {
    Upsert {
        episode: AkiEpisode,
        readings: ReadingDelta,
    },
    /// Status and readings were both vacuumed out: no AKI anymore.
    Delete { episode_id: Uuid },
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Whether the newest creatinine has come back down: within normal limits,
/// or at the known baseline, or (failing a baseline) within the range the
/// chronic CKD stage predicts.
fn is_resolved(series: &OrderedLabSeries, ctx: &AkiContext) -> Result<bool, LabError> {
    let Some(newest) = series.newest() else {
        return Ok(false);
    };
    if is_within_normal_limits(newest.reading.value, config::CREATININE_UPPER_LIMIT) {
        return Ok(true);
    }
    if ctx.baseline_creatinine.is_some() {
        return is_at_baseline(
            newest.reading.value,
            ctx.baseline_creatinine,
            ctx.on_dialysis,
            config::BASELINE_VARIANCE,
        );
    }
    if let (Some(stage), Some(age), Some(gender)) = (ctx.stage, ctx.age, ctx.gender) {
        return Ok(within_range_for_stage(
            newest.reading.value,
            stage,
            age,
            gender,
        ));
    }
    Ok(false)
}

/// Recompute the episode status from a newest-first creatinine series.
/// Idempotent; no step-wise transitions. An empty series is ongoing.
pub fn classify(series: &OrderedLabSeries, ctx: &AkiContext) -> Result<AkiStatus, LabError> {
    if series.is_empty() {
        return Ok(AkiStatus::Ongoing);
    }
    let status = if is_resolved(series, ctx)? {
        AkiStatus::Resolved
    } else if series.values_improving() {
        AkiStatus::Improving
    } else {
        AkiStatus::Ongoing
    };
    tracing::debug!(status = status.as_str(), readings = series.len(), "classified AKI");
    Ok(status)
}

/// Cross-validate a caller-asserted status against the computed trajectory,
/// collecting the mismatch message under the `"creatinine"` key. Each of the
/// asserted/actual mismatch pairs has its own message.
pub fn check_status(
    asserted: AkiStatus,
    series: &OrderedLabSeries,
    ctx: &AkiContext,
) -> Result<ValidationErrors, LabError> {
    let mut errors = ValidationErrors::new();
    if series.is_empty() {
        return Ok(errors);
    }
    let resolved = is_resolved(series, ctx)?;
    let improving = series.values_improving() && !resolved;
    match asserted {
        AkiStatus::Resolved => {
            if !resolved {
                if improving {
                    errors.add("creatinine", Messages::AKI_RESOLVED_BUT_IMPROVING);
                } else {
                    errors.add("creatinine", Messages::AKI_RESOLVED_BUT_NOT);
                }
            }
        }
        AkiStatus::Improving => {
            if resolved {
                errors.add("creatinine", Messages::AKI_IMPROVING_BUT_RESOLVED);
            } else if !improving {
                errors.add("creatinine", Messages::AKI_IMPROVING_BUT_NOT);
            }
        }
        AkiStatus::Ongoing => {
            if resolved {
                errors.add("creatinine", Messages::AKI_ONGOING_BUT_RESOLVED);
            } else if improving {
                errors.add("creatinine", Messages::AKI_ONGOING_BUT_IMPROVING);
            }
        }
    }
    Ok(errors)
}

/// Creatinines hanging off an episode only make sense if the caller also
/// says there is an AKI.
pub fn check_creatinines_require_aki(aki_flagged: bool, has_creatinines: bool) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    if !aki_flagged && has_creatinines {
        errors.add("aki", Messages::CREATININES_REQUIRE_AKI);
    }
    errors
}

// ---------------------------------------------------------------------------
// Create / update flows
// ---------------------------------------------------------------------------

/// Create an episode from a command. Sorts the incoming readings, validates
/// an asserted status against them, and computes the status when none was
/// asserted. A command with neither status nor readings still creates an
/// ongoing episode.
pub fn create_aki(
    owner: OwnerRef,
    command: AkiCommand,
    ctx: &AkiContext,
    fallback_date: Option<NaiveDate>,
) -> Result<AkiOutcome, AidError> {
    let readings = reconcile_readings(&[], command.creatinines, fallback_date)?;
    let series = OrderedLabSeries::sorted_newest_first(readings.merged.clone(), fallback_date)?;
    let status = resolve_status(command.status, &series, ctx)?;
    let mut episode = AkiEpisode::new(owner, Some(status));
    episode.fallback_date = fallback_date;
    Ok(AkiOutcome::Upsert { episode, readings })
}

/// Update an episode against a target command. An empty command (no status,
/// no readings) deletes the episode; otherwise the readings are reconciled
/// and the status validated/recomputed over the merged series.
pub fn update_aki(
    episode: &AkiEpisode,
    existing_readings: &[LabReading],
    command: AkiCommand,
    ctx: &AkiContext,
) -> Result<AkiOutcome, AidError> {
    if command.status.is_none() && command.creatinines.is_empty() {
        tracing::debug!(episode = %episode.id, "AKI vacuumed; scheduling delete");
        return Ok(AkiOutcome::Delete {
            episode_id: episode.id,
        });
    }
    let readings = reconcile_readings(existing_readings, command.creatinines, episode.fallback_date)?;
    let series =
        OrderedLabSeries::sorted_newest_first(readings.merged.clone(), episode.fallback_date)?;
    let status = resolve_status(command.status, &series, ctx)?;
    let mut episode = episode.clone();
    episode.status = status;
    Ok(AkiOutcome::Upsert { episode, readings })
}

fn resolve_status(
    asserted: Option<AkiStatus>,
    series: &OrderedLabSeries,
    ctx: &AkiContext,
) -> Result<AkiStatus, AidError> {
    match asserted {
        Some(status) => {
            let errors = check_status(status, series, ctx)?;
            if !errors.is_empty() {
                tracing::warn!(%errors, "asserted AKI status contradicts creatinines");
            }
            errors.into_result()?;
            Ok(status)
        }
        None => Ok(classify(series, ctx)?),
    }
}


#[cfg(test)]
mod properties {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 1).unwrap() + Duration::days(n)
    }

    fn series_from_cents(cents: &[u32]) -> OrderedLabSeries {
        let readings = cents
            .iter()
            .enumerate()
            .map(|(i, c)| LabReading {
                id: None,
                value: Decimal::new(i64::from(*c), 2),
                date_drawn: Some(day(-(i as i64))),
                owner: OwnerRef::Episode(Uuid::nil()),
            })
            .collect();
        OrderedLabSeries::assert_newest_first(readings, None).unwrap()
    }

    proptest! {
        // Values fall over time and end within normal limits: resolved.
        #[test]
        fn decreasing_trend_ending_normal_resolves(
            newest_cents in 10u32..=135,
            rises in proptest::collection::vec(1u32..200, 0..6),
        ) {
            let mut cents = vec![newest_cents];
            let mut current = newest_cents;
            for rise in rises {
                current += rise;
                cents.push(current);
            }
            let series = series_from_cents(&cents);
            prop_assert_eq!(
                classify(&series, &AkiContext::default()).unwrap(),
                AkiStatus::Resolved
            );
        }

        // Values fall (or hold) over time but the newest is still elevated
        // with nothing to resolve against: improving.
        #[test]
        fn non_increasing_but_elevated_improves(
            newest_cents in 136u32..=400,
            rises in proptest::collection::vec(0u32..200, 1..6),
        ) {
            let mut cents = vec![newest_cents];
            let mut current = newest_cents;
            for rise in rises {
                current += rise;
                cents.push(current);
            }
            let series = series_from_cents(&cents);
            prop_assert_eq!(
                classify(&series, &AkiContext::default()).unwrap(),
                AkiStatus::Improving
            );
        }

        // A rise from the previous reading while still elevated: ongoing.
        #[test]
        fn rise_while_elevated_stays_ongoing(
            older_cents in 36u32..=300,
            bump in 1u32..100,
        ) {
            let newest_cents = older_cents + bump + 100;
            let series = series_from_cents(&[newest_cents, older_cents]);
            prop_assert_eq!(
                classify(&series, &AkiContext::default()).unwrap(),
                AkiStatus::Ongoing
            );
        }
    }
}
