use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config;
use crate::error::{AidError, ValidationErrors};
use crate::labs::{reconcile_readings, OrderedLabSeries, ReadingDelta};
use crate::models::enums::{GoalUrate, Indication};
use crate::models::lab::validate_urate_value;
use crate::models::{GoutDetail, GoutHistory, LabReading};

use super::messages::Messages;

/// Evaluation context for a prophylaxis decision. The gout history and its
/// detail are hard preconditions: a patient without gout has no business in
/// this engine, and their absence is a caller error rather than a
/// validation finding.
#[derive(Debug, Clone)]
pub struct PpxContext<'a> {
    pub gout: Option<&'a GoutHistory>,
    /// Newest-first urate series.
    pub urates: &'a OrderedLabSeries,
    pub goal: GoalUrate,
    pub as_of: NaiveDate,
    /// The currently persisted indication, for change detection.
    pub stored_indication: Option<Indication>,
}

/// Stored gout-detail flags that lab data says should change. Only proposed
/// when a urate was drawn recently enough to trust over the stored answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GoutFlagUpdates {
    pub at_goal: bool,
    pub at_goal_long_term: bool,
}

/// The decision plus everything the caller needs to persist or display it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PpxOutcome {
    pub indication: Indication,
    pub hyperuricemic: bool,
    pub at_goal: bool,
    pub recent_urate: bool,
    pub flag_updates: Option<GoutFlagUpdates>,
    pub indication_changed: bool,
    pub discrepancy: Option<&'static str>,
}

/// Compute the flare-prophylaxis indication for a patient.
///
/// Derived once per evaluation: `hyperuricemic` (most recent urate above
/// goal), `at_goal` (not hyperuricemic and below goal for six months or
/// longer), and `recent_urate` (a draw within the last 90 days).
pub fn evaluate(ctx: &PpxContext) -> Result<PpxOutcome, AidError> {
    let gout = ctx.gout.ok_or(AidError::MissingGoutHistory)?;
    let detail = gout.detail.as_ref().ok_or(AidError::MissingGoutDetail)?;

    let goal = ctx.goal.value();
    let newest = ctx.urates.newest();
    let hyperuricemic = newest
        .map(|reading| reading.reading.value > goal)
        .unwrap_or(false);
    let at_goal = !hyperuricemic && ctx.urates.at_goal_for_months(goal, config::AT_GOAL_MONTHS);
    let recent_urate = ctx.urates.within_days(config::RECENT_URATE_DAYS, ctx.as_of);

    let on_or_starting = detail.on_ult || detail.starting_ult;
    let at_goal_and_recent = at_goal && recent_urate;
    let indication = if !on_or_starting {
        // No urate-lowering therapy, no prophylaxis.
        Indication::NotIndicated
    } else if detail.starting_ult {
        // ACR guidance: prophylax every ULT start, unless labs already show
        // sustained control.
        if at_goal_and_recent {
            Indication::NotIndicated
        } else {
            Indication::Indicated
        }
    } else if (detail.flaring == Some(true) || hyperuricemic) && !at_goal_and_recent {
        // Established ULT but still flaring or above goal: the patient is
        // mid-titration and benefits from cover while it finishes.
        Indication::Conditional
    } else {
        Indication::NotIndicated
    };

    let discrepancy = newest
        .and_then(|reading| urate_status_discrepancy(reading.reading.value, detail.hyperuricemic, goal));

    let urate_within_month = ctx
        .urates
        .within_days(config::URATE_FLAG_REFRESH_DAYS, ctx.as_of);
    let computed_at_goal = newest.map(|reading| reading.reading.value <= goal);
    let flags_stale = detail.at_goal != computed_at_goal || detail.at_goal_long_term != at_goal;
    let flag_updates = if urate_within_month && flags_stale {
        Some(GoutFlagUpdates {
            at_goal: computed_at_goal.unwrap_or(false),
            at_goal_long_term: at_goal,
        })
    } else {
        None
    };

    let indication_changed = ctx.stored_indication != Some(indication);
    tracing::debug!(
        indication = indication.as_str(),
        hyperuricemic,
        at_goal,
        recent_urate,
        "evaluated prophylaxis indication"
    );

    Ok(PpxOutcome {
        indication,
        hyperuricemic,
        at_goal,
        recent_urate,
        flag_updates,
        indication_changed,
        discrepancy,
    })
}

/// Compare the asserted hyperuricemic flag against what the most recent
/// urate actually implies. The never-answered check runs first; only then
/// are the two directional mismatches considered.
pub fn urate_status_discrepancy(
    newest_value: Decimal,
    hyperuricemic: Option<bool>,
    goal: Decimal,
) -> Option<&'static str> {
    match hyperuricemic {
        None => Some(Messages::CLARIFY_HYPERURICEMIC_UNSET),
        Some(false) if newest_value > goal => Some(Messages::CLARIFY_HYPERURICEMIC_ABOVE_GOAL),
        Some(true) if newest_value <= goal => Some(Messages::CLARIFY_HYPERURICEMIC_AT_GOAL),
        _ => None,
    }
}

/// Collect the discrepancy, if any, under the `"urate"` key of the boundary
/// error map. Silent when no urate was ever reported.
pub fn check_urate_status(
    urates: &OrderedLabSeries,
    detail: &GoutDetail,
    goal: GoalUrate,
) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    if let Some(newest) = urates.newest() {
        if let Some(message) =
            urate_status_discrepancy(newest.reading.value, detail.hyperuricemic, goal.value())
        {
            errors.add("urate", message);
        }
    }
    errors
}

/// Decision plus the urate write set, for the update flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PpxUpdate {
    pub outcome: PpxOutcome,
    pub urates: ReadingDelta,
}

/// Update flow: reconcile a caller-supplied target urate list against the
/// persisted one, then evaluate the indication over the merged series. All
/// values are validated for plausibility before anything is diffed.
pub fn update_ppx(
    gout: Option<&GoutHistory>,
    existing_urates: &[LabReading],
    incoming_urates: Vec<LabReading>,
    goal: GoalUrate,
    as_of: NaiveDate,
    stored_indication: Option<Indication>,
) -> Result<PpxUpdate, AidError> {
    for reading in &incoming_urates {
        validate_urate_value(reading.value)?;
        reading.validate_date_drawn(as_of)?;
    }
    let urates = reconcile_readings(existing_urates, incoming_urates, None)?;
    let series = OrderedLabSeries::sorted_newest_first(urates.merged.clone(), None)?;
    let context = PpxContext {
        gout,
        urates: &series,
        goal,
        as_of,
        stored_indication,
    };
    let outcome = evaluate(&context)?;
    Ok(PpxUpdate { outcome, urates })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GoutDetail, LabReading, OwnerRef};
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, 1).unwrap()
    }

    fn days_ago(n: i64) -> NaiveDate {
        today() - Duration::days(n)
    }

    fn urates(entries: &[(Decimal, i64)]) -> OrderedLabSeries {
        OrderedLabSeries::sorted_newest_first(
            entries
                .iter()
                .map(|(value, age_days)| LabReading {
                    id: None,
                    value: *value,
                    date_drawn: Some(days_ago(*age_days)),
                    owner: OwnerRef::Subject(Uuid::nil()),
                })
                .collect(),
            None,
        )
        .unwrap()
    }

    fn gout(detail: GoutDetail) -> GoutHistory {
        GoutHistory {
            id: Uuid::new_v4(),
            detail: Some(detail),
        }
    }

    fn ctx<'a>(gout: Option<&'a GoutHistory>, urates: &'a OrderedLabSeries) -> PpxContext<'a> {
        PpxContext {
            gout,
            urates,
            goal: GoalUrate::default(),
            as_of: today(),
            stored_indication: None,
        }
    }

    // Newest at goal 10 days ago, at goal 200 days ago: sustained control.
    fn controlled_series() -> OrderedLabSeries {
        urates(&[(dec!(5.0), 10), (dec!(5.5), 200)])
    }

    #[test]
    fn missing_gout_history_is_fatal() {
        let series = controlled_series();
        let err = evaluate(&ctx(None, &series)).unwrap_err();
        assert!(matches!(err, AidError::MissingGoutHistory));
    }

    #[test]
    fn missing_gout_detail_is_fatal() {
        let series = controlled_series();
        let history = GoutHistory {
            id: Uuid::new_v4(),
            detail: None,
        };
        let err = evaluate(&ctx(Some(&history), &series)).unwrap_err();
        assert!(matches!(err, AidError::MissingGoutDetail));
    }

    #[test]
    fn no_ult_means_not_indicated() {
        let series = urates(&[(dec!(9.0), 5)]);
        let history = gout(GoutDetail {
            flaring: Some(true),
            ..GoutDetail::default()
        });
        let outcome = evaluate(&ctx(Some(&history), &series)).unwrap();
        assert_eq!(outcome.indication, Indication::NotIndicated);
        assert!(outcome.hyperuricemic);
    }

    #[test]
    fn starting_ult_with_sustained_control_is_not_indicated() {
        let series = controlled_series();
        let history = gout(GoutDetail {
            on_ult: true,
            starting_ult: true,
            ..GoutDetail::default()
        });
        let outcome = evaluate(&ctx(Some(&history), &series)).unwrap();
        assert!(outcome.at_goal);
        assert!(outcome.recent_urate);
        assert_eq!(outcome.indication, Indication::NotIndicated);
    }

    #[test]
    fn starting_ult_without_control_is_indicated() {
        let series = urates(&[(dec!(7.5), 10)]);
        let history = gout(GoutDetail {
            on_ult: true,
            starting_ult: true,
            ..GoutDetail::default()
        });
        let outcome = evaluate(&ctx(Some(&history), &series)).unwrap();
        assert!(!outcome.at_goal);
        assert_eq!(outcome.indication, Indication::Indicated);
    }

    #[test]
    fn starting_ult_with_no_urates_is_indicated() {
        let series = OrderedLabSeries::default();
        let history = gout(GoutDetail {
            starting_ult: true,
            ..GoutDetail::default()
        });
        let outcome = evaluate(&ctx(Some(&history), &series)).unwrap();
        assert_eq!(outcome.indication, Indication::Indicated);
    }

    #[test]
    fn established_ult_while_flaring_is_conditional() {
        let series = urates(&[(dec!(6.5), 10)]);
        let history = gout(GoutDetail {
            on_ult: true,
            flaring: Some(true),
            ..GoutDetail::default()
        });
        let outcome = evaluate(&ctx(Some(&history), &series)).unwrap();
        assert_eq!(outcome.indication, Indication::Conditional);
    }

    #[test]
    fn established_ult_while_hyperuricemic_is_conditional() {
        let series = urates(&[(dec!(7.0), 10)]);
        let history = gout(GoutDetail {
            on_ult: true,
            ..GoutDetail::default()
        });
        let outcome = evaluate(&ctx(Some(&history), &series)).unwrap();
        assert!(outcome.hyperuricemic);
        assert_eq!(outcome.indication, Indication::Conditional);
    }

    #[test]
    fn established_ult_with_sustained_control_is_not_indicated() {
        let series = controlled_series();
        let history = gout(GoutDetail {
            on_ult: true,
            flaring: Some(true),
            ..GoutDetail::default()
        });
        let outcome = evaluate(&ctx(Some(&history), &series)).unwrap();
        assert_eq!(outcome.indication, Indication::NotIndicated);
    }

    #[test]
    fn established_ult_quiet_and_controlled_is_not_indicated() {
        let series = controlled_series();
        let history = gout(GoutDetail {
            on_ult: true,
            flaring: Some(false),
            ..GoutDetail::default()
        });
        let outcome = evaluate(&ctx(Some(&history), &series)).unwrap();
        assert_eq!(outcome.indication, Indication::NotIndicated);
    }

    // --- discrepancy detector ---

    #[test]
    fn unanswered_flag_with_data_asks_for_clarification() {
        // The null check runs before the directional checks.
        assert_eq!(
            urate_status_discrepancy(dec!(7.0), None, dec!(6.0)),
            Some(Messages::CLARIFY_HYPERURICEMIC_UNSET)
        );
        assert_eq!(
            urate_status_discrepancy(dec!(5.0), None, dec!(6.0)),
            Some(Messages::CLARIFY_HYPERURICEMIC_UNSET)
        );
    }

    #[test]
    fn above_goal_but_reported_false() {
        assert_eq!(
            urate_status_discrepancy(dec!(6.1), Some(false), dec!(6.0)),
            Some(Messages::CLARIFY_HYPERURICEMIC_ABOVE_GOAL)
        );
    }

    #[test]
    fn at_goal_but_reported_true() {
        assert_eq!(
            urate_status_discrepancy(dec!(6.0), Some(true), dec!(6.0)),
            Some(Messages::CLARIFY_HYPERURICEMIC_AT_GOAL)
        );
    }

    #[test]
    fn consistent_flags_raise_nothing() {
        assert_eq!(urate_status_discrepancy(dec!(7.0), Some(true), dec!(6.0)), None);
        assert_eq!(urate_status_discrepancy(dec!(5.0), Some(false), dec!(6.0)), None);
    }

    #[test]
    fn discrepancy_collects_under_the_urate_key() {
        let series = urates(&[(dec!(7.0), 10)]);
        let detail = GoutDetail {
            hyperuricemic: Some(false),
            ..GoutDetail::default()
        };
        let errors = check_urate_status(&series, &detail, GoalUrate::default());
        assert_eq!(
            errors.field("urate").unwrap(),
            [Messages::CLARIFY_HYPERURICEMIC_ABOVE_GOAL]
        );

        let empty = OrderedLabSeries::default();
        assert!(check_urate_status(&empty, &detail, GoalUrate::default()).is_empty());
    }

    #[test]
    fn no_urates_means_no_discrepancy() {
        let series = OrderedLabSeries::default();
        let history = gout(GoutDetail {
            on_ult: true,
            ..GoutDetail::default()
        });
        let outcome = evaluate(&ctx(Some(&history), &series)).unwrap();
        assert_eq!(outcome.discrepancy, None);
    }

    #[test]
    fn discrepancy_surfaces_through_evaluate() {
        let series = urates(&[(dec!(7.0), 10)]);
        let history = gout(GoutDetail {
            on_ult: true,
            hyperuricemic: Some(false),
            ..GoutDetail::default()
        });
        let outcome = evaluate(&ctx(Some(&history), &series)).unwrap();
        assert_eq!(
            outcome.discrepancy,
            Some(Messages::CLARIFY_HYPERURICEMIC_ABOVE_GOAL)
        );
    }

    // --- stored flag refresh ---

    #[test]
    fn fresh_urate_proposes_flag_updates() {
        let series = controlled_series();
        let history = gout(GoutDetail {
            on_ult: true,
            at_goal: Some(false),
            ..GoutDetail::default()
        });
        let outcome = evaluate(&ctx(Some(&history), &series)).unwrap();
        assert_eq!(
            outcome.flag_updates,
            Some(GoutFlagUpdates {
                at_goal: true,
                at_goal_long_term: true,
            })
        );
    }

    #[test]
    fn stale_urate_does_not_touch_stored_flags() {
        // Newest draw is 40 days old: past the refresh window.
        let series = urates(&[(dec!(5.0), 40), (dec!(5.5), 240)]);
        let history = gout(GoutDetail {
            on_ult: true,
            at_goal: Some(false),
            ..GoutDetail::default()
        });
        let outcome = evaluate(&ctx(Some(&history), &series)).unwrap();
        assert_eq!(outcome.flag_updates, None);
    }

    #[test]
    fn matching_flags_propose_nothing() {
        let series = controlled_series();
        let history = gout(GoutDetail {
            on_ult: true,
            at_goal: Some(true),
            at_goal_long_term: true,
            ..GoutDetail::default()
        });
        let outcome = evaluate(&ctx(Some(&history), &series)).unwrap();
        assert_eq!(outcome.flag_updates, None);
    }

    // --- update flow ---

    #[test]
    fn update_reconciles_urates_before_deciding() {
        let persisted_id = Uuid::new_v4();
        let existing = vec![LabReading {
            id: Some(persisted_id),
            value: dec!(5.5),
            date_drawn: Some(days_ago(200)),
            owner: OwnerRef::Subject(Uuid::nil()),
        }];
        let incoming = vec![
            existing[0].clone(),
            LabReading {
                id: None,
                value: dec!(5.0),
                date_drawn: Some(days_ago(10)),
                owner: OwnerRef::Subject(Uuid::nil()),
            },
        ];
        let history = gout(GoutDetail {
            on_ult: true,
            starting_ult: true,
            ..GoutDetail::default()
        });
        let update = update_ppx(
            Some(&history),
            &existing,
            incoming,
            GoalUrate::default(),
            today(),
            None,
        )
        .unwrap();
        assert_eq!(update.outcome.indication, Indication::NotIndicated);
        assert_eq!(update.urates.to_create.len(), 1);
        assert!(update.urates.to_delete.is_empty());
        assert_eq!(update.urates.merged[0].value, dec!(5.0));
    }

    #[test]
    fn update_rejects_implausible_urates() {
        let incoming = vec![LabReading {
            id: None,
            value: dec!(31.0),
            date_drawn: Some(days_ago(1)),
            owner: OwnerRef::Subject(Uuid::nil()),
        }];
        let history = gout(GoutDetail::default());
        let err = update_ppx(
            Some(&history),
            &[],
            incoming,
            GoalUrate::default(),
            today(),
            None,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AidError::Lab(crate::error::LabError::ImplausibleUrate(_))
        ));
    }

    #[test]
    fn indication_change_is_reported() {
        let series = controlled_series();
        let history = gout(GoutDetail {
            on_ult: true,
            ..GoutDetail::default()
        });
        let mut context = ctx(Some(&history), &series);
        context.stored_indication = Some(Indication::NotIndicated);
        let outcome = evaluate(&context).unwrap();
        assert!(!outcome.indication_changed);

        context.stored_indication = Some(Indication::Conditional);
        let outcome = evaluate(&context).unwrap();
        assert!(outcome.indication_changed);
    }
}
