use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::LabError;
use crate::models::LabReading;

/// A reading annotated with the date it is ordered by: its own `date_drawn`,
/// or the owning episode's fallback date when that is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatedReading {
    pub reading: LabReading,
    pub effective_date: NaiveDate,
}

/// A newest-first view over a patient's or episode's lab readings.
///
/// This is a transient view, never stored. Constructors either sort
/// explicitly ([`OrderedLabSeries::sorted_newest_first`]) or check the
/// caller's claimed ordering and error on the offending element
/// ([`OrderedLabSeries::assert_newest_first`]); nothing silently resorts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedLabSeries {
    readings: Vec<DatedReading>,
}

impl OrderedLabSeries {
    /// Annotate effective dates and sort newest-first.
    pub fn sorted_newest_first(
        readings: Vec<LabReading>,
        fallback_date: Option<NaiveDate>,
    ) -> Result<Self, LabError> {
        let mut readings = annotate(readings, fallback_date)?;
        readings.sort_by(|a, b| b.effective_date.cmp(&a.effective_date));
        Ok(Self { readings })
    }

    /// Annotate effective dates and verify the caller's newest-first claim,
    /// walking pairwise and erroring on the first successor that is newer
    /// than its predecessor.
    pub fn assert_newest_first(
        readings: Vec<LabReading>,
        fallback_date: Option<NaiveDate>,
    ) -> Result<Self, LabError> {
        let readings = annotate(readings, fallback_date)?;
        for (index, pair) in readings.windows(2).enumerate() {
            if pair[1].effective_date > pair[0].effective_date {
                return Err(LabError::OutOfOrder {
                    index: index + 1,
                    date: pair[1].effective_date,
                    previous: pair[0].effective_date,
                });
            }
        }
        Ok(Self { readings })
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn newest(&self) -> Option<&DatedReading> {
        self.readings.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DatedReading> {
        self.readings.iter()
    }

    pub fn into_readings(self) -> Vec<LabReading> {
        self.readings.into_iter().map(|r| r.reading).collect()
    }

    /// True when the newest reading was drawn within the last `days` days.
    pub fn within_days(&self, days: i64, as_of: NaiveDate) -> bool {
        self.newest()
            .map(|newest| newest.effective_date > as_of - Duration::days(days))
            .unwrap_or(false)
    }

    /// Scan from the newest reading toward the oldest, index by index, until
    /// a reading both at/below `goal` and at least `months` 30-day months
    /// older than the newest is found. Fails closed: the first scanned value
    /// above goal ends the scan with `false`, regardless of older readings.
    pub fn at_goal_for_months(&self, goal: Decimal, months: u32) -> bool {
        let Some(newest) = self.newest() else {
            return false;
        };
        let window = Duration::days(config::DAYS_PER_MONTH * i64::from(months));
        for reading in &self.readings {
            if reading.reading.value > goal {
                return false;
            }
            if newest.effective_date - reading.effective_date >= window {
                return true;
            }
        }
        false
    }

    /// True when the values trend downward toward the present: every reading
    /// is at or below the next older one. Ties count as improving; a series
    /// of fewer than two readings has no counter-evidence and also counts.
    pub fn values_improving(&self) -> bool {
        self.readings
            .windows(2)
            .all(|pair| pair[0].reading.value <= pair[1].reading.value)
    }
}

fn annotate(
    readings: Vec<LabReading>,
    fallback_date: Option<NaiveDate>,
) -> Result<Vec<DatedReading>, LabError> {
    readings
        .into_iter()
        .enumerate()
        .map(|(index, reading)| {
            let effective_date = reading
                .date_drawn
                .or(fallback_date)
                .ok_or(LabError::MissingDate { index })?;
            Ok(DatedReading {
                reading,
                effective_date,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OwnerRef;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + Duration::days(i64::from(n))
    }

    fn reading(value: Decimal, date: Option<NaiveDate>) -> LabReading {
        LabReading {
            id: None,
            value,
            date_drawn: date,
            owner: OwnerRef::Subject(Uuid::nil()),
        }
    }

    fn series(entries: &[(Decimal, NaiveDate)]) -> OrderedLabSeries {
        OrderedLabSeries::assert_newest_first(
            entries.iter().map(|(v, d)| reading(*v, Some(*d))).collect(),
            None,
        )
        .unwrap()
    }

    #[test]
    fn sorted_newest_first_sorts_descending() {
        let labs = vec![
            reading(dec!(1.0), Some(day(1))),
            reading(dec!(2.0), Some(day(5))),
            reading(dec!(3.0), Some(day(3))),
        ];
        let series = OrderedLabSeries::sorted_newest_first(labs, None).unwrap();
        let dates: Vec<NaiveDate> = series.iter().map(|r| r.effective_date).collect();
        assert_eq!(dates, vec![day(5), day(3), day(1)]);
    }

    #[test]
    fn assert_newest_first_names_the_offender() {
        let labs = vec![
            reading(dec!(1.0), Some(day(5))),
            reading(dec!(2.0), Some(day(7))),
        ];
        let err = OrderedLabSeries::assert_newest_first(labs, None).unwrap_err();
        assert_eq!(
            err,
            LabError::OutOfOrder {
                index: 1,
                date: day(7),
                previous: day(5),
            }
        );
    }

    #[test]
    fn equal_dates_are_in_order() {
        let labs = vec![
            reading(dec!(1.0), Some(day(5))),
            reading(dec!(2.0), Some(day(5))),
        ];
        assert!(OrderedLabSeries::assert_newest_first(labs, None).is_ok());
    }

    #[test]
    fn fallback_date_stands_in_for_missing_date_drawn() {
        let labs = vec![reading(dec!(6.0), None)];
        let series = OrderedLabSeries::sorted_newest_first(labs.clone(), Some(day(9))).unwrap();
        assert_eq!(series.newest().unwrap().effective_date, day(9));

        let err = OrderedLabSeries::sorted_newest_first(labs, None).unwrap_err();
        assert_eq!(err, LabError::MissingDate { index: 0 });
    }

    #[test]
    fn within_days_is_strict() {
        let s = series(&[(dec!(5.0), day(10))]);
        assert!(s.within_days(90, day(10) + Duration::days(89)));
        // Exactly 90 days old is no longer "within 90 days".
        assert!(!s.within_days(90, day(10) + Duration::days(90)));
        assert!(!OrderedLabSeries::default().within_days(90, day(10)));
    }

    #[test]
    fn at_goal_for_months_needs_the_full_window() {
        let goal = dec!(6.0);
        // 180 days apart, both below goal.
        let s = series(&[(dec!(5.0), day(200)), (dec!(5.5), day(20))]);
        assert!(s.at_goal_for_months(goal, 6));
        // 179 days apart is one short.
        let s = series(&[(dec!(5.0), day(200)), (dec!(5.5), day(21))]);
        assert!(!s.at_goal_for_months(goal, 6));
    }

    #[test]
    fn at_goal_for_months_fails_closed_on_first_high_value() {
        let goal = dec!(6.0);
        // The middle reading is above goal; the old at-goal reading past it
        // must not rescue the scan.
        let s = series(&[
            (dec!(5.0), day(300)),
            (dec!(7.0), day(150)),
            (dec!(5.0), day(1)),
        ]);
        assert!(!s.at_goal_for_months(goal, 6));
    }

    #[test]
    fn at_goal_boundary_counts_goal_value_as_at_goal() {
        let goal = dec!(6.0);
        let s = series(&[(dec!(6.0), day(200)), (dec!(6.0), day(10))]);
        assert!(s.at_goal_for_months(goal, 6));
    }

    #[test]
    fn single_reading_is_never_at_goal_long_term() {
        let s = series(&[(dec!(5.0), day(10))]);
        assert!(!s.at_goal_for_months(dec!(6.0), 6));
    }

    #[test]
    fn improving_trend_is_non_increasing_toward_present() {
        let s = series(&[
            (dec!(1.5), day(9)),
            (dec!(2.0), day(5)),
            (dec!(3.0), day(1)),
        ]);
        assert!(s.values_improving());

        let bump = series(&[
            (dec!(2.5), day(9)),
            (dec!(2.0), day(5)),
            (dec!(3.0), day(1)),
        ]);
        assert!(!bump.values_improving());
    }

    #[test]
    fn improving_boundary_ties_count_as_improving() {
        let s = series(&[(dec!(2.0), day(9)), (dec!(2.0), day(5))]);
        assert!(s.values_improving());
    }
}
