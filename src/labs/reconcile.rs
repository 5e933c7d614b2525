use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AidError, LabError};
use crate::models::LabReading;

/// The create/update/delete set produced by diffing a caller-supplied target
/// list of readings against what is persisted. Applied atomically by the
/// write collaborator: all of it succeeds or none of it does.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReadingDelta {
    pub to_create: Vec<LabReading>,
    pub to_update: Vec<LabReading>,
    pub to_delete: Vec<Uuid>,
    /// The post-reconciliation list, re-sorted newest-first.
    pub merged: Vec<LabReading>,
}

impl ReadingDelta {
    pub fn is_noop(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }
}

/// Diff `incoming` against `existing`.
///
/// Incoming readings without an id are created. Incoming readings with an id
/// update their existing counterpart, and appear in `to_update` only when a
/// field actually changed. Existing readings no incoming id references are
/// deleted. An incoming id that matches nothing in `existing` is a caller
/// error and fatal.
pub fn reconcile_readings(
    existing: &[LabReading],
    incoming: Vec<LabReading>,
    fallback_date: Option<NaiveDate>,
) -> Result<ReadingDelta, AidError> {
    let mut by_id: HashMap<Uuid, &LabReading> = HashMap::with_capacity(existing.len());
    for reading in existing {
        let id = reading.id.ok_or(AidError::ExistingRecordWithoutId)?;
        by_id.insert(id, reading);
    }

    let mut delta = ReadingDelta::default();
    let mut referenced: Vec<Uuid> = Vec::with_capacity(incoming.len());

    for reading in incoming {
        match reading.id {
            Some(id) => {
                let current = *by_id.get(&id).ok_or(AidError::UnknownRecordId(id))?;
                referenced.push(id);
                if reading.value != current.value || reading.date_drawn != current.date_drawn {
                    delta.to_update.push(reading.clone());
                }
                delta.merged.push(reading);
            }
            None => {
                delta.to_create.push(reading.clone());
                delta.merged.push(reading);
            }
        }
    }

    for reading in existing {
        if let Some(id) = reading.id {
            if !referenced.contains(&id) {
                delta.to_delete.push(id);
            }
        }
    }

    sort_newest_first(&mut delta.merged, fallback_date)?;
    Ok(delta)
}

fn sort_newest_first(
    readings: &mut [LabReading],
    fallback_date: Option<NaiveDate>,
) -> Result<(), LabError> {
    let mut keyed: Vec<(NaiveDate, usize)> = Vec::with_capacity(readings.len());
    for (index, reading) in readings.iter().enumerate() {
        let date = reading
            .date_drawn
            .or(fallback_date)
            .ok_or(LabError::MissingDate { index })?;
        keyed.push((date, index));
    }
    keyed.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    let order: Vec<usize> = keyed.into_iter().map(|(_, index)| index).collect();
    let snapshot: Vec<LabReading> = readings.to_vec();
    for (slot, source) in order.into_iter().enumerate() {
        readings[slot] = snapshot[source].clone();
    }
    Ok(())
}
