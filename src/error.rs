use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::enums::Stage;

// ---------------------------------------------------------------------------
// LabError — domain invariant violations
// ---------------------------------------------------------------------------

/// Raised immediately when a lab series or comparison violates a domain
/// invariant. These indicate the computation context was built incorrectly,
/// not that the patient's data is inconsistent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LabError {
    #[error("lab reading at index {index} has no date drawn and no fallback date")]
    MissingDate { index: usize },

    #[error(
        "lab series is not in chronological order: reading at index {index} ({date}) \
         is newer than its predecessor ({previous})"
    )]
    OutOfOrder {
        index: usize,
        date: NaiveDate,
        previous: NaiveDate,
    },

    #[error("lab reading date drawn {0} is in the future")]
    DateDrawnInFuture(NaiveDate),

    #[error("cannot compare a creatinine against an absent baseline")]
    MissingBaseline,

    #[error("baseline creatinine comparison is undefined for a patient on dialysis")]
    BaselineOnDialysis,

    #[error(
        "a baseline creatinine of {0} mg/dL isn't very likely; \
         a value above 10 mg/dL would typically mean the patient is on dialysis"
    )]
    ImplausibleBaselineCreatinine(Decimal),

    #[error(
        "a uric acid of {0} mg/dL is very unlikely; if this value is correct, \
         an emergency medical evaluation is warranted"
    )]
    ImplausibleUrate(Decimal),
}

// ---------------------------------------------------------------------------
// AidError — configuration errors and transport
// ---------------------------------------------------------------------------

/// Fatal errors from the decision-aid layer. `MissingGoutHistory` and
/// `MissingGoutDetail` mean the caller built the evaluation context
/// incorrectly; they are never collected into a [`ValidationErrors`] map.
#[derive(Error, Debug)]
pub enum AidError {
    #[error("no gout history associated with the prophylaxis evaluation")]
    MissingGoutHistory,

    #[error("gout history has no gout detail record")]
    MissingGoutDetail,

    #[error("incoming record id {0} does not match any existing record")]
    UnknownRecordId(Uuid),

    #[error("existing record has no id; only persisted records can be reconciled")]
    ExistingRecordWithoutId,

    #[error(
        "given stage ({given}) and calculated stage ({calculated}) should be equal \
         by the time a stage is resolved"
    )]
    ConflictingStage { given: Stage, calculated: Stage },

    #[error(transparent)]
    Lab(#[from] LabError),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

/// A string failed to parse into one of the clinical enums.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {name} value: {value}")]
pub struct ParseEnumError {
    pub name: &'static str,
    pub value: String,
}

// ---------------------------------------------------------------------------
// ValidationErrors — collected, field-scoped, user-facing
// ---------------------------------------------------------------------------

/// A mapping from field name to human-readable messages. Checks collect into
/// this map rather than aborting so a caller can surface every problem at
/// once; [`ValidationErrors::into_result`] is the explicit gate that converts
/// the collected map into an error for transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message under a field key.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Merge another collected map into this one, preserving message order.
    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    /// Messages collected for a field, if any.
    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.errors.get(field).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.errors
            .iter()
            .map(|(field, messages)| (field.as_str(), messages.as_slice()))
    }

    /// The raise-if-any-collected gate: `Ok(())` when empty, otherwise the
    /// whole map as an error.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.errors {
            for message in messages {
                if !first {
                    write!(f, " ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
