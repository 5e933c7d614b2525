use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Detail record describing whether a patient with a history of gout is
/// actively flaring, at goal urate, or on therapy. Tri-state flags are
/// `None` when the question was never answered.
///
/// Invariant: `at_goal_long_term` implies `at_goal == Some(true)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoutDetail {
    pub flaring: Option<bool>,
    pub hyperuricemic: Option<bool>,
    pub at_goal: Option<bool>,
    pub at_goal_long_term: bool,
    pub on_ppx: bool,
    pub on_ult: bool,
    pub starting_ult: bool,
}

impl GoutDetail {
    pub fn invariant_holds(&self) -> bool {
        !self.at_goal_long_term || self.at_goal == Some(true)
    }
}

/// A patient's gout medical-history record with its 1:1 detail. The detail
/// is required by the prophylaxis engine; its absence there is a caller
/// error, not patient-data inconsistency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoutHistory {
    pub id: Uuid,
    pub detail: Option<GoutDetail>,
}
